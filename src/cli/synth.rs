use clap::Parser;
use std::path::PathBuf;

use super::ManifestArgs;

/// Arguments for the synth command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Synthesize stackwire.yaml into ./stackwire.out:\n    stackwire synth\n\n\
                  Synthesize another manifest:\n    stackwire synth -f demos/stackwire.yaml -o out")]
pub struct SynthArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Output directory for templates and manifest.json
    #[arg(long, short = 'o', value_name = "DIR", default_value = "stackwire.out")]
    pub output: PathBuf,
}
