use clap::Parser;

use super::ManifestArgs;

/// Arguments for the graph command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show the dependency graph:\n    stackwire graph\n\n\
                  Print the graph as JSON:\n    stackwire graph --json")]
pub struct GraphArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Print the graph as JSON
    #[arg(long)]
    pub json: bool,
}
