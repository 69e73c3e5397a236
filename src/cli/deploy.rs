use clap::Parser;

use super::ManifestArgs;

/// Arguments for the deploy command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Walk the pipeline without provisioning:\n    stackwire deploy --dry-run\n\n\
                  Simulate a failing stack:\n    stackwire deploy --dry-run --fail Backend\n\n\
                  Deploy, then tear everything down again:\n    stackwire deploy --dry-run --teardown")]
pub struct DeployArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Use the dry-run provisioner (the only provisioner available)
    #[arg(long)]
    pub dry_run: bool,

    /// Make provisioning of this stack fail (repeatable)
    #[arg(long, value_name = "STACK")]
    pub fail: Vec<String>,

    /// Tear the assembly down after a successful deployment
    #[arg(long)]
    pub teardown: bool,
}
