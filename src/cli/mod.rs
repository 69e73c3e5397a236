//! CLI definitions using clap derive API
//!
//! Argument types per command:
//! - synth: Synthesis arguments
//! - deploy: Dry-run deployment arguments
//! - graph: Dependency graph arguments
//! - completions: Completions arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use stackwire::config::{ACCOUNT_ENV, ContextOverrides, MANIFEST_FILE_NAME, REGION_ENV};

pub mod completions;
pub mod deploy;
pub mod graph;
pub mod synth;

pub use completions::CompletionsArgs;
pub use deploy::DeployArgs;
pub use graph::GraphArgs;
pub use synth::SynthArgs;

/// Stackwire - stack composition engine
///
/// Wire independently declared stacks into one ordered, validated deployment plan.
#[derive(Parser, Debug)]
#[command(
    name = "stackwire",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Compose stacks, resolve cross-stack references and plan deployments",
    long_about = "Stackwire builds the stacks declared in stackwire.yaml, resolves every \
                  cross-stack and cross-region import, rejects cyclic or inconsistent \
                  assemblies and emits a deterministic deployment order.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  stackwire validate                      \x1b[90m# Check stackwire.yaml\x1b[0m\n   \
                  stackwire synth -o out                  \x1b[90m# Write templates and manifest\x1b[0m\n   \
                  stackwire graph                         \x1b[90m# Show dependency edges and waves\x1b[0m\n   \
                  stackwire deploy --dry-run              \x1b[90m# Walk the pipeline without provisioning\x1b[0m\n   \
                  stackwire --region us-east-1 synth      \x1b[90m# Override the default region\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Default target account for stacks without one
    #[arg(long, global = true, env = ACCOUNT_ENV)]
    pub account: Option<String>,

    /// Default target region for stacks without one
    #[arg(long, global = true, env = REGION_ENV)]
    pub region: Option<String>,

    /// Allow cross-region references on every stack
    #[arg(long, global = true)]
    pub cross_region_references: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Context overrides for this synthesis run
    pub fn overrides(&self) -> ContextOverrides {
        ContextOverrides {
            account: self.account.clone(),
            region: self.region.clone(),
            cross_region_references: self.cross_region_references,
        }
    }
}

/// Location of the assembly manifest
#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Assembly manifest
    #[arg(long, short = 'f', value_name = "FILE", default_value = MANIFEST_FILE_NAME)]
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize templates and the assembly manifest
    Synth(SynthArgs),

    /// Validate the assembly without writing anything
    Validate(ManifestArgs),

    /// Show stacks, dependency edges and deployment waves
    Graph(GraphArgs),

    /// Run the configured pipeline against a dry-run provisioner
    Deploy(DeployArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_validate_default_file() {
        let cli = Cli::try_parse_from(["stackwire", "validate"]).unwrap();
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.file, PathBuf::from(MANIFEST_FILE_NAME)),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_parsing_synth() {
        let cli =
            Cli::try_parse_from(["stackwire", "synth", "-f", "demo.yaml", "-o", "out"]).unwrap();
        match cli.command {
            Commands::Synth(args) => {
                assert_eq!(args.manifest.file, PathBuf::from("demo.yaml"));
                assert_eq!(args.output, PathBuf::from("out"));
            }
            _ => panic!("Expected Synth command"),
        }
    }

    #[test]
    fn test_cli_parsing_deploy() {
        let cli = Cli::try_parse_from([
            "stackwire", "deploy", "--dry-run", "--fail", "Backend", "--fail", "Web",
        ])
        .unwrap();
        match cli.command {
            Commands::Deploy(args) => {
                assert!(args.dry_run);
                assert_eq!(args.fail, vec!["Backend", "Web"]);
                assert!(!args.teardown);
            }
            _ => panic!("Expected Deploy command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "stackwire",
            "-v",
            "--account",
            "111111111111",
            "--region",
            "eu-west-1",
            "--cross-region-references",
            "graph",
        ])
        .unwrap();
        assert!(cli.verbose);
        let overrides = cli.overrides();
        assert_eq!(overrides.account.as_deref(), Some("111111111111"));
        assert_eq!(overrides.region.as_deref(), Some("eu-west-1"));
        assert!(overrides.cross_region_references);
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["stackwire", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }
}
