//! Stackwire - stack composition engine
//!
//! Command-line entry point: parses arguments, sets up logging and
//! dispatches to the command implementations.

mod cli;
mod commands;
mod progress;

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use cli::{Cli, Commands};
use stackwire::StackwireError;

fn init_tracing(verbose: bool) {
    let default = if verbose { "stackwire=debug" } else { "stackwire=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn report(err: &StackwireError) {
    eprintln!("Error: {err}");
    if let Some(help) = err.help() {
        eprintln!("  help: {help}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let overrides = cli.overrides();

    let result = match cli.command {
        Commands::Synth(args) => commands::synth::run(args, &overrides),
        Commands::Validate(args) => commands::validate::run(args, &overrides),
        Commands::Graph(args) => commands::graph::run(args, &overrides),
        Commands::Deploy(args) => commands::deploy::run(args, &overrides),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}
