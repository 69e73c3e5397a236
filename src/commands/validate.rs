//! Validate command implementation
//!
//! Builds and resolves the assembly without writing anything, then checks
//! the configured pipeline's stage layout against it.

use console::Style;

use stackwire::config::ContextOverrides;
use stackwire::error::Result;

use crate::cli::ManifestArgs;

/// Run validate command
pub fn run(args: ManifestArgs, overrides: &ContextOverrides) -> Result<()> {
    let (manifest, synth) = super::synthesize(&args.file, overrides)?;

    let stages = match manifest.pipeline()? {
        Some(pipeline) => Some(pipeline.plan(&synth)?.stages.len()),
        None => None,
    };

    println!(
        "{} {}",
        Style::new().green().bold().apply_to("✓"),
        Style::new().bold().apply_to(synth.app_name())
    );
    println!("  Stacks:  {}", synth.stacks().len());
    println!("  Exports: {}", synth.registry().len());
    println!("  Edges:   {}", synth.graph().edges().len());
    if let Some(stages) = stages {
        println!("  Stages:  {stages}");
    }
    Ok(())
}
