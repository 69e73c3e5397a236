//! Synth command implementation
//!
//! Writes one template per stack and the assembly manifest, then prints the
//! deployment order.

use console::Style;

use stackwire::config::ContextOverrides;
use stackwire::error::Result;

use crate::cli::SynthArgs;

/// Run synth command
pub fn run(args: SynthArgs, overrides: &ContextOverrides) -> Result<()> {
    let (_, synth) = super::synthesize(&args.manifest.file, overrides)?;
    let written = synth.write_to(&args.output)?;

    println!(
        "Synthesized {} ({} stacks, {} files) to {}",
        Style::new().bold().yellow().apply_to(synth.app_name()),
        synth.stacks().len(),
        written.len(),
        args.output.display()
    );
    println!();
    println!("{}", Style::new().bold().apply_to("Deployment order:"));
    for (position, stack) in synth.ordered_stacks().enumerate() {
        println!(
            "  {:>2}. {}  {}",
            position + 1,
            stack.name(),
            Style::new().dim().apply_to(stack.scope())
        );
    }
    Ok(())
}
