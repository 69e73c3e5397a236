//! Graph command implementation
//!
//! Prints stacks, dependency edges and deployment waves, either as text or
//! as a single JSON document.

use console::Style;
use serde::Serialize;

use stackwire::SynthesisPlan;
use stackwire::config::ContextOverrides;
use stackwire::error::Result;
use stackwire::resolver::EdgeReason;

use crate::cli::GraphArgs;

#[derive(Debug, Serialize)]
struct GraphView<'a> {
    app: &'a str,
    order: Vec<&'a str>,
    edges: Vec<EdgeView<'a>>,
    waves: Vec<Vec<&'a str>>,
}

#[derive(Debug, Serialize)]
struct EdgeView<'a> {
    consumer: &'a str,
    producer: &'a str,
    #[serde(flatten)]
    reason: &'a EdgeReason,
}

fn view(synth: &SynthesisPlan) -> GraphView<'_> {
    let graph = synth.graph();
    GraphView {
        app: synth.app_name(),
        order: synth.ordered_names(),
        edges: graph
            .edges()
            .iter()
            .map(|edge| EdgeView {
                consumer: graph.name(edge.consumer),
                producer: graph.name(edge.producer),
                reason: &edge.reason,
            })
            .collect(),
        waves: graph
            .waves(synth.order())
            .iter()
            .map(|wave| wave.iter().map(|&id| graph.name(id)).collect())
            .collect(),
    }
}

/// Run graph command
pub fn run(args: GraphArgs, overrides: &ContextOverrides) -> Result<()> {
    let (_, synth) = super::synthesize(&args.manifest.file, overrides)?;
    let view = view(&synth);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let header = Style::new().bold();
    println!("{}", header.apply_to("Stacks:"));
    for stack in synth.stacks() {
        println!(
            "  {}  {}",
            Style::new().yellow().apply_to(stack.name()),
            Style::new().dim().apply_to(stack.scope())
        );
    }

    println!();
    println!("{}", header.apply_to("Edges:"));
    if view.edges.is_empty() {
        println!("  (none)");
    }
    for edge in &view.edges {
        let reason = match edge.reason {
            EdgeReason::Import { export_name } => format!("imports {export_name}"),
            EdgeReason::Explicit => "depends on".to_string(),
        };
        println!(
            "  {} -> {}  {}",
            edge.consumer,
            edge.producer,
            Style::new().dim().apply_to(reason)
        );
    }

    println!();
    println!("{}", header.apply_to("Waves:"));
    for (index, wave) in view.waves.iter().enumerate() {
        println!("  {}: {}", index + 1, wave.join(", "));
    }
    Ok(())
}
