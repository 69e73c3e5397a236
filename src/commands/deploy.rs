//! Deploy command implementation
//!
//! Runs the manifest's pipeline against the dry-run provisioner. Without a
//! pipeline section every top-level stack is deployed in a single stage and
//! failures are logged.

use std::collections::{BTreeMap, HashMap};

use console::Style;

use stackwire::SynthesisPlan;
use stackwire::config::ContextOverrides;
use stackwire::error::{Result, config_invalid, provisioning_failed};
use stackwire::executor::{
    DeploymentReport, DryRunProvisioner, Executor, FinalizedStack, Provisioner, StackOutcome,
};
use stackwire::pipeline::{LogSink, Pipeline, StatePredicate};

use crate::cli::DeployArgs;
use crate::progress::ProgressDisplay;

/// Stage id of the pipeline used when the manifest declares none
const DEFAULT_STAGE: &str = "Deploy";

/// Provisioner wrapper that advances the progress display
struct Tracked<P> {
    inner: P,
    progress: ProgressDisplay,
    stages: HashMap<String, String>,
}

impl<P: Provisioner> Provisioner for Tracked<P> {
    fn provision(&mut self, stack: &FinalizedStack<'_>) -> Result<BTreeMap<String, String>> {
        let name = stack.stack.name();
        let stage = self.stages.get(name).map_or("", String::as_str);
        self.progress.update_stack(stage, name);
        let outputs = self.inner.provision(stack);
        self.progress.inc_stack();
        outputs
    }

    fn destroy(&mut self, stack: &FinalizedStack<'_>) -> Result<()> {
        self.inner.destroy(stack)
    }
}

fn default_pipeline(app: &str, synth: &SynthesisPlan) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new(app);
    let top_level = synth
        .stacks()
        .iter()
        .filter(|stack| stack.parent().is_none())
        .map(|stack| stack.name().to_string());
    pipeline.add_stage(DEFAULT_STAGE, top_level)?;
    pipeline.on_state_change(StatePredicate::failed(), LogSink);
    Ok(pipeline)
}

/// Run deploy command
pub fn run(args: DeployArgs, overrides: &ContextOverrides) -> Result<()> {
    if !args.dry_run {
        return Err(config_invalid(
            "no provisioner is configured; run deploy with --dry-run",
        ));
    }
    let (manifest, synth) = super::synthesize(&args.manifest.file, overrides)?;
    for name in &args.fail {
        synth.require_stack(name)?;
    }

    let mut pipeline = match manifest.pipeline()? {
        Some(pipeline) => pipeline,
        None => default_pipeline(&manifest.app, &synth)?,
    };
    let plan = pipeline.plan(&synth)?;
    let stages = plan
        .stages
        .iter()
        .flat_map(|stage| {
            stage
                .stack_names
                .iter()
                .map(|name| (name.clone(), stage.id.clone()))
        })
        .collect();

    let mut executor = Executor::new(Tracked {
        inner: DryRunProvisioner::failing(args.fail.iter().cloned()),
        progress: ProgressDisplay::new(plan.stacks().count() as u64),
        stages,
    });
    let report = executor.deploy(&synth, &mut pipeline)?;
    if report.succeeded() {
        executor.provisioner().progress.finish();
    } else {
        executor.provisioner().progress.abandon();
    }
    print_report(&report);

    if let Some(stack) = first_failure(&report) {
        return Err(provisioning_failed(
            stack,
            format!("pipeline '{}' ended in state {}", report.pipeline, report.state),
        ));
    }

    if args.teardown {
        let teardown = executor.teardown(&synth)?;
        println!();
        println!("{}", Style::new().bold().apply_to("Teardown:"));
        for entry in &teardown.resources {
            println!(
                "  {}  {}",
                entry.resource,
                Style::new().dim().apply_to(entry.disposition.as_str())
            );
        }
        let retained = teardown.retained().count();
        if retained > 0 {
            println!(
                "  {} {retained} resource(s) retained",
                Style::new().yellow().apply_to("!")
            );
        }
    }
    Ok(())
}

fn first_failure(report: &DeploymentReport) -> Option<&str> {
    report
        .stacks
        .iter()
        .find(|stack| matches!(stack.outcome, StackOutcome::Failed { .. }))
        .map(|stack| stack.stack.as_str())
}

fn print_report(report: &DeploymentReport) {
    let state = if report.succeeded() {
        Style::new().green().bold().apply_to(report.state.as_str())
    } else {
        Style::new().red().bold().apply_to(report.state.as_str())
    };
    println!(
        "Pipeline {} {}  {}",
        Style::new().bold().apply_to(&report.pipeline),
        state,
        Style::new().dim().apply_to(&report.execution_id)
    );

    let mut stage = "";
    for stack in &report.stacks {
        if stack.stage != stage {
            stage = &stack.stage;
            println!("  {}", Style::new().bold().apply_to(stage));
        }
        match &stack.outcome {
            StackOutcome::Deployed { outputs } => {
                println!("    {} {}", Style::new().green().apply_to("✓"), stack.stack);
                for (name, value) in outputs {
                    println!("        {name} = {value}");
                }
            }
            StackOutcome::Failed { reason } => println!(
                "    {} {}  {}",
                Style::new().red().apply_to("✗"),
                stack.stack,
                Style::new().dim().apply_to(reason)
            ),
            StackOutcome::Skipped => println!(
                "    {} {}  {}",
                Style::new().dim().apply_to("-"),
                stack.stack,
                Style::new().dim().apply_to("skipped")
            ),
        }
    }
    if report.notifications > 0 {
        println!("  Notifications sent: {}", report.notifications);
    }
    if report.notification_failures > 0 {
        println!(
            "  {} {}",
            Style::new().yellow().apply_to("Notifications failed:"),
            report.notification_failures
        );
    }
}
