//! Deployment execution against an external provisioning collaborator
//!
//! The engine never provisions anything itself. A [`Provisioner`] receives
//! finalized stacks (resources plus real import values) and reports the
//! output values it produced. The [`Executor`] walks a pipeline's plan stage
//! by stage, feeds each stack only values its producers actually reported,
//! and tells the pipeline about the resulting state transitions.

pub mod dry_run;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

pub use dry_run::DryRunProvisioner;

use crate::error::{Result, export_not_published, provisioning_failed};
use crate::pipeline::{Pipeline, PipelineState, StateChangeEvent};
use crate::resource::{RemovalPolicy, ResourceUnit};
use crate::stack::{Stack, StackId};
use crate::synth::{StackArtifact, SynthesisPlan};

/// A stack ready to hand to a provisioner
#[derive(Debug)]
pub struct FinalizedStack<'a> {
    pub stack: &'a Stack,
    pub artifact: StackArtifact,
    pub resources: Vec<&'a ResourceUnit>,
    /// Import values keyed by export name
    pub imports: BTreeMap<String, String>,
    /// Synthesized output values keyed by export name
    pub outputs: BTreeMap<String, String>,
}

/// Collaborator that creates and destroys concrete infrastructure
pub trait Provisioner {
    /// Provision a stack, returning the produced outputs keyed by export name
    fn provision(&mut self, stack: &FinalizedStack<'_>) -> Result<BTreeMap<String, String>>;

    /// Destroy a stack, honoring each resource's lifecycle policy
    fn destroy(&mut self, stack: &FinalizedStack<'_>) -> Result<()>;
}

/// Result of deploying one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StackOutcome {
    Deployed { outputs: BTreeMap<String, String> },
    Failed { reason: String },
    /// Not attempted because an earlier stack failed
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackReport {
    pub stack: String,
    pub stage: String,
    #[serde(flatten)]
    pub outcome: StackOutcome,
}

/// Result of one pipeline execution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub pipeline: String,
    pub execution_id: String,
    pub state: PipelineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
    pub stacks: Vec<StackReport>,
    pub notifications: usize,
    /// Notifications a sink failed to deliver
    pub notification_failures: usize,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Succeeded
    }

    pub fn outcome(&self, stack: &str) -> Option<&StackOutcome> {
        self.stacks
            .iter()
            .find(|report| report.stack == stack)
            .map(|report| &report.outcome)
    }
}

/// What teardown did to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Retained,
    Destroyed,
    DestroyedWithContents,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Retained => "retained",
            Disposition::Destroyed => "destroyed",
            Disposition::DestroyedWithContents => "destroyed with contents",
        }
    }

    pub fn of(unit: &ResourceUnit) -> Self {
        let lifecycle = unit.lifecycle();
        match lifecycle.removal {
            RemovalPolicy::Retain => Disposition::Retained,
            RemovalPolicy::Destroy if lifecycle.auto_delete_contents => {
                Disposition::DestroyedWithContents
            }
            RemovalPolicy::Destroy => Disposition::Destroyed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeardownEntry {
    pub stack: String,
    pub resource: String,
    pub disposition: Disposition,
}

/// Result of tearing an assembly down
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeardownReport {
    /// Stacks in the order they were destroyed
    pub stacks: Vec<String>,
    pub resources: Vec<TeardownEntry>,
}

impl TeardownReport {
    pub fn retained(&self) -> impl Iterator<Item = &TeardownEntry> {
        self.resources
            .iter()
            .filter(|entry| entry.disposition == Disposition::Retained)
    }
}

/// Reference executor deploying one stack at a time
///
/// Waves are walked in order, so every producer completes before any of its
/// consumers starts.
#[derive(Debug)]
pub struct Executor<P: Provisioner> {
    provisioner: P,
}

impl<P: Provisioner> Executor<P> {
    pub fn new(provisioner: P) -> Self {
        Self { provisioner }
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    pub fn into_inner(self) -> P {
        self.provisioner
    }

    /// Run `pipeline` over a synthesized assembly
    ///
    /// A provisioning failure does not return an error: it ends the run in
    /// the `FAILED` state, skips the remaining stacks and is reported to the
    /// pipeline's observers. A sink that fails to deliver a notification is
    /// logged and counted in the report. Errors are planning failures.
    pub fn deploy(
        &mut self,
        synth: &SynthesisPlan,
        pipeline: &mut Pipeline,
    ) -> Result<DeploymentReport> {
        let plan = pipeline.plan(synth)?;
        let execution_id = Uuid::new_v4().to_string();
        let started = Utc::now();
        info!(
            pipeline = pipeline.id(),
            execution_id = %execution_id,
            stages = plan.stages.len(),
            "deployment started"
        );
        let mut delivery = pipeline.deliver(
            &StateChangeEvent::new(pipeline.id(), PipelineState::Started, &execution_id).at(started),
        );

        let mut published: HashMap<String, String> = HashMap::new();
        let mut reports = Vec::new();
        let mut failed_stage: Option<String> = None;

        for stage in &plan.stages {
            for wave in &stage.waves {
                for &id in wave {
                    let name = synth.stack(id).name().to_string();
                    let outcome = if failed_stage.is_some() {
                        StackOutcome::Skipped
                    } else {
                        match self.deploy_stack(synth, id, &published) {
                            Ok(outputs) => {
                                published.extend(outputs.clone());
                                StackOutcome::Deployed { outputs }
                            }
                            Err(err) => {
                                error!(stack = %name, stage = %stage.id, error = %err, "stack deployment failed");
                                failed_stage = Some(stage.id.clone());
                                StackOutcome::Failed {
                                    reason: err.to_string(),
                                }
                            }
                        }
                    };
                    reports.push(StackReport {
                        stack: name,
                        stage: stage.id.clone(),
                        outcome,
                    });
                }
            }
        }

        let state = if failed_stage.is_some() {
            PipelineState::Failed
        } else {
            PipelineState::Succeeded
        };
        let finished = Utc::now();
        let mut event = StateChangeEvent::new(pipeline.id(), state, &execution_id).at(finished);
        if let Some(stage) = &failed_stage {
            event = event.in_stage(stage.as_str());
        }
        let finish_delivery = pipeline.deliver(&event);
        delivery.sent += finish_delivery.sent;
        delivery.failures.extend(finish_delivery.failures);
        if !delivery.failures.is_empty() {
            warn!(
                pipeline = pipeline.id(),
                execution_id = %execution_id,
                failures = delivery.failures.len(),
                "some notifications were not delivered"
            );
        }
        info!(
            pipeline = pipeline.id(),
            execution_id = %execution_id,
            state = %state,
            "deployment finished"
        );

        Ok(DeploymentReport {
            pipeline: pipeline.id().to_string(),
            execution_id,
            state,
            failed_stage,
            stacks: reports,
            notifications: delivery.sent,
            notification_failures: delivery.failures.len(),
            started,
            finished,
        })
    }

    fn deploy_stack(
        &mut self,
        synth: &SynthesisPlan,
        id: StackId,
        published: &HashMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let stack = synth.stack(id);
        let mut imports = BTreeMap::new();
        for import in stack.imports() {
            let export_name = import.handle.export_name();
            let output = synth.registry().resolve(export_name, stack.name())?;
            let value = if output.producer == id {
                synth.value_of(&import.handle)?.to_string()
            } else {
                published.get(export_name).cloned().ok_or_else(|| {
                    export_not_published(stack.name(), export_name, output.producer_name.as_str())
                })?
            };
            imports.insert(export_name.to_string(), value);
        }

        let finalized = finalize(synth, id, imports)?;
        let outputs = self.provisioner.provision(&finalized)?;
        if let Some(missing) = stack.exports().iter().find(|name| !outputs.contains_key(*name)) {
            return Err(provisioning_failed(
                stack.name(),
                format!("export '{missing}' was not reported"),
            ));
        }
        Ok(outputs)
    }

    /// Destroy every stack, consumers before producers
    pub fn teardown(&mut self, synth: &SynthesisPlan) -> Result<TeardownReport> {
        let mut report = TeardownReport::default();
        for id in synth.teardown_order() {
            let finalized = finalize(synth, id, synth.stack_imports(id)?)?;
            self.provisioner.destroy(&finalized)?;

            let stack = synth.stack(id).name().to_string();
            for unit in &finalized.resources {
                report.resources.push(TeardownEntry {
                    stack: stack.clone(),
                    resource: unit.path().to_string(),
                    disposition: Disposition::of(unit),
                });
            }
            report.stacks.push(stack);
        }
        info!(
            stacks = report.stacks.len(),
            retained = report.retained().count(),
            "teardown finished"
        );
        Ok(report)
    }
}

fn finalize<'a>(
    synth: &'a SynthesisPlan,
    id: StackId,
    imports: BTreeMap<String, String>,
) -> Result<FinalizedStack<'a>> {
    Ok(FinalizedStack {
        stack: synth.stack(id),
        artifact: synth.artifact(id)?,
        resources: synth.resources(id),
        imports,
        outputs: synth.stack_outputs(id),
    })
}
