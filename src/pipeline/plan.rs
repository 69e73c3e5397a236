//! Stage-ordered deployment plans

use std::collections::HashMap;
use std::iter;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, duplicate_stage_member, stage_order_violation};
use crate::pipeline::{Pipeline, ShellStep};
use crate::stack::StackId;
use crate::synth::SynthesisPlan;

/// Deployment plan of one stage
#[derive(Debug, Clone, Serialize)]
pub struct StagePlan {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<ShellStep>,
    /// Members in deployment order
    #[serde(skip)]
    pub stacks: Vec<StackId>,
    /// Members grouped into waves that may deploy in parallel
    #[serde(skip)]
    pub waves: Vec<Vec<StackId>>,
    #[serde(rename = "stacks")]
    pub stack_names: Vec<String>,
    #[serde(rename = "waves")]
    pub wave_names: Vec<Vec<String>>,
}

/// Ordered stages of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub pipeline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synth: Option<ShellStep>,
    pub stages: Vec<StagePlan>,
}

impl DeploymentPlan {
    /// Every planned stack, stage by stage
    pub fn stacks(&self) -> impl Iterator<Item = StackId> + '_ {
        self.stages.iter().flat_map(|stage| stage.stacks.iter().copied())
    }

    pub fn stage_of(&self, stack: StackId) -> Option<&StagePlan> {
        self.stages.iter().find(|stage| stage.stacks.contains(&stack))
    }
}

/// Assign stacks to stages and order each stage
///
/// A stage's members are the stacks it lists plus every stack nested inside
/// them. Within a stage, members follow the synthesis order.
///
/// # Errors
///
/// - `UnknownStack` for a listed stack missing from the assembly
/// - `DuplicateStageMember` when a stack ends up in two stages
/// - `StageOrderViolation` when a member depends on a stack deployed in a
///   later stage or in no stage at all
pub fn plan_stages(pipeline: &Pipeline, synth: &SynthesisPlan) -> Result<DeploymentPlan> {
    let stages = pipeline.stages();
    let mut assigned: HashMap<StackId, usize> = HashMap::new();

    for (index, stage) in stages.iter().enumerate() {
        for name in stage.stacks() {
            let listed = synth.require_stack(name)?.id();
            for member in iter::once(listed).chain(synth.nested_stacks(listed)) {
                match assigned.get(&member) {
                    Some(&other) if other == index => {}
                    Some(&other) => {
                        return Err(duplicate_stage_member(
                            synth.stack(member).name(),
                            stages[other].id(),
                            stage.id(),
                        ));
                    }
                    None => {
                        assigned.insert(member, index);
                    }
                }
            }
        }
    }

    for &consumer in synth.order() {
        let Some(&stage_index) = assigned.get(&consumer) else {
            continue;
        };
        for &producer in synth.graph().producers_of(consumer) {
            let placement = match assigned.get(&producer) {
                Some(&index) if index <= stage_index => continue,
                Some(&index) => format!("is deployed in later stage '{}'", stages[index].id()),
                None => "is not part of any stage".to_string(),
            };
            return Err(stage_order_violation(
                synth.stack(consumer).name(),
                stages[stage_index].id(),
                synth.stack(producer).name(),
                placement,
            ));
        }
    }

    let names = |ids: &[StackId]| -> Vec<String> {
        ids.iter()
            .map(|&id| synth.stack(id).name().to_string())
            .collect()
    };

    let mut planned = Vec::with_capacity(stages.len());
    for (index, stage) in stages.iter().enumerate() {
        let stacks: Vec<StackId> = synth
            .order()
            .iter()
            .copied()
            .filter(|id| assigned.get(id) == Some(&index))
            .collect();
        let waves = synth.graph().waves(&stacks);
        debug!(
            stage = stage.id(),
            stacks = stacks.len(),
            waves = waves.len(),
            "planned stage"
        );
        planned.push(StagePlan {
            id: stage.id().to_string(),
            pre: stage.pre().cloned(),
            stack_names: names(&stacks),
            wave_names: waves.iter().map(|wave| names(wave)).collect(),
            stacks,
            waves,
        });
    }

    Ok(DeploymentPlan {
        pipeline: pipeline.id().to_string(),
        synth: pipeline.synth_step().cloned(),
        stages: planned,
    })
}
