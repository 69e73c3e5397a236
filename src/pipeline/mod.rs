//! Stage/pipeline orchestration
//!
//! A [`Pipeline`] deploys its stages strictly in declaration order. Each
//! stage lists stacks; within a stage the synthesis order applies. State
//! transitions reported by a deployment executor are matched against the
//! registered observers, and every qualifying transition produces exactly
//! one notification per observer.

pub mod notify;
pub mod plan;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use notify::{
    JsonLinesSink, LogSink, MemorySink, NotificationEvent, NotificationSink, PipelineState,
    StateChangeEvent, StatePredicate, render_message,
};
pub use plan::{DeploymentPlan, StagePlan, plan_stages};

use crate::error::{Result, StackwireError, duplicate_stage};
use crate::synth::SynthesisPlan;

/// A shell step recorded in the plan; never executed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellStep {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl ShellStep {
    pub fn new<S: Into<String>>(name: impl Into<String>, commands: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ordered group of stacks deployed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    id: String,
    stacks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pre: Option<ShellStep>,
}

impl Stage {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stack names as listed
    pub fn stacks(&self) -> &[String] {
        &self.stacks
    }

    /// Validation or build step run before the stage
    pub fn pre(&self) -> Option<&ShellStep> {
        self.pre.as_ref()
    }

    pub fn set_pre(&mut self, step: ShellStep) -> &mut Self {
        self.pre = Some(step);
        self
    }
}

/// Outcome of notifying the observers of one transition
#[derive(Debug, Default)]
pub struct Delivery {
    pub sent: usize,
    pub failures: Vec<StackwireError>,
}

struct Observer {
    predicate: StatePredicate,
    sink: Box<dyn NotificationSink>,
}

/// A delivery pipeline
pub struct Pipeline {
    id: String,
    synth: Option<ShellStep>,
    stages: Vec<Stage>,
    observers: Vec<Observer>,
    /// (execution id, state) pairs already notified
    ///
    /// Entries are never pruned; a long-lived pipeline grows by one entry
    /// per execution and notified state.
    delivered: HashSet<(String, PipelineState)>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("synth", &self.synth)
            .field("stages", &self.stages)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Pipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            synth: None,
            stages: Vec::new(),
            observers: Vec::new(),
            delivered: HashSet::new(),
        }
    }

    pub fn with_synth(mut self, step: ShellStep) -> Self {
        self.synth = Some(step);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn synth_step(&self) -> Option<&ShellStep> {
        self.synth.as_ref()
    }

    /// Stages in deployment order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Append a stage
    ///
    /// Fails with `DuplicateStage` if a stage with the same id exists.
    pub fn add_stage<S: Into<String>>(
        &mut self,
        id: &str,
        stacks: impl IntoIterator<Item = S>,
    ) -> Result<&mut Stage> {
        if self.stages.iter().any(|stage| stage.id == id) {
            return Err(duplicate_stage(self.id.as_str(), id));
        }
        self.stages.push(Stage {
            id: id.to_string(),
            stacks: stacks.into_iter().map(Into::into).collect(),
            pre: None,
        });
        let index = self.stages.len() - 1;
        Ok(&mut self.stages[index])
    }

    /// Notify `sink` whenever a transition matches `predicate`
    pub fn on_state_change(
        &mut self,
        predicate: StatePredicate,
        sink: impl NotificationSink + 'static,
    ) {
        self.observers.push(Observer {
            predicate,
            sink: Box::new(sink),
        });
    }

    /// Feed a state transition reported by the executor
    ///
    /// Returns the number of notifications sent. Transitions of other
    /// pipelines and repeated (execution id, state) pairs are ignored. If a
    /// sink fails, the remaining observers are still notified and the first
    /// sink error is returned.
    pub fn handle_transition(&mut self, event: &StateChangeEvent) -> Result<usize> {
        let delivery = self.deliver(event);
        match delivery.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(delivery.sent),
        }
    }

    /// Like [`Pipeline::handle_transition`], but reports every sink failure
    ///
    /// The (execution id, state) pair counts as notified once every matching
    /// observer has been tried, whether or not its sink succeeded.
    pub fn deliver(&mut self, event: &StateChangeEvent) -> Delivery {
        let mut delivery = Delivery::default();
        if event.pipeline != self.id {
            return delivery;
        }
        if !self
            .delivered
            .insert((event.execution_id.clone(), event.state))
        {
            debug!(
                pipeline = %self.id,
                state = %event.state,
                execution_id = %event.execution_id,
                "duplicate transition ignored"
            );
            return delivery;
        }

        let mut notification = None;
        for observer in &mut self.observers {
            if !observer.predicate.matches(event.state) {
                continue;
            }
            let notification =
                notification.get_or_insert_with(|| NotificationEvent::from_transition(event));
            match observer.sink.send(notification) {
                Ok(()) => delivery.sent += 1,
                Err(err) => {
                    warn!(
                        pipeline = %self.id,
                        state = %event.state,
                        error = %err,
                        "notification delivery failed"
                    );
                    delivery.failures.push(err);
                }
            }
        }
        delivery
    }

    /// Plan the stages of this pipeline against a synthesized assembly
    pub fn plan(&self, synth: &SynthesisPlan) -> Result<DeploymentPlan> {
        plan_stages(self, synth)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StackwireError;

    #[test]
    fn test_duplicate_stage() {
        let mut pipeline = Pipeline::new("website");
        pipeline.add_stage("Prod", ["Frontend"]).unwrap();
        let err = pipeline.add_stage("Prod", ["Backend"]).unwrap_err();
        assert!(matches!(err, StackwireError::DuplicateStage { .. }));
    }

    #[test]
    fn test_stage_pre_step() {
        let mut pipeline = Pipeline::new("website");
        pipeline
            .add_stage("Prod", ["Frontend"])
            .unwrap()
            .set_pre(ShellStep::new("Validate", ["npm test"]));
        assert_eq!(pipeline.stages()[0].pre().unwrap().commands, vec!["npm test"]);
    }

    #[test]
    fn test_one_notification_per_qualifying_transition() {
        let sink = MemorySink::new();
        let mut pipeline = Pipeline::new("website");
        pipeline.on_state_change(StatePredicate::failed(), sink.clone());

        let started = StateChangeEvent::new("website", PipelineState::Started, "exec-1");
        let failed = StateChangeEvent::new("website", PipelineState::Failed, "exec-1");
        assert_eq!(pipeline.handle_transition(&started).unwrap(), 0);
        assert_eq!(pipeline.handle_transition(&failed).unwrap(), 1);
        assert_eq!(pipeline.handle_transition(&failed).unwrap(), 0);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pipeline, "website");
        assert_eq!(events[0].execution_id, "exec-1");
    }

    #[test]
    fn test_new_execution_notifies_again() {
        let sink = MemorySink::new();
        let mut pipeline = Pipeline::new("website");
        pipeline.on_state_change(StatePredicate::failed(), sink.clone());

        for execution in ["exec-1", "exec-2"] {
            let event = StateChangeEvent::new("website", PipelineState::Failed, execution);
            pipeline.handle_transition(&event).unwrap();
        }
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_other_pipeline_ignored() {
        let sink = MemorySink::new();
        let mut pipeline = Pipeline::new("website");
        pipeline.on_state_change(StatePredicate::failed(), sink.clone());
        let event = StateChangeEvent::new("other", PipelineState::Failed, "exec-1");
        assert_eq!(pipeline.handle_transition(&event).unwrap(), 0);
        assert!(sink.is_empty());
    }

    struct BrokenSink;

    impl NotificationSink for BrokenSink {
        fn send(&mut self, _event: &NotificationEvent) -> Result<()> {
            Err(StackwireError::IoError {
                message: "topic down".to_string(),
            })
        }
    }

    #[test]
    fn test_failing_sink_does_not_starve_other_observers() {
        let sink = MemorySink::new();
        let mut pipeline = Pipeline::new("website");
        pipeline.on_state_change(StatePredicate::failed(), BrokenSink);
        pipeline.on_state_change(StatePredicate::failed(), sink.clone());

        let failed = StateChangeEvent::new("website", PipelineState::Failed, "exec-1");
        let err = pipeline.handle_transition(&failed).unwrap_err();
        assert!(matches!(err, StackwireError::IoError { .. }));
        assert_eq!(sink.len(), 1);

        assert_eq!(pipeline.handle_transition(&failed).unwrap(), 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_deliver_reports_every_failure() {
        let sink = MemorySink::new();
        let mut pipeline = Pipeline::new("website");
        pipeline.on_state_change(StatePredicate::failed(), BrokenSink);
        pipeline.on_state_change(StatePredicate::failed(), sink.clone());
        pipeline.on_state_change(StatePredicate::failed(), BrokenSink);

        let failed = StateChangeEvent::new("website", PipelineState::Failed, "exec-1");
        let delivery = pipeline.deliver(&failed);
        assert_eq!(delivery.sent, 1);
        assert_eq!(delivery.failures.len(), 2);
    }
}
