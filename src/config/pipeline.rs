//! Pipeline section of the assembly manifest

use std::io;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::{JsonLinesSink, LogSink, Pipeline, ShellStep, StatePredicate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub id: String,

    /// Synthesis step recorded ahead of the first stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synth: Option<ShellStep>,

    #[serde(default)]
    pub stages: Vec<StageConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<NotificationConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub id: String,

    /// Stack names, top-level or path-qualified
    pub stacks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<ShellStep>,
}

/// Where notifications are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Structured warning log events
    #[default]
    Log,
    /// JSON lines on standard output
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    #[serde(default)]
    pub states: StatePredicate,

    #[serde(default)]
    pub sink: SinkKind,
}

impl PipelineConfig {
    /// Build the pipeline with its stages and notification observers
    pub fn build(&self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(self.id.as_str());
        if let Some(step) = &self.synth {
            pipeline = pipeline.with_synth(step.clone());
        }
        for stage in &self.stages {
            let added = pipeline.add_stage(&stage.id, stage.stacks.iter().cloned())?;
            if let Some(step) = &stage.pre {
                added.set_pre(step.clone());
            }
        }
        for notification in &self.notifications {
            match notification.sink {
                SinkKind::Log => pipeline.on_state_change(notification.states.clone(), LogSink),
                SinkKind::Stdout => pipeline.on_state_change(
                    notification.states.clone(),
                    JsonLinesSink::new(io::stdout()),
                ),
            }
        }
        Ok(pipeline)
    }
}
