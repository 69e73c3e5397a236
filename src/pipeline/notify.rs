//! Pipeline state changes and failure notifications

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Execution state reported by a deployment executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Started,
    Succeeded,
    Failed,
    Stopped,
    Canceled,
    Superseded,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Started => "STARTED",
            PipelineState::Succeeded => "SUCCEEDED",
            PipelineState::Failed => "FAILED",
            PipelineState::Stopped => "STOPPED",
            PipelineState::Canceled => "CANCELED",
            PipelineState::Superseded => "SUPERSEDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineState::Started)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition of a pipeline execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateChangeEvent {
    pub pipeline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub state: PipelineState,
    pub execution_id: String,
    pub time: DateTime<Utc>,
}

impl StateChangeEvent {
    pub fn new(
        pipeline: impl Into<String>,
        state: PipelineState,
        execution_id: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage: None,
            state,
            execution_id: execution_id.into(),
            time: Utc::now(),
        }
    }

    pub fn in_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}

/// Set of states that trigger a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePredicate {
    states: BTreeSet<PipelineState>,
}

impl StatePredicate {
    pub fn on(states: impl IntoIterator<Item = PipelineState>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }

    pub fn failed() -> Self {
        Self::on([PipelineState::Failed])
    }

    pub fn matches(&self, state: PipelineState) -> bool {
        self.states.contains(&state)
    }
}

impl Default for StatePredicate {
    fn default() -> Self {
        Self::failed()
    }
}

/// Structured notification handed to a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub pipeline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub state: PipelineState,
    pub execution_id: String,
    pub time: DateTime<Utc>,
    pub message: String,
}

impl NotificationEvent {
    pub fn from_transition(event: &StateChangeEvent) -> Self {
        Self {
            pipeline: event.pipeline.clone(),
            stage: event.stage.clone(),
            state: event.state,
            execution_id: event.execution_id.clone(),
            time: event.time,
            message: render_message(event),
        }
    }
}

/// Human-readable notification body
///
/// ```text
/// Pipeline website-pipeline failed!
/// State: FAILED
/// Execution ID: 0b7c...
/// Time: 2024-05-01T12:00:00Z
/// ```
pub fn render_message(event: &StateChangeEvent) -> String {
    let headline = match event.state {
        PipelineState::Failed => format!("Pipeline {} failed!", event.pipeline),
        PipelineState::Succeeded => format!("Pipeline {} succeeded.", event.pipeline),
        state => format!("Pipeline {} changed state to {}.", event.pipeline, state),
    };
    let mut message = format!(
        "{headline}\nState: {}\nExecution ID: {}\nTime: {}",
        event.state,
        event.execution_id,
        event.time.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    if let Some(stage) = &event.stage {
        message.push_str(&format!("\nStage: {stage}"));
    }
    message
}

/// Delivery channel for notifications
pub trait NotificationSink {
    fn send(&mut self, event: &NotificationEvent) -> Result<()>;
}

/// Sink that emits notifications as warning log events
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(&mut self, event: &NotificationEvent) -> Result<()> {
        warn!(
            pipeline = %event.pipeline,
            stage = event.stage.as_deref().unwrap_or("-"),
            state = %event.state,
            execution_id = %event.execution_id,
            time = %event.time,
            "{}",
            event.message
        );
        Ok(())
    }
}

/// Sink writing one JSON document per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> NotificationSink for JsonLinesSink<W> {
    fn send(&mut self, event: &NotificationEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink whose clones share the collected events
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<NotificationEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn send(&mut self, event: &NotificationEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
