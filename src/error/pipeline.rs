//! Pipeline and deployment errors

use super::StackwireError;

/// Creates a duplicate stage error
pub fn duplicate_stage(pipeline: impl Into<String>, stage: impl Into<String>) -> StackwireError {
    StackwireError::DuplicateStage {
        pipeline: pipeline.into(),
        stage: stage.into(),
    }
}

/// Creates a duplicate stage member error
pub fn duplicate_stage_member(
    stack: impl Into<String>,
    first: impl Into<String>,
    second: impl Into<String>,
) -> StackwireError {
    StackwireError::DuplicateStageMember {
        stack: stack.into(),
        first: first.into(),
        second: second.into(),
    }
}

/// Creates a stage order violation error
pub fn stage_order_violation(
    consumer: impl Into<String>,
    stage: impl Into<String>,
    producer: impl Into<String>,
    placement: impl Into<String>,
) -> StackwireError {
    StackwireError::StageOrderViolation {
        consumer: consumer.into(),
        stage: stage.into(),
        producer: producer.into(),
        placement: placement.into(),
    }
}

/// Creates an export-not-published error
pub fn export_not_published(
    consumer: impl Into<String>,
    export_name: impl Into<String>,
    producer: impl Into<String>,
) -> StackwireError {
    StackwireError::ExportNotPublished {
        consumer: consumer.into(),
        export_name: export_name.into(),
        producer: producer.into(),
    }
}

/// Creates a provisioning failure error
pub fn provisioning_failed(stack: impl Into<String>, reason: impl Into<String>) -> StackwireError {
    StackwireError::Provisioning {
        stack: stack.into(),
        reason: reason.into(),
    }
}
