//! Dependency graph errors

use super::StackwireError;

/// Creates a cyclic dependency error from the stacks forming the cycle
pub fn cyclic_dependency<S: AsRef<str>>(cycle: &[S]) -> StackwireError {
    StackwireError::CyclicStackDependency {
        cycle: cycle
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" -> "),
    }
}

/// Creates an unknown stack error
pub fn unknown_stack(name: impl Into<String>) -> StackwireError {
    StackwireError::UnknownStack { name: name.into() }
}

/// Creates an order violation error
pub fn order_violation(consumer: impl Into<String>, producer: impl Into<String>) -> StackwireError {
    StackwireError::OrderViolation {
        consumer: consumer.into(),
        producer: producer.into(),
    }
}
