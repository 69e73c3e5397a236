//! Construct tree and resource unit errors

use super::StackwireError;

/// Creates a sibling name collision error
pub fn name_collision(scope: impl Into<String>, name: impl Into<String>) -> StackwireError {
    StackwireError::NameCollision {
        scope: scope.into(),
        name: name.into(),
    }
}

/// Creates an invalid construct name error
pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> StackwireError {
    StackwireError::InvalidConstructName {
        name: name.into(),
        reason: reason.into(),
    }
}

/// Creates a cyclic construction error from the chain of construction keys
pub fn cyclic_construction(chain: impl Into<String>) -> StackwireError {
    StackwireError::CyclicConstruction {
        chain: chain.into(),
    }
}

/// Creates an inconsistent lifecycle policy error
pub fn inconsistent_lifecycle(path: impl Into<String>, reason: impl Into<String>) -> StackwireError {
    StackwireError::InconsistentLifecyclePolicy {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an unknown resource reference error
pub fn unknown_resource(scope: impl Into<String>, name: impl Into<String>) -> StackwireError {
    StackwireError::UnknownResourceReference {
        scope: scope.into(),
        name: name.into(),
    }
}

/// Creates an unknown attribute error
pub fn unknown_attribute(path: impl Into<String>, attribute: impl Into<String>) -> StackwireError {
    StackwireError::UnknownAttribute {
        path: path.into(),
        attribute: attribute.into(),
    }
}
