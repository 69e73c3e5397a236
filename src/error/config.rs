//! Assembly manifest errors

use super::StackwireError;

/// Creates a manifest not found error
pub fn not_found(path: impl Into<String>) -> StackwireError {
    StackwireError::ConfigNotFound { path: path.into() }
}

/// Creates a manifest read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> StackwireError {
    StackwireError::ConfigReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a manifest parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> StackwireError {
    StackwireError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid configuration error
pub fn invalid(message: impl Into<String>) -> StackwireError {
    StackwireError::ConfigInvalid {
        message: message.into(),
    }
}

/// Creates an unknown template error
pub fn unknown_template(name: impl Into<String>) -> StackwireError {
    StackwireError::UnknownTemplate { name: name.into() }
}
