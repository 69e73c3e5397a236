//! Export registry errors

use super::StackwireError;

/// Creates a duplicate export error naming both producers
pub fn duplicate_export(
    export_name: impl Into<String>,
    existing: impl Into<String>,
    producer: impl Into<String>,
) -> StackwireError {
    StackwireError::DuplicateExport {
        export_name: export_name.into(),
        existing: existing.into(),
        producer: producer.into(),
    }
}

/// Creates an unresolved import error
pub fn unresolved_import(export_name: impl Into<String>, consumer: impl Into<String>) -> StackwireError {
    StackwireError::UnresolvedImport {
        export_name: export_name.into(),
        consumer: consumer.into(),
    }
}

/// Creates a sealed registry error
pub fn registry_sealed(export_name: impl Into<String>) -> StackwireError {
    StackwireError::RegistrySealed {
        export_name: export_name.into(),
    }
}

/// Creates an import-not-resolved error
pub fn import_not_resolved(export_name: impl Into<String>) -> StackwireError {
    StackwireError::ImportNotResolved {
        export_name: export_name.into(),
    }
}
