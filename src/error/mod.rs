//! Error types and handling for Stackwire
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`construct`]: Construct tree and resource unit errors
//! - [`export`]: Export registry and import handle errors
//! - [`graph`]: Dependency graph and ordering errors
//! - [`pipeline`]: Stage, pipeline and deployment errors
//! - [`config`]: Assembly manifest errors

pub mod config;
pub mod construct;
pub mod export;
pub mod graph;
pub mod pipeline;

pub use config::{
    invalid as config_invalid, not_found as config_not_found, parse_failed as config_parse_failed,
    read_failed as config_read_failed, unknown_template,
};
pub use construct::{
    cyclic_construction, inconsistent_lifecycle, invalid_name as invalid_construct_name,
    name_collision, unknown_attribute, unknown_resource,
};
pub use export::{duplicate_export, import_not_resolved, registry_sealed, unresolved_import};
pub use graph::{cyclic_dependency, order_violation, unknown_stack};
pub use pipeline::{
    duplicate_stage, duplicate_stage_member, export_not_published, provisioning_failed,
    stage_order_violation,
};

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Stackwire operations
#[derive(Error, Diagnostic, Debug, Clone)]
pub enum StackwireError {
    // Construct errors
    #[error("Construct '{name}' already exists under '{scope}'")]
    #[diagnostic(
        code(stackwire::construct::name_collision),
        help("Sibling constructs must have unique names; rename one of them")
    )]
    NameCollision { scope: String, name: String },

    #[error("Invalid construct name '{name}': {reason}")]
    #[diagnostic(code(stackwire::construct::invalid_name))]
    InvalidConstructName { name: String, reason: String },

    #[error("Cyclic construction detected: {chain}")]
    #[diagnostic(
        code(stackwire::construct::cyclic),
        help(
            "A stack definition re-entered itself with an identical id and configuration. \
             Nested stacks must differ from every enclosing stack under construction."
        )
    )]
    CyclicConstruction { chain: String },

    #[error("Inconsistent lifecycle policy on '{path}': {reason}")]
    #[diagnostic(
        code(stackwire::construct::lifecycle),
        help("auto_delete_contents requires removal: destroy")
    )]
    InconsistentLifecyclePolicy { path: String, reason: String },

    #[error("Resource '{name}' not found under '{scope}'")]
    #[diagnostic(code(stackwire::construct::unknown_resource))]
    UnknownResourceReference { scope: String, name: String },

    #[error("Resource '{path}' has no attribute '{attribute}'")]
    #[diagnostic(code(stackwire::construct::unknown_attribute))]
    UnknownAttribute { path: String, attribute: String },

    // Export errors
    #[error("Export '{export_name}' is published by both '{existing}' and '{producer}'")]
    #[diagnostic(
        code(stackwire::export::duplicate),
        help("Export names are global across the whole assembly; rename one of the outputs")
    )]
    DuplicateExport {
        export_name: String,
        existing: String,
        producer: String,
    },

    #[error("Import '{export_name}' declared by stack '{consumer}' does not resolve to any export")]
    #[diagnostic(
        code(stackwire::export::unresolved),
        help("Check that the producing stack is part of the assembly and publishes this export")
    )]
    UnresolvedImport {
        export_name: String,
        consumer: String,
    },

    #[error("Export registry is sealed; cannot register '{export_name}' after the build phase")]
    #[diagnostic(code(stackwire::export::sealed))]
    RegistrySealed { export_name: String },

    #[error("Import '{export_name}' has not been resolved in this synthesis run")]
    #[diagnostic(
        code(stackwire::export::not_resolved),
        help("Import values are only readable from the plan produced by the same synthesis run")
    )]
    ImportNotResolved { export_name: String },

    // Graph errors
    #[error(
        "Stack '{consumer}' ({consumer_scope}) imports '{export_name}' from '{producer}' ({producer_scope}) across deployment scopes"
    )]
    #[diagnostic(
        code(stackwire::graph::cross_region),
        help("Enable cross_region_references on both the producing and the consuming stack")
    )]
    CrossRegionReference {
        export_name: String,
        consumer: String,
        consumer_scope: String,
        producer: String,
        producer_scope: String,
    },

    #[error("Cyclic stack dependency: {cycle}")]
    #[diagnostic(
        code(stackwire::graph::cyclic),
        help("Break the cycle by moving one of the shared values into a separate stack")
    )]
    CyclicStackDependency { cycle: String },

    #[error("Unknown stack: {name}")]
    #[diagnostic(code(stackwire::graph::unknown_stack))]
    UnknownStack { name: String },

    #[error("Stack '{consumer}' is ordered before its producer '{producer}'")]
    #[diagnostic(code(stackwire::graph::order_violation))]
    OrderViolation { consumer: String, producer: String },

    // Pipeline errors
    #[error("Stage '{stage}' is declared more than once in pipeline '{pipeline}'")]
    #[diagnostic(code(stackwire::pipeline::duplicate_stage))]
    DuplicateStage { pipeline: String, stage: String },

    #[error("Stack '{stack}' is a member of both stage '{first}' and stage '{second}'")]
    #[diagnostic(code(stackwire::pipeline::duplicate_member))]
    DuplicateStageMember {
        stack: String,
        first: String,
        second: String,
    },

    #[error("Stack '{consumer}' in stage '{stage}' depends on '{producer}', which {placement}")]
    #[diagnostic(
        code(stackwire::pipeline::stage_order),
        help("Producers must be deployed in the same stage or in an earlier one")
    )]
    StageOrderViolation {
        consumer: String,
        stage: String,
        producer: String,
        placement: String,
    },

    #[error("Stack '{consumer}' needs '{export_name}' from '{producer}' before it was published")]
    #[diagnostic(code(stackwire::pipeline::not_published))]
    ExportNotPublished {
        consumer: String,
        export_name: String,
        producer: String,
    },

    #[error("Provisioning of stack '{stack}' failed: {reason}")]
    #[diagnostic(code(stackwire::pipeline::provisioning))]
    Provisioning { stack: String, reason: String },

    // Configuration errors
    #[error("Assembly manifest not found: {path}")]
    #[diagnostic(
        code(stackwire::config::not_found),
        help("Pass the manifest with --file or create stackwire.yaml in the current directory")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to read assembly manifest: {path}: {reason}")]
    #[diagnostic(code(stackwire::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse assembly manifest: {path}: {reason}")]
    #[diagnostic(code(stackwire::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(stackwire::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Unknown stack template: {name}")]
    #[diagnostic(code(stackwire::config::unknown_template))]
    UnknownTemplate { name: String },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(stackwire::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for StackwireError {
    fn from(err: std::io::Error) -> Self {
        StackwireError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for StackwireError {
    fn from(err: serde_yaml::Error) -> Self {
        StackwireError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StackwireError {
    fn from(err: serde_json::Error) -> Self {
        StackwireError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, StackwireError>;

#[cfg(test)]
mod tests;
