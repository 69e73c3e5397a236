//! Output export registry
//!
//! The registry maps global export names to the outputs that publish them.
//! It lives for exactly one synthesis run: [`ExportRegistry::init_run`] starts
//! an empty build phase, producers append during construction, and
//! [`ExportRegistry::seal`] makes it read-only before resolution. A second
//! producer of the same name is an error, never an overwrite.

pub mod handle;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

pub use handle::{ImportHandle, ImportId, ResolvedImports, RunId};

use crate::construct::ConstructPath;
use crate::error::{Result, duplicate_export, registry_sealed, unresolved_import};
use crate::stack::{DeploymentScope, StackId};

/// Value published by an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    /// A value known at publish time
    Literal(String),
    /// Re-export of another stack's export
    Import(ImportHandle),
}

impl From<&str> for OutputValue {
    fn from(value: &str) -> Self {
        OutputValue::Literal(value.to_string())
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        OutputValue::Literal(value)
    }
}

impl From<ImportHandle> for OutputValue {
    fn from(handle: ImportHandle) -> Self {
        OutputValue::Import(handle)
    }
}

impl From<&ImportHandle> for OutputValue {
    fn from(handle: &ImportHandle) -> Self {
        OutputValue::Import(handle.clone())
    }
}

/// A named value published by a producer stack
#[derive(Debug, Clone, Serialize)]
pub struct ExportedOutput {
    pub export_name: String,
    pub value: OutputValue,
    #[serde(skip)]
    pub producer: StackId,
    #[serde(rename = "producer")]
    pub producer_name: String,
    /// Path of the output construct
    pub path: ConstructPath,
    #[serde(skip)]
    pub scope: DeploymentScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Lifecycle phase of the registry within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// Producers may register exports
    Building,
    /// Read-only; resolution may proceed
    Sealed,
}

/// Table of exports for one synthesis run
#[derive(Debug)]
pub struct ExportRegistry {
    run: RunId,
    phase: RegistryPhase,
    outputs: Vec<ExportedOutput>,
    by_name: HashMap<String, usize>,
}

impl Default for ExportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportRegistry {
    /// Create a registry already in the build phase of a fresh run
    pub fn new() -> Self {
        Self {
            run: RunId::next(),
            phase: RegistryPhase::Building,
            outputs: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Start a new run: drop every export and reopen for registration
    pub fn init_run(&mut self) -> RunId {
        self.clear();
        self.run = RunId::next();
        self.phase = RegistryPhase::Building;
        debug!(run = %self.run, "export registry initialised");
        self.run
    }

    /// Drop every export without starting a new run
    pub fn clear(&mut self) {
        self.outputs.clear();
        self.by_name.clear();
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn phase(&self) -> RegistryPhase {
        self.phase
    }

    /// Make the registry read-only for the rest of the run
    pub fn seal(&mut self) {
        self.phase = RegistryPhase::Sealed;
    }

    /// Register an export
    ///
    /// Fails with `DuplicateExport` naming both producers when the name is
    /// already taken, and with `RegistrySealed` after the build phase.
    pub fn register(&mut self, output: ExportedOutput) -> Result<()> {
        if self.phase == RegistryPhase::Sealed {
            return Err(registry_sealed(output.export_name));
        }
        if let Some(&index) = self.by_name.get(&output.export_name) {
            let existing = &self.outputs[index];
            return Err(duplicate_export(
                output.export_name,
                existing.producer_name.as_str(),
                output.producer_name,
            ));
        }
        debug!(
            export = %output.export_name,
            producer = %output.producer_name,
            "registered export"
        );
        self.by_name
            .insert(output.export_name.clone(), self.outputs.len());
        self.outputs.push(output);
        Ok(())
    }

    pub fn get(&self, export_name: &str) -> Option<&ExportedOutput> {
        self.by_name.get(export_name).map(|&i| &self.outputs[i])
    }

    pub fn contains(&self, export_name: &str) -> bool {
        self.by_name.contains_key(export_name)
    }

    /// Resolve an export for `consumer`, failing with `UnresolvedImport` if absent
    pub fn resolve(&self, export_name: &str, consumer: &str) -> Result<&ExportedOutput> {
        self.get(export_name)
            .ok_or_else(|| unresolved_import(export_name, consumer))
    }

    /// Exports in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ExportedOutput> {
        self.outputs.iter()
    }

    /// Exports published by `producer`, in registration order
    pub fn exports_of(&self, producer: StackId) -> impl Iterator<Item = &ExportedOutput> {
        self.outputs.iter().filter(move |o| o.producer == producer)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StackwireError;

    fn output(name: &str, producer: usize, value: &str) -> ExportedOutput {
        ExportedOutput {
            export_name: name.to_string(),
            value: value.into(),
            producer: StackId::new(producer),
            producer_name: format!("Stack{producer}"),
            path: ConstructPath::parse(&format!("Stack{producer}/{name}")).unwrap(),
            scope: DeploymentScope::default(),
            description: None,
        }
    }

    #[test]
    fn test_register_then_resolve_returns_published_value() {
        let mut registry = ExportRegistry::new();
        registry
            .register(output("BucketName1", 0, "frontend-bucket"))
            .unwrap();

        let resolved = registry.resolve("BucketName1", "Backend").unwrap();
        assert_eq!(resolved.value, OutputValue::from("frontend-bucket"));
        assert_eq!(resolved.producer, StackId::new(0));
    }

    #[test]
    fn test_duplicate_export_names_both_producers() {
        let mut registry = ExportRegistry::new();
        registry.register(output("Shared", 0, "a")).unwrap();

        let err = registry.register(output("Shared", 1, "b")).unwrap_err();
        match err {
            StackwireError::DuplicateExport {
                export_name,
                existing,
                producer,
            } => {
                assert_eq!(export_name, "Shared");
                assert_eq!(existing, "Stack0");
                assert_eq!(producer, "Stack1");
            }
            other => panic!("unexpected error: {other}"),
        }
        // first writer wins
        assert_eq!(
            registry.get("Shared").unwrap().value,
            OutputValue::from("a")
        );
    }

    #[test]
    fn test_resolve_missing_export() {
        let registry = ExportRegistry::new();
        let err = registry.resolve("BucketName1", "Backend").unwrap_err();
        assert!(matches!(err, StackwireError::UnresolvedImport { .. }));
        assert!(err.to_string().contains("BucketName1"));
        assert!(err.to_string().contains("Backend"));
    }

    #[test]
    fn test_sealed_registry_rejects_writes() {
        let mut registry = ExportRegistry::new();
        registry.seal();
        assert_eq!(registry.phase(), RegistryPhase::Sealed);
        assert!(matches!(
            registry.register(output("Late", 0, "x")),
            Err(StackwireError::RegistrySealed { .. })
        ));
    }

    #[test]
    fn test_init_run_clears_previous_state() {
        let mut registry = ExportRegistry::new();
        let first = registry.run();
        registry.register(output("Old", 0, "x")).unwrap();
        registry.seal();

        let second = registry.init_run();
        assert_ne!(first, second);
        assert!(registry.is_empty());
        assert_eq!(registry.phase(), RegistryPhase::Building);
        assert!(registry.register(output("Old", 1, "y")).is_ok());
    }

    #[test]
    fn test_iter_keeps_registration_order() {
        let mut registry = ExportRegistry::new();
        registry.register(output("B", 0, "1")).unwrap();
        registry.register(output("A", 1, "2")).unwrap();
        let names: Vec<_> = registry.iter().map(|o| o.export_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(registry.exports_of(StackId::new(1)).count(), 1);
    }

    #[test]
    fn test_resolved_imports_reject_foreign_run() {
        let run = RunId::next();
        let other = RunId::next();
        let handle = ImportHandle::new(ImportId(0), "X".to_string(), StackId::new(0), run);
        let foreign = ImportHandle::new(ImportId(0), "X".to_string(), StackId::new(0), other);

        let mut values = HashMap::new();
        values.insert(ImportId(0), "value".to_string());
        let resolved = ResolvedImports::new(run, values);

        assert_eq!(resolved.get(&handle).unwrap(), "value");
        assert!(matches!(
            resolved.get(&foreign),
            Err(StackwireError::ImportNotResolved { .. })
        ));
    }
}
