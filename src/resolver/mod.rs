//! Cross-stack reference resolution
//!
//! Runs once per synthesis, after every stack is built and the export
//! registry is sealed:
//!
//! 1. resolve each declared import through the registry and build the
//!    consumer → producer graph ([`graph`])
//! 2. reject dependency cycles ([`validation`])
//! 3. compute the producers-first deployment order ([`sort`])
//! 4. compute the value behind every export, following re-exports, and
//!    fill the per-run import table

pub mod graph;
pub mod sort;
pub mod validation;

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

pub use graph::{DeploymentGraph, Edge, EdgeReason, build_dependency_graph, check_order};
pub use sort::topological_sort;
pub use validation::{check_cycle, check_scope, detect_cycles};

use crate::error::Result;
use crate::exports::{ExportRegistry, OutputValue, ResolvedImports};
use crate::stack::{Stack, StackId};

/// Outcome of resolving an assembly
#[derive(Debug, Clone)]
pub struct Resolution {
    pub graph: DeploymentGraph,
    pub order: Vec<StackId>,
    pub imports: ResolvedImports,
    /// Final value of every export
    pub export_values: BTreeMap<String, String>,
}

/// Resolve every import of `stacks` against a sealed `registry`
///
/// # Errors
///
/// `UnresolvedImport`, `CrossRegionReference`, `UnknownStack` and
/// `CyclicStackDependency`, the latter also for self-referential re-exports.
pub fn resolve(stacks: &[Stack], registry: &ExportRegistry) -> Result<Resolution> {
    let graph = build_dependency_graph(stacks, registry)?;
    detect_cycles(&graph)?;
    let order = topological_sort(&graph)?;

    let mut values = ValueResolver::new(registry);
    let mut export_values = BTreeMap::new();
    for output in registry.iter() {
        let value = values.value_of(&output.export_name, &output.producer_name)?;
        export_values.insert(output.export_name.clone(), value);
    }

    let mut imports = HashMap::new();
    for stack in stacks {
        for import in stack.imports() {
            let value = values.value_of(import.handle.export_name(), stack.name())?;
            imports.insert(import.handle.id(), value);
        }
    }
    debug!(
        imports = imports.len(),
        exports = export_values.len(),
        "resolved import values"
    );

    Ok(Resolution {
        graph,
        order,
        imports: ResolvedImports::new(registry.run(), imports),
        export_values,
    })
}

/// Memoized export value lookup that follows re-exports
struct ValueResolver<'a> {
    registry: &'a ExportRegistry,
    memo: HashMap<String, String>,
    chain: Vec<String>,
}

impl<'a> ValueResolver<'a> {
    fn new(registry: &'a ExportRegistry) -> Self {
        Self {
            registry,
            memo: HashMap::new(),
            chain: Vec::new(),
        }
    }

    fn value_of(&mut self, export_name: &str, consumer: &str) -> Result<String> {
        if let Some(value) = self.memo.get(export_name) {
            return Ok(value.clone());
        }
        check_cycle(export_name, &self.chain)?;

        let registry = self.registry;
        let output = registry.resolve(export_name, consumer)?;
        let value = match &output.value {
            OutputValue::Literal(value) => value.clone(),
            OutputValue::Import(handle) => {
                self.chain.push(export_name.to_string());
                let value = self.value_of(handle.export_name(), &output.producer_name);
                self.chain.pop();
                value?
            }
        };
        self.memo.insert(export_name.to_string(), value.clone());
        Ok(value)
    }
}
