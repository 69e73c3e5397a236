//! Synthesis plan: the resolved, ordered assembly
//!
//! A [`SynthesisPlan`] is the only place import values can be read from.
//! It carries the construct tree, the stacks, the sealed export registry, the
//! dependency graph and the deployment order of one run, and renders
//! per-stack templates for an external deployment executor.

pub mod artifact;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

pub use artifact::{
    BindingArtifact, ImportArtifact, MANIFEST_FILE, ManifestArtifact, ManifestEntry,
    OutputArtifact, ResourceArtifact, StackArtifact, TEMPLATE_SUFFIX,
};

use crate::construct::ConstructTree;
use crate::error::{Result, unknown_stack};
use crate::exports::{ExportRegistry, ImportHandle, ResolvedImports, RunId};
use crate::hash::short_hash;
use crate::resolver::{DeploymentGraph, Resolution, check_order};
use crate::resource::ResourceUnit;
use crate::stack::{Stack, StackId};

/// Resolved assembly of one synthesis run
#[derive(Debug)]
pub struct SynthesisPlan {
    app: String,
    tree: ConstructTree,
    stacks: Vec<Stack>,
    registry: ExportRegistry,
    graph: DeploymentGraph,
    order: Vec<StackId>,
    imports: ResolvedImports,
    export_values: BTreeMap<String, String>,
    /// Template file stem per stack, indexed by `StackId`
    template_stems: Vec<String>,
}

impl SynthesisPlan {
    pub(crate) fn new(
        app: String,
        tree: ConstructTree,
        stacks: Vec<Stack>,
        registry: ExportRegistry,
        resolution: Resolution,
    ) -> Self {
        let template_stems = template_stems(&stacks);
        Self {
            template_stems,
            app,
            tree,
            stacks,
            registry,
            graph: resolution.graph,
            order: resolution.order,
            imports: resolution.imports,
            export_values: resolution.export_values,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app
    }

    pub fn run(&self) -> RunId {
        self.registry.run()
    }

    pub fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &DeploymentGraph {
        &self.graph
    }

    /// Stacks in construction order
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, id: StackId) -> &Stack {
        &self.stacks[id.index()]
    }

    pub fn find_stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    /// Look up a stack by name, failing with `UnknownStack`
    pub fn require_stack(&self, name: &str) -> Result<&Stack> {
        self.find_stack(name).ok_or_else(|| unknown_stack(name))
    }

    /// Deployment order, producers first
    pub fn order(&self) -> &[StackId] {
        &self.order
    }

    pub fn ordered_stacks(&self) -> impl Iterator<Item = &Stack> {
        self.order.iter().map(|&id| self.stack(id))
    }

    pub fn ordered_names(&self) -> Vec<&str> {
        self.ordered_stacks().map(Stack::name).collect()
    }

    /// Teardown order: consumers before the producers they import from
    pub fn teardown_order(&self) -> Vec<StackId> {
        self.order.iter().rev().copied().collect()
    }

    /// Verify an externally proposed order against the dependency graph
    pub fn check_order(&self, order: &[StackId]) -> Result<()> {
        check_order(&self.graph, order)
    }

    pub fn imports(&self) -> &ResolvedImports {
        &self.imports
    }

    /// Resolved value of an import handle issued in this run
    pub fn value_of(&self, handle: &ImportHandle) -> Result<&str> {
        self.imports.get(handle)
    }

    /// Final value published under `export_name`
    pub fn export_value(&self, export_name: &str) -> Option<&str> {
        self.export_values.get(export_name).map(String::as_str)
    }

    pub fn export_values(&self) -> &BTreeMap<String, String> {
        &self.export_values
    }

    /// Resource units owned by a stack, excluding nested stacks
    pub fn resources(&self, id: StackId) -> Vec<&ResourceUnit> {
        self.tree.stack_resources(self.stack(id).node())
    }

    /// Stacks nested anywhere below `id`
    pub fn nested_stacks(&self, id: StackId) -> Vec<StackId> {
        self.stacks
            .iter()
            .filter(|s| self.is_descendant(s.id(), id))
            .map(Stack::id)
            .collect()
    }

    fn is_descendant(&self, stack: StackId, ancestor: StackId) -> bool {
        let mut current = self.stack(stack).parent();
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.stack(parent).parent();
        }
        false
    }

    /// Import values of a stack keyed by export name
    pub fn stack_imports(&self, id: StackId) -> Result<BTreeMap<String, String>> {
        let mut values = BTreeMap::new();
        for import in self.stack(id).imports() {
            let value = self.value_of(&import.handle)?;
            values.insert(import.handle.export_name().to_string(), value.to_string());
        }
        Ok(values)
    }

    /// Export values published by a stack keyed by export name
    pub fn stack_outputs(&self, id: StackId) -> BTreeMap<String, String> {
        self.stack(id)
            .exports()
            .iter()
            .filter_map(|name| {
                self.export_value(name)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect()
    }

    /// Render the template of one stack
    pub fn artifact(&self, id: StackId) -> Result<StackArtifact> {
        let stack = self.stack(id);

        let mut resources = Vec::new();
        for unit in self.resources(id) {
            let mut bindings = BTreeMap::new();
            for (property, handle) in unit.bindings() {
                bindings.insert(
                    property.clone(),
                    BindingArtifact {
                        export_name: handle.export_name().to_string(),
                        value: self.value_of(handle)?.to_string(),
                    },
                );
            }
            resources.push(ResourceArtifact {
                logical_id: unit.logical_id(),
                path: unit.path().clone(),
                type_name: unit.kind().type_name().to_string(),
                properties: serde_json::to_value(unit.config())?,
                deletion_policy: unit.lifecycle().deletion_policy().to_string(),
                auto_delete_contents: unit.lifecycle().auto_delete_contents,
                attributes: unit.attributes().clone(),
                bindings,
            });
        }

        let outputs = self
            .registry
            .exports_of(id)
            .map(|output| OutputArtifact {
                logical_id: output.path.logical_id(),
                export_name: output.export_name.clone(),
                value: self
                    .export_value(&output.export_name)
                    .unwrap_or_default()
                    .to_string(),
                description: output.description.clone(),
            })
            .collect();

        let mut imports = Vec::new();
        for import in stack.imports() {
            let export_name = import.handle.export_name();
            let producer = self
                .registry
                .get(export_name)
                .map(|o| o.producer_name.clone())
                .unwrap_or_default();
            imports.push(ImportArtifact {
                export_name: export_name.to_string(),
                producer,
                value: self.value_of(&import.handle)?.to_string(),
            });
        }

        Ok(StackArtifact {
            stack: stack.name().to_string(),
            environment: stack.scope().clone(),
            cross_region_references: stack.cross_region_references(),
            resources,
            outputs,
            imports,
            dependencies: self.dependency_names(id),
            nested_stacks: self
                .nested_stacks(id)
                .into_iter()
                .map(|nested| self.stack(nested).name().to_string())
                .collect(),
        })
    }

    fn dependency_names(&self, id: StackId) -> Vec<String> {
        self.graph
            .producers_of(id)
            .iter()
            .map(|&p| self.stack(p).name().to_string())
            .collect()
    }

    /// Template file name of a stack
    ///
    /// The dashed stack path, unless another stack dashes to the same name
    /// (`A/B` and `A-B`); colliding stacks then get a short path digest.
    pub fn template_file(&self, id: StackId) -> String {
        format!("{}{}", self.template_stems[id.index()], TEMPLATE_SUFFIX)
    }

    /// Render the assembly manifest
    pub fn manifest(&self) -> ManifestArtifact {
        ManifestArtifact {
            app: self.app.clone(),
            run: self.run().to_string(),
            order: self.ordered_names().into_iter().map(str::to_string).collect(),
            stacks: self
                .ordered_stacks()
                .map(|stack| ManifestEntry {
                    name: stack.name().to_string(),
                    template: self.template_file(stack.id()),
                    environment: stack.scope().clone(),
                    dependencies: self.dependency_names(stack.id()),
                })
                .collect(),
        }
    }

    /// Write every template and the manifest into `dir`
    ///
    /// Returns the written paths, templates in deployment order, manifest last.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        for &id in &self.order {
            let path = dir.join(self.template_file(id));
            let json = serde_json::to_string_pretty(&self.artifact(id)?)?;
            fs::write(&path, json)?;
            written.push(path);
        }

        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(&self.manifest())?)?;
        written.push(path);

        info!(
            dir = %dir.display(),
            files = written.len(),
            "wrote synthesis artifacts"
        );
        Ok(written)
    }
}

fn template_stems(stacks: &[Stack]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for stack in stacks {
        *counts.entry(stack.path().dashed()).or_default() += 1;
    }
    stacks
        .iter()
        .map(|stack| {
            let dashed = stack.path().dashed();
            if counts[&dashed] > 1 {
                format!("{}-{}", dashed, short_hash(stack.path().components()))
            } else {
                dashed
            }
        })
        .collect()
}
