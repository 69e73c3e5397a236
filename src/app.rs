//! The assembly: every stack of one synthesis run
//!
//! An [`App`] owns the construct tree, the stacks and the export registry of
//! one run. Stacks are added through [`App::add_stack`]; [`App::synth`]
//! seals the registry, resolves every import and hands back the plan.
//!
//! Nested construction is reentrant: a stack definition may instantiate
//! further stacks below its own root. Every frame under construction carries
//! a construction key (local id, definition kind, configuration fingerprint);
//! entering a frame whose key is already on the construction stack would
//! never terminate and fails with `CyclicConstruction` instead.

use std::iter;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::construct::{ConstructPath, ConstructTree, NodeId, NodeKind};
use crate::error::{Result, StackwireError, cyclic_construction};
use crate::exports::{ExportRegistry, ImportHandle, ImportId};
use crate::hash::{display_hash, hash_config};
use crate::resolver;
use crate::stack::{Stack, StackBuilder, StackContext, StackDefinition, StackId};
use crate::synth::SynthesisPlan;

/// Upper bound on stack nesting
pub const MAX_NESTING_DEPTH: usize = 32;

/// Identity of a stack construction frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructionKey {
    pub id: String,
    pub kind: String,
    pub config_hash: String,
}

#[derive(Debug)]
struct ConstructionFrame {
    key: ConstructionKey,
    path: ConstructPath,
}

/// A set of stacks synthesized together
///
/// An assembly whose construction failed is unusable: its export registry
/// has been cleared, and every later [`App::add_stack`] or [`App::synth`]
/// returns the original construction error.
#[derive(Debug)]
pub struct App {
    name: String,
    tree: ConstructTree,
    stacks: Vec<Stack>,
    registry: ExportRegistry,
    building: Vec<ConstructionFrame>,
    next_import: usize,
    failure: Option<StackwireError>,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        let mut registry = ExportRegistry::new();
        registry.init_run();
        Self {
            name: name.into(),
            tree: ConstructTree::new(),
            stacks: Vec::new(),
            registry,
            building: Vec::new(),
            next_import: 0,
            failure: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut ConstructTree {
        &mut self.tree
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ExportRegistry {
        &mut self.registry
    }

    /// Stacks in construction order
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, id: StackId) -> &Stack {
        &self.stacks[id.index()]
    }

    pub(crate) fn stack_mut(&mut self, id: StackId) -> &mut Stack {
        &mut self.stacks[id.index()]
    }

    pub fn find_stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    /// The construction error that made this assembly unusable, if any
    pub fn failure(&self) -> Option<&StackwireError> {
        self.failure.as_ref()
    }

    /// Build a top-level stack named `id`
    pub fn add_stack(
        &mut self,
        id: &str,
        context: StackContext,
        definition: &dyn StackDefinition,
    ) -> Result<StackId> {
        let root = self.tree.root();
        self.instantiate(root, None, id, context, definition)
            .inspect_err(|err| warn!(stack = id, error = %err, "stack construction failed"))
    }

    fn fail(&mut self, err: &StackwireError) {
        if self.failure.is_none() {
            self.failure = Some(err.clone());
            self.registry.clear();
        }
    }

    pub(crate) fn issue_import(&mut self, export_name: &str, consumer: StackId) -> ImportHandle {
        let id = ImportId(self.next_import);
        self.next_import += 1;
        ImportHandle::new(id, export_name.to_string(), consumer, self.registry.run())
    }

    pub(crate) fn instantiate(
        &mut self,
        parent: NodeId,
        parent_stack: Option<StackId>,
        id: &str,
        context: StackContext,
        definition: &dyn StackDefinition,
    ) -> Result<StackId> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.construct(parent, parent_stack, id, context, definition)
            .inspect_err(|err| self.fail(err))
    }

    fn construct(
        &mut self,
        parent: NodeId,
        parent_stack: Option<StackId>,
        id: &str,
        context: StackContext,
        definition: &dyn StackDefinition,
    ) -> Result<StackId> {
        let kind = definition.kind().to_string();
        let config_hash = hash_config(
            &kind,
            &json!({ "config": definition.config(), "context": context }),
        )?;
        let key = ConstructionKey {
            id: id.to_string(),
            kind,
            config_hash,
        };
        let path = self.tree.node(parent).path().child(id)?;

        if self.building.len() >= MAX_NESTING_DEPTH
            || self.building.iter().any(|frame| frame.key == key)
        {
            let chain = self
                .building
                .iter()
                .map(|frame| frame.path.to_string())
                .chain(iter::once(path.to_string()))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(cyclic_construction(chain));
        }

        let stack_id = StackId::new(self.stacks.len());
        let node = self.tree.add_child(parent, id, NodeKind::Stack(stack_id))?;
        debug!(
            stack = %path,
            kind = %key.kind,
            config = display_hash(&key.config_hash),
            scope = %context.scope,
            "building stack"
        );
        self.stacks.push(Stack::new(
            stack_id,
            path.clone(),
            node,
            context,
            parent_stack,
            key.kind.clone(),
            key.config_hash.clone(),
        ));

        self.building.push(ConstructionFrame { key, path });
        let built = definition.build(&mut StackBuilder::new(self, stack_id));
        self.building.pop();
        built?;

        let stack = self.stack(stack_id);
        info!(
            stack = stack.name(),
            imports = stack.imports().len(),
            exports = stack.exports().len(),
            "built stack"
        );
        Ok(stack_id)
    }

    /// Seal the registry, resolve every import and compute the deployment order
    ///
    /// Fails atomically: on error the registry is cleared and no plan exists.
    /// An assembly whose construction failed yields that construction error.
    pub fn synth(mut self) -> Result<SynthesisPlan> {
        if let Some(err) = self.failure.take() {
            warn!(app = %self.name, error = %err, "assembly construction failed; no plan");
            return Err(err);
        }
        self.registry.seal();
        info!(
            app = %self.name,
            stacks = self.stacks.len(),
            exports = self.registry.len(),
            "synthesizing assembly"
        );
        match resolver::resolve(&self.stacks, &self.registry) {
            Ok(resolution) => Ok(SynthesisPlan::new(
                self.name,
                self.tree,
                self.stacks,
                self.registry,
                resolution,
            )),
            Err(err) => {
                self.registry.clear();
                warn!(app = %self.name, error = %err, "synthesis failed");
                Err(err)
            }
        }
    }
}
