//! Stacks: deployable units of infrastructure
//!
//! A stack owns one subtree of the construct tree, carries its deployment
//! context and records the imports it declared. Stacks are defined through
//! the [`StackDefinition`] trait and populated through a [`StackBuilder`]
//! handed out by the [`App`](crate::app::App) while the stack is built.

pub mod builder;
pub mod scope;

use std::fmt;

use serde::Serialize;

pub use builder::StackBuilder;
pub use scope::{ACCOUNT_TOKEN, DeploymentScope, REGION_TOKEN, StackContext};

use crate::construct::{ConstructPath, NodeId};
use crate::error::Result;
use crate::exports::ImportHandle;

/// Index of a stack within an assembly, in construction order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StackId(usize);

impl StackId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An import declared by a stack
#[derive(Debug, Clone)]
pub struct DeclaredImport {
    pub handle: ImportHandle,
    /// Scope the consumer expects the producer to live in
    pub expected_scope: Option<DeploymentScope>,
}

/// Blueprint of a stack
///
/// `kind` and `config` identify the definition; instantiating the same
/// definition with the same id and configuration inside its own construction
/// is rejected as cyclic.
pub trait StackDefinition {
    /// Stable name of this definition
    fn kind(&self) -> &str;

    /// Configuration snapshot fingerprinted into the construction key
    fn config(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Populate the stack
    fn build(&self, stack: &mut StackBuilder<'_>) -> Result<()>;
}

/// A deployable unit
#[derive(Debug, Clone)]
pub struct Stack {
    id: StackId,
    name: String,
    path: ConstructPath,
    node: NodeId,
    context: StackContext,
    parent: Option<StackId>,
    kind: String,
    config_hash: String,
    imports: Vec<DeclaredImport>,
    exports: Vec<String>,
    dependencies: Vec<String>,
}

impl Stack {
    pub(crate) fn new(
        id: StackId,
        path: ConstructPath,
        node: NodeId,
        context: StackContext,
        parent: Option<StackId>,
        kind: String,
        config_hash: String,
    ) -> Self {
        Self {
            id,
            name: path.to_string(),
            path,
            node,
            context,
            parent,
            kind,
            config_hash,
            imports: Vec::new(),
            exports: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn id(&self) -> StackId {
        self.id
    }

    /// Path-qualified name, unique within the assembly
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &ConstructPath {
        &self.path
    }

    /// Root node of the stack's subtree
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn context(&self) -> &StackContext {
        &self.context
    }

    pub fn scope(&self) -> &DeploymentScope {
        &self.context.scope
    }

    pub fn cross_region_references(&self) -> bool {
        self.context.cross_region_references
    }

    /// Enclosing stack for nested stacks
    pub fn parent(&self) -> Option<StackId> {
        self.parent
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn imports(&self) -> &[DeclaredImport] {
        &self.imports
    }

    /// Export names published by this stack, in publish order
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// Names of stacks this stack explicitly depends on
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn push_import(&mut self, import: DeclaredImport) {
        self.imports.push(import);
    }

    pub(crate) fn push_export(&mut self, export_name: String) {
        self.exports.push(export_name);
    }

    pub(crate) fn push_dependency(&mut self, stack: String) {
        if !self.dependencies.contains(&stack) {
            self.dependencies.push(stack);
        }
    }
}
