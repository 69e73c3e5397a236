//! Construct tree: hierarchical ownership of scopes, resources, outputs and stacks
//!
//! The tree is an arena of nodes indexed both by [`NodeId`] and by
//! [`ConstructPath`]. Children keep their insertion order, which later serves
//! as the tie-break for deterministic synthesis.
//!
//! ## Structure
//!
//! ```text
//! <root>
//!  ├── Frontend                 (stack boundary)
//!  │    ├── SiteBucket          (resource)
//!  │    └── BucketName          (output)
//!  └── Backend                  (stack boundary)
//!       ├── BackendLambda       (resource)
//!       └── FrontendStack       (nested stack boundary)
//! ```

pub mod path;

use std::collections::HashMap;

use serde::Serialize;

pub use path::{ConstructPath, PATH_SEPARATOR, validate_name};

use crate::error::{Result, name_collision, unknown_resource};
use crate::resource::{LifecyclePolicy, ResourceConfig, ResourceUnit};
use crate::stack::{DeploymentScope, StackId};

/// Index of a node in the construct arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An output construct publishing a value under a global export name
#[derive(Debug, Clone, Serialize)]
pub struct OutputNode {
    pub export_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What a node in the tree represents
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The unnamed root of the tree
    Root,
    /// A grouping scope with no infrastructure of its own
    Scope,
    /// A resource unit
    Resource(Box<ResourceUnit>),
    /// An exported output
    Output(OutputNode),
    /// The root scope of a stack
    Stack(StackId),
}

/// A node in the construct tree
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    path: ConstructPath,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    /// Stack owning this node; for stack boundaries, the stack itself
    stack: Option<StackId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn path(&self) -> &ConstructPath {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn stack(&self) -> Option<StackId> {
        self.stack
    }

    pub fn as_resource(&self) -> Option<&ResourceUnit> {
        match &self.kind {
            NodeKind::Resource(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_output(&self) -> Option<&OutputNode> {
        match &self.kind {
            NodeKind::Output(output) => Some(output),
            _ => None,
        }
    }

    pub fn as_stack(&self) -> Option<StackId> {
        match self.kind {
            NodeKind::Stack(stack) => Some(stack),
            _ => None,
        }
    }
}

/// Arena holding every construct of an assembly
#[derive(Debug, Clone)]
pub struct ConstructTree {
    nodes: Vec<Node>,
    by_path: HashMap<ConstructPath, NodeId>,
}

impl Default for ConstructTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructTree {
    /// Create a tree holding only the root node
    pub fn new() -> Self {
        let root = Node {
            id: NodeId(0),
            path: ConstructPath::root(),
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Root,
            stack: None,
        };
        let mut by_path = HashMap::new();
        by_path.insert(ConstructPath::root(), NodeId(0));
        Self {
            nodes: vec![root],
            by_path,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn find(&self, path: &ConstructPath) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Path under `parent` for a new child, failing on sibling name collisions
    fn child_path(&self, parent: NodeId, name: &str) -> Result<ConstructPath> {
        let parent_path = &self.nodes[parent.0].path;
        let path = parent_path.child(name)?;
        if self.by_path.contains_key(&path) {
            return Err(name_collision(parent_path.to_string(), name));
        }
        Ok(path)
    }

    fn insert(&mut self, parent: NodeId, path: ConstructPath, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let stack = match kind {
            NodeKind::Stack(stack) => Some(stack),
            _ => self.nodes[parent.0].stack,
        };
        self.by_path.insert(path.clone(), id);
        self.nodes.push(Node {
            id,
            path,
            parent: Some(parent),
            children: Vec::new(),
            kind,
            stack,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add a child node under `parent`
    ///
    /// Fails with `NameCollision` when `parent` already has a child named `name`.
    pub fn add_child(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId> {
        let path = self.child_path(parent, name)?;
        Ok(self.insert(parent, path, kind))
    }

    pub fn add_scope(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add_child(parent, name, NodeKind::Scope)
    }

    /// Return the scope at `relative` below `parent`, creating missing scopes
    pub fn ensure_scope(&mut self, parent: NodeId, relative: &ConstructPath) -> Result<NodeId> {
        let mut current = parent;
        for name in relative.components() {
            let path = self.nodes[current.0].path.child(name)?;
            current = match self.by_path.get(&path) {
                Some(&existing) if matches!(self.nodes[existing.0].kind, NodeKind::Scope) => existing,
                Some(_) => {
                    return Err(name_collision(
                        self.nodes[current.0].path.to_string(),
                        name.as_str(),
                    ));
                }
                None => self.insert(current, path, NodeKind::Scope),
            };
        }
        Ok(current)
    }

    /// Create a resource unit under `parent`
    ///
    /// Fails with `NameCollision` when the name is taken, or with
    /// `InconsistentLifecyclePolicy` when the lifecycle policy is invalid.
    pub fn add_resource(
        &mut self,
        parent: NodeId,
        name: &str,
        config: ResourceConfig,
        lifecycle: LifecyclePolicy,
        scope: &DeploymentScope,
    ) -> Result<NodeId> {
        let path = self.child_path(parent, name)?;
        let unit = ResourceUnit::new(path.clone(), config, lifecycle, scope)?;
        Ok(self.insert(parent, path, NodeKind::Resource(Box::new(unit))))
    }

    pub(crate) fn resource_mut(&mut self, id: NodeId) -> Option<&mut ResourceUnit> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Resource(unit) => Some(unit),
            _ => None,
        }
    }

    /// Find a resource by a path relative to `scope`
    pub fn find_resource(&self, scope: NodeId, relative: &str) -> Result<NodeId> {
        let scope_path = &self.nodes[scope.0].path;
        let path = ConstructPath::parse(relative).map(|rel| scope_path.join(&rel))?;
        self.find(&path)
            .filter(|id| self.nodes[id.0].as_resource().is_some())
            .ok_or_else(|| unknown_resource(scope_path.to_string(), relative))
    }

    /// Depth-first pre-order walk from `start`, children in insertion order
    pub fn walk(&self, start: NodeId) -> Vec<NodeId> {
        self.walk_filtered(start, |_| true)
    }

    /// Nodes owned by the stack rooted at `stack_root`, excluding nested stacks
    pub fn stack_nodes(&self, stack_root: NodeId) -> Vec<NodeId> {
        let owner = self.nodes[stack_root.0].stack;
        self.walk_filtered(stack_root, |node| node.stack == owner)
    }

    /// Resource units owned by the stack rooted at `stack_root`, in walk order
    pub fn stack_resources(&self, stack_root: NodeId) -> Vec<&ResourceUnit> {
        self.stack_nodes(stack_root)
            .into_iter()
            .filter_map(|id| self.nodes[id.0].as_resource())
            .collect()
    }

    /// Walk that does not descend into nodes rejected by `descend`
    fn walk_filtered(&self, start: NodeId, descend: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut pending = vec![start];
        while let Some(id) = pending.pop() {
            let node = &self.nodes[id.0];
            if id != start && !descend(node) {
                continue;
            }
            result.push(id);
            pending.extend(node.children.iter().rev().copied());
        }
        result
    }
}

#[cfg(test)]
mod tests;
