//! Build-phase access to one stack of an assembly

use crate::app::App;
use crate::construct::{ConstructPath, NodeId, NodeKind, OutputNode};
use crate::error::{Result, invalid_construct_name, unknown_resource};
use crate::exports::{ExportedOutput, ImportHandle, OutputValue};
use crate::resource::{LifecyclePolicy, ResourceConfig, ResourceUnit};
use crate::stack::{DeclaredImport, DeploymentScope, Stack, StackContext, StackDefinition, StackId};

/// Mutable view of the stack under construction
///
/// Everything a stack definition adds goes through the builder, so nodes
/// always land inside the stack's own subtree.
pub struct StackBuilder<'a> {
    app: &'a mut App,
    stack: StackId,
}

impl<'a> StackBuilder<'a> {
    pub(crate) fn new(app: &'a mut App, stack: StackId) -> Self {
        Self { app, stack }
    }

    pub fn id(&self) -> StackId {
        self.stack
    }

    pub fn stack(&self) -> &Stack {
        self.app.stack(self.stack)
    }

    pub fn name(&self) -> &str {
        self.stack().name()
    }

    /// Root scope of the stack
    pub fn root(&self) -> NodeId {
        self.stack().node()
    }

    pub fn scope(&self) -> &DeploymentScope {
        self.stack().scope()
    }

    pub fn context(&self) -> &StackContext {
        self.stack().context()
    }

    fn ensure_owned(&self, node: NodeId, name: &str) -> Result<()> {
        if self.app.tree().node(node).stack() == Some(self.stack) {
            Ok(())
        } else {
            Err(invalid_construct_name(
                name,
                format!("parent scope is not part of stack '{}'", self.name()),
            ))
        }
    }

    pub fn add_scope(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.ensure_owned(parent, name)?;
        self.app.tree_mut().add_scope(parent, name)
    }

    /// Return the scope at `relative` below the stack root, creating it if needed
    pub fn ensure_scope(&mut self, relative: &str) -> Result<NodeId> {
        let relative = ConstructPath::parse(relative)?;
        let root = self.root();
        self.app.tree_mut().ensure_scope(root, &relative)
    }

    /// Add a resource with its kind's default lifecycle policy
    pub fn add_resource(
        &mut self,
        parent: NodeId,
        name: &str,
        config: impl Into<ResourceConfig>,
    ) -> Result<NodeId> {
        let config = config.into();
        let lifecycle = config.kind().default_lifecycle();
        self.add_resource_with(parent, name, config, lifecycle)
    }

    pub fn add_resource_with(
        &mut self,
        parent: NodeId,
        name: &str,
        config: impl Into<ResourceConfig>,
        lifecycle: LifecyclePolicy,
    ) -> Result<NodeId> {
        self.ensure_owned(parent, name)?;
        let config = config.into();
        for reference in config.references() {
            self.find_resource(reference)?;
        }
        let scope = self.scope().clone();
        self.app
            .tree_mut()
            .add_resource(parent, name, config, lifecycle, &scope)
    }

    pub fn resource(&self, node: NodeId) -> Option<&ResourceUnit> {
        self.app.tree().get(node).and_then(|n| n.as_resource())
    }

    /// Find a resource by its path relative to the stack root
    pub fn find_resource(&self, relative: &str) -> Result<NodeId> {
        self.app.tree().find_resource(self.root(), relative)
    }

    /// Declare an import of another stack's export
    ///
    /// The returned handle is unresolved; its value becomes readable only
    /// after the whole assembly is synthesized.
    pub fn declare_import(
        &mut self,
        export_name: &str,
        expected_scope: Option<DeploymentScope>,
    ) -> ImportHandle {
        let handle = self.app.issue_import(export_name, self.stack);
        self.app.stack_mut(self.stack).push_import(DeclaredImport {
            handle: handle.clone(),
            expected_scope,
        });
        handle
    }

    /// Handle owned by this stack for the same export
    fn own_handle(&mut self, handle: &ImportHandle) -> ImportHandle {
        if handle.consumer() == self.stack {
            handle.clone()
        } else {
            self.declare_import(handle.export_name(), None)
        }
    }

    /// Feed an imported value into a resource property
    pub fn bind_import(
        &mut self,
        resource: NodeId,
        property: &str,
        handle: &ImportHandle,
    ) -> Result<()> {
        let handle = self.own_handle(handle);
        let name = self.app.tree().node(resource).name().to_string();
        self.ensure_owned(resource, &name)?;
        let scope = self.app.tree().node(resource).path().to_string();
        let unit = self
            .app
            .tree_mut()
            .resource_mut(resource)
            .ok_or_else(|| unknown_resource(scope, name))?;
        unit.bind(property, handle);
        Ok(())
    }

    /// Publish a value under a global export name
    pub fn publish(
        &mut self,
        id: &str,
        export_name: &str,
        value: impl Into<OutputValue>,
    ) -> Result<NodeId> {
        self.publish_described(id, export_name, value, None)
    }

    pub fn publish_described(
        &mut self,
        id: &str,
        export_name: &str,
        value: impl Into<OutputValue>,
        description: Option<&str>,
    ) -> Result<NodeId> {
        let value = match value.into() {
            OutputValue::Import(handle) => OutputValue::Import(self.own_handle(&handle)),
            literal => literal,
        };
        let root = self.root();
        let node = self.app.tree_mut().add_child(
            root,
            id,
            NodeKind::Output(OutputNode {
                export_name: export_name.to_string(),
                description: description.map(str::to_string),
            }),
        )?;
        let stack = self.stack();
        let output = ExportedOutput {
            export_name: export_name.to_string(),
            value,
            producer: self.stack,
            producer_name: stack.name().to_string(),
            path: self.app.tree().node(node).path().clone(),
            scope: stack.scope().clone(),
            description: description.map(str::to_string),
        };
        self.app.registry_mut().register(output)?;
        self.app
            .stack_mut(self.stack)
            .push_export(export_name.to_string());
        Ok(node)
    }

    /// Publish an identifying attribute of a resource
    pub fn publish_attribute(
        &mut self,
        id: &str,
        export_name: &str,
        resource: NodeId,
        attribute: &str,
    ) -> Result<NodeId> {
        let node = self.app.tree().node(resource);
        let value = match node.as_resource() {
            Some(unit) => unit.attribute(attribute)?.to_string(),
            None => {
                return Err(unknown_resource(
                    self.name(),
                    node.path().to_string(),
                ));
            }
        };
        self.publish(id, export_name, value)
    }

    /// Order this stack after another one without importing from it
    pub fn add_dependency(&mut self, stack: &str) {
        self.app
            .stack_mut(self.stack)
            .push_dependency(stack.to_string());
    }

    /// Instantiate a nested stack under `parent`
    ///
    /// Without an explicit context the nested stack inherits this stack's.
    pub fn add_stack(
        &mut self,
        parent: NodeId,
        id: &str,
        context: Option<StackContext>,
        definition: &dyn StackDefinition,
    ) -> Result<StackId> {
        self.ensure_owned(parent, id)?;
        let context = context.unwrap_or_else(|| self.context().clone());
        self.app
            .instantiate(parent, Some(self.stack), id, context, definition)
    }
}
