//! Declarative stack templates
//!
//! A template lists resources, imports, outputs, explicit dependencies and
//! nested stacks. [`TemplateStack`] turns one template into a
//! [`StackDefinition`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Result, config_invalid, unknown_template};
use crate::exports::{ImportHandle, OutputValue};
use crate::resource::{LifecyclePolicy, RemovalPolicy, ResourceConfig, ResourceKind};
use crate::stack::{DeploymentScope, StackBuilder, StackContext, StackDefinition};

/// A named stack blueprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputDecl>,

    /// Stacks nested inside this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<StackInstanceConfig>,

    /// Stacks this one is ordered after without importing from them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDecl {
    /// Path relative to the stack root; intermediate scopes are created
    pub id: String,

    pub kind: ResourceKind,

    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    pub properties: serde_yaml::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal: Option<RemovalPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_delete_contents: Option<bool>,

    /// Property name → local import id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bind: BTreeMap<String, String>,
}

impl ResourceDecl {
    /// Lifecycle from the declaration, falling back to the kind's default
    pub fn lifecycle(&self) -> LifecyclePolicy {
        let default = self.kind.default_lifecycle();
        LifecyclePolicy {
            removal: self.removal.unwrap_or(default.removal),
            auto_delete_contents: self
                .auto_delete_contents
                .unwrap_or(default.auto_delete_contents),
        }
    }
}

/// An import declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportDecl {
    /// Local id other declarations refer to
    pub id: String,

    /// Global export name
    pub export: String,

    /// Scope the producer is expected to be deployed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<DeploymentScope>,
}

/// Reference to a resource attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeRef {
    pub resource: String,
    pub attribute: String,
}

/// An output declaration; exactly one of `value`, `from` and `import` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDecl {
    pub id: String,

    pub export: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<AttributeRef>,

    /// Local import id to re-export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
}

impl OutputDecl {
    pub fn validate(&self) -> Result<()> {
        let sources = [
            self.value.is_some(),
            self.from.is_some(),
            self.import.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if sources != 1 {
            return Err(config_invalid(format!(
                "output '{}' must set exactly one of value, from, import",
                self.id
            )));
        }
        Ok(())
    }
}

/// Instantiation of a template, at the top level or nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackInstanceConfig {
    pub id: String,

    pub template: String,

    /// Target account and region; missing parts come from the context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<DeploymentScope>,

    #[serde(default)]
    pub cross_region_references: bool,
}

impl StackInstanceConfig {
    /// Context of this instance with missing scope parts filled from `defaults`
    pub fn context(&self, defaults: &DeploymentScope) -> StackContext {
        let scope = self
            .env
            .as_ref()
            .map_or_else(|| defaults.clone(), |env| env.or(defaults));
        StackContext::new(scope).with_cross_region_references(self.cross_region_references)
    }
}

/// A template bound to the catalog it can nest templates from
pub struct TemplateStack<'a> {
    kind: String,
    template: &'a TemplateConfig,
    catalog: &'a BTreeMap<String, TemplateConfig>,
    /// Configuration snapshot fingerprinted at construction
    snapshot: serde_json::Value,
}

impl<'a> TemplateStack<'a> {
    pub fn new(name: &str, catalog: &'a BTreeMap<String, TemplateConfig>) -> Result<Self> {
        let template = catalog.get(name).ok_or_else(|| unknown_template(name))?;
        let snapshot = serde_json::to_value(template).map_err(|err| {
            config_invalid(format!("template '{name}' has no JSON configuration snapshot: {err}"))
        })?;
        Ok(Self {
            kind: format!("template:{name}"),
            template,
            catalog,
            snapshot,
        })
    }
}

impl StackDefinition for TemplateStack<'_> {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn config(&self) -> serde_json::Value {
        self.snapshot.clone()
    }

    fn build(&self, stack: &mut StackBuilder<'_>) -> Result<()> {
        let template = self.template;

        let mut imports: HashMap<&str, ImportHandle> = HashMap::new();
        for decl in &template.imports {
            let handle = stack.declare_import(&decl.export, decl.scope.clone());
            if imports.insert(decl.id.as_str(), handle).is_some() {
                return Err(config_invalid(format!(
                    "import id '{}' declared twice in '{}'",
                    decl.id,
                    stack.name()
                )));
            }
        }
        let import = |id: &str| {
            imports
                .get(id)
                .ok_or_else(|| config_invalid(format!("unknown import id '{id}'")))
        };

        for decl in &template.resources {
            let config = ResourceConfig::from_properties(decl.kind, &decl.properties)?;
            let (parent, name) = match decl.id.rsplit_once('/') {
                Some((scope, name)) => (stack.ensure_scope(scope)?, name),
                None => (stack.root(), decl.id.as_str()),
            };
            let node = stack.add_resource_with(parent, name, config, decl.lifecycle())?;
            for (property, import_id) in &decl.bind {
                stack.bind_import(node, property, import(import_id)?)?;
            }
        }

        for nested in &template.stacks {
            let definition = TemplateStack::new(&nested.template, self.catalog)?;
            let mut context = nested.context(stack.scope());
            context.cross_region_references |= stack.context().cross_region_references;
            let root = stack.root();
            stack.add_stack(root, &nested.id, Some(context), &definition)?;
        }

        for decl in &template.outputs {
            decl.validate()?;
            let description = decl.description.as_deref();
            if let Some(from) = &decl.from {
                let resource = stack.find_resource(&from.resource)?;
                let value = stack
                    .resource(resource)
                    .map(|unit| unit.attribute(&from.attribute).map(str::to_string))
                    .transpose()?
                    .unwrap_or_default();
                stack.publish_described(&decl.id, &decl.export, value, description)?;
            } else if let Some(import_id) = &decl.import {
                let value = OutputValue::from(import(import_id)?);
                stack.publish_described(&decl.id, &decl.export, value, description)?;
            } else if let Some(value) = &decl.value {
                stack.publish_described(&decl.id, &decl.export, value.as_str(), description)?;
            }
        }

        for dependency in &template.depends_on {
            stack.add_dependency(dependency);
        }
        Ok(())
    }
}
