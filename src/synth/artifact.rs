//! Serializable synthesis artifacts
//!
//! One template per stack plus an assembly manifest listing the stacks in
//! deployment order. Both are plain JSON documents.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::construct::ConstructPath;
use crate::stack::DeploymentScope;

/// Suffix of per-stack template files
pub const TEMPLATE_SUFFIX: &str = ".template.json";

/// Name of the assembly manifest file
pub const MANIFEST_FILE: &str = "manifest.json";

/// Template of one stack
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackArtifact {
    pub stack: String,
    pub environment: DeploymentScope,
    pub cross_region_references: bool,
    pub resources: Vec<ResourceArtifact>,
    pub outputs: Vec<OutputArtifact>,
    pub imports: Vec<ImportArtifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_stacks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceArtifact {
    pub logical_id: String,
    pub path: ConstructPath,
    #[serde(rename = "type")]
    pub type_name: String,
    pub properties: serde_json::Value,
    pub deletion_policy: String,
    pub auto_delete_contents: bool,
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, BindingArtifact>,
}

/// Resource property fed by an import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingArtifact {
    pub export_name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputArtifact {
    pub logical_id: String,
    pub export_name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportArtifact {
    pub export_name: String,
    pub producer: String,
    pub value: String,
}

/// Assembly manifest
#[derive(Debug, Clone, Serialize)]
pub struct ManifestArtifact {
    pub app: String,
    pub run: String,
    pub order: Vec<String>,
    pub stacks: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub template: String,
    pub environment: DeploymentScope,
    pub dependencies: Vec<String>,
}
