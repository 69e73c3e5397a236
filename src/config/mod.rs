//! Assembly manifest (stackwire.yaml)
//!
//! The manifest declares the stacks of an assembly as data:
//!
//! ```yaml
//! app: express-website
//! context:
//!   account: "111111111111"
//!   region: eu-west-1
//! templates:
//!   certificate:
//!     resources:
//!       - id: Certificate
//!         kind: certificate
//!         properties: { domain_name: example.com }
//!     outputs:
//!       - id: CertificateArn
//!         export: CertificateArn
//!         from: { resource: Certificate, attribute: certificateArn }
//! stacks:
//!   - id: CertificateStack
//!     template: certificate
//!     env: { region: us-east-1 }
//!     cross_region_references: true
//! ```

pub mod pipeline;
pub mod template;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use pipeline::{NotificationConfig, PipelineConfig, SinkKind, StageConfig};
pub use template::{
    AttributeRef, ImportDecl, OutputDecl, ResourceDecl, StackInstanceConfig, TemplateConfig,
    TemplateStack,
};

use crate::app::App;
use crate::error::{
    Result, config_invalid, config_not_found, config_parse_failed, config_read_failed,
    unknown_template,
};
use crate::pipeline::Pipeline;
use crate::stack::DeploymentScope;

/// Default manifest file name
pub const MANIFEST_FILE_NAME: &str = "stackwire.yaml";

/// Environment variable supplying the default account
pub const ACCOUNT_ENV: &str = "STACKWIRE_DEFAULT_ACCOUNT";

/// Environment variable supplying the default region
pub const REGION_ENV: &str = "STACKWIRE_DEFAULT_REGION";

/// Synthesis-wide context defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Applied to every stack that does not opt in itself
    #[serde(default)]
    pub cross_region_references: bool,
}

/// Overrides supplied once per synthesis run, taking precedence over the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    pub account: Option<String>,
    pub region: Option<String>,
    pub cross_region_references: bool,
}

/// Parsed stackwire.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblyManifest {
    pub app: String,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub templates: BTreeMap<String, TemplateConfig>,

    pub stacks: Vec<StackInstanceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineConfig>,
}

impl AssemblyManifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(config_not_found(path.display().to_string()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| config_read_failed(path.display().to_string(), e.to_string()))?;
        let manifest: Self = serde_yaml::from_str(&content)
            .map_err(|e| config_parse_failed(path.display().to_string(), e.to_string()))?;
        manifest.validate()?;
        debug!(
            path = %path.display(),
            templates = manifest.templates.len(),
            stacks = manifest.stacks.len(),
            "loaded assembly manifest"
        );
        Ok(manifest)
    }

    /// Parse and validate a manifest from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Structural checks that do not need a built assembly
    pub fn validate(&self) -> Result<()> {
        if self.app.trim().is_empty() {
            return Err(config_invalid("app name cannot be empty"));
        }
        let referenced = self
            .stacks
            .iter()
            .chain(self.templates.values().flat_map(|t| t.stacks.iter()));
        for instance in referenced {
            if !self.templates.contains_key(&instance.template) {
                return Err(unknown_template(instance.template.as_str()));
            }
        }
        for output in self.templates.values().flat_map(|t| t.outputs.iter()) {
            output.validate()?;
        }
        Ok(())
    }

    /// Default deployment scope after applying overrides
    pub fn default_scope(&self, overrides: &ContextOverrides) -> DeploymentScope {
        DeploymentScope {
            account: overrides
                .account
                .clone()
                .or_else(|| self.context.account.clone()),
            region: overrides
                .region
                .clone()
                .or_else(|| self.context.region.clone()),
        }
    }

    /// Build every top-level stack into a fresh assembly
    pub fn build_app(&self, overrides: &ContextOverrides) -> Result<App> {
        let defaults = self.default_scope(overrides);
        let cross_region = overrides.cross_region_references || self.context.cross_region_references;

        let mut app = App::new(self.app.as_str());
        for instance in &self.stacks {
            let definition = TemplateStack::new(&instance.template, &self.templates)?;
            let mut context = instance.context(&defaults);
            context.cross_region_references |= cross_region;
            app.add_stack(&instance.id, context, &definition)?;
        }
        Ok(app)
    }

    /// Build the configured pipeline, if any
    pub fn pipeline(&self) -> Result<Option<Pipeline>> {
        self.pipeline.as_ref().map(PipelineConfig::build).transpose()
    }
}

#[cfg(test)]
mod tests;
