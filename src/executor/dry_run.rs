//! Provisioner that records calls instead of touching infrastructure

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::error::{Result, provisioning_failed};
use crate::executor::{FinalizedStack, Provisioner};

/// Dry-run provisioner
///
/// Reports each stack's synthesized output values as produced. Stacks named
/// in the failure set fail instead.
#[derive(Debug, Clone, Default)]
pub struct DryRunProvisioner {
    fail: BTreeSet<String>,
    provisioned: Vec<String>,
    destroyed: Vec<String>,
}

impl DryRunProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make provisioning of `stacks` fail
    pub fn failing<S: Into<String>>(stacks: impl IntoIterator<Item = S>) -> Self {
        Self {
            fail: stacks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Stacks provisioned so far, in call order
    pub fn provisioned(&self) -> &[String] {
        &self.provisioned
    }

    /// Stacks destroyed so far, in call order
    pub fn destroyed(&self) -> &[String] {
        &self.destroyed
    }
}

impl Provisioner for DryRunProvisioner {
    fn provision(&mut self, stack: &FinalizedStack<'_>) -> Result<BTreeMap<String, String>> {
        let name = stack.stack.name();
        if self.fail.contains(name) {
            return Err(provisioning_failed(name, "simulated failure"));
        }
        info!(
            stack = name,
            resources = stack.resources.len(),
            imports = stack.imports.len(),
            "dry-run provision"
        );
        self.provisioned.push(name.to_string());
        Ok(stack.outputs.clone())
    }

    fn destroy(&mut self, stack: &FinalizedStack<'_>) -> Result<()> {
        info!(stack = stack.stack.name(), "dry-run destroy");
        self.destroyed.push(stack.stack.name().to_string());
        Ok(())
    }
}
