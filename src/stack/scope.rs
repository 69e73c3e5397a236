//! Deployment scope and stack context

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder used when an account is left to the deployment environment
pub const ACCOUNT_TOKEN: &str = "${AWS::AccountId}";

/// Placeholder used when a region is left to the deployment environment
pub const REGION_TOKEN: &str = "${AWS::Region}";

/// Target account and region of a stack
///
/// A missing component is environment-agnostic and matches any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl DeploymentScope {
    pub fn new(account: Option<&str>, region: Option<&str>) -> Self {
        Self {
            account: account.map(str::to_string),
            region: region.map(str::to_string),
        }
    }

    /// Scope pinned to a region only
    pub fn region(region: &str) -> Self {
        Self::new(None, Some(region))
    }

    /// Whether two scopes can refer to the same deployment target
    pub fn matches(&self, other: &DeploymentScope) -> bool {
        fn component(a: &Option<String>, b: &Option<String>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }
        component(&self.account, &other.account) && component(&self.region, &other.region)
    }

    /// Fill missing components from `defaults`
    pub fn or(&self, defaults: &DeploymentScope) -> DeploymentScope {
        DeploymentScope {
            account: self.account.clone().or_else(|| defaults.account.clone()),
            region: self.region.clone().or_else(|| defaults.region.clone()),
        }
    }

    pub fn account_or_token(&self) -> &str {
        self.account.as_deref().unwrap_or(ACCOUNT_TOKEN)
    }

    pub fn region_or_token(&self) -> &str {
        self.region.as_deref().unwrap_or(REGION_TOKEN)
    }
}

impl fmt::Display for DeploymentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.account.as_deref().unwrap_or("*"),
            self.region.as_deref().unwrap_or("*")
        )
    }
}

/// Per-stack synthesis context
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StackContext {
    pub scope: DeploymentScope,
    /// Allows imports and exports across deployment scopes
    pub cross_region_references: bool,
}

impl StackContext {
    pub fn new(scope: DeploymentScope) -> Self {
        Self {
            scope,
            cross_region_references: false,
        }
    }

    pub fn with_cross_region_references(mut self, enabled: bool) -> Self {
        self.cross_region_references = enabled;
        self
    }
}
