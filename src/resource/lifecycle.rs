//! Lifecycle (removal) policy of a resource unit

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, inconsistent_lifecycle};

/// What happens to a unit's infrastructure when its stack is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Keep the infrastructure after the stack is deleted
    Retain,
    /// Delete the infrastructure together with the stack
    Destroy,
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalPolicy::Retain => write!(f, "retain"),
            RemovalPolicy::Destroy => write!(f, "destroy"),
        }
    }
}

/// Lifecycle intent recorded on a unit
///
/// The unit only records the intent; the deployment executor honors it at
/// teardown time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub removal: RemovalPolicy,
    /// Empty the unit's contents before deleting it
    pub auto_delete_contents: bool,
}

impl LifecyclePolicy {
    pub fn retain() -> Self {
        Self {
            removal: RemovalPolicy::Retain,
            auto_delete_contents: false,
        }
    }

    pub fn destroy() -> Self {
        Self {
            removal: RemovalPolicy::Destroy,
            auto_delete_contents: false,
        }
    }

    pub fn destroy_with_contents() -> Self {
        Self {
            removal: RemovalPolicy::Destroy,
            auto_delete_contents: true,
        }
    }

    /// Check the policy is self-consistent for the unit at `path`
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.auto_delete_contents && self.removal == RemovalPolicy::Retain {
            return Err(inconsistent_lifecycle(
                path,
                "auto_delete_contents cannot be combined with removal policy 'retain'",
            ));
        }
        Ok(())
    }

    /// Deletion policy name as written into stack templates
    pub fn deletion_policy(&self) -> &'static str {
        match self.removal {
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Destroy => "Delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackwireError;

    #[test]
    fn test_retain_with_auto_delete_rejected() {
        let policy = LifecyclePolicy {
            removal: RemovalPolicy::Retain,
            auto_delete_contents: true,
        };
        assert!(matches!(
            policy.validate("App/Bucket"),
            Err(StackwireError::InconsistentLifecyclePolicy { .. })
        ));
    }

    #[test]
    fn test_destroy_with_auto_delete_accepted() {
        assert!(LifecyclePolicy::destroy_with_contents().validate("App/Bucket").is_ok());
        assert!(LifecyclePolicy::retain().validate("App/Bucket").is_ok());
    }

    #[test]
    fn test_deletion_policy_names() {
        assert_eq!(LifecyclePolicy::retain().deletion_policy(), "Retain");
        assert_eq!(LifecyclePolicy::destroy().deletion_policy(), "Delete");
    }
}
