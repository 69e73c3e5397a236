//! Resource units: the smallest composable nodes of a stack
//!
//! A **resource unit** wraps one piece of managed infrastructure state: its
//! kind-specific configuration, its lifecycle policy and the identifying
//! attributes (bucket name, function ARN, ...) other constructs may publish.

pub mod config;
pub mod lifecycle;

use std::collections::BTreeMap;

use serde::Serialize;

pub use config::{
    BucketConfig, BucketDeploymentConfig, CertificateConfig, CertificateValidation,
    DistributionConfig, FunctionConfig, PolicyStatement, PriceClass, ResourceConfig,
    ResourceKind, Subscription, TopicConfig, ViewerProtocolPolicy,
};
pub use lifecycle::{LifecyclePolicy, RemovalPolicy};

use crate::construct::ConstructPath;
use crate::error::{Result, unknown_attribute};
use crate::exports::ImportHandle;
use crate::hash::short_hash;
use crate::stack::DeploymentScope;

/// Maximum length of generated physical names
const MAX_PHYSICAL_NAME_LEN: usize = 63;

/// One piece of managed infrastructure state
#[derive(Debug, Clone, Serialize)]
pub struct ResourceUnit {
    path: ConstructPath,
    config: ResourceConfig,
    lifecycle: LifecyclePolicy,
    attributes: BTreeMap<String, String>,
    /// Properties whose value comes from a cross-stack import
    bindings: BTreeMap<String, ImportHandle>,
}

impl ResourceUnit {
    /// Create a unit at `path`, validating its lifecycle policy
    pub(crate) fn new(
        path: ConstructPath,
        config: ResourceConfig,
        lifecycle: LifecyclePolicy,
        scope: &DeploymentScope,
    ) -> Result<Self> {
        lifecycle.validate(&path.to_string())?;
        let attributes = derive_attributes(&path, &config, scope);
        Ok(Self {
            path,
            config,
            lifecycle,
            attributes,
            bindings: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn path(&self) -> &ConstructPath {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.config.kind()
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> LifecyclePolicy {
        self.lifecycle
    }

    pub fn logical_id(&self) -> String {
        self.path.logical_id()
    }

    /// Look up an identifying attribute
    pub fn attribute(&self, name: &str) -> Result<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| unknown_attribute(self.path.to_string(), name))
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn bindings(&self) -> &BTreeMap<String, ImportHandle> {
        &self.bindings
    }

    pub(crate) fn bind(&mut self, property: impl Into<String>, handle: ImportHandle) {
        self.bindings.insert(property.into(), handle);
    }
}

/// Generate a deterministic physical name from a construct path
///
/// ```text
/// Frontend/SiteBucket → frontend-sitebucket-1a2b3c4d
/// ```
pub fn generated_name(path: &ConstructPath) -> String {
    let base: String = path
        .components()
        .iter()
        .map(|part| {
            part.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let suffix = short_hash(path.components()).to_ascii_lowercase();
    let budget = MAX_PHYSICAL_NAME_LEN - suffix.len() - 1;
    let base = if base.len() > budget { &base[..budget] } else { &base };
    format!("{base}-{suffix}")
}

fn derive_attributes(
    path: &ConstructPath,
    config: &ResourceConfig,
    scope: &DeploymentScope,
) -> BTreeMap<String, String> {
    let region = scope.region_or_token();
    let account = scope.account_or_token();
    let mut attributes = BTreeMap::new();

    match config {
        ResourceConfig::Bucket(cfg) => {
            let name = cfg.bucket_name.clone().unwrap_or_else(|| generated_name(path));
            attributes.insert("bucketArn".to_string(), format!("arn:aws:s3:::{name}"));
            attributes.insert(
                "bucketDomainName".to_string(),
                format!("{name}.s3.amazonaws.com"),
            );
            attributes.insert("bucketName".to_string(), name);
        }
        ResourceConfig::Function(cfg) => {
            let name = cfg
                .function_name
                .clone()
                .unwrap_or_else(|| generated_name(path));
            attributes.insert(
                "functionArn".to_string(),
                format!("arn:aws:lambda:{region}:{account}:function:{name}"),
            );
            attributes.insert("functionName".to_string(), name);
        }
        ResourceConfig::Distribution(_) => {
            let id = format!("E{}", short_hash(path.components()));
            attributes.insert(
                "domainName".to_string(),
                format!("{}.cloudfront.net", id.to_ascii_lowercase()),
            );
            attributes.insert("distributionId".to_string(), id);
        }
        ResourceConfig::Certificate(_) => {
            let id = short_hash(path.components()).to_ascii_lowercase();
            attributes.insert(
                "certificateArn".to_string(),
                format!("arn:aws:acm:{region}:{account}:certificate/{id}"),
            );
        }
        ResourceConfig::Topic(cfg) => {
            let name = cfg.topic_name.clone().unwrap_or_else(|| generated_name(path));
            attributes.insert(
                "topicArn".to_string(),
                format!("arn:aws:sns:{region}:{account}:{name}"),
            );
            attributes.insert("topicName".to_string(), name);
        }
        ResourceConfig::BucketDeployment(cfg) => {
            attributes.insert(
                "destinationBucket".to_string(),
                cfg.destination_bucket.clone(),
            );
        }
    }

    attributes
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StackwireError;

    fn path(p: &str) -> ConstructPath {
        ConstructPath::parse(p).unwrap()
    }

    #[test]
    fn test_bucket_attributes_use_configured_name() {
        let unit = ResourceUnit::new(
            path("Frontend/FrontendPrivateBucket/PrivateBucket"),
            BucketConfig {
                bucket_name: Some("frontend-private-bucket-vdiaz".to_string()),
                versioned: true,
                ..BucketConfig::default()
            }
            .into(),
            LifecyclePolicy::destroy(),
            &DeploymentScope::default(),
        )
        .unwrap();

        assert_eq!(unit.attribute("bucketName").unwrap(), "frontend-private-bucket-vdiaz");
        assert_eq!(
            unit.attribute("bucketArn").unwrap(),
            "arn:aws:s3:::frontend-private-bucket-vdiaz"
        );
        assert_eq!(unit.name(), "PrivateBucket");
    }

    #[test]
    fn test_function_arn_uses_scope() {
        let unit = ResourceUnit::new(
            path("Backend/BackendLambda"),
            FunctionConfig {
                runtime: "nodejs22.x".to_string(),
                handler: "backend.handler".to_string(),
                code_path: "src/lambda".to_string(),
                function_name: Some("backend-fn".to_string()),
                environment: BTreeMap::new(),
                role_policies: Vec::new(),
            }
            .into(),
            LifecyclePolicy::destroy(),
            &DeploymentScope::new(Some("111111111111"), Some("eu-west-1")),
        )
        .unwrap();

        assert_eq!(
            unit.attribute("functionArn").unwrap(),
            "arn:aws:lambda:eu-west-1:111111111111:function:backend-fn"
        );
    }

    #[test]
    fn test_unknown_attribute() {
        let unit = ResourceUnit::new(
            path("App/Topic"),
            TopicConfig::default().into(),
            LifecyclePolicy::destroy(),
            &DeploymentScope::default(),
        )
        .unwrap();
        assert!(matches!(
            unit.attribute("bucketName"),
            Err(StackwireError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_inconsistent_lifecycle_rejected_at_creation() {
        let result = ResourceUnit::new(
            path("App/Bucket"),
            BucketConfig::default().into(),
            LifecyclePolicy {
                removal: RemovalPolicy::Retain,
                auto_delete_contents: true,
            },
            &DeploymentScope::default(),
        );
        assert!(matches!(
            result,
            Err(StackwireError::InconsistentLifecyclePolicy { .. })
        ));
    }

    #[test]
    fn test_generated_name_is_bounded_and_lowercase() {
        let long = "VeryLongConstructName".repeat(6);
        let name = generated_name(&path(&format!("Stack/{long}")));
        assert!(name.len() <= MAX_PHYSICAL_NAME_LEN);
        assert_eq!(name, name.to_ascii_lowercase());
        assert_eq!(name, generated_name(&path(&format!("Stack/{long}"))));
    }
}
