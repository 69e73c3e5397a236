//! Explicit configuration records, one per resource kind
//!
//! Every recognized option is a field. Records reject unknown fields so a
//! misspelled option fails at construction time instead of being ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, config_invalid};
use crate::resource::lifecycle::LifecyclePolicy;

/// Kind of a resource unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bucket,
    Function,
    Distribution,
    Certificate,
    Topic,
    BucketDeployment,
}

impl ResourceKind {
    /// Resource type written into stack templates
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Bucket => "AWS::S3::Bucket",
            ResourceKind::Function => "AWS::Lambda::Function",
            ResourceKind::Distribution => "AWS::CloudFront::Distribution",
            ResourceKind::Certificate => "AWS::CertificateManager::Certificate",
            ResourceKind::Topic => "AWS::SNS::Topic",
            ResourceKind::BucketDeployment => "Custom::CDKBucketDeployment",
        }
    }

    /// Lifecycle applied when the declaration does not set one
    ///
    /// Buckets keep their data by default, everything else is deleted with its stack.
    pub fn default_lifecycle(&self) -> LifecyclePolicy {
        match self {
            ResourceKind::Bucket => LifecyclePolicy::retain(),
            _ => LifecyclePolicy::destroy(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Bucket => "bucket",
            ResourceKind::Function => "function",
            ResourceKind::Distribution => "distribution",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Topic => "topic",
            ResourceKind::BucketDeployment => "bucket_deployment",
        };
        write!(f, "{name}")
    }
}

/// Object storage bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    /// Physical bucket name; generated from the construct path when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    /// Keep every version of every object
    #[serde(default)]
    pub versioned: bool,

    /// Grant anonymous read access to objects
    #[serde(default)]
    pub public_read_access: bool,

    /// Block all public access at the bucket level
    #[serde(default = "default_true")]
    pub block_public_access: bool,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            bucket_name: None,
            versioned: false,
            public_read_access: false,
            block_public_access: true,
        }
    }
}

/// A single IAM-style policy statement attached to a function role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    #[serde(default = "default_effect")]
    pub effect: String,
}

/// Serverless function with its execution role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionConfig {
    /// Runtime identifier, e.g. `nodejs22.x`
    pub runtime: String,

    /// Entry point, e.g. `index.handler`
    pub handler: String,

    /// Path of the code asset
    pub code_path: String,

    /// Physical function name; generated from the construct path when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Extra statements added to the execution role
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_policies: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    #[default]
    RedirectToHttps,
    HttpsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClass {
    #[default]
    #[serde(rename = "price_class_100")]
    PriceClass100,
    #[serde(rename = "price_class_200")]
    PriceClass200,
    PriceClassAll,
}

/// Content-delivery distribution in front of a bucket origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionConfig {
    /// Name of the origin bucket, relative to the stack root
    pub origin: String,

    #[serde(default)]
    pub viewer_protocol_policy: ViewerProtocolPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,

    #[serde(default)]
    pub price_class: PriceClass,

    /// Alternate domain names served by the distribution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateValidation {
    #[default]
    Dns,
    Email,
}

/// TLS certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateConfig {
    pub domain_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alternative_names: Vec<String>,

    #[serde(default)]
    pub validation: CertificateValidation,
}

/// Subscription of an endpoint to a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subscription {
    /// Delivery protocol, e.g. `email`
    pub protocol: String,
    pub endpoint: String,
}

/// Messaging topic
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscriptions: Vec<Subscription>,
}

/// Upload of local assets into a bucket during deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketDeploymentConfig {
    /// Local asset directories
    pub sources: Vec<String>,

    /// Name of the destination bucket, relative to the stack root
    pub destination_bucket: String,
}

/// Configuration of a resource unit, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceConfig {
    Bucket(BucketConfig),
    Function(FunctionConfig),
    Distribution(DistributionConfig),
    Certificate(CertificateConfig),
    Topic(TopicConfig),
    BucketDeployment(BucketDeploymentConfig),
}

impl ResourceConfig {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceConfig::Bucket(_) => ResourceKind::Bucket,
            ResourceConfig::Function(_) => ResourceKind::Function,
            ResourceConfig::Distribution(_) => ResourceKind::Distribution,
            ResourceConfig::Certificate(_) => ResourceKind::Certificate,
            ResourceConfig::Topic(_) => ResourceKind::Topic,
            ResourceConfig::BucketDeployment(_) => ResourceKind::BucketDeployment,
        }
    }

    /// Parse the kind-specific record from declared properties
    ///
    /// A missing or `null` property block is read as an empty mapping, so
    /// kinds whose options all have defaults can be declared without one.
    pub fn from_properties(kind: ResourceKind, properties: &serde_yaml::Value) -> Result<Self> {
        let properties = match properties {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
            other => other.clone(),
        };

        let invalid = |e: serde_yaml::Error| config_invalid(format!("{kind} properties: {e}"));

        Ok(match kind {
            ResourceKind::Bucket => {
                ResourceConfig::Bucket(serde_yaml::from_value(properties).map_err(invalid)?)
            }
            ResourceKind::Function => {
                ResourceConfig::Function(serde_yaml::from_value(properties).map_err(invalid)?)
            }
            ResourceKind::Distribution => {
                ResourceConfig::Distribution(serde_yaml::from_value(properties).map_err(invalid)?)
            }
            ResourceKind::Certificate => {
                ResourceConfig::Certificate(serde_yaml::from_value(properties).map_err(invalid)?)
            }
            ResourceKind::Topic => {
                ResourceConfig::Topic(serde_yaml::from_value(properties).map_err(invalid)?)
            }
            ResourceKind::BucketDeployment => ResourceConfig::BucketDeployment(
                serde_yaml::from_value(properties).map_err(invalid)?,
            ),
        })
    }

    /// Names of sibling resources this configuration refers to
    pub fn references(&self) -> Vec<&str> {
        match self {
            ResourceConfig::Distribution(cfg) => vec![cfg.origin.as_str()],
            ResourceConfig::BucketDeployment(cfg) => vec![cfg.destination_bucket.as_str()],
            _ => Vec::new(),
        }
    }
}

impl From<BucketConfig> for ResourceConfig {
    fn from(config: BucketConfig) -> Self {
        ResourceConfig::Bucket(config)
    }
}

impl From<FunctionConfig> for ResourceConfig {
    fn from(config: FunctionConfig) -> Self {
        ResourceConfig::Function(config)
    }
}

impl From<DistributionConfig> for ResourceConfig {
    fn from(config: DistributionConfig) -> Self {
        ResourceConfig::Distribution(config)
    }
}

impl From<CertificateConfig> for ResourceConfig {
    fn from(config: CertificateConfig) -> Self {
        ResourceConfig::Certificate(config)
    }
}

impl From<TopicConfig> for ResourceConfig {
    fn from(config: TopicConfig) -> Self {
        ResourceConfig::Topic(config)
    }
}

impl From<BucketDeploymentConfig> for ResourceConfig {
    fn from(config: BucketDeploymentConfig) -> Self {
        ResourceConfig::BucketDeployment(config)
    }
}

fn default_true() -> bool {
    true
}

fn default_effect() -> String {
    "Allow".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StackwireError;

    #[test]
    fn test_bucket_from_properties() {
        let props: serde_yaml::Value =
            serde_yaml::from_str("bucket_name: frontend-private-bucket\nversioned: true").unwrap();
        let config = ResourceConfig::from_properties(ResourceKind::Bucket, &props).unwrap();
        let ResourceConfig::Bucket(bucket) = config else {
            panic!("expected bucket config");
        };
        assert_eq!(bucket.bucket_name.as_deref(), Some("frontend-private-bucket"));
        assert!(bucket.versioned);
        assert!(bucket.block_public_access);
    }

    #[test]
    fn test_null_properties_use_defaults() {
        let config =
            ResourceConfig::from_properties(ResourceKind::Topic, &serde_yaml::Value::Null).unwrap();
        assert_eq!(config, ResourceConfig::Topic(TopicConfig::default()));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let props: serde_yaml::Value = serde_yaml::from_str("versioned: true\nversioning: true").unwrap();
        let err = ResourceConfig::from_properties(ResourceKind::Bucket, &props).unwrap_err();
        assert!(matches!(err, StackwireError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("versioning"));
    }

    #[test]
    fn test_function_requires_runtime() {
        let props: serde_yaml::Value = serde_yaml::from_str("handler: index.handler").unwrap();
        assert!(ResourceConfig::from_properties(ResourceKind::Function, &props).is_err());
    }

    #[test]
    fn test_policy_statement_default_effect() {
        let props: serde_yaml::Value = serde_yaml::from_str(
            "runtime: nodejs22.x\nhandler: index.handler\ncode_path: src/lambda\nrole_policies:\n  - actions: [s3:GetObject]\n    resources: ['*']",
        )
        .unwrap();
        let ResourceConfig::Function(function) =
            ResourceConfig::from_properties(ResourceKind::Function, &props).unwrap()
        else {
            panic!("expected function config");
        };
        assert_eq!(function.role_policies[0].effect, "Allow");
    }

    #[test]
    fn test_references() {
        let config = ResourceConfig::Distribution(DistributionConfig {
            origin: "SiteBucket".to_string(),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            default_root_object: Some("index.html".to_string()),
            price_class: PriceClass::PriceClass100,
            domain_names: Vec::new(),
        });
        assert_eq!(config.references(), vec!["SiteBucket"]);
        assert_eq!(config.kind().type_name(), "AWS::CloudFront::Distribution");
    }

    #[test]
    fn test_default_lifecycle() {
        assert_eq!(ResourceKind::Bucket.default_lifecycle(), LifecyclePolicy::retain());
        assert_eq!(ResourceKind::Function.default_lifecycle(), LifecyclePolicy::destroy());
    }
}
