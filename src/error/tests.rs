//! Error type tests
//!
//! Tests for StackwireError and its conversions.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use super::*;
use miette::Diagnostic;

macro_rules! test_error_contains {
    ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
        #[test]
        fn $test_name() {
            let err = $err;
            let error_string = err.to_string();
            $(
                assert!(error_string.contains($contains),
                    "Error message should contain '{}', got: {}",
                    $contains,
                    error_string
                );
            )+
        }
    };
}

#[test]
fn test_error_display() {
    let err = name_collision("App/Frontend", "bucket");
    assert_eq!(
        err.to_string(),
        "Construct 'bucket' already exists under 'App/Frontend'"
    );
}

#[test]
fn test_error_code() {
    let err = name_collision("App", "bucket");
    assert_eq!(
        err.code().map(|c| c.to_string()),
        Some("stackwire::construct::name_collision".to_string())
    );
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: StackwireError = io_err.into();
    assert!(matches!(err, StackwireError::IoError { .. }));
}

#[test]
fn test_yaml_error_conversion() {
    let parse_result: std::result::Result<serde_yaml::Value, _> =
        serde_yaml::from_str("invalid: yaml: content: [unclosed");
    let err: StackwireError = parse_result.unwrap_err().into();
    assert!(matches!(err, StackwireError::ConfigParseFailed { .. }));
}

#[test]
fn test_json_error_conversion() {
    let parse_result: std::result::Result<serde_json::Value, _> =
        serde_json::from_str("invalid json content");
    let err: StackwireError = parse_result.unwrap_err().into();
    assert!(matches!(err, StackwireError::ConfigParseFailed { .. }));
}

test_error_contains!(
    test_duplicate_export_names_both_producers,
    duplicate_export("BucketName1", "Frontend", "Storage"),
    "BucketName1",
    "Frontend",
    "Storage"
);

test_error_contains!(
    test_unresolved_import_names_consumer,
    unresolved_import("BucketName1", "Backend"),
    "BucketName1",
    "Backend"
);

test_error_contains!(
    test_cyclic_dependency_joins_cycle,
    cyclic_dependency(&["A", "B", "A"]),
    "A -> B -> A"
);

test_error_contains!(
    test_cyclic_construction_chain,
    cyclic_construction("Frontend -> Backend -> Frontend"),
    "Cyclic construction"
);

test_error_contains!(
    test_stage_order_violation,
    stage_order_violation("Api", "S1", "Db", "is deployed in later stage 'S2'"),
    "Api",
    "S1",
    "later stage 'S2'"
);

test_error_contains!(
    test_config_not_found,
    config_not_found("stackwire.yaml"),
    "Assembly manifest not found"
);

#[test]
fn test_cross_region_reference_carries_both_scopes() {
    let err = StackwireError::CrossRegionReference {
        export_name: "CertificateArn".to_string(),
        consumer: "Website".to_string(),
        consumer_scope: "111111111111/eu-west-1".to_string(),
        producer: "Certificate".to_string(),
        producer_scope: "111111111111/us-east-1".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("eu-west-1"));
    assert!(message.contains("us-east-1"));
    assert!(err.help().is_some());
}

#[test]
fn test_constructor_variants() {
    assert!(matches!(
        invalid_construct_name("a/b", "contains '/'"),
        StackwireError::InvalidConstructName { .. }
    ));
    assert!(matches!(
        inconsistent_lifecycle("App/Bucket", "retain with auto-delete"),
        StackwireError::InconsistentLifecyclePolicy { .. }
    ));
    assert!(matches!(
        registry_sealed("X"),
        StackwireError::RegistrySealed { .. }
    ));
    assert!(matches!(
        import_not_resolved("X"),
        StackwireError::ImportNotResolved { .. }
    ));
    assert!(matches!(
        order_violation("A", "B"),
        StackwireError::OrderViolation { .. }
    ));
    assert!(matches!(
        duplicate_stage("P", "S1"),
        StackwireError::DuplicateStage { .. }
    ));
    assert!(matches!(
        duplicate_stage_member("A", "S1", "S2"),
        StackwireError::DuplicateStageMember { .. }
    ));
    assert!(matches!(
        export_not_published("A", "X", "B"),
        StackwireError::ExportNotPublished { .. }
    ));
    assert!(matches!(
        provisioning_failed("A", "boom"),
        StackwireError::Provisioning { .. }
    ));
    assert!(matches!(
        unknown_template("Missing"),
        StackwireError::UnknownTemplate { .. }
    ));
    assert!(matches!(
        unknown_stack("Missing"),
        StackwireError::UnknownStack { .. }
    ));
    assert!(matches!(
        unknown_resource("App", "bucket"),
        StackwireError::UnknownResourceReference { .. }
    ));
    assert!(matches!(
        unknown_attribute("App/bucket", "nope"),
        StackwireError::UnknownAttribute { .. }
    ));
    assert!(matches!(
        config_read_failed("x.yaml", "denied"),
        StackwireError::ConfigReadFailed { .. }
    ));
    assert!(matches!(
        config_parse_failed("x.yaml", "bad"),
        StackwireError::ConfigParseFailed { .. }
    ));
    assert!(matches!(
        config_invalid("bad"),
        StackwireError::ConfigInvalid { .. }
    ));
}
