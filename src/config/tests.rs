//! Assembly manifest tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::error::StackwireError;
use crate::resource::RemovalPolicy;

const DEMO: &str = include_str!("../../demos/stackwire.yaml");

fn overrides() -> ContextOverrides {
    ContextOverrides::default()
}

#[test]
fn test_demo_manifest_parses() {
    let manifest = AssemblyManifest::from_yaml(DEMO).unwrap();
    assert_eq!(manifest.app, "express-website");
    assert_eq!(manifest.stacks.len(), 4);
    assert!(manifest.templates.contains_key("backend"));
    assert_eq!(
        manifest.pipeline.as_ref().unwrap().stages.len(),
        2,
        "demo pipeline has two stages"
    );
}

#[test]
fn test_demo_manifest_synthesizes() {
    let manifest = AssemblyManifest::from_yaml(DEMO).unwrap();
    let plan = manifest.build_app(&overrides()).unwrap().synth().unwrap();

    assert_eq!(
        plan.ordered_names(),
        vec![
            "CertificateStack",
            "CdkExpressWebsiteStack",
            "Backend/FrontendStack",
            "Backend",
            "PipelineStack",
        ]
    );
    assert_eq!(
        plan.export_value("FrontendBucketName2"),
        Some("frontend-private-bucket-vdiaz")
    );
    assert_eq!(
        plan.export_value("FrontendBucketName1"),
        plan.export_value("FrontendBucketName2")
    );
}

#[test]
fn test_unknown_field_is_rejected() {
    let yaml = r#"
app: demo
stacks: []
colour: blue
"#;
    let err = AssemblyManifest::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, StackwireError::ConfigParseFailed { .. }));
}

#[test]
fn test_unknown_resource_option_is_rejected_at_build() {
    let yaml = r#"
app: demo
templates:
  storage:
    resources:
      - id: Bucket
        kind: bucket
        properties:
          versioned: true
          versionned: true
stacks:
  - id: Storage
    template: storage
"#;
    let manifest = AssemblyManifest::from_yaml(yaml).unwrap();
    let err = manifest.build_app(&overrides()).unwrap_err();
    assert!(matches!(err, StackwireError::ConfigInvalid { .. }));
    assert!(err.to_string().contains("versionned"));
}

#[test]
fn test_template_without_json_snapshot_is_rejected() {
    let yaml = r#"
app: demo
templates:
  storage:
    resources:
      - id: Bucket
        kind: bucket
        properties:
          [a, b]: true
stacks:
  - id: Storage
    template: storage
"#;
    let manifest = AssemblyManifest::from_yaml(yaml).unwrap();
    let err = manifest.build_app(&overrides()).unwrap_err();
    assert!(matches!(err, StackwireError::ConfigInvalid { .. }));
    assert!(err.to_string().contains("storage"));
}

#[test]
fn test_unknown_template() {
    let yaml = r#"
app: demo
stacks:
  - id: Storage
    template: storage
"#;
    assert!(matches!(
        AssemblyManifest::from_yaml(yaml),
        Err(StackwireError::UnknownTemplate { .. })
    ));
}

#[test]
fn test_output_needs_exactly_one_source() {
    let yaml = r#"
app: demo
templates:
  storage:
    outputs:
      - id: Name
        export: Name
        value: a
        import: b
stacks:
  - id: Storage
    template: storage
"#;
    assert!(matches!(
        AssemblyManifest::from_yaml(yaml),
        Err(StackwireError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_overrides_take_precedence() {
    let manifest = AssemblyManifest::from_yaml(DEMO).unwrap();
    let scope = manifest.default_scope(&ContextOverrides {
        account: Some("222222222222".to_string()),
        region: None,
        cross_region_references: false,
    });
    assert_eq!(scope.account.as_deref(), Some("222222222222"));
    assert_eq!(scope.region.as_deref(), Some("eu-west-1"));
}

#[test]
fn test_instance_env_fills_from_defaults() {
    let manifest = AssemblyManifest::from_yaml(DEMO).unwrap();
    let app = manifest.build_app(&overrides()).unwrap();
    let certificate = app.find_stack("CertificateStack").unwrap();
    assert_eq!(certificate.scope().account.as_deref(), Some("111111111111"));
    assert_eq!(certificate.scope().region.as_deref(), Some("us-east-1"));

    let nested = app.find_stack("Backend/FrontendStack").unwrap();
    assert_eq!(nested.scope().region.as_deref(), Some("eu-west-1"));
}

#[test]
fn test_resource_lifecycle_from_declaration() {
    let decl: ResourceDecl = serde_yaml::from_str(
        r#"
id: Site
kind: bucket
removal: destroy
auto_delete_contents: true
"#,
    )
    .unwrap();
    let lifecycle = decl.lifecycle();
    assert_eq!(lifecycle.removal, RemovalPolicy::Destroy);
    assert!(lifecycle.auto_delete_contents);

    let default: ResourceDecl = serde_yaml::from_str("id: Site\nkind: bucket\n").unwrap();
    assert_eq!(default.lifecycle().removal, RemovalPolicy::Retain);
}

#[test]
fn test_missing_file() {
    let err = AssemblyManifest::load(Path::new("/nonexistent/stackwire.yaml")).unwrap_err();
    assert!(matches!(err, StackwireError::ConfigNotFound { .. }));
}

#[test]
fn test_load_reports_parse_errors_with_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(MANIFEST_FILE_NAME);
    fs::write(&path, "app: [unclosed").unwrap();
    let err = AssemblyManifest::load(&path).unwrap_err();
    match err {
        StackwireError::ConfigParseFailed { path: reported, .. } => {
            assert!(reported.ends_with(MANIFEST_FILE_NAME));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_pipeline_built_from_manifest() {
    let manifest = AssemblyManifest::from_yaml(DEMO).unwrap();
    let pipeline = manifest.pipeline().unwrap().unwrap();
    assert_eq!(pipeline.id(), "express-website-pipeline");
    assert_eq!(pipeline.stages()[1].pre().unwrap().name, "Validate");
    assert_eq!(pipeline.synth_step().unwrap().commands.len(), 3);
}
