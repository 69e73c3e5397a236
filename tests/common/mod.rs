//! Common test utilities for Stackwire integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::Value;
use stackwire::error::Result;
use stackwire::resource::{BucketConfig, FunctionConfig};
use stackwire::{DeploymentScope, StackBuilder, StackContext, StackDefinition};
use tempfile::TempDir;

/// A temporary directory holding an assembly manifest
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Write `stackwire.yaml` into the workspace root
    pub fn write_manifest(&self, content: &str) -> PathBuf {
        self.write_file("stackwire.yaml", content);
        self.path.join("stackwire.yaml")
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }
}

/// Path of the demo manifest shipped with the repository
pub fn demo_manifest() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("stackwire.yaml")
}

/// Stack definition backed by a closure
pub struct FnStack<F> {
    kind: String,
    config: Value,
    build: F,
}

impl<F> StackDefinition for FnStack<F>
where
    F: Fn(&mut StackBuilder<'_>) -> Result<()>,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn config(&self) -> Value {
        self.config.clone()
    }

    fn build(&self, stack: &mut StackBuilder<'_>) -> Result<()> {
        (self.build)(stack)
    }
}

/// Build a stack definition of `kind` from a closure
pub fn define<F>(kind: &str, build: F) -> FnStack<F>
where
    F: Fn(&mut StackBuilder<'_>) -> Result<()>,
{
    FnStack {
        kind: kind.to_string(),
        config: Value::Null,
        build,
    }
}

/// Build a stack definition with an explicit configuration fingerprint input
pub fn define_with<F>(kind: &str, config: Value, build: F) -> FnStack<F>
where
    F: Fn(&mut StackBuilder<'_>) -> Result<()>,
{
    FnStack {
        kind: kind.to_string(),
        config,
        build,
    }
}

/// Context of a stack in the default test account
pub fn context(region: &str) -> StackContext {
    StackContext::new(DeploymentScope::new(Some("111111111111"), Some(region)))
}

pub fn cross_region(region: &str) -> StackContext {
    context(region).with_cross_region_references(true)
}

pub fn bucket(name: &str) -> BucketConfig {
    BucketConfig {
        bucket_name: Some(name.to_string()),
        ..BucketConfig::default()
    }
}

pub fn function(name: &str) -> FunctionConfig {
    FunctionConfig {
        runtime: "nodejs22.x".to_string(),
        handler: "index.handler".to_string(),
        code_path: "lambda".to_string(),
        function_name: Some(name.to_string()),
        environment: Default::default(),
        role_policies: Vec::new(),
    }
}

/// Stack publishing one bucket's name under `export_name`
pub fn bucket_stack(
    export_name: &'static str,
    bucket_name: &'static str,
) -> FnStack<impl Fn(&mut StackBuilder<'_>) -> Result<()>> {
    define("bucket-stack", move |s| {
        let root = s.root();
        let node = s.add_resource(root, "Bucket", bucket(bucket_name))?;
        s.publish_attribute("BucketNameOutput", export_name, node, "bucketName")?;
        Ok(())
    })
}

/// Stack importing `import` and publishing a literal under `export_name`
pub fn consumer_stack(
    import: &'static str,
    export_name: &'static str,
    value: &'static str,
) -> FnStack<impl Fn(&mut StackBuilder<'_>) -> Result<()>> {
    define("consumer-stack", move |s| {
        let handle = s.declare_import(import, None);
        let root = s.root();
        let node = s.add_resource(root, "Function", function(value))?;
        s.bind_import(node, "bucket_name", &handle)?;
        s.publish("ValueOutput", export_name, value)?;
        Ok(())
    })
}
