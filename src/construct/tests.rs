//! Construct tree tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::error::StackwireError;
use crate::resource::{BucketConfig, TopicConfig};

fn bucket() -> ResourceConfig {
    BucketConfig::default().into()
}

#[test]
fn test_add_child_computes_path() {
    let mut tree = ConstructTree::new();
    let stack = tree.add_scope(tree.root(), "Frontend").unwrap();
    let group = tree.add_scope(stack, "FrontendPrivateBucket").unwrap();
    let unit = tree
        .add_resource(
            group,
            "PrivateBucket",
            bucket(),
            LifecyclePolicy::destroy(),
            &DeploymentScope::default(),
        )
        .unwrap();

    assert_eq!(
        tree.node(unit).path().to_string(),
        "Frontend/FrontendPrivateBucket/PrivateBucket"
    );
    assert_eq!(tree.node(unit).parent(), Some(group));
    assert_eq!(
        tree.find(&ConstructPath::parse("Frontend/FrontendPrivateBucket").unwrap()),
        Some(group)
    );
}

#[test]
fn test_sibling_name_collision() {
    let mut tree = ConstructTree::new();
    let scope = tree.add_scope(tree.root(), "Stack").unwrap();
    tree.add_resource(scope, "bucket", bucket(), LifecyclePolicy::retain(), &DeploymentScope::default())
        .unwrap();

    let err = tree
        .add_resource(scope, "bucket", bucket(), LifecyclePolicy::retain(), &DeploymentScope::default())
        .unwrap_err();
    assert!(matches!(err, StackwireError::NameCollision { .. }));
    assert!(err.to_string().contains("bucket"));

    let err = tree.add_scope(scope, "bucket").unwrap_err();
    assert!(matches!(err, StackwireError::NameCollision { .. }));
}

#[test]
fn test_same_name_in_different_scopes() {
    let mut tree = ConstructTree::new();
    let a = tree.add_scope(tree.root(), "A").unwrap();
    let b = tree.add_scope(tree.root(), "B").unwrap();
    assert!(tree.add_scope(a, "bucket").is_ok());
    assert!(tree.add_scope(b, "bucket").is_ok());
}

#[test]
fn test_walk_is_depth_first_in_insertion_order() {
    let mut tree = ConstructTree::new();
    let a = tree.add_scope(tree.root(), "A").unwrap();
    let a1 = tree.add_scope(a, "A1").unwrap();
    let a2 = tree.add_scope(a, "A2").unwrap();
    let a1x = tree.add_scope(a1, "X").unwrap();
    let b = tree.add_scope(tree.root(), "B").unwrap();

    let order = tree.walk(tree.root());
    assert_eq!(order, vec![tree.root(), a, a1, a1x, a2, b]);
}

#[test]
fn test_stack_nodes_stop_at_nested_stack() {
    let mut tree = ConstructTree::new();
    let outer = tree
        .add_child(tree.root(), "Backend", NodeKind::Stack(StackId::new(0)))
        .unwrap();
    let lambda = tree
        .add_resource(outer, "Topic", TopicConfig::default().into(), LifecyclePolicy::destroy(), &DeploymentScope::default())
        .unwrap();
    let nested = tree
        .add_child(outer, "FrontendStack", NodeKind::Stack(StackId::new(1)))
        .unwrap();
    let nested_bucket = tree
        .add_resource(nested, "Bucket", bucket(), LifecyclePolicy::retain(), &DeploymentScope::default())
        .unwrap();

    assert_eq!(tree.stack_nodes(outer), vec![outer, lambda]);
    assert_eq!(tree.stack_nodes(nested), vec![nested, nested_bucket]);
    assert_eq!(tree.node(nested_bucket).stack(), Some(StackId::new(1)));
    assert_eq!(tree.stack_resources(outer).len(), 1);
}

#[test]
fn test_ensure_scope_reuses_existing() {
    let mut tree = ConstructTree::new();
    let root = tree.root();
    let first = tree
        .ensure_scope(root, &ConstructPath::parse("Group/Inner").unwrap())
        .unwrap();
    let second = tree
        .ensure_scope(root, &ConstructPath::parse("Group/Inner").unwrap())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_ensure_scope_rejects_non_scope() {
    let mut tree = ConstructTree::new();
    let root = tree.root();
    tree.add_resource(root, "Bucket", bucket(), LifecyclePolicy::retain(), &DeploymentScope::default())
        .unwrap();
    let err = tree
        .ensure_scope(root, &ConstructPath::parse("Bucket").unwrap())
        .unwrap_err();
    assert!(matches!(err, StackwireError::NameCollision { .. }));
}

#[test]
fn test_find_resource_relative() {
    let mut tree = ConstructTree::new();
    let stack = tree.add_scope(tree.root(), "Site").unwrap();
    let unit = tree
        .add_resource(stack, "SiteBucket", bucket(), LifecyclePolicy::retain(), &DeploymentScope::default())
        .unwrap();
    assert_eq!(tree.find_resource(stack, "SiteBucket").unwrap(), unit);
    assert!(matches!(
        tree.find_resource(stack, "Missing"),
        Err(StackwireError::UnknownResourceReference { .. })
    ));
}
