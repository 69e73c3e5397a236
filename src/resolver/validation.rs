//! Validation passes over the dependency graph
//!
//! - Deployment scope checks for cross-stack imports
//! - Cycle detection with the full cycle path
//! - Cycle checks along re-export chains

use std::iter;

use crate::error::{Result, StackwireError, cyclic_dependency};
use crate::resolver::graph::DeploymentGraph;
use crate::stack::{DeclaredImport, Stack, StackId};

/// Check that an import stays within one deployment scope, or is allowed to cross
///
/// The expected scope defaults to the consumer's own. A mismatch with the
/// producer's scope requires `cross_region_references` on both stacks.
///
/// # Errors
///
/// Returns `StackwireError::CrossRegionReference` carrying both scopes.
pub fn check_scope(consumer: &Stack, import: &DeclaredImport, producer: &Stack) -> Result<()> {
    let expected = import
        .expected_scope
        .as_ref()
        .unwrap_or_else(|| consumer.scope());
    if expected.matches(producer.scope()) {
        return Ok(());
    }
    if consumer.cross_region_references() && producer.cross_region_references() {
        return Ok(());
    }
    Err(StackwireError::CrossRegionReference {
        export_name: import.handle.export_name().to_string(),
        consumer: consumer.name().to_string(),
        consumer_scope: expected.to_string(),
        producer: producer.name().to_string(),
        producer_scope: producer.scope().to_string(),
    })
}

/// Check for a cycle along a chain of names being resolved
///
/// # Errors
///
/// Returns `StackwireError::CyclicStackDependency` if `name` is already in `chain`.
pub fn check_cycle(name: &str, chain: &[String]) -> Result<()> {
    if let Some(start) = chain.iter().position(|n| n == name) {
        let cycle: Vec<&str> = chain[start..]
            .iter()
            .map(String::as_str)
            .chain(iter::once(name))
            .collect();
        return Err(cyclic_dependency(&cycle));
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not visited yet
    White,
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

/// Reject graphs containing a dependency cycle
///
/// DFS with three-color marking, starting from every stack in construction
/// order. Reaching a GRAY node closes a cycle; reaching a BLACK node from a
/// different branch only means two consumers share a producer.
///
/// # Errors
///
/// Returns `StackwireError::CyclicStackDependency` naming every stack on the cycle.
pub fn detect_cycles(graph: &DeploymentGraph) -> Result<()> {
    let mut marks = vec![Mark::White; graph.len()];
    let mut path = Vec::new();
    for node in graph.nodes() {
        if marks[node.index()] == Mark::White {
            visit(graph, node, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit(
    graph: &DeploymentGraph,
    node: StackId,
    marks: &mut [Mark],
    path: &mut Vec<StackId>,
) -> Result<()> {
    match marks[node.index()] {
        Mark::Black => return Ok(()),
        Mark::Gray => {
            let start = path.iter().position(|&n| n == node).unwrap_or(0);
            let cycle: Vec<&str> = path[start..]
                .iter()
                .chain(iter::once(&node))
                .map(|&id| graph.name(id))
                .collect();
            return Err(cyclic_dependency(&cycle));
        }
        Mark::White => {}
    }

    marks[node.index()] = Mark::Gray;
    path.push(node);
    for &producer in graph.producers_of(node) {
        visit(graph, producer, marks, path)?;
    }
    path.pop();
    marks[node.index()] = Mark::Black;
    Ok(())
}
