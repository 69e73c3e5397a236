//! Stack dependency graph
//!
//! Nodes are stacks, edges point from a consumer to the producer it needs.
//! Edges come from resolved imports and from explicit stack dependencies;
//! construct ownership (a stack nested inside another) never adds an edge.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, order_violation, unknown_stack};
use crate::exports::ExportRegistry;
use crate::resolver::validation::check_scope;
use crate::stack::{Stack, StackId};

/// Why a consumer depends on a producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EdgeReason {
    /// The consumer imports this export from the producer
    Import { export_name: String },
    /// The consumer declared an explicit dependency
    Explicit,
}

/// Directed edge consumer → producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub consumer: StackId,
    pub producer: StackId,
    #[serde(flatten)]
    pub reason: EdgeReason,
}

/// Stacks and their dependency edges for one synthesis run
#[derive(Debug, Clone, Default)]
pub struct DeploymentGraph {
    names: Vec<String>,
    edges: Vec<Edge>,
    /// Distinct producers per stack, in first-seen order
    producers: Vec<Vec<StackId>>,
    /// Distinct consumers per stack, in first-seen order
    consumers: Vec<Vec<StackId>>,
}

impl DeploymentGraph {
    /// Graph over `names.len()` stacks without edges
    pub fn with_stacks<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let len = names.len();
        Self {
            names,
            edges: Vec::new(),
            producers: vec![Vec::new(); len],
            consumers: vec![Vec::new(); len],
        }
    }

    /// Record an edge; parallel edges keep their reasons but count once
    pub fn add_edge(&mut self, consumer: StackId, producer: StackId, reason: EdgeReason) {
        let producers = &mut self.producers[consumer.index()];
        if !producers.contains(&producer) {
            producers.push(producer);
            self.consumers[producer.index()].push(consumer);
        }
        self.edges.push(Edge {
            consumer,
            producer,
            reason,
        });
    }

    /// Stacks in construction order
    pub fn nodes(&self) -> impl Iterator<Item = StackId> + '_ {
        (0..self.names.len()).map(StackId::new)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, id: StackId) -> &str {
        &self.names[id.index()]
    }

    pub fn find(&self, name: &str) -> Option<StackId> {
        self.names.iter().position(|n| n == name).map(StackId::new)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn producers_of(&self, id: StackId) -> &[StackId] {
        &self.producers[id.index()]
    }

    pub fn consumers_of(&self, id: StackId) -> &[StackId] {
        &self.consumers[id.index()]
    }

    /// Group `members` into waves that may deploy in parallel
    ///
    /// `members` must already be in deployment order. A stack lands in the
    /// wave after the latest wave holding one of its producers among
    /// `members`; producers outside `members` are ignored.
    pub fn waves(&self, members: &[StackId]) -> Vec<Vec<StackId>> {
        let mut level: HashMap<StackId, usize> = HashMap::new();
        let mut waves: Vec<Vec<StackId>> = Vec::new();
        for &stack in members {
            let wave = self
                .producers_of(stack)
                .iter()
                .filter_map(|p| level.get(p))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level.insert(stack, wave);
            if waves.len() <= wave {
                waves.resize_with(wave + 1, Vec::new);
            }
            waves[wave].push(stack);
        }
        waves
    }
}

/// Build the dependency graph of an assembly
///
/// Every declared import must resolve through `registry` and pass the
/// deployment scope check. Self-imports add no edge.
///
/// # Errors
///
/// `UnresolvedImport`, `CrossRegionReference`, or `UnknownStack` for an
/// explicit dependency on a stack that is not part of the assembly.
pub fn build_dependency_graph(stacks: &[Stack], registry: &ExportRegistry) -> Result<DeploymentGraph> {
    let mut graph = DeploymentGraph::with_stacks(stacks.iter().map(Stack::name));

    for consumer in stacks {
        for import in consumer.imports() {
            let export_name = import.handle.export_name();
            let output = registry.resolve(export_name, consumer.name())?;
            let producer = &stacks[output.producer.index()];
            if producer.id() == consumer.id() {
                continue;
            }
            check_scope(consumer, import, producer)?;
            graph.add_edge(
                consumer.id(),
                producer.id(),
                EdgeReason::Import {
                    export_name: export_name.to_string(),
                },
            );
        }

        for dependency in consumer.dependencies() {
            let producer = graph
                .find(dependency)
                .ok_or_else(|| unknown_stack(dependency.as_str()))?;
            if producer != consumer.id() {
                graph.add_edge(consumer.id(), producer, EdgeReason::Explicit);
            }
        }
    }

    debug!(
        stacks = graph.len(),
        edges = graph.edges().len(),
        "built dependency graph"
    );
    Ok(graph)
}

/// Verify that `order` places every producer before its consumers
///
/// # Errors
///
/// `OrderViolation` for the first consumer found ahead of a producer, and
/// `UnknownStack` when an edge endpoint is missing from `order`.
pub fn check_order(graph: &DeploymentGraph, order: &[StackId]) -> Result<()> {
    let position: HashMap<StackId, usize> =
        order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    for edge in graph.edges() {
        let consumer = position
            .get(&edge.consumer)
            .ok_or_else(|| unknown_stack(graph.name(edge.consumer)))?;
        let producer = position
            .get(&edge.producer)
            .ok_or_else(|| unknown_stack(graph.name(edge.producer)))?;
        if producer > consumer {
            return Err(order_violation(
                graph.name(edge.consumer),
                graph.name(edge.producer),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StackwireError;

    fn id(i: usize) -> StackId {
        StackId::new(i)
    }

    fn diamond() -> DeploymentGraph {
        // D imports from B and C, both import from A
        let mut graph = DeploymentGraph::with_stacks(["A", "B", "C", "D"]);
        graph.add_edge(id(1), id(0), EdgeReason::Explicit);
        graph.add_edge(id(2), id(0), EdgeReason::Explicit);
        graph.add_edge(id(3), id(1), EdgeReason::Explicit);
        graph.add_edge(id(3), id(2), EdgeReason::Explicit);
        graph
    }

    #[test]
    fn test_parallel_edges_count_once() {
        let mut graph = DeploymentGraph::with_stacks(["Frontend", "Backend"]);
        for name in ["BucketName1", "BucketName2"] {
            graph.add_edge(
                id(1),
                id(0),
                EdgeReason::Import {
                    export_name: name.to_string(),
                },
            );
        }
        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.producers_of(id(1)), &[id(0)]);
        assert_eq!(graph.consumers_of(id(0)), &[id(1)]);
    }

    #[test]
    fn test_waves() {
        let graph = diamond();
        let waves = graph.waves(&[id(0), id(1), id(2), id(3)]);
        assert_eq!(waves, vec![vec![id(0)], vec![id(1), id(2)], vec![id(3)]]);
    }

    #[test]
    fn test_waves_ignore_producers_outside_members() {
        let graph = diamond();
        let waves = graph.waves(&[id(1), id(2), id(3)]);
        assert_eq!(waves, vec![vec![id(1), id(2)], vec![id(3)]]);
    }

    #[test]
    fn test_check_order_accepts_valid_order() {
        let graph = diamond();
        assert!(check_order(&graph, &[id(0), id(2), id(1), id(3)]).is_ok());
    }

    #[test]
    fn test_check_order_rejects_consumer_first() {
        let graph = diamond();
        let err = check_order(&graph, &[id(1), id(0), id(2), id(3)]).unwrap_err();
        match err {
            StackwireError::OrderViolation { consumer, producer } => {
                assert_eq!(consumer, "B");
                assert_eq!(producer, "A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_order_rejects_missing_stack() {
        let graph = diamond();
        assert!(matches!(
            check_order(&graph, &[id(0), id(1), id(3)]),
            Err(StackwireError::UnknownStack { .. })
        ));
    }
}
