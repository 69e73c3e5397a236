//! Topological sort of the deployment graph
//!
//! Repeatedly extracts stacks whose producers are all placed (Kahn's
//! algorithm). Among ready stacks the one constructed first goes first, so
//! the order is deterministic and an assembly without edges deploys in
//! construction order.
//!
//! ```text
//! Backend imports from Frontend, Certificate is independent
//!
//! construction: [Backend, Frontend, Certificate]
//! order:        [Frontend, Backend, Certificate]
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{Result, cyclic_dependency};
use crate::resolver::graph::DeploymentGraph;
use crate::stack::StackId;

/// Producers-first order of every stack in `graph`
///
/// # Errors
///
/// Returns `CyclicStackDependency` listing the stacks left unplaced if the
/// graph is not acyclic.
pub fn topological_sort(graph: &DeploymentGraph) -> Result<Vec<StackId>> {
    let mut pending: Vec<usize> = graph
        .nodes()
        .map(|node| graph.producers_of(node).len())
        .collect();
    let mut ready: BinaryHeap<Reverse<StackId>> = graph
        .nodes()
        .filter(|node| pending[node.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &consumer in graph.consumers_of(node) {
            let count = &mut pending[consumer.index()];
            *count -= 1;
            if *count == 0 {
                ready.push(Reverse(consumer));
            }
        }
    }

    if order.len() != graph.len() {
        let stuck: Vec<&str> = graph
            .nodes()
            .filter(|node| pending[node.index()] > 0)
            .map(|node| graph.name(node))
            .collect();
        return Err(cyclic_dependency(&stuck));
    }
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StackwireError;
    use crate::resolver::graph::EdgeReason;

    fn id(i: usize) -> StackId {
        StackId::new(i)
    }

    #[test]
    fn test_no_edges_keeps_construction_order() {
        let graph = DeploymentGraph::with_stacks(["Frontend", "Backend", "Certificate"]);
        assert_eq!(
            topological_sort(&graph).unwrap(),
            vec![id(0), id(1), id(2)]
        );
    }

    #[test]
    fn test_producer_moves_ahead() {
        let mut graph = DeploymentGraph::with_stacks(["Backend", "Frontend", "Certificate"]);
        graph.add_edge(
            id(0),
            id(1),
            EdgeReason::Import {
                export_name: "BucketName1".to_string(),
            },
        );
        assert_eq!(
            topological_sort(&graph).unwrap(),
            vec![id(1), id(0), id(2)]
        );
    }

    #[test]
    fn test_ties_break_by_construction_order() {
        // C depends on A; B is independent and constructed before C
        let mut graph = DeploymentGraph::with_stacks(["A", "B", "C", "D"]);
        graph.add_edge(id(2), id(0), EdgeReason::Explicit);
        graph.add_edge(id(3), id(1), EdgeReason::Explicit);
        assert_eq!(
            topological_sort(&graph).unwrap(),
            vec![id(0), id(1), id(2), id(3)]
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut graph = DeploymentGraph::with_stacks(["A", "B"]);
        graph.add_edge(id(0), id(1), EdgeReason::Explicit);
        graph.add_edge(id(1), id(0), EdgeReason::Explicit);
        assert!(matches!(
            topological_sort(&graph),
            Err(StackwireError::CyclicStackDependency { .. })
        ));
    }
}
