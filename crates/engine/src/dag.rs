//! Dependency graph validation. Run this before persisting a new
//! dependency edge.
//!
//! Rules enforced:
//! 1. Every edge must reference known chores (both `parent` and `child`).
//! 2. A chore cannot depend on itself.
//! 3. The directed graph must be acyclic (topological sort must succeed).
//!
//! Returns the chores in topological spawn order on success.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::EngineError;

/// Directed edge: completing `parent` spawns `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub parent: Uuid,
    pub child: Uuid,
}

/// Validate the dependency graph and return chores in topological order.
///
/// # Errors
/// - [`EngineError::UnknownChoreReference`] if an edge references a missing chore.
/// - [`EngineError::Validation`] for a self-dependency.
/// - [`EngineError::CycleDetected`] if the graph is not acyclic.
pub fn validate_dependency_graph(
    chores: &[Uuid],
    edges: &[DependencyEdge],
) -> Result<Vec<Uuid>, EngineError> {
    let chore_set: HashSet<Uuid> = chores.iter().copied().collect();

    // -----------------------------------------------------------------------
    // 1. Validate edge endpoints
    // -----------------------------------------------------------------------
    for edge in edges {
        if !chore_set.contains(&edge.parent) {
            return Err(EngineError::UnknownChoreReference {
                chore_id: edge.parent,
                side: "parent",
            });
        }
        if !chore_set.contains(&edge.child) {
            return Err(EngineError::UnknownChoreReference {
                chore_id: edge.child,
                side: "child",
            });
        }
        if edge.parent == edge.child {
            return Err(EngineError::Validation("a chore cannot depend on itself".into()));
        }
    }

    // -----------------------------------------------------------------------
    // 2. Topological sort (Kahn's algorithm)
    // -----------------------------------------------------------------------
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut in_degree: HashMap<Uuid, usize> = HashMap::new();

    for &chore in &chore_set {
        adjacency.entry(chore).or_default();
        in_degree.entry(chore).or_insert(0);
    }

    for edge in edges {
        adjacency.entry(edge.parent).or_default().push(edge.child);
        *in_degree.entry(edge.child).or_insert(0) += 1;
    }

    // Seed in input order so the result is deterministic.
    let mut queue: VecDeque<Uuid> = chores
        .iter()
        .copied()
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect::<Vec<_>>()
        .into_iter()
        .fold((VecDeque::new(), HashSet::new()), |(mut q, mut seen), id| {
            if seen.insert(id) {
                q.push_back(id);
            }
            (q, seen)
        })
        .0;

    let mut sorted: Vec<Uuid> = Vec::with_capacity(chore_set.len());

    while let Some(chore) = queue.pop_front() {
        sorted.push(chore);

        if let Some(children) = adjacency.get(&chore) {
            for &child in children {
                let deg = in_degree.entry(child).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    // If we didn't visit every chore the graph contains a cycle.
    if sorted.len() != chore_set.len() {
        return Err(EngineError::CycleDetected);
    }

    Ok(sorted)
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn edge(parent: Uuid, child: Uuid) -> DependencyEdge {
        DependencyEdge { parent, child }
    }

    #[test]
    fn chain_returns_spawn_order() {
        // cook → wash dishes → dry dishes
        let c = ids(3);
        let sorted = validate_dependency_graph(&c, &[edge(c[0], c[1]), edge(c[1], c[2])])
            .expect("should be valid");
        assert_eq!(sorted, c);
    }

    #[test]
    fn diamond_is_valid() {
        //   A
        //  / \
        // B   C
        //  \ /
        //   D
        let c = ids(4);
        let sorted = validate_dependency_graph(
            &c,
            &[edge(c[0], c[1]), edge(c[0], c[2]), edge(c[1], c[3]), edge(c[2], c[3])],
        )
        .expect("should be valid");

        assert_eq!(sorted.first(), Some(&c[0]));
        assert_eq!(sorted.last(), Some(&c[3]));
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn edge_referencing_missing_chore_is_rejected() {
        let c = ids(1);
        let ghost = Uuid::new_v4();
        assert!(matches!(
            validate_dependency_graph(&c, &[edge(c[0], ghost)]),
            Err(EngineError::UnknownChoreReference { chore_id, side: "child" }) if chore_id == ghost
        ));
    }

    #[test]
    fn self_dependency_is_rejected() {
        let c = ids(1);
        assert!(matches!(
            validate_dependency_graph(&c, &[edge(c[0], c[0])]),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn cycle_is_detected() {
        // A → B → C → A
        let c = ids(3);
        let edges = [edge(c[0], c[1]), edge(c[1], c[2]), edge(c[2], c[0])];
        assert!(matches!(
            validate_dependency_graph(&c, &edges),
            Err(EngineError::CycleDetected)
        ));
    }

    #[test]
    fn chores_without_edges_are_valid() {
        let c = ids(2);
        let sorted = validate_dependency_graph(&c, &[]).expect("no edges is valid");
        assert_eq!(sorted, c);
    }
}
