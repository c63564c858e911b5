//! In-memory dependency graph over one project's tasks.
//!
//! The graph is rebuilt from the full task list on every validation or
//! scheduling pass; it owns no persistent state and never outlives the task
//! snapshot it was built from. Node iteration order follows the input task
//! list so that traversals (and therefore reported cycle paths) are
//! deterministic for identical input.

use std::collections::HashMap;

use crate::task::{DependencyEdge, Task};

/// An edge whose `predecessor_id` does not match any task in the snapshot.
///
/// These are retained in the graph but reported, so the caller can decide
/// whether to warn or fail; the scheduler excludes them from computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownReference {
    /// Task that owns the dangling edge.
    pub task_id: u64,
    /// The id the edge points at.
    pub predecessor_id: u64,
}

/// Adjacency representation of one project's dependency edges.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Node ids in deterministic order: snapshot tasks first (input order),
    /// then unknown predecessor ids in first-seen order.
    order: Vec<u64>,
    /// Incoming edges keyed by successor id. Mirrors each task's
    /// `predecessors` list.
    preds: HashMap<u64, Vec<DependencyEdge>>,
    /// Outgoing adjacency keyed by predecessor id, derived from `preds`.
    succs: HashMap<u64, Vec<u64>>,
    unknown: Vec<UnknownReference>,
}

impl DependencyGraph {
    /// Build a graph from a flat task snapshot.
    ///
    /// Node set = task ids; edge set = every `(predecessor_id -> task.id)`
    /// pair found in any task's `predecessors`. Edges referencing ids outside
    /// the snapshot are kept and reported via [`unknown_references`].
    ///
    /// [`unknown_references`]: DependencyGraph::unknown_references
    pub fn build(tasks: &[Task]) -> Self {
        let order: Vec<u64> = tasks.iter().map(|t| t.id).collect();
        let preds: HashMap<u64, Vec<DependencyEdge>> = tasks
            .iter()
            .map(|t| (t.id, t.predecessors.clone()))
            .collect();
        Self::finish(order, preds)
    }

    /// Return a copy of this graph with `task_id`'s incoming edges replaced
    /// by `edges`: a what-if graph for validating a pending edit before
    /// commit. The original graph is untouched.
    pub fn with_proposed_edges(&self, task_id: u64, edges: &[DependencyEdge]) -> Self {
        let mut order: Vec<u64> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.preds.contains_key(id))
            .collect();
        let mut preds = self.preds.clone();
        if !preds.contains_key(&task_id) {
            order.push(task_id);
        }
        preds.insert(task_id, edges.to_vec());
        Self::finish(order, preds)
    }

    /// Derive outgoing adjacency and unknown-reference reports from the
    /// incoming-edge map, appending unknown predecessor ids as extra nodes.
    fn finish(mut order: Vec<u64>, preds: HashMap<u64, Vec<DependencyEdge>>) -> Self {
        let mut succs: HashMap<u64, Vec<u64>> = HashMap::new();
        let mut unknown = Vec::new();
        for &id in order.clone().iter() {
            for edge in &preds[&id] {
                if !preds.contains_key(&edge.predecessor_id) {
                    unknown.push(UnknownReference {
                        task_id: id,
                        predecessor_id: edge.predecessor_id,
                    });
                    if !order.contains(&edge.predecessor_id) {
                        order.push(edge.predecessor_id);
                    }
                }
                succs.entry(edge.predecessor_id).or_default().push(id);
            }
        }
        DependencyGraph { order, preds, succs, unknown }
    }

    /// Node ids in deterministic traversal order.
    pub fn nodes(&self) -> &[u64] {
        &self.order
    }

    /// Incoming edges of a task (its predecessor configuration).
    pub fn predecessors_of(&self, id: u64) -> &[DependencyEdge] {
        self.preds.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Ids of tasks that list `id` as a predecessor.
    pub fn successors_of(&self, id: u64) -> &[u64] {
        self.succs.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Edges pointing at ids not present in the task snapshot.
    pub fn unknown_references(&self) -> &[UnknownReference] {
        &self.unknown
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fields::{DependencyKind, Status};

    pub(crate) fn task(id: u64, preds: &[(u64, DependencyKind, i64)]) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            project: None,
            start_date: None,
            end_date: None,
            duration_days: None,
            predecessors: preds
                .iter()
                .map(|&(p, k, lag)| DependencyEdge::new(p, k, lag))
                .collect(),
            status: Status::NotStarted,
            parent: None,
            notes: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn test_build_adjacency() {
        let fs = DependencyKind::FinishToStart;
        let tasks = vec![
            task(1, &[]),
            task(2, &[(1, fs, 0)]),
            task(3, &[(1, fs, 2), (2, fs, 0)]),
        ];
        let g = DependencyGraph::build(&tasks);
        assert_eq!(g.nodes(), &[1, 2, 3]);
        assert_eq!(g.successors_of(1), &[2, 3]);
        assert_eq!(g.successors_of(3), &[] as &[u64]);
        assert_eq!(g.predecessors_of(3).len(), 2);
        assert!(g.unknown_references().is_empty());
    }

    #[test]
    fn test_unknown_reference_retained_and_flagged() {
        let tasks = vec![task(1, &[(99, DependencyKind::StartToStart, 0)])];
        let g = DependencyGraph::build(&tasks);
        assert_eq!(
            g.unknown_references(),
            &[UnknownReference { task_id: 1, predecessor_id: 99 }]
        );
        // The dangling id still appears as a node with an outgoing edge.
        assert_eq!(g.nodes(), &[1, 99]);
        assert_eq!(g.successors_of(99), &[1]);
    }

    #[test]
    fn test_with_proposed_edges_is_pure() {
        let fs = DependencyKind::FinishToStart;
        let tasks = vec![task(1, &[]), task(2, &[(1, fs, 0)])];
        let g = DependencyGraph::build(&tasks);
        let g2 = g.with_proposed_edges(2, &[DependencyEdge::new(1, fs, 5)]);
        assert_eq!(g.predecessors_of(2)[0].lag_days, 0);
        assert_eq!(g2.predecessors_of(2)[0].lag_days, 5);
        // Replacement, not append.
        assert_eq!(g2.predecessors_of(2).len(), 1);
    }

    #[test]
    fn test_with_proposed_edges_replaces_incoming_only() {
        let fs = DependencyKind::FinishToStart;
        let tasks = vec![task(1, &[]), task(2, &[(1, fs, 0)]), task(3, &[(2, fs, 0)])];
        let g = DependencyGraph::build(&tasks);
        let g2 = g.with_proposed_edges(2, &[]);
        assert!(g2.predecessors_of(2).is_empty());
        // 3 still depends on 2.
        assert_eq!(g2.successors_of(2), &[3]);
    }
}
