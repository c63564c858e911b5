//! Cycle detection over the dependency graph.
//!
//! Runs before any dependency edit is persisted: a cycle is a normal,
//! expected outcome reported as a value, never an error. The traversal is
//! depth-first with an explicit stack and an "on current path" marker per
//! node; visiting a node already on the path yields the cycle, and the path
//! from that node's first occurrence through the top of the stack is returned
//! for user-facing diagnostics. Because nodes and their successors are walked
//! in input order, identical input always reports the identical path.

use std::collections::HashMap;

use super::graph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current traversal path.
    Active,
    /// Fully explored, known cycle-free.
    Done,
}

/// Search the graph for a directed cycle.
///
/// Returns the cycle as a node path whose first element repeats at the end
/// (`[a, b, c, a]`; a self-loop reports `[a, a]`), or `None` for an acyclic
/// graph.
pub fn find_cycle(graph: &DependencyGraph) -> Option<Vec<u64>> {
    let mut marks: HashMap<u64, Mark> = HashMap::new();

    for &root in graph.nodes() {
        if marks.contains_key(&root) {
            continue;
        }
        // Each frame is (node, index of the next successor to visit).
        let mut stack: Vec<(u64, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::Active);

        while let Some(&mut (node, ref mut next)) = stack.last_mut() {
            let succs = graph.successors_of(node);
            if *next < succs.len() {
                let child = succs[*next];
                *next += 1;
                match marks.get(&child) {
                    Some(Mark::Active) => {
                        // Found the cycle: everything from the first
                        // occurrence of `child` up the stack, closed by
                        // repeating `child`.
                        let from = stack
                            .iter()
                            .position(|&(n, _)| n == child)
                            .unwrap_or(stack.len() - 1);
                        let mut path: Vec<u64> =
                            stack[from..].iter().map(|&(n, _)| n).collect();
                        path.push(child);
                        return Some(path);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::Active);
                        stack.push((child, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
            }
        }
    }
    None
}

/// Order all nodes so that every predecessor appears before its successors.
///
/// Kahn's algorithm with an input-order tie-break, so the result is stable
/// across runs. On a cyclic graph the offending path from [`find_cycle`] is
/// returned as the error.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<u64>, Vec<u64>> {
    let mut indegree: HashMap<u64, usize> = graph.nodes().iter().map(|&n| (n, 0)).collect();
    for &n in graph.nodes() {
        for _ in graph.predecessors_of(n) {
            *indegree.get_mut(&n).unwrap() += 1;
        }
    }

    let mut order = Vec::with_capacity(graph.nodes().len());
    let mut ready: Vec<u64> = graph
        .nodes()
        .iter()
        .copied()
        .filter(|n| indegree[n] == 0)
        .collect();

    let mut cursor = 0;
    while cursor < ready.len() {
        let n = ready[cursor];
        cursor += 1;
        order.push(n);
        for &succ in graph.successors_of(n) {
            let d = indegree.get_mut(&succ).unwrap();
            *d -= 1;
            if *d == 0 {
                ready.push(succ);
            }
        }
    }

    if order.len() == graph.nodes().len() {
        Ok(order)
    } else {
        Err(find_cycle(graph).unwrap_or_default())
    }
}
