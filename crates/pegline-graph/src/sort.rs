//! Graph sort (C8): topological order over a node set, tie-broken by a
//! caller-supplied priority, with cycle detection.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::GraphError;
use crate::op::OpHash;

/// Topologically sort `nodes`, using `preds` restricted to `nodes` for
/// edges and `priority` to break ties among simultaneously-ready nodes
/// (lower priority first; missing entries sort last). At each step the
/// lowest-priority zero-in-degree node is emitted and its successors'
/// in-degree decremented. If the ready-heap empties before every node has
/// been emitted, the remainder forms at least one cycle.
pub(crate) fn tie_broken_topo_sort(
    nodes: &HashSet<OpHash>,
    preds: &HashMap<OpHash, HashSet<OpHash>>,
    priority: &HashMap<OpHash, usize>,
) -> Result<Vec<OpHash>, GraphError> {
    let mut indegree: HashMap<OpHash, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    let mut successors: HashMap<OpHash, Vec<OpHash>> = HashMap::new();
    for &n in nodes {
        for &p in preds.get(&n).into_iter().flatten() {
            if nodes.contains(&p) {
                *indegree.get_mut(&n).unwrap() += 1;
                successors.entry(p).or_default().push(n);
            }
        }
    }

    let key = |n: OpHash| (priority.get(&n).copied().unwrap_or(usize::MAX), n);
    let mut heap: BinaryHeap<Reverse<(usize, OpHash)>> =
        nodes.iter().filter(|&&n| indegree[&n] == 0).map(|&n| Reverse(key(n))).collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse((_, n))) = heap.pop() {
        order.push(n);
        for &s in successors.get(&n).into_iter().flatten() {
            let deg = indegree.get_mut(&s).unwrap();
            *deg -= 1;
            if *deg == 0 {
                heap.push(Reverse(key(s)));
            }
        }
    }

    if order.len() != nodes.len() {
        let resolved: HashSet<OpHash> = order.iter().copied().collect();
        let mut residual: Vec<OpHash> = nodes.iter().copied().filter(|n| !resolved.contains(n)).collect();
        residual.sort();
        return Err(GraphError::CycleError(residual));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn h(n: u64) -> OpHash {
        // Tests only need distinct, orderable identities; `Operation::content_hash`
        // is exercised separately in `op.rs`.
        OpHash(n)
    }

    #[test]
    fn sorts_a_simple_chain() {
        let nodes: HashSet<OpHash> = [h(1), h(2), h(3)].into_iter().collect();
        let mut preds = HashMap::new();
        preds.insert(h(2), [h(1)].into_iter().collect());
        preds.insert(h(3), [h(2)].into_iter().collect());
        let order = tie_broken_topo_sort(&nodes, &preds, &HashMap::new()).unwrap();
        assert_eq!(order, vec![h(1), h(2), h(3)]);
    }

    #[test]
    fn detects_a_cycle() {
        let nodes: HashSet<OpHash> = [h(1), h(2)].into_iter().collect();
        let mut preds = HashMap::new();
        preds.insert(h(1), [h(2)].into_iter().collect());
        preds.insert(h(2), [h(1)].into_iter().collect());
        let err = tie_broken_topo_sort(&nodes, &preds, &HashMap::new()).unwrap_err();
        assert!(matches!(err, GraphError::CycleError(residual) if residual.len() == 2));
    }

    #[test]
    fn breaks_ties_by_priority() {
        let nodes: HashSet<OpHash> = [h(1), h(2)].into_iter().collect();
        let mut priority = HashMap::new();
        priority.insert(h(1), 5);
        priority.insert(h(2), 1);
        let order = tie_broken_topo_sort(&nodes, &HashMap::new(), &priority).unwrap();
        assert_eq!(order, vec![h(2), h(1)]);
    }
}
