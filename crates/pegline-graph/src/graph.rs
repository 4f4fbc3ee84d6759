//! The computation graph (C7): a content-addressed DAG of operations with a
//! target set, subgraph queries, and an ordered execution plan.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::GraphError;
use crate::op::{OpHash, Operation};
use crate::sort;

/// A content-addressed dataflow graph. Mutating calls (`add`, `add_target`)
/// take `&mut self`; queries (`subgraph`, `order`) take `&self` and cache
/// their results internally, invalidated on the next mutation.
#[derive(Default)]
pub struct Graph {
    ops: HashMap<OpHash, Operation>,
    preds: HashMap<OpHash, HashSet<OpHash>>,
    /// Insertion order matters: target 0 is the one the scheduler tries to
    /// reach first (see `order`'s phase 1).
    targets: Vec<OpHash>,
    subgraph_cache: RefCell<HashMap<OpHash, HashSet<OpHash>>>,
    order_cache: RefCell<Option<Vec<OpHash>>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `op`, fusing with any existing operation of the same content
    /// hash. `deps` are unioned into the operation's predecessor set
    /// alongside any hash its own arguments reference — use `deps` for
    /// ordering edges that carry no argument value, such as the
    /// consecutive-effect edges an AST→graph translator inserts between
    /// side-effecting operations (see spec §9's effect-ordering note).
    pub fn add(&mut self, op: Operation, deps: impl IntoIterator<Item = OpHash>) -> OpHash {
        let hash = op.content_hash();
        let mut edges: HashSet<OpHash> = deps.into_iter().collect();
        edges.extend(op.arg_refs());
        self.preds.entry(hash).or_default().extend(edges);
        self.ops.entry(hash).or_insert(op);
        self.invalidate();
        hash
    }

    /// Mark the given operations as required outputs.
    pub fn add_target(&mut self, hashes: impl IntoIterator<Item = OpHash>) {
        for h in hashes {
            if !self.targets.contains(&h) {
                self.targets.push(h);
            }
        }
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.order_cache.borrow_mut().take();
        self.subgraph_cache.borrow_mut().clear();
    }

    /// The transitive closure of `h`'s dependencies, including `h` itself.
    /// Memoized; fails if any reachable hash is missing an operation
    /// (incomplete graph) or if following `preds` revisits a hash still on
    /// the current path (a cycle).
    pub fn subgraph(&self, h: OpHash) -> Result<HashSet<OpHash>, GraphError> {
        if let Some(cached) = self.subgraph_cache.borrow().get(&h) {
            return Ok(cached.clone());
        }
        let mut visiting = HashSet::new();
        let mut closure = HashSet::new();
        self.collect_subgraph(h, &mut visiting, &mut closure)?;
        self.subgraph_cache.borrow_mut().insert(h, closure.clone());
        Ok(closure)
    }

    fn collect_subgraph(&self, h: OpHash, visiting: &mut HashSet<OpHash>, closure: &mut HashSet<OpHash>) -> Result<(), GraphError> {
        if closure.contains(&h) {
            return Ok(());
        }
        if !self.ops.contains_key(&h) {
            return Err(GraphError::UnknownOperation(h));
        }
        if !visiting.insert(h) {
            let mut residual: Vec<OpHash> = visiting.iter().copied().collect();
            residual.sort();
            return Err(GraphError::CycleError(residual));
        }
        closure.insert(h);
        for &p in self.preds.get(&h).into_iter().flatten() {
            self.collect_subgraph(p, visiting, closure)?;
        }
        visiting.remove(&h);
        Ok(())
    }

    /// The execution order: every operation reachable from a target,
    /// topologically sorted, ties broken to minimize latency to the
    /// earliest-added target that needs it (spec §4.7, §9). Empty if no
    /// targets have been added.
    pub fn order(&self) -> Result<Vec<OpHash>, GraphError> {
        if let Some(cached) = self.order_cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        if self.targets.is_empty() {
            return Ok(Vec::new());
        }

        // Phase 1: order the targets against each other.
        let target_set: HashSet<OpHash> = self.targets.iter().copied().collect();
        let mut target_subgraphs = Vec::with_capacity(self.targets.len());
        for &t in &self.targets {
            target_subgraphs.push((t, self.subgraph(t)?));
        }
        let target_preds: HashMap<OpHash, HashSet<OpHash>> = target_subgraphs
            .iter()
            .map(|(t, sub)| (*t, sub.iter().copied().filter(|h| h != t && target_set.contains(h)).collect()))
            .collect();
        let addition_order: HashMap<OpHash, usize> =
            self.targets.iter().enumerate().map(|(i, &h)| (h, i)).collect();
        let target_order = sort::tie_broken_topo_sort(&target_set, &target_preds, &addition_order)?;
        let target_priority: HashMap<OpHash, usize> = target_order.iter().enumerate().map(|(i, &h)| (h, i)).collect();

        // Phase 2: every op gets the priority of the earliest target whose
        // subgraph contains it, then the whole union is sorted with that
        // tie-break.
        let mut nodes: HashSet<OpHash> = HashSet::new();
        let mut priority: HashMap<OpHash, usize> = HashMap::new();
        for &t in &target_order {
            let prio = target_priority[&t];
            let (_, sub) = target_subgraphs.iter().find(|(h, _)| *h == t).expect("target_order is a permutation of targets");
            for &op in sub {
                nodes.insert(op);
                priority.entry(op).or_insert(prio);
            }
        }

        let order = sort::tie_broken_topo_sort(&nodes, &self.preds, &priority)?;
        *self.order_cache.borrow_mut() = Some(order.clone());
        Ok(order)
    }

    /// Walk `order()`, handing each operation to `f` along with its
    /// dependencies' already-computed results, threaded in argument order
    /// (mirroring how the operation's own arguments reference them).
    /// Results are keyed by hash so later operations can look theirs up.
    pub fn execute<R>(&self, mut f: impl FnMut(&Operation, &[&R]) -> R) -> Result<HashMap<OpHash, R>, GraphError> {
        let order = self.order()?;
        let mut results: HashMap<OpHash, R> = HashMap::with_capacity(order.len());
        for h in order {
            let op = &self.ops[&h];
            let deps: Vec<&R> = op.arg_refs().filter_map(|p| results.get(&p)).collect();
            let result = f(op, &deps);
            results.insert(h, result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpArg;

    fn int(n: &str) -> Operation {
        Operation::new("int", vec![OpArg::Literal(n.to_string())])
    }

    #[test]
    fn identical_tuples_fuse() {
        let mut g = Graph::new();
        let a = g.add(int("1"), []);
        let b = g.add(int("1"), []);
        assert_eq!(a, b);
        assert_eq!(g.ops.len(), 1);
    }

    #[test]
    fn order_respects_dependencies_and_reaches_target() {
        // S4: add("int","1")=h1, add("int","2")=h2, add("add",h1,h2)=h3, target h3.
        let mut g = Graph::new();
        let h1 = g.add(int("1"), []);
        let h2 = g.add(int("2"), []);
        let h3 = g.add(Operation::new("add", vec![OpArg::Ref(h1), OpArg::Ref(h2)]), []);
        g.add_target([h3]);

        let order = g.order().unwrap();
        assert_eq!(order.len(), 3);
        let pos = |h: OpHash| order.iter().position(|&x| x == h).unwrap();
        assert!(pos(h1) < pos(h3));
        assert!(pos(h2) < pos(h3));
    }

    #[test]
    fn unrelated_operations_are_excluded_from_order() {
        let mut g = Graph::new();
        let h1 = g.add(int("1"), []);
        let _unrelated = g.add(int("99"), []);
        g.add_target([h1]);
        assert_eq!(g.order().unwrap(), vec![h1]);
    }

    #[test]
    fn explicit_dep_orders_side_effects() {
        // S5: p1=("Print",x), p2=("Print",y) with preds(p2) ⊇ {p1}, both targeted.
        let mut g = Graph::new();
        let p1 = g.add(Operation::new("Print", vec![OpArg::Literal("x".into())]), []);
        let p2 = g.add(Operation::new("Print", vec![OpArg::Literal("y".into())]), [p1]);
        g.add_target([p1, p2]);

        let order = g.order().unwrap();
        let pos = |h: OpHash| order.iter().position(|&x| x == h).unwrap();
        assert!(pos(p1) < pos(p2));
    }

    #[test]
    fn shared_dependency_is_prioritized_by_first_target() {
        // Property 11: targets T1, T2 in that order, shared dep D required by T1;
        // D must appear before any dependency unique to T2.
        let mut g = Graph::new();
        let d = g.add(int("0"), []);
        let t1 = g.add(Operation::new("use", vec![OpArg::Ref(d)]), []);
        let unique_to_t2 = g.add(int("7"), []);
        let t2 = g.add(Operation::new("use2", vec![OpArg::Ref(d), OpArg::Ref(unique_to_t2)]), []);
        g.add_target([t1, t2]);

        let order = g.order().unwrap();
        let pos = |h: OpHash| order.iter().position(|&x| x == h).unwrap();
        assert!(pos(d) < pos(unique_to_t2));
    }

    #[test]
    fn cycle_is_reported_as_an_error() {
        let mut g = Graph::new();
        let a = g.add(int("a"), []);
        // Force a cycle: make `a`'s own predecessor set include a hash that
        // in turn depends back on `a`.
        let b = g.add(Operation::new("b", vec![OpArg::Ref(a)]), []);
        g.preds.get_mut(&a).unwrap().insert(b);
        g.add_target([a]);

        assert!(matches!(g.order(), Err(GraphError::CycleError(_))));
    }

    #[test]
    fn subgraph_query_fails_on_missing_operation() {
        let mut g = Graph::new();
        let ghost = OpHash(0xdead_beef);
        let a = g.add(Operation::new("use", vec![OpArg::Ref(ghost)]), []);
        assert!(matches!(g.subgraph(a), Err(GraphError::UnknownOperation(h)) if h == ghost));
    }
}
