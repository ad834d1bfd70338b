//! Compilation of pseudo-Boolean constraints into ROBDDs.
//!
//! Follows the interval-memoised construction of Abio et al.: for each term
//! index the memo (L-set) maps an interval of residual thresholds to the
//! sub-diagram that all thresholds in the interval share. Nodes live in an
//! arena; the two terminals occupy the fixed indices 0 (false) and 1 (true)
//! and children are index fields.

use crate::pb::{PbConstraint, StartVar};
use crate::{INF, NEG_INF};
use std::collections::BTreeMap;

pub type NodeId = u32;

pub const FALSE_NODE: NodeId = 0;
pub const TRUE_NODE: NodeId = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BddNode {
    Terminal(bool),
    Internal {
        selector: StartVar,
        /// Child for the false assignment of the selector.
        lo: NodeId,
        /// Child for the true assignment of the selector.
        hi: NodeId,
    },
}

/// Interval-indexed memo for one term index: maps the lower endpoint of an
/// interval to its upper endpoint and the shared sub-diagram. Intervals are
/// pairwise disjoint.
struct LSet {
    intervals: BTreeMap<i32, (i32, NodeId)>,
}

impl LSet {
    /// Seeds the level memo with the two trivial outcomes: thresholds at
    /// least the remaining coefficient sum are always satisfiable, negative
    /// thresholds never.
    fn seeded(suffix_sum: i32) -> Self {
        let mut intervals = BTreeMap::new();
        intervals.insert(suffix_sum, (INF, TRUE_NODE));
        intervals.insert(NEG_INF, (-1, FALSE_NODE));
        LSet { intervals }
    }

    fn search(&self, threshold: i32) -> Option<(i32, i32, NodeId)> {
        let (&lo, &(hi, node)) = self.intervals.range(..=threshold).next_back()?;
        if threshold <= hi {
            Some((lo, hi, node))
        } else {
            None
        }
    }

    fn insert(&mut self, lo: i32, hi: i32, node: NodeId) {
        debug_assert!(lo <= hi);
        debug_assert!(
            self.intervals
                .range(..=hi)
                .next_back()
                .map_or(true, |(_, &(prev_hi, _))| prev_hi < lo),
            "overlapping interval inserted into L-set"
        );
        self.intervals.insert(lo, (hi, node));
    }
}

/// A reduced ordered BDD for one PB constraint. Selector order along every
/// root-to-leaf path follows the constraint's term order; isomorphic
/// sub-diagrams are shared through the memo.
pub struct Robdd {
    nodes: Vec<BddNode>,
    root: NodeId,
}

impl Robdd {
    /// Builds the diagram for `c`. The recursion of the reference algorithm
    /// is driven by an explicit stack so that wide constraints cannot
    /// exhaust the call stack.
    pub fn compile(c: &PbConstraint) -> Robdd {
        let n = c.num_terms();
        let mut nodes = vec![BddNode::Terminal(false), BddNode::Terminal(true)];

        let mut memo: Vec<LSet> = (0..=n)
            .map(|i| {
                let suffix: i32 = (i..n).map(|j| c.coef(j)).sum();
                LSet::seeded(suffix)
            })
            .collect();

        enum Frame {
            Enter(usize, i32),
            Combine(usize, i32),
        }

        let mut stack = vec![Frame::Enter(0, c.cap)];
        // (interval low, interval high, node) results of completed frames
        let mut results: Vec<(i32, i32, NodeId)> = Vec::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(i, threshold) => {
                    if let Some(hit) = memo[i].search(threshold) {
                        results.push(hit);
                    } else {
                        stack.push(Frame::Combine(i, threshold));
                        // the false branch is evaluated first, so push it last
                        stack.push(Frame::Enter(i + 1, threshold - c.coef(i)));
                        stack.push(Frame::Enter(i + 1, threshold));
                    }
                }
                Frame::Combine(i, threshold) => {
                    let (t_lo, t_hi, t_node) = results.pop().unwrap();
                    let (f_lo, f_hi, f_node) = results.pop().unwrap();
                    let coef = c.coef(i);
                    let (lo, hi, node) = if (f_lo, f_hi) == (t_lo, t_hi) {
                        // both branches agree on the whole interval: the
                        // selector is irrelevant at this threshold
                        debug_assert_eq!(f_node, t_node);
                        (t_lo + coef, t_hi, t_node)
                    } else {
                        let id = nodes.len() as NodeId;
                        nodes.push(BddNode::Internal {
                            selector: c.var(i),
                            lo: f_node,
                            hi: t_node,
                        });
                        (f_lo.max(t_lo + coef), f_hi.min(t_hi + coef), id)
                    };
                    debug_assert!(lo <= threshold && threshold <= hi);
                    memo[i].insert(lo, hi, node);
                    results.push((lo, hi, node));
                }
            }
        }

        let (_, _, root) = results.pop().unwrap();
        debug_assert!(results.is_empty());
        Robdd { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> BddNode {
        self.nodes[id as usize]
    }

    /// In-order traversal of the nodes reachable from the root, each node
    /// exactly once. The false terminal is absent iff the constraint cannot
    /// be falsified, in which case no clauses are needed for it.
    pub fn reachable(&self) -> Vec<NodeId> {
        enum Visit {
            Explore(NodeId),
            Emit(NodeId),
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![Visit::Explore(self.root)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Explore(id) => {
                    if visited[id as usize] {
                        continue;
                    }
                    visited[id as usize] = true;
                    match self.nodes[id as usize] {
                        BddNode::Terminal(_) => order.push(id),
                        BddNode::Internal { lo, hi, .. } => {
                            stack.push(Visit::Explore(hi));
                            stack.push(Visit::Emit(id));
                            stack.push(Visit::Explore(lo));
                        }
                    }
                }
                Visit::Emit(id) => order.push(id),
            }
        }
        order
    }

    /// Evaluates the diagram under the given assignment of start variables.
    pub fn eval<F: Fn(StartVar) -> bool>(&self, assignment: F) -> bool {
        let mut id = self.root;
        loop {
            match self.nodes[id as usize] {
                BddNode::Terminal(v) => return v,
                BddNode::Internal { selector, lo, hi } => {
                    id = if assignment(selector) { hi } else { lo };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb::PbConstraint;

    fn var(i: usize) -> StartVar {
        StartVar { job: i, offset: 0 }
    }

    fn pb(coefs: &[i32], cap: i32) -> PbConstraint {
        let mut c = PbConstraint::new(cap);
        for (i, &q) in coefs.iter().enumerate() {
            c.push_term(q, var(i));
        }
        c
    }

    /// Checks the diagram against the inequality on all 2^n assignments.
    fn assert_equivalent(coefs: &[i32], cap: i32) {
        let c = pb(coefs, cap);
        let robdd = Robdd::compile(&c);
        let n = coefs.len();
        for bits in 0..(1u32 << n) {
            let lhs: i32 = (0..n).filter(|&i| bits & (1 << i) != 0).map(|i| coefs[i]).sum();
            let expected = lhs <= cap;
            let actual = robdd.eval(|v| bits & (1 << v.job) != 0);
            assert_eq!(actual, expected, "coefs {:?} cap {} bits {:b}", coefs, cap, bits);
        }
    }

    #[test]
    fn diagrams_match_the_inequality() {
        assert_equivalent(&[2, 3, 4], 5);
        assert_equivalent(&[1, 1, 1], 1);
        assert_equivalent(&[1, 1, 1], 2);
        assert_equivalent(&[5, 3, 3, 2], 7);
        assert_equivalent(&[1, 2, 3, 4, 5], 7);
        assert_equivalent(&[7], 3);
        assert_equivalent(&[2, 2], 1);
    }

    #[test]
    fn unfalsifiable_constraint_has_unreachable_false_terminal() {
        let c = pb(&[1, 1], 5);
        let robdd = Robdd::compile(&c);
        assert_eq!(robdd.root(), TRUE_NODE);
        assert!(!robdd.reachable().contains(&FALSE_NODE));
    }

    #[test]
    fn unsatisfiable_constraint_collapses_to_false() {
        let c = pb(&[3, 4], -1);
        let robdd = Robdd::compile(&c);
        assert_eq!(robdd.root(), FALSE_NODE);
    }

    #[test]
    fn selector_order_is_strict_along_paths() {
        let c = pb(&[3, 2, 4, 1], 6);
        let robdd = Robdd::compile(&c);
        fn walk(robdd: &Robdd, id: NodeId, last_job: Option<usize>) {
            if let BddNode::Internal { selector, lo, hi } = robdd.node(id) {
                if let Some(prev) = last_job {
                    assert!(selector.job > prev, "selectors must strictly increase");
                }
                walk(robdd, lo, Some(selector.job));
                walk(robdd, hi, Some(selector.job));
            }
        }
        walk(&robdd, robdd.root(), None);
    }

    #[test]
    fn shared_subdiagrams_keep_the_arena_small() {
        // all-equal coefficients give maximal sharing: the diagram must stay
        // far below the 2^n decision-tree size
        let coefs = vec![1; 12];
        let c = pb(&coefs, 6);
        let robdd = Robdd::compile(&c);
        assert!(robdd.num_nodes() < 100, "got {} nodes", robdd.num_nodes());
    }

    #[test]
    fn memo_intervals_stay_disjoint() {
        // exercised through the debug assertion in LSet::insert
        for cap in 0..12 {
            let c = pb(&[2, 3, 4, 1, 2], cap);
            let _ = Robdd::compile(&c);
        }
    }
}
