//! Lazy SMT over integer difference logic.
//!
//! Combines the CDCL core of `makespan_sat` with the temporal network of
//! `makespan_stn`: difference constraints are reified into propositional
//! literals, a full propositional model activates the corresponding edges,
//! and every theory inconsistency is returned to the SAT solver as a
//! conflict clause over the enabling literals.

use log::debug;
use makespan_sat::lit::{BVar, Lit};
use makespan_sat::{SearchResult, Solver as SatSolver};
use makespan_stn::{BacktrackMark, EdgeId, NetworkStatus, Stn, Timepoint, W};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum SmtResult {
    /// The last propositional model is theory-consistent; timepoint values
    /// can be read with [`IdlSolver::lb`].
    Sat,
    Unsat,
    Interrupted,
}

/// Two-way binding between propositional literals and difference-logic
/// edges. A literal may enable several edges; an edge is enabled by at most
/// one literal.
#[derive(Default)]
struct Bindings {
    edges_of: HashMap<Lit, Vec<EdgeId>>,
    literal_of: HashMap<EdgeId, Lit>,
}

impl Bindings {
    fn bind(&mut self, lit: Lit, edge: EdgeId) {
        debug_assert!(!self.literal_of.contains_key(&edge));
        self.literal_of.insert(edge, lit);
        self.edges_of.entry(lit).or_insert_with(|| Vec::with_capacity(1)).push(edge);
    }

    fn edges_of(&self, lit: Lit) -> &[EdgeId] {
        self.edges_of.get(&lit).map(Vec::as_slice).unwrap_or(&[])
    }

    fn literal_of(&self, edge: EdgeId) -> Option<Lit> {
        self.literal_of.get(&edge).copied()
    }
}

pub struct IdlSolver {
    pub sat: SatSolver,
    stn: Stn,
    bindings: Bindings,
    /// Mark separating the permanent part of the network (bounds, always-on
    /// edges) from the per-model activations. Established by the first
    /// check, cleared by [`IdlSolver::reset`].
    base: Option<BacktrackMark>,
}

impl Default for IdlSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdlSolver {
    pub fn new() -> Self {
        IdlSolver {
            sat: SatSolver::default(),
            stn: Stn::new(),
            bindings: Bindings::default(),
            base: None,
        }
    }

    pub fn set_interrupt_flag(&mut self, flag: Arc<AtomicBool>) {
        self.sat.set_interrupt_flag(flag);
    }

    pub fn origin(&self) -> Timepoint {
        makespan_stn::ORIGIN
    }

    /// Creates an integer timepoint with the given (inclusive) domain.
    pub fn new_timepoint(&mut self, lb: W, ub: W) -> Timepoint {
        debug_assert!(self.base.is_none(), "timepoints must precede the first check");
        self.stn.add_timepoint(lb, ub)
    }

    pub fn num_timepoints(&self) -> u32 {
        self.stn.num_timepoints()
    }

    /// Creates a fresh propositional variable.
    pub fn new_bvar(&mut self) -> BVar {
        self.sat.add_var()
    }

    /// Permanently asserts `target - source <= weight`.
    pub fn enforce(&mut self, source: Timepoint, target: Timepoint, weight: W) {
        debug_assert!(self.base.is_none(), "permanent edges must precede the check (use reset)");
        self.stn.add_edge(source, target, weight);
    }

    /// Reifies `target - source <= weight` into a literal: when the literal
    /// is true the edge is active, when it is false its negation
    /// (`source - target <= -weight - 1`) is.
    pub fn reify(&mut self, source: Timepoint, target: Timepoint, weight: W) -> Lit {
        debug_assert!(self.base.is_none(), "bindings must precede the first check");
        let lit = self.sat.add_var().true_lit();
        let edge = self.stn.add_inactive_edge(source, target, weight);
        let negated = self.stn.add_inactive_edge(target, source, -weight - 1);
        self.bindings.bind(lit, edge);
        self.bindings.bind(!lit, negated);
        lit
    }

    pub fn add_clause(&mut self, disjuncts: &[Lit]) {
        self.sat.add_clause(disjuncts);
    }

    pub fn value_of(&self, lit: Lit) -> Option<bool> {
        self.sat.value_of(lit)
    }

    /// Value of the timepoint in the current model (its lower bound in the
    /// propagated network). Meaningful only after [`SmtResult::Sat`].
    pub fn lb(&self, tp: Timepoint) -> W {
        self.stn.lb(tp)
    }

    /// Returns to the permanent state: the SAT solver backtracks to its root
    /// and the network drops all per-model activations. New permanent edges
    /// may be asserted afterwards.
    pub fn reset(&mut self) {
        self.sat.backtrack_to_root();
        if let Some(base) = self.base.take() {
            self.stn.backtrack_to(base);
        }
    }

    /// Checks satisfiability modulo the difference-logic theory.
    pub fn solve(&mut self) -> SmtResult {
        if self.base.is_none() {
            // the permanent part alone must be consistent
            match self.stn.propagate_all() {
                NetworkStatus::Inconsistent(_) => {
                    // make the unsatisfiability sticky on the SAT side as well
                    self.sat.add_clause(&[]);
                    return SmtResult::Unsat;
                }
                NetworkStatus::Consistent => {
                    self.base = Some(self.stn.set_backtrack_point());
                }
            }
        }
        loop {
            match self.sat.solve() {
                SearchResult::Unsolvable => return SmtResult::Unsat,
                SearchResult::Interrupted => return SmtResult::Interrupted,
                SearchResult::Solved => {
                    let base = self.base.take().unwrap();
                    self.stn.backtrack_to(base);
                    self.base = Some(self.stn.set_backtrack_point());

                    // activate the edges entailed by the model, in the order
                    // the literals were set so that explanations stay small
                    for lit in self.sat.model_literals() {
                        for &edge in self.bindings.edges_of(lit) {
                            self.stn.mark_active(edge);
                        }
                    }
                    match self.stn.propagate_all() {
                        NetworkStatus::Consistent => return SmtResult::Sat,
                        NetworkStatus::Inconsistent(culprits) => {
                            let clause: Vec<Lit> = culprits
                                .iter()
                                .filter_map(|&e| self.bindings.literal_of(e))
                                .map(|l| !l)
                                .collect();
                            debug!("theory conflict over {} literals", clause.len());
                            self.sat.add_forgettable_clause(&clause);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn permanent_difference_chain() {
        let mut idl = IdlSolver::new();
        let a = idl.new_timepoint(0, 10);
        let b = idl.new_timepoint(0, 10);
        // b - a >= 3, i.e. a - b <= -3
        idl.enforce(b, a, -3);
        assert_eq!(idl.solve(), SmtResult::Sat);
        assert_eq!(idl.lb(a), 0);
        assert_eq!(idl.lb(b), 3);
    }

    #[test]
    fn inconsistent_permanent_part() {
        let mut idl = IdlSolver::new();
        let a = idl.new_timepoint(0, 10);
        let b = idl.new_timepoint(0, 10);
        let c = idl.new_timepoint(0, 10);
        // a < b < c < a
        idl.enforce(b, a, -1);
        idl.enforce(c, b, -1);
        idl.enforce(a, c, -1);
        assert_eq!(idl.solve(), SmtResult::Unsat);
    }

    #[test]
    fn conflicting_reified_atoms() {
        let mut idl = IdlSolver::new();
        let origin = idl.origin();
        let x = idl.new_timepoint(0, 5);
        let le2 = idl.reify(origin, x, 2); // x <= 2
        let ge3 = idl.reify(x, origin, -3); // x >= 3
        idl.add_clause(&[le2]);
        idl.add_clause(&[ge3]);
        assert_eq!(idl.solve(), SmtResult::Unsat);
    }

    #[test]
    fn theory_prunes_to_the_feasible_disjunct() {
        let mut idl = IdlSolver::new();
        let origin = idl.origin();
        let x = idl.new_timepoint(0, 5);
        let le2 = idl.reify(origin, x, 2); // x <= 2
        let ge3 = idl.reify(x, origin, -3); // x >= 3
        idl.add_clause(&[le2, ge3]);
        // x >= 4 rules out the first disjunct
        idl.enforce(x, origin, -4);
        assert_eq!(idl.solve(), SmtResult::Sat);
        assert_eq!(idl.value_of(ge3), Some(true));
        assert_eq!(idl.lb(x), 4);
    }

    #[test]
    fn tightening_after_reset() {
        let mut idl = IdlSolver::new();
        let origin = idl.origin();
        let x = idl.new_timepoint(0, 10);
        let ge4 = idl.reify(x, origin, -4); // x >= 4
        idl.add_clause(&[ge4]);
        assert_eq!(idl.solve(), SmtResult::Sat);
        assert_eq!(idl.lb(x), 4);

        idl.reset();
        idl.enforce(origin, x, 3); // x <= 3
        assert_eq!(idl.solve(), SmtResult::Unsat);
    }

    #[test]
    fn interruption_is_reported() {
        let mut idl = IdlSolver::new();
        let origin = idl.origin();
        let x = idl.new_timepoint(0, 5);
        let l = idl.reify(origin, x, 2);
        idl.add_clause(&[l, !l]);
        let flag = Arc::new(AtomicBool::new(true));
        idl.set_interrupt_flag(flag.clone());
        assert_eq!(idl.solve(), SmtResult::Interrupted);
        flag.store(false, Ordering::Relaxed);
        assert_eq!(idl.solve(), SmtResult::Sat);
    }
}
