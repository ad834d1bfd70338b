//! Encoders turning a preprocessed instance into a back-end formula, plus
//! the destructive optimisation driver embedded in each of them.

pub mod sat;
pub mod smt;
pub mod wcnf;

pub use self::sat::SatEncoder;
pub use self::smt::SmtEncoder;

use crate::bdd::{BddNode, Robdd, FALSE_NODE, TRUE_NODE};
use crate::interrupt::Session;
use crate::measure::SolveOutcome;
use makespan_sat::lit::Lit;

/// Back-end selection: either the pure propositional encoding or the
/// integer-difference-logic one. Both expose the same operations.
pub enum Encoder {
    Sat(SatEncoder),
    Smt(SmtEncoder),
}

impl Encoder {
    pub fn encode(&mut self) {
        match self {
            Encoder::Sat(e) => e.encode(),
            Encoder::Smt(e) => e.encode(),
        }
    }

    pub fn optimise(&mut self) -> SolveOutcome {
        match self {
            Encoder::Sat(e) => e.optimise(),
            Encoder::Smt(e) => e.optimise(),
        }
    }

    /// Handles to register with the signal watcher.
    pub fn session(&self) -> Session {
        match self {
            Encoder::Sat(e) => e.session(),
            Encoder::Smt(e) => e.session(),
        }
    }

    pub fn result_line(&self) -> String {
        match self {
            Encoder::Sat(e) => e.result_line(),
            Encoder::Smt(e) => e.result_line(),
        }
    }
}

/// Destination of the clauses compiled from a PB constraint. Both back-ends
/// allocate fresh Boolean variables for the ROBDD auxiliaries.
pub(crate) trait PbSink {
    fn fresh_var(&mut self) -> Lit;
    fn clause(&mut self, disjuncts: &[Lit]);
}

impl PbSink for makespan_sat::Solver {
    fn fresh_var(&mut self) -> Lit {
        self.add_var().true_lit()
    }
    fn clause(&mut self, disjuncts: &[Lit]) {
        self.add_clause(disjuncts);
    }
}

impl PbSink for makespan_smt::IdlSolver {
    fn fresh_var(&mut self) -> Lit {
        self.new_bvar().true_lit()
    }
    fn clause(&mut self, disjuncts: &[Lit]) {
        self.add_clause(disjuncts);
    }
}

/// Emits the CNF clauses enforcing a PB constraint through its ROBDD: per
/// reachable internal node `n` with selector `v` and children `f`/`t`,
/// `a(f) | !a(n)` and `a(t) | !v | !a(n)`, plus the three unit clauses
/// pinning the root and the terminals. Auxiliary variables are created on
/// first reference. Emits nothing when the false terminal is unreachable
/// (the constraint cannot be falsified).
///
/// Returns the number of auxiliary variables and clauses created.
pub(crate) fn emit_pb_clauses<S: PbSink>(robdd: &Robdd, y: &[Vec<Lit>], sink: &mut S) -> (i64, i64) {
    let order = robdd.reachable();
    if !order.contains(&FALSE_NODE) {
        return (0, 0);
    }

    let mut aux: Vec<Option<Lit>> = vec![None; robdd.num_nodes()];
    let mut n_aux = 0i64;
    let aux_of = |aux: &mut Vec<Option<Lit>>, n_aux: &mut i64, sink: &mut S, id: u32| -> Lit {
        match aux[id as usize] {
            Some(l) => l,
            None => {
                let l = sink.fresh_var();
                aux[id as usize] = Some(l);
                *n_aux += 1;
                l
            }
        }
    };

    let mut n_clauses = 0i64;
    for &id in &order {
        if let BddNode::Internal { selector, lo, hi } = robdd.node(id) {
            let sel = y[selector.job][selector.offset];
            let a_lo = aux_of(&mut aux, &mut n_aux, sink, lo);
            let a_hi = aux_of(&mut aux, &mut n_aux, sink, hi);
            let a_n = aux_of(&mut aux, &mut n_aux, sink, id);
            sink.clause(&[a_lo, !a_n]);
            sink.clause(&[a_hi, !sel, !a_n]);
            n_clauses += 2;
        }
    }
    let a_root = aux_of(&mut aux, &mut n_aux, sink, robdd.root());
    let a_false = aux_of(&mut aux, &mut n_aux, sink, FALSE_NODE);
    let a_true = aux_of(&mut aux, &mut n_aux, sink, TRUE_NODE);
    sink.clause(&[a_root]);
    sink.clause(&[!a_false]);
    sink.clause(&[a_true]);
    n_clauses += 3;

    (n_aux, n_clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb::{PbConstraint, StartVar};
    use makespan_sat::{SearchResult, Solver};

    /// The CNF emitted for a PB constraint must be equisatisfiable with the
    /// inequality under every assignment of the y variables.
    #[test]
    fn emitted_cnf_matches_the_inequality() {
        let coefs = [2i32, 3, 4];
        let cap = 5;
        let n = coefs.len();

        for bits in 0..(1u32 << n) {
            let mut solver = Solver::default();
            let y: Vec<Vec<Lit>> = (0..n).map(|_| vec![solver.add_var().true_lit()]).collect();

            let mut c = PbConstraint::new(cap);
            for (i, &q) in coefs.iter().enumerate() {
                c.push_term(q, StartVar { job: i, offset: 0 });
            }
            let robdd = Robdd::compile(&c);
            let (n_aux, n_clauses) = emit_pb_clauses(&robdd, &y, &mut solver);
            assert!(n_aux > 0 && n_clauses > 0);

            // pin the assignment
            let mut lhs = 0;
            for i in 0..n {
                if bits & (1 << i) != 0 {
                    solver.add_clause(&[y[i][0]]);
                    lhs += coefs[i];
                } else {
                    solver.add_clause(&[!y[i][0]]);
                }
            }
            let expected = lhs <= cap;
            let result = solver.solve();
            if expected {
                assert_eq!(result, SearchResult::Solved, "bits {:b} should satisfy", bits);
            } else {
                assert_eq!(result, SearchResult::Unsolvable, "bits {:b} should violate", bits);
            }
        }
    }

    #[test]
    fn unfalsifiable_constraints_emit_nothing() {
        let mut solver = Solver::default();
        let y = vec![vec![solver.add_var().true_lit()], vec![solver.add_var().true_lit()]];
        let mut c = PbConstraint::new(10);
        c.push_term(1, StartVar { job: 0, offset: 0 });
        c.push_term(1, StartVar { job: 1, offset: 0 });
        let robdd = Robdd::compile(&c);
        let (n_aux, n_clauses) = emit_pb_clauses(&robdd, &y, &mut solver);
        assert_eq!((n_aux, n_clauses), (0, 0));
        assert_eq!(solver.num_vars(), 2);
    }
}
