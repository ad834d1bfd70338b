//! Integer-difference-logic encoding: one integer start variable per
//! activity (an STN timepoint), extended precedence edges with energetic
//! lags, start Booleans bound to their integer counterparts, and the same
//! BDD-compiled resource constraints as the propositional path.

use crate::bdd::Robdd;
use crate::bounds::Bounds;
use crate::check::check_valid;
use crate::encode::emit_pb_clauses;
use crate::interrupt::Session;
use crate::measure::{Measurements, SolveOutcome};
use crate::pb::resource_constraints;
use crate::preprocess::{extended_precedence, PrecedenceLags, TimeWindows};
use crate::problem::Problem;
use log::info;
use makespan_sat::lit::Lit;
use makespan_smt::{IdlSolver, SmtResult};
use makespan_stn::Timepoint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub struct SmtEncoder {
    problem: Problem,
    lb: i32,
    ub: i32,
    lags: PrecedenceLags,
    windows: TimeWindows,
    /// False when some start-time window came out empty: the formula is
    /// trivially unsatisfiable.
    feasible: bool,
    /// Start timepoint of each activity.
    s: Vec<Timepoint>,
    /// `y[i][t - es[i]]`: activity `i` starts at `t`, tied to `s[i]` by a
    /// pair of reified difference atoms.
    y: Vec<Vec<Lit>>,
    idl: IdlSolver,
    meas: Measurements,
    stop: Arc<AtomicBool>,
    searching: Arc<AtomicBool>,
    shared: Arc<Mutex<Measurements>>,
}

impl SmtEncoder {
    pub fn new(problem: Problem, bounds: Bounds, file: String) -> SmtEncoder {
        let mut meas = Measurements::new(file);
        let (lags, windows) = extended_precedence(&problem, bounds.ub);
        let feasible = windows.feasible();

        let stop = Arc::new(AtomicBool::new(false));
        let mut idl = IdlSolver::new();
        idl.set_interrupt_flag(stop.clone());

        let mut s = Vec::with_capacity(problem.njobs);
        if feasible {
            for i in 0..problem.njobs {
                // the source is pinned to 0; the others range over their
                // start-time window
                let tp = if i == problem.source() {
                    idl.new_timepoint(0, 0)
                } else {
                    idl.new_timepoint(windows.es[i], windows.ls[i])
                };
                s.push(tp);
                meas.n_intv += 1;
            }
        }

        let shared = Arc::new(Mutex::new(meas.clone()));
        SmtEncoder {
            problem,
            lb: bounds.lb,
            ub: bounds.ub,
            lags,
            windows,
            feasible,
            s,
            y: Vec::new(),
            idl,
            meas,
            stop,
            searching: Arc::new(AtomicBool::new(false)),
            shared,
        }
    }

    pub fn session(&self) -> Session {
        Session {
            stop: self.stop.clone(),
            searching: self.searching.clone(),
            measurements: self.shared.clone(),
        }
    }

    pub fn result_line(&self) -> String {
        self.meas.result_line()
    }

    pub fn encode(&mut self) {
        let started = Instant::now();
        if self.feasible {
            self.bind_start_variables();
            self.assert_precedence_edges();
            self.assert_resource_clauses();
        }
        self.meas.t_enc = started.elapsed().as_millis() as u64;
        self.sync_shared();
    }

    /// Creates `y[i, t]` and ties it to `s[i] = t`: `y -> s <= t`,
    /// `y -> s >= t`, and `(s <= t) & (s >= t) -> y`.
    fn bind_start_variables(&mut self) {
        let origin = self.idl.origin();
        for i in 0..self.problem.njobs {
            let tp = self.s[i];
            let mut row = Vec::with_capacity(self.windows.stw_len(i));
            for t in self.windows.es[i]..=self.windows.ls[i] {
                let y = self.idl.new_bvar().true_lit();
                let below = self.idl.reify(origin, tp, t);
                let above = self.idl.reify(tp, origin, -t);
                self.idl.add_clause(&[!y, below]);
                self.idl.add_clause(&[!y, above]);
                self.idl.add_clause(&[!below, !above, y]);
                self.meas.n_boolv += 3;
                self.meas.n_clause += 3;
                row.push(y);
            }
            self.y.push(row);
        }
    }

    /// Permanently asserts `s[j] - s[i] >= lag[i][j]` for every extended
    /// successor pair.
    fn assert_precedence_edges(&mut self) {
        for i in 0..self.problem.njobs {
            for jx in 0..self.lags.estar[i].len() {
                let j = self.lags.estar[i][jx];
                if i == j {
                    continue;
                }
                self.idl.enforce(self.s[j], self.s[i], -self.lags.lag[i][j]);
            }
        }
    }

    fn assert_resource_clauses(&mut self) {
        let pbs = resource_constraints(&self.problem, &self.windows, self.ub);
        info!("compiling {} pseudo-boolean capacity constraints", pbs.len());
        for pb in &pbs {
            let robdd = Robdd::compile(pb);
            let (n_aux, n_clauses) = emit_pb_clauses(&robdd, &self.y, &mut self.idl);
            self.meas.n_boolv += n_aux;
            self.meas.n_clause += n_clauses;
        }
    }

    /// Destructive upper-bound optimisation: after each model, permanently
    /// bound the sink start below the achieved makespan and re-check.
    pub fn optimise(&mut self) -> SolveOutcome {
        if !self.feasible {
            self.meas.schedule.clear();
            self.meas.certified = true;
            self.sync_shared();
            return SolveOutcome::Infeasible;
        }
        let origin = self.idl.origin();
        let sink_tp = self.s[self.problem.sink()];

        match self.check() {
            SmtResult::Sat => {
                let schedule = self.extract_schedule();
                self.record_model(schedule);
            }
            SmtResult::Interrupted => {
                self.sync_shared();
                return SolveOutcome::Interrupted { best: None };
            }
            SmtResult::Unsat => {
                self.meas.schedule.clear();
                self.meas.certified = true;
                self.sync_shared();
                return SolveOutcome::Infeasible;
            }
        }

        self.ub = self.meas.makespan() - 1;
        while self.ub >= self.lb {
            info!("makespan {}, tightening to {}", self.meas.makespan(), self.ub);
            self.idl.reset();
            self.idl.enforce(origin, sink_tp, self.ub);
            match self.check() {
                SmtResult::Sat => {
                    let schedule = self.extract_schedule();
                    self.record_model(schedule);
                    self.ub = self.meas.makespan() - 1;
                }
                SmtResult::Interrupted => {
                    self.sync_shared();
                    return SolveOutcome::Interrupted {
                        best: Some(self.meas.schedule.clone()),
                    };
                }
                SmtResult::Unsat => break,
            }
        }

        self.meas.certified = true;
        self.sync_shared();
        SolveOutcome::Optimal {
            schedule: self.meas.schedule.clone(),
        }
    }

    fn check(&mut self) -> SmtResult {
        let started = Instant::now();
        self.searching.store(true, Ordering::SeqCst);
        let result = self.idl.solve();
        self.searching.store(false, Ordering::SeqCst);
        self.meas.t_search += started.elapsed().as_millis() as u64;
        result
    }

    /// The schedule is the integer value of each start timepoint in the
    /// theory-consistent model.
    fn extract_schedule(&self) -> Vec<i32> {
        (0..self.problem.njobs).map(|i| self.idl.lb(self.s[i])).collect()
    }

    fn record_model(&mut self, schedule: Vec<i32>) {
        self.meas.valid = check_valid(&self.problem, &schedule);
        self.meas.schedule = schedule;
        self.sync_shared();
    }

    fn sync_shared(&self) {
        *self.shared.lock().unwrap() = self.meas.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;

    fn chain_problem() -> Problem {
        let mut p = Problem::new(3, 10, 1);
        p.add_precedence(0, 1);
        p.add_precedence(1, 2);
        p.durations = vec![0, 2, 0];
        p.requests[1][0] = vec![1, 1];
        p.capacities[0] = vec![1; 10];
        p
    }

    #[test]
    fn optimises_a_chain() {
        let p = chain_problem();
        let mut enc = SmtEncoder::new(p, Bounds { lb: 2, ub: 10 }, "test".into());
        enc.encode();
        match enc.optimise() {
            SolveOutcome::Optimal { schedule } => assert_eq!(schedule, vec![0, 0, 2]),
            other => panic!("expected optimal outcome, got {:?}", other),
        }
        assert!(enc.meas.certified);
        assert!(enc.meas.valid);
        assert_eq!(enc.meas.n_intv, 3);
    }

    #[test]
    fn optimises_under_contention() {
        let mut p = Problem::new(4, 10, 1);
        p.add_precedence(0, 1);
        p.add_precedence(0, 2);
        p.add_precedence(1, 3);
        p.add_precedence(2, 3);
        p.durations = vec![0, 3, 3, 0];
        p.requests[1][0] = vec![1, 1, 1];
        p.requests[2][0] = vec![1, 1, 1];
        p.capacities[0] = vec![1; 10];

        let mut enc = SmtEncoder::new(p, Bounds { lb: 3, ub: 10 }, "test".into());
        enc.encode();
        match enc.optimise() {
            SolveOutcome::Optimal { schedule } => {
                assert_eq!(schedule[3], 6);
                assert!(schedule == vec![0, 0, 3, 6] || schedule == vec![0, 3, 0, 6]);
            }
            other => panic!("expected optimal outcome, got {:?}", other),
        }
    }

    #[test]
    fn empty_windows_are_certified_infeasible() {
        let mut p = Problem::new(4, 4, 1);
        p.add_precedence(0, 1);
        p.add_precedence(0, 2);
        p.add_precedence(1, 3);
        p.add_precedence(2, 3);
        p.durations = vec![0, 3, 3, 0];
        p.requests[1][0] = vec![1, 1, 1];
        p.requests[2][0] = vec![1, 1, 1];
        p.capacities[0] = vec![1; 4];

        let mut enc = SmtEncoder::new(p, Bounds { lb: 0, ub: 4 }, "test".into());
        enc.encode();
        assert_eq!(enc.optimise(), SolveOutcome::Infeasible);
        assert!(enc.meas.certified);
    }
}
