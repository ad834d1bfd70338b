//! Pure propositional encoding: start variables `y[i, s]`, process
//! variables `x[i, t]`, Horbach-style precedence clauses and BDD-compiled
//! resource constraints, discharged by the CDCL back-end in multi-check
//! mode.

use crate::bdd::Robdd;
use crate::bounds::Bounds;
use crate::check::check_valid;
use crate::encode::emit_pb_clauses;
use crate::interrupt::Session;
use crate::measure::{Measurements, SolveOutcome};
use crate::pb::resource_constraints;
use crate::preprocess::{critical_path_windows, TimeWindows};
use crate::problem::Problem;
use log::{error, info};
use makespan_sat::lit::Lit;
use makespan_sat::{SearchResult, Solver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub struct SatEncoder {
    problem: Problem,
    lb: i32,
    ub: i32,
    /// `None` when preprocessing already proved the instance infeasible
    /// under the initial upper bound (the formula is trivially false).
    windows: Option<TimeWindows>,
    /// `y[i][s - es[i]]`: activity `i` starts at `s`.
    y: Vec<Vec<Lit>>,
    /// `x[i][t - es[i]]`: activity `i` is running at `t`.
    x: Vec<Vec<Lit>>,
    solver: Solver,
    meas: Measurements,
    stop: Arc<AtomicBool>,
    searching: Arc<AtomicBool>,
    shared: Arc<Mutex<Measurements>>,
}

impl SatEncoder {
    pub fn new(problem: Problem, bounds: Bounds, file: String) -> SatEncoder {
        let mut meas = Measurements::new(file);
        let windows = critical_path_windows(&problem, bounds.ub);

        let stop = Arc::new(AtomicBool::new(false));
        let mut solver = Solver::default();
        solver.set_interrupt_flag(stop.clone());

        let mut y = Vec::with_capacity(problem.njobs);
        let mut x = Vec::with_capacity(problem.njobs);
        if let Some(w) = &windows {
            for i in 0..problem.njobs {
                let row = (w.es[i]..=w.ls[i]).map(|_| solver.add_var().true_lit()).collect::<Vec<_>>();
                meas.n_boolv += row.len() as i64;
                y.push(row);
            }
            for i in 0..problem.njobs {
                let row = (w.es[i]..=w.lc[i]).map(|_| solver.add_var().true_lit()).collect::<Vec<_>>();
                meas.n_boolv += row.len() as i64;
                x.push(row);
            }
        }

        let shared = Arc::new(Mutex::new(meas.clone()));
        SatEncoder {
            problem,
            lb: bounds.lb,
            ub: bounds.ub,
            windows,
            y,
            x,
            solver,
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

    /// Asserts the full formula into the back-end.
    pub fn encode(&mut self) {
        let started = Instant::now();
        if let Some(windows) = self.windows.clone() {
            self.assert_precedence_clauses(&windows);
            self.assert_resource_clauses(&windows);
        }
        self.meas.t_enc = started.elapsed().as_millis() as u64;
        self.sync_shared();
    }

    fn assert_precedence_clauses(&mut self, w: &TimeWindows) {
        let n = self.problem.njobs;

        // starting at s implies running during [s, s + duration)
        for i in 0..n {
            for s in w.es[i]..=w.ls[i] {
                for t in s..s + self.problem.durations[i] {
                    let y = self.y[i][(s - w.es[i]) as usize];
                    let x = self.x[i][(t - w.es[i]) as usize];
                    self.solver.add_clause(&[!y, x]);
                    self.meas.n_clause += 1;
                }
            }
        }

        // the source starts at 0
        self.solver.add_clause(&[self.y[0][0]]);
        self.meas.n_clause += 1;

        // a start of i at s requires each predecessor j to have started
        // early enough to be finished; resource gaps make starts beyond
        // s - duration(j) impossible but anything earlier acceptable
        let mut clause: Vec<Lit> = Vec::new();
        for i in 1..n {
            for p in 0..self.problem.predecessors[i].len() {
                let j = self.problem.predecessors[i][p];
                for s in w.es[i]..=w.ls[i] {
                    clause.clear();
                    clause.push(!self.y[i][(s - w.es[i]) as usize]);
                    let latest = (s - self.problem.durations[j]).min(w.ls[j]);
                    for t in w.es[j]..=latest {
                        clause.push(self.y[j][(t - w.es[j]) as usize]);
                    }
                    self.solver.add_clause(&clause);
                    self.meas.n_clause += 1;
                }
            }
        }

        // every non-source activity starts somewhere in its window
        for i in 1..n {
            clause.clear();
            for s in w.es[i]..=w.ls[i] {
                clause.push(self.y[i][(s - w.es[i]) as usize]);
            }
            self.solver.add_clause(&clause);
            self.meas.n_clause += 1;
        }

        // redundant run-continuity clauses: once running, an activity keeps
        // running or it has just started at the latest possible moment
        for i in 0..n {
            let duration = self.problem.durations[i];
            for c in w.ec[i]..w.lc[i] {
                let x_c = self.x[i][(c - w.es[i]) as usize];
                let x_next = self.x[i][(c + 1 - w.es[i]) as usize];
                let y_start = self.y[i][(c - duration + 1 - w.es[i]) as usize];
                self.solver.add_clause(&[!x_c, x_next, y_start]);
                self.meas.n_clause += 1;
            }
        }
    }

    fn assert_resource_clauses(&mut self, w: &TimeWindows) {
        let pbs = resource_constraints(&self.problem, w, self.ub);
        info!("compiling {} pseudo-boolean capacity constraints", pbs.len());
        for pb in &pbs {
            let robdd = Robdd::compile(pb);
            let (n_aux, n_clauses) = emit_pb_clauses(&robdd, &self.y, &mut self.solver);
            self.meas.n_boolv += n_aux;
            self.meas.n_clause += n_clauses;
        }
    }

    /// Destructive upper-bound optimisation: repeatedly forbid all sink
    /// starts above the best makespan until the formula becomes
    /// unsatisfiable or the lower bound is crossed.
    pub fn optimise(&mut self) -> SolveOutcome {
        let windows = match self.windows.clone() {
            Some(w) => w,
            None => {
                self.meas.schedule.clear();
                self.meas.certified = true;
                self.sync_shared();
                return SolveOutcome::Infeasible;
            }
        };
        let sink = self.problem.sink();

        match self.check() {
            SearchResult::Solved => {
                let schedule = self.extract_schedule(&windows);
                self.record_model(schedule);
            }
            SearchResult::Interrupted => {
                self.sync_shared();
                return SolveOutcome::Interrupted { best: None };
            }
            SearchResult::Unsolvable => {
                self.meas.schedule.clear();
                self.meas.certified = true;
                self.sync_shared();
                return SolveOutcome::Infeasible;
            }
        }

        let mut ub_old = self.ub;
        self.ub = self.meas.makespan() - 1;

        while self.ub >= self.lb {
            info!("makespan {}, tightening to {}", self.meas.makespan(), self.ub);
            for s in (self.ub + 1)..=ub_old {
                if s >= windows.es[sink] && s <= windows.ls[sink] {
                    let lit = self.y[sink][(s - windows.es[sink]) as usize];
                    self.solver.add_clause(&[!lit]);
                    self.meas.n_clause += 1;
                }
            }
            match self.check() {
                SearchResult::Solved => {
                    let schedule = self.extract_schedule(&windows);
                    self.record_model(schedule);
                    ub_old = self.ub;
                    self.ub = self.meas.makespan() - 1;
                }
                SearchResult::Interrupted => {
                    self.sync_shared();
                    return SolveOutcome::Interrupted {
                        best: Some(self.meas.schedule.clone()),
                    };
                }
                SearchResult::Unsolvable => break,
            }
        }

        self.meas.certified = true;
        self.sync_shared();
        SolveOutcome::Optimal {
            schedule: self.meas.schedule.clone(),
        }
    }

    /// One satisfiability check, with the searching flag raised for the
    /// signal watcher and the time charged to the search budget.
    fn check(&mut self) -> SearchResult {
        let started = Instant::now();
        self.searching.store(true, Ordering::SeqCst);
        let result = self.solver.solve();
        self.searching.store(false, Ordering::SeqCst);
        self.meas.t_search += started.elapsed().as_millis() as u64;
        result
    }

    /// Reads the schedule off the model: the unique true start variable per
    /// activity.
    fn extract_schedule(&self, w: &TimeWindows) -> Vec<i32> {
        let mut schedule = Vec::with_capacity(self.problem.njobs);
        for i in 0..self.problem.njobs {
            let mut start = None;
            for (offset, &lit) in self.y[i].iter().enumerate() {
                if self.solver.value_of(lit) == Some(true) {
                    start = Some(w.es[i] + offset as i32);
                    break;
                }
            }
            match start {
                Some(s) => schedule.push(s),
                None => {
                    error!("job {} was not started in the model", i);
                    schedule.push(w.es[i]);
                }
            }
        }
        schedule
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

    fn contention_problem(horizon: i32) -> Problem {
        let mut p = Problem::new(4, horizon, 1);
        p.add_precedence(0, 1);
        p.add_precedence(0, 2);
        p.add_precedence(1, 3);
        p.add_precedence(2, 3);
        p.durations = vec![0, 3, 3, 0];
        p.requests[1][0] = vec![1, 1, 1];
        p.requests[2][0] = vec![1, 1, 1];
        p.capacities[0] = vec![1; horizon as usize];
        p
    }

    #[test]
    fn optimises_serial_schedule_under_contention() {
        let p = contention_problem(10);
        let mut enc = SatEncoder::new(p, Bounds { lb: 0, ub: 10 }, "test".into());
        enc.encode();
        match enc.optimise() {
            SolveOutcome::Optimal { schedule } => {
                assert_eq!(schedule[0], 0);
                assert_eq!(schedule[3], 6);
                assert!(schedule == vec![0, 0, 3, 6] || schedule == vec![0, 3, 0, 6]);
            }
            other => panic!("expected optimal outcome, got {:?}", other),
        }
        assert!(enc.meas.certified);
        assert!(enc.meas.valid);
    }

    #[test]
    fn unsatisfiable_bound_is_certified_infeasible() {
        // six units of serial work cannot fit below a horizon of 4
        let p = contention_problem(4);
        let mut enc = SatEncoder::new(p, Bounds { lb: 0, ub: 4 }, "test".into());
        enc.encode();
        assert_eq!(enc.optimise(), SolveOutcome::Infeasible);
        assert!(enc.meas.certified);
        assert!(enc.meas.schedule.is_empty());
        assert_eq!(enc.meas.makespan(), -1);
    }

    #[test]
    fn interrupt_before_search_reports_no_model() {
        let p = contention_problem(10);
        let mut enc = SatEncoder::new(p, Bounds { lb: 0, ub: 10 }, "test".into());
        enc.encode();
        enc.stop.store(true, Ordering::SeqCst);
        assert_eq!(enc.optimise(), SolveOutcome::Interrupted { best: None });
        assert!(!enc.meas.certified);
    }
}
