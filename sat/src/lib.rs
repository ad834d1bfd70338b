pub mod assignment;
pub mod brancher;
pub mod clause;
pub mod lit;
pub mod stats;

use crate::assignment::{Assignments, DecisionLevel, GROUND_LEVEL};
use crate::brancher::{Brancher, BrancherParams};
use crate::clause::{Clause, ClauseDb, ClauseId, ClausesParams};
use crate::lit::{BVal, BVar, Lit};
use crate::stats::Stats;
use itertools::Itertools;
use makespan_collections::index_map::IndexMap;
use makespan_collections::ToIndex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a satisfiability check.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum SearchResult {
    /// A model was found; query it with [`Solver::value`].
    Solved,
    Unsolvable,
    /// The search was stopped through the interruption flag. The solver can
    /// be queried again later but holds no model.
    Interrupted,
}

#[derive(Copy, Clone, Debug)]
pub struct SearchParams {
    init_nof_conflict: usize,
    /// Given a problem with N clauses, the initial number of allowed learnt
    /// clauses is `init_learnt_base + N * init_learnt_ratio`.
    init_learnt_ratio: f64,
    init_learnt_base: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            init_nof_conflict: 100,
            init_learnt_ratio: 1_f64 / 3_f64,
            init_learnt_base: 1000_f64,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Status {
    Unsolvable,
    Pending,
    Conflict,
    Consistent,
    Solution,
}

/// Result of one run of `search`, before restart handling.
enum SearchOutcome {
    Solved,
    Unsolvable,
    Restart,
    Interrupted,
}

/// CDCL solver supporting the incremental "assert, check, assert more,
/// re-check" pattern: clauses may be added after a model has been found and
/// the next check resumes from the root level.
pub struct Solver {
    assignments: Assignments,
    clauses: ClauseDb,
    watches: IndexMap<Lit, Vec<ClauseId>>,
    propagation_queue: Vec<Lit>,
    brancher: Brancher,
    pub params: SearchParams,
    pub stats: Stats,
    status: Status,
    allowed_conflicts: f64,
    allowed_learnt: f64,
    conflicts_since_restart: usize,
    /// An empty clause was asserted; the problem is trivially unsatisfiable.
    root_unsat: bool,
    /// Clauses added but not yet integrated (no watches set up).
    pending_clauses: VecDeque<ClauseId>,
    /// Buffer reused across propagations to avoid allocations.
    propagation_work_buffer: Vec<ClauseId>,
    /// Cooperative stop flag, polled once per search step.
    interrupt: Arc<AtomicBool>,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(SearchParams::default())
    }
}

impl Solver {
    pub fn new(params: SearchParams) -> Self {
        Solver {
            assignments: Assignments::new(),
            clauses: ClauseDb::new(ClausesParams::default()),
            watches: IndexMap::new_with(0, Vec::new),
            propagation_queue: Vec::new(),
            brancher: Brancher::new(BrancherParams::default()),
            params,
            stats: Stats::default(),
            status: Status::Consistent,
            allowed_conflicts: f64::NAN,
            allowed_learnt: f64::NAN,
            conflicts_since_restart: 0,
            root_unsat: false,
            pending_clauses: VecDeque::new(),
            propagation_work_buffer: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a fresh variable and makes it available to the brancher.
    pub fn add_var(&mut self) -> BVar {
        let var = self.assignments.declare_var();
        self.watches.grow_to(2 * self.assignments.num_vars(), Vec::new());
        self.brancher.declare_var(var);
        var
    }

    pub fn num_vars(&self) -> usize {
        self.assignments.num_vars()
    }

    pub fn variables(&self) -> impl Iterator<Item = BVar> {
        makespan_collections::TypedRange::first(self.num_vars())
    }

    /// Sets the preferred polarity used when deciding on `var`.
    pub fn set_polarity(&mut self, var: BVar, polarity: bool) {
        self.assignments.set_polarity(var, polarity);
    }

    /// Shares the flag that interrupts any running check when set.
    pub fn set_interrupt_flag(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = flag;
    }

    /// Adds a clause that is part of the problem definition.
    pub fn add_clause(&mut self, disjuncts: &[Lit]) {
        self.add_clause_impl(disjuncts, false);
    }

    /// Adds an implied clause that the solver may forget when reducing its
    /// database (e.g. a theory conflict clause).
    pub fn add_forgettable_clause(&mut self, disjuncts: &[Lit]) {
        self.add_clause_impl(disjuncts, true);
    }

    fn add_clause_impl(&mut self, disjuncts: &[Lit], learnt: bool) {
        if disjuncts.is_empty() {
            self.root_unsat = true;
            return;
        }
        let mut cl = Clause::new(disjuncts, learnt);
        cl.simplify();
        if cl.disjuncts.is_empty() {
            // trivially true clause
            return;
        }
        let id = self.clauses.add_clause(cl);
        self.pending_clauses.push_back(id);
        if self.status == Status::Solution {
            self.status = Status::Pending;
        }
    }

    /// Value of `var` in the current (partial) assignment.
    pub fn value(&self, var: BVar) -> Option<bool> {
        self.assignments.value(var).as_bool()
    }

    pub fn value_of(&self, lit: Lit) -> Option<bool> {
        self.assignments.value_of(lit).as_bool()
    }

    /// Literals currently set, in assignment order. After [`SearchResult::Solved`]
    /// this is a total model.
    pub fn model_literals(&self) -> impl Iterator<Item = Lit> + '_ {
        self.assignments.trail().iter().copied()
    }

    pub fn backtrack_to_root(&mut self) {
        self.backtrack_to(GROUND_LEVEL);
        if self.status != Status::Unsolvable {
            self.status = Status::Pending;
        }
    }

    /// Checks satisfiability of the asserted clauses.
    pub fn solve(&mut self) -> SearchResult {
        self.stats.solves += 1;
        if self.root_unsat {
            self.status = Status::Unsolvable;
        }
        match self.status {
            Status::Unsolvable => return SearchResult::Unsolvable,
            Status::Solution if self.pending_clauses.is_empty() => return SearchResult::Solved,
            _ => (),
        }
        if !self.pending_clauses.is_empty() {
            // integrate new clauses from the root
            self.backtrack_to(GROUND_LEVEL);
            self.status = Status::Pending;
        }
        if self.allowed_conflicts.is_nan() {
            self.allowed_conflicts = self.params.init_nof_conflict as f64;
        }
        if self.allowed_learnt.is_nan() {
            self.allowed_learnt =
                self.params.init_learnt_base + self.clauses.num_clauses() as f64 * self.params.init_learnt_ratio;
        }

        loop {
            match self.search() {
                SearchOutcome::Solved => {
                    debug_assert!(self.is_model_valid());
                    return SearchResult::Solved;
                }
                SearchOutcome::Unsolvable => return SearchResult::Unsolvable,
                SearchOutcome::Interrupted => return SearchResult::Interrupted,
                SearchOutcome::Restart => {
                    // no result within the conflict budget, enlarge it
                    debug_assert_eq!(self.assignments.decision_level(), GROUND_LEVEL);
                    self.allowed_conflicts *= 1.5;
                    self.allowed_learnt *= 1.1;
                    self.conflicts_since_restart = 0;
                    self.stats.restarts += 1;
                }
            }
        }
    }

    fn search(&mut self) -> SearchOutcome {
        loop {
            if self.interrupt.load(Ordering::Relaxed) {
                self.backtrack_to(GROUND_LEVEL);
                self.status = Status::Pending;
                self.stats.end_time = Instant::now();
                return SearchOutcome::Interrupted;
            }
            match self.propagate() {
                Some(conflict) => {
                    self.handle_conflict(conflict);
                    match self.status {
                        Status::Unsolvable => {
                            self.stats.end_time = Instant::now();
                            return SearchOutcome::Unsolvable;
                        }
                        Status::Consistent | Status::Pending => (),
                        x => unreachable!("unexpected status after conflict: {:?}", x),
                    }
                    self.clauses.decay_activities();
                    self.brancher.decay_activities();
                }
                None => {
                    if self.clauses.num_learnt() as i64 - self.assignments.num_assigned() as i64
                        >= self.allowed_learnt as i64
                    {
                        let assignments = &self.assignments;
                        let locked: HashSet<ClauseId> = self
                            .variables()
                            .filter_map(|v| assignments.reason(v))
                            .collect();
                        let watches = &mut self.watches;
                        self.clauses.reduce_db(|cl| locked.contains(&cl), watches);
                    }

                    if self.num_vars() == self.assignments.num_assigned() {
                        self.stats.end_time = Instant::now();
                        self.status = Status::Solution;
                        return SearchOutcome::Solved;
                    } else if self.conflicts_since_restart > self.allowed_conflicts as usize {
                        self.backtrack_to(GROUND_LEVEL);
                        self.status = Status::Pending;
                        self.stats.end_time = Instant::now();
                        return SearchOutcome::Restart;
                    } else {
                        let next: BVar = loop {
                            match self.brancher.pop_next_var() {
                                Some(v) if !self.assignments.is_set(v) => break v,
                                Some(_) => continue, // already set, proceed to the next one
                                None => unreachable!("no unset variable in the heap"),
                            }
                        };
                        let polarity = self.assignments.polarity(next);
                        self.decide(next.lit(polarity));
                        self.stats.decisions += 1;
                    }
                }
            }
        }
    }

    fn decide(&mut self, decision: Lit) {
        self.assignments.add_backtrack_point(decision);
        self.assume(decision, None);
    }

    fn assume(&mut self, decision: Lit, reason: Option<ClauseId>) {
        self.assignments.set(decision, reason);
        self.propagation_queue.push(decision);
    }

    /// Returns false if the literal is already false; otherwise records it
    /// (with its reason) and schedules it for propagation.
    fn enqueue(&mut self, lit: Lit, reason: Option<ClauseId>) -> bool {
        if let Some(r) = reason {
            // the reason clause must imply the literal
            debug_assert!(self.clauses[r]
                .disjuncts
                .iter()
                .all(|&l| l == lit || self.assignments.value_of(!l) == BVal::True));
        }
        match self.assignments.value_of(lit) {
            BVal::False => false,
            BVal::True => true,
            BVal::Undef => {
                self.assignments.set(lit, reason);
                self.propagation_queue.push(lit);
                self.status = Status::Pending;
                true
            }
        }
    }

    /// Propagates all pending clauses and enqueued literals. Returns the
    /// violated clause if a conflict is detected.
    pub fn propagate(&mut self) -> Option<ClauseId> {
        while let Some(cl) = self.pending_clauses.pop_front() {
            if let Some(conflict) = self.integrate_clause(cl) {
                self.status = Status::Conflict;
                return Some(conflict);
            }
        }
        self.propagate_enqueued()
    }

    /// Sets up a newly added clause, making no assumption on the state of its
    /// literals.
    fn integrate_clause(&mut self, cl_id: ClauseId) -> Option<ClauseId> {
        debug_assert_eq!(self.assignments.decision_level(), GROUND_LEVEL);
        let clause = &self.clauses[cl_id].disjuncts;
        debug_assert!(!clause.is_empty());
        if clause.len() == 1 {
            let l = clause[0];
            self.watches[!l].push(cl_id);
            return match self.assignments.value_of(l) {
                BVal::Undef => {
                    self.enqueue(l, Some(cl_id));
                    None
                }
                BVal::True => None,
                BVal::False => Some(cl_id),
            };
        }

        self.move_watches_front(cl_id);
        let clause = &self.clauses[cl_id].disjuncts;
        let l0 = clause[0];
        let l1 = clause[1];
        if self.assignments.value_of(l0) == BVal::True {
            // satisfied
            self.set_watch_on_first_literals(cl_id);
            None
        } else if self.assignments.value_of(l0) == BVal::False {
            // violated
            debug_assert!(self.violated(&self.clauses[cl_id].disjuncts));
            self.set_watch_on_first_literals(cl_id);
            Some(cl_id)
        } else if self.assignments.value_of(l1) == BVal::Undef {
            // pending
            self.set_watch_on_first_literals(cl_id);
            None
        } else {
            // unit
            self.integrate_unit_clause(cl_id);
            None
        }
    }

    fn integrate_unit_clause(&mut self, cl_id: ClauseId) {
        debug_assert!(self.unit(&self.clauses[cl_id].disjuncts));
        if self.clauses[cl_id].disjuncts.len() == 1 {
            let l = self.clauses[cl_id].disjuncts[0];
            self.watches[!l].push(cl_id);
            if !self.enqueue(l, None) {
                self.status = Status::Unsolvable;
            }
        } else {
            // first literal is the implied one, all others are false
            self.move_watches_front(cl_id);
            let l = self.clauses[cl_id].disjuncts[0];
            debug_assert!(self.assignments.value_of(l) == BVal::Undef);
            debug_assert!(self.violated(&self.clauses[cl_id].disjuncts[1..]));
            self.set_watch_on_first_literals(cl_id);
            let enqueued = self.enqueue(l, Some(cl_id));
            debug_assert!(enqueued);
        }
    }

    fn propagate_enqueued(&mut self) -> Option<ClauseId> {
        debug_assert!(
            self.pending_clauses.is_empty(),
            "some clauses have not been integrated yet"
        );

        while let Some(p) = self.propagation_queue.pop() {
            self.propagation_work_buffer.clear();
            for watcher in self.watches[p].drain(..) {
                self.propagation_work_buffer.push(watcher);
            }

            let n = self.propagation_work_buffer.len();
            for i in 0..n {
                if !self.propagate_clause(self.propagation_work_buffer[i], p) {
                    // clause violated: restore the remaining watches and stop
                    for j in i + 1..n {
                        let watcher = self.propagation_work_buffer[j];
                        self.watches[p].push(watcher);
                    }
                    self.propagation_queue.clear();
                    self.status = Status::Conflict;
                    return Some(self.propagation_work_buffer[i]);
                }
            }
        }
        None
    }

    /// Propagates the falsified literal `p` in the watching clause.
    /// Returns false on conflict.
    fn propagate_clause(&mut self, cl_id: ClauseId, p: Lit) -> bool {
        self.stats.propagations += 1;
        let lits = &mut self.clauses[cl_id].disjuncts;
        if lits.len() == 1 {
            debug_assert_eq!(lits[0], !p);
            self.watches[p].push(cl_id);
            return false;
        }
        if lits[0] == !p {
            lits.swap(0, 1);
        }
        debug_assert_eq!(lits[1], !p);
        let lits = &self.clauses[cl_id].disjuncts;
        if self.assignments.value_of(lits[0]) == BVal::True {
            // clause satisfied, restore the watch
            self.watches[p].push(cl_id);
            return true;
        }
        for i in 2..lits.len() {
            if self.assignments.value_of(lits[i]) != BVal::False {
                let lits = &mut self.clauses[cl_id].disjuncts;
                lits.swap(1, i);
                let watched = !self.clauses[cl_id].disjuncts[1];
                self.watches[watched].push(cl_id);
                return true;
            }
        }
        // no replacement watch found: the clause is unit
        self.watches[p].push(cl_id);
        let first = self.clauses[cl_id].disjuncts[0];
        self.enqueue(first, Some(cl_id))
    }

    /// Moves the two highest-priority literals to the front of the clause,
    /// where the watches are placed. Priority is: true literals, then
    /// undefined ones, then false literals by decreasing decision level.
    fn move_watches_front(&mut self, cl_id: ClauseId) {
        fn priority(ass: &Assignments, lit: Lit) -> u32 {
            match ass.value_of(lit) {
                BVal::True => u32::MAX,
                BVal::Undef => u32::MAX - 1,
                BVal::False => ass.level(lit.variable()),
            }
        }
        let cl = &mut self.clauses[cl_id].disjuncts;
        debug_assert!(cl.len() >= 2);
        let mut lvl0 = priority(&self.assignments, cl[0]);
        let mut lvl1 = priority(&self.assignments, cl[1]);
        if lvl1 > lvl0 {
            std::mem::swap(&mut lvl0, &mut lvl1);
            cl.swap(0, 1);
        }
        for i in 2..cl.len() {
            let lvl = priority(&self.assignments, cl[i]);
            if lvl > lvl1 {
                lvl1 = lvl;
                cl.swap(1, i);
                if lvl > lvl0 {
                    lvl1 = lvl0;
                    lvl0 = lvl;
                    cl.swap(0, 1);
                }
            }
        }
    }

    fn set_watch_on_first_literals(&mut self, cl_id: ClauseId) {
        let cl = &self.clauses[cl_id].disjuncts;
        debug_assert!(cl.len() >= 2);
        let w0 = !cl[0];
        let w1 = !cl[1];
        self.watches[w0].push(cl_id);
        self.watches[w1].push(cl_id);
    }

    fn handle_conflict(&mut self, conflict: ClauseId) {
        debug_assert!(self.violated(&self.clauses[conflict].disjuncts));
        self.stats.conflicts += 1;
        self.conflicts_since_restart += 1;

        if self.assignments.decision_level() == GROUND_LEVEL {
            self.status = Status::Unsolvable;
            return;
        }

        let (learnt, backtrack_level) = self.analyze(conflict);
        debug_assert!(backtrack_level < self.assignments.decision_level());
        self.backtrack_to(backtrack_level);
        self.status = Status::Consistent;

        debug_assert!(self.unit(&learnt));
        let learnt_id = self.clauses.add_clause(Clause::new(&learnt, true));
        self.bump_activity_on_learnt(learnt_id);
        self.integrate_unit_clause(learnt_id);
    }

    /// First-UIP conflict analysis: resolves the conflict clause against the
    /// reasons of the literals set at the current decision level until a
    /// single such literal remains. Returns the learnt clause (asserting
    /// literal first) and the level to backtrack to.
    fn analyze(&mut self, conflict: ClauseId) -> (Vec<Lit>, DecisionLevel) {
        let mut seen = vec![false; self.num_vars()];
        let mut counter = 0usize;
        let mut p: Option<Lit> = None;
        let mut p_reason: Vec<Lit> = Vec::new();
        let mut out_learnt: Vec<Lit> = vec![Lit::UNDEF];
        let mut out_btlevel = GROUND_LEVEL;

        {
            let analyzed = &self.clauses[conflict].disjuncts;
            debug_assert!(self.violated(analyzed));
            debug_assert!(analyzed
                .iter()
                .any(|&l| self.assignments.level(l.variable()) == self.assignments.decision_level()));
        }

        let mut clause = Some(conflict);
        let mut simulated_undone = 0usize;
        let mut first = true;
        while first || counter > 0 {
            first = false;
            p_reason.clear();
            self.calc_reason(clause.expect("analyzed clause is empty"), p, &mut p_reason);

            for &q in &p_reason {
                let qvar = q.variable();
                if !seen[qvar.to_index()] {
                    seen[qvar.to_index()] = true;
                    if self.assignments.level(qvar) == self.assignments.decision_level() {
                        counter += 1;
                    } else if self.assignments.level(qvar) > GROUND_LEVEL {
                        out_learnt.push(!q);
                        out_btlevel = out_btlevel.max(self.assignments.level(qvar));
                    }
                }
            }

            // walk the trail back to the next literal involved in the conflict
            loop {
                let l = self.assignments.last_assignment(simulated_undone);
                debug_assert_eq!(
                    self.assignments.level(l.variable()),
                    self.assignments.decision_level()
                );
                p = Some(l);
                clause = self.assignments.reason(l.variable());
                simulated_undone += 1;
                if seen[l.variable().to_index()] {
                    break;
                }
            }
            counter -= 1;
        }
        debug_assert_eq!(out_learnt[0], Lit::UNDEF);
        out_learnt[0] = !p.unwrap();

        (out_learnt, out_btlevel)
    }

    /// Collects into `out_reason` the conjunction of literals that entailed
    /// `p` through `clause` (the negation of the other literals). With
    /// `p == None`, the negation of the whole clause.
    fn calc_reason(&mut self, clause: ClauseId, p: Option<Lit>, out_reason: &mut Vec<Lit>) {
        let cl = &self.clauses[clause];
        debug_assert!(out_reason.is_empty());
        debug_assert!(p.iter().all(|&p| cl.disjuncts[0] == p));
        let first = match p {
            Some(_) => 1,
            None => 0,
        };
        for &l in &cl.disjuncts[first..] {
            out_reason.push(!l);
        }
        if cl.learnt {
            self.clauses.bump_activity(clause);
        }
    }

    fn bump_activity_on_learnt(&mut self, cl_id: ClauseId) {
        for i in 0..self.clauses[cl_id].disjuncts.len() {
            let var = self.clauses[cl_id].disjuncts[i].variable();
            self.brancher.bump_activity(var);
        }
        self.clauses.bump_activity(cl_id);
    }

    fn backtrack_to(&mut self, lvl: DecisionLevel) -> Option<Lit> {
        self.propagation_queue.clear();
        let brancher = &mut self.brancher;
        self.assignments.backtrack_to(lvl, &mut |v| brancher.var_insert(v))
    }

    fn violated(&self, clause: &[Lit]) -> bool {
        clause
            .iter()
            .all(|&l| self.assignments.value_of(l) == BVal::False)
    }

    fn unit(&self, clause: &[Lit]) -> bool {
        !clause.iter().any(|&l| self.assignments.value_of(l) == BVal::True)
            && clause
                .iter()
                .filter(|&&l| self.assignments.value_of(l) == BVal::Undef)
                .take(2)
                .count()
                == 1
    }

    fn is_model_valid(&self) -> bool {
        for cl_id in self.clauses.all_clauses() {
            let satisfied = self.clauses[cl_id]
                .disjuncts
                .iter()
                .any(|&l| self.assignments.value_of(l) == BVal::True);
            if !satisfied {
                log::error!(
                    "invalid model, violated clause {}: {} = {:?}",
                    cl_id,
                    self.clauses[cl_id],
                    self.clauses[cl_id]
                        .disjuncts
                        .iter()
                        .map(|&l| self.assignments.value_of(l))
                        .collect_vec()
                );
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(ints: &[i32]) -> Vec<Lit> {
        ints.iter().map(|&i| Lit::from_dimacs(i)).collect()
    }

    fn solver_with_vars(n: usize) -> Solver {
        let mut solver = Solver::default();
        for _ in 0..n {
            solver.add_var();
        }
        solver
    }

    #[test]
    fn unit_propagation() {
        let mut solver = solver_with_vars(2);
        solver.add_clause(&lits(&[-1, 2]));
        assert!(solver.propagate().is_none());
        assert_eq!(solver.value(BVar::new(0)), None);

        solver.add_clause(&lits(&[1]));
        assert!(solver.propagate().is_none());
        assert_eq!(solver.value(BVar::new(0)), Some(true));
        assert_eq!(solver.value(BVar::new(1)), Some(true));
    }

    #[test]
    fn conflicting_units_are_unsolvable() {
        let mut solver = solver_with_vars(1);
        solver.add_clause(&lits(&[1]));
        solver.add_clause(&lits(&[-1]));
        assert_eq!(solver.solve(), SearchResult::Unsolvable);
    }

    #[test]
    fn solves_small_formulas() {
        let mut solver = solver_with_vars(3);
        solver.add_clause(&lits(&[1, 2]));
        solver.add_clause(&lits(&[-1, 3]));
        solver.add_clause(&lits(&[-2, 3]));
        assert_eq!(solver.solve(), SearchResult::Solved);
        assert_eq!(solver.value(BVar::new(2)), Some(true));
    }

    #[test]
    fn pigeonhole_two_in_one_is_unsat() {
        // two pigeons, one hole
        let mut solver = solver_with_vars(2);
        solver.add_clause(&lits(&[1]));
        solver.add_clause(&lits(&[2]));
        solver.add_clause(&lits(&[-1, -2]));
        assert_eq!(solver.solve(), SearchResult::Unsolvable);
    }

    #[test]
    fn incremental_strengthening() {
        // multi-check use: find a model, forbid part of it, re-check
        let mut solver = solver_with_vars(2);
        solver.add_clause(&lits(&[1, 2]));
        assert_eq!(solver.solve(), SearchResult::Solved);
        let first = (solver.value(BVar::new(0)), solver.value(BVar::new(1)));

        solver.add_clause(&lits(&[-1]));
        assert_eq!(solver.solve(), SearchResult::Solved);
        assert_eq!(solver.value(BVar::new(0)), Some(false));
        assert_eq!(solver.value(BVar::new(1)), Some(true));
        assert_ne!(
            first,
            (Some(false), Some(false)),
            "first model must satisfy the original clause"
        );

        solver.add_clause(&lits(&[-2]));
        assert_eq!(solver.solve(), SearchResult::Unsolvable);
        // unsolvable is sticky
        assert_eq!(solver.solve(), SearchResult::Unsolvable);
    }

    #[test]
    fn interruption_stops_the_search() {
        let mut solver = solver_with_vars(2);
        solver.add_clause(&lits(&[1, 2]));
        let flag = Arc::new(AtomicBool::new(true));
        solver.set_interrupt_flag(flag.clone());
        assert_eq!(solver.solve(), SearchResult::Interrupted);

        flag.store(false, Ordering::Relaxed);
        assert_eq!(solver.solve(), SearchResult::Solved);
    }

    #[test]
    fn polarity_steers_the_model() {
        let mut solver = solver_with_vars(2);
        solver.add_clause(&lits(&[1, 2]));
        solver.set_polarity(BVar::new(0), true);
        solver.set_polarity(BVar::new(1), false);
        assert_eq!(solver.solve(), SearchResult::Solved);
        assert_eq!(solver.value(BVar::new(0)), Some(true));
        assert_eq!(solver.value(BVar::new(1)), Some(false));
    }
}
