use crate::clause::ClauseId;
use crate::lit::{BVal, BVar, Lit};
use makespan_collections::index_map::IndexMap;

pub type DecisionLevel = u32;
pub const GROUND_LEVEL: DecisionLevel = 0;

#[derive(Clone, Copy, Debug)]
pub(crate) struct VarState {
    pub value: BVal,
    /// Decision level at which the variable was set. Meaningless if undef.
    pub level: DecisionLevel,
    /// Clause whose propagation set the variable, `None` for decisions.
    pub reason: Option<ClauseId>,
    /// Preferred polarity for future decisions on this variable.
    pub polarity: bool,
}

impl VarState {
    pub const INIT: VarState = VarState {
        value: BVal::Undef,
        level: GROUND_LEVEL,
        reason: None,
        polarity: false,
    };

    fn clear(&mut self) {
        // polarity survives backtracking (phase saving)
        self.value = BVal::Undef;
        self.level = GROUND_LEVEL;
        self.reason = None;
    }
}

/// Trail-based partial assignment with chronological backtracking.
pub(crate) struct Assignments {
    pub states: IndexMap<BVar, VarState>,
    trail: Vec<Lit>,
    /// One entry per decision: the decision literal and the trail length
    /// when it was taken.
    levels: Vec<(Lit, usize)>,
}

impl Assignments {
    pub fn new() -> Self {
        Assignments {
            states: IndexMap::new(0, VarState::INIT),
            trail: Vec::new(),
            levels: Vec::new(),
        }
    }

    pub fn declare_var(&mut self) -> BVar {
        self.states.push(VarState::INIT)
    }

    pub fn num_vars(&self) -> usize {
        self.states.len()
    }

    pub fn set(&mut self, lit: Lit, reason: Option<ClauseId>) {
        let var = lit.variable();
        debug_assert_eq!(self.states[var].value, BVal::Undef);
        self.states[var].value = BVal::from_bool(lit.is_positive());
        self.states[var].level = self.decision_level();
        self.states[var].reason = reason;
        self.trail.push(lit);
    }

    pub fn is_set(&self, var: BVar) -> bool {
        self.states[var].value != BVal::Undef
    }

    pub fn value(&self, var: BVar) -> BVal {
        self.states[var].value
    }

    pub fn value_of(&self, lit: Lit) -> BVal {
        let v = self.value(lit.variable());
        if lit.is_positive() {
            v
        } else {
            !v
        }
    }

    pub fn level(&self, var: BVar) -> DecisionLevel {
        self.states[var].level
    }

    pub fn reason(&self, var: BVar) -> Option<ClauseId> {
        self.states[var].reason
    }

    pub fn decision_level(&self) -> DecisionLevel {
        self.levels.len() as DecisionLevel
    }

    pub fn add_backtrack_point(&mut self, decision: Lit) {
        self.levels.push((decision, self.trail.len()));
    }

    /// Undoes the last decision level. Returns the decision that was undone,
    /// or `None` if already at the ground level.
    pub fn backtrack<F: FnMut(BVar)>(&mut self, on_restore: &mut F) -> Option<Lit> {
        let (decision, trail_len) = self.levels.pop()?;
        for i in trail_len..self.trail.len() {
            let var = self.trail[i].variable();
            self.states[var].clear();
            on_restore(var);
        }
        self.trail.truncate(trail_len);
        Some(decision)
    }

    /// Backtracks until the decision level is at most `lvl`, returning the
    /// last decision undone (if any).
    pub fn backtrack_to<F: FnMut(BVar)>(&mut self, lvl: DecisionLevel, on_restore: &mut F) -> Option<Lit> {
        let mut last = None;
        while self.decision_level() > lvl {
            last = self.backtrack(on_restore);
        }
        last
    }

    /// The `past`-th most recent assignment on the trail.
    pub fn last_assignment(&self, past: usize) -> Lit {
        self.trail[self.trail.len() - 1 - past]
    }

    pub fn num_assigned(&self) -> usize {
        self.trail.len()
    }

    /// All literals currently set, in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn polarity(&self, var: BVar) -> bool {
        self.states[var].polarity
    }

    pub fn set_polarity(&mut self, var: BVar, polarity: bool) {
        self.states[var].polarity = polarity;
    }

    #[allow(dead_code)]
    pub fn variables(&self) -> impl Iterator<Item = BVar> {
        makespan_collections::TypedRange::first(self.states.len())
    }
}

impl std::ops::Index<BVar> for Assignments {
    type Output = VarState;
    fn index(&self, var: BVar) -> &VarState {
        &self.states[var]
    }
}
