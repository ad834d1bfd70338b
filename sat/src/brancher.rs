use crate::lit::BVar;
use makespan_collections::heap::IdxHeap;

pub struct BrancherParams {
    var_inc: f64,
    var_decay: f64,
}

impl Default for BrancherParams {
    fn default() -> Self {
        BrancherParams {
            var_inc: 1_f64,
            var_decay: 0.95_f64,
        }
    }
}

/// Activity-ordered variable selection (VSIDS style).
pub struct Brancher {
    params: BrancherParams,
    heap: IdxHeap<BVar, f64>,
}

impl Brancher {
    pub fn new(params: BrancherParams) -> Self {
        Brancher {
            params,
            heap: IdxHeap::with_elements(0, 1_f64),
        }
    }

    /// Records a new variable and makes it available for selection.
    /// Variables must be declared in index order.
    pub fn declare_var(&mut self, var: BVar) {
        self.heap.declare(var, 1_f64);
        self.heap.enqueue(var);
    }

    pub fn pop_next_var(&mut self) -> Option<BVar> {
        self.heap.pop()
    }

    /// Makes an unset variable selectable again, typically on backtracking.
    pub fn var_insert(&mut self, var: BVar) {
        self.heap.enqueue(var);
    }

    pub fn bump_activity(&mut self, var: BVar) {
        let var_inc = self.params.var_inc;
        self.heap.change_priority(var, |a| *a += var_inc);
        if *self.heap.priority(var) > 1e100_f64 {
            self.rescale_activities();
        }
    }

    pub fn decay_activities(&mut self) {
        self.params.var_inc /= self.params.var_decay;
    }

    fn rescale_activities(&mut self) {
        // scaling all activities by the same factor preserves heap order
        self.heap.rescale_priorities(|a| *a *= 1e-100_f64);
        self.params.var_inc *= 1e-100_f64;
    }
}
