use crate::lit::Lit;
use makespan_collections::index_map::IndexMap;
use makespan_collections::ToIndex;
use std::cmp::Ordering::Equal;
use std::fmt::{Display, Error, Formatter};
use std::ops::{Index, IndexMut};

pub struct ClausesParams {
    cla_inc: f64,
    cla_decay: f64,
}

impl Default for ClausesParams {
    fn default() -> Self {
        ClausesParams {
            cla_inc: 1_f64,
            cla_decay: 0.999_f64,
        }
    }
}

pub struct Clause {
    pub activity: f64,
    pub learnt: bool,
    pub disjuncts: Vec<Lit>,
}

impl Clause {
    pub fn new(lits: &[Lit], learnt: bool) -> Self {
        Clause {
            activity: 0_f64,
            learnt,
            disjuncts: Vec::from(lits),
        }
    }

    /// Sorts and deduplicates the literals. If the clause contains a literal
    /// and its negation it is trivially true and is emptied to mark it as
    /// removable.
    pub fn simplify(&mut self) {
        self.disjuncts.sort();
        self.disjuncts.dedup();
        for w in self.disjuncts.windows(2) {
            if w[0].variable() == w[1].variable() {
                debug_assert_ne!(w[0].is_positive(), w[1].is_positive());
                self.disjuncts.clear();
                return;
            }
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "[")?;
        for (n, lit) in self.disjuncts.iter().enumerate() {
            if n != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, "]")
    }
}

#[derive(Eq, Hash, PartialOrd, Ord, PartialEq, Debug, Clone, Copy)]
pub struct ClauseId(u32);

impl ToIndex for ClauseId {
    fn to_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(i: usize) -> Self {
        ClauseId(i as u32)
    }
}

impl Display for ClauseId {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

/// Clause database with slot reuse for deleted learnt clauses.
pub struct ClauseDb {
    params: ClausesParams,
    /// Number of live clauses that are part of the problem definition.
    num_fixed: usize,
    /// Number of live clauses, learnt or not.
    num_clauses: usize,
    first_possibly_free: usize,
    clauses: IndexMap<ClauseId, Option<Clause>>,
}

impl ClauseDb {
    pub fn new(params: ClausesParams) -> ClauseDb {
        ClauseDb {
            params,
            num_fixed: 0,
            num_clauses: 0,
            first_possibly_free: 0,
            clauses: IndexMap::new_with(0, || None),
        }
    }

    pub fn add_clause(&mut self, cl: Clause) -> ClauseId {
        self.num_clauses += 1;
        if !cl.learnt {
            self.num_fixed += 1;
        }

        // insert in the first free spot, or push at the end
        let mut i = self.first_possibly_free;
        while i < self.clauses.len() && self.clauses[ClauseId::from_index(i)].is_some() {
            i += 1;
        }
        let id = if i < self.clauses.len() {
            let id = ClauseId::from_index(i);
            self.clauses[id] = Some(cl);
            id
        } else {
            self.clauses.push(Some(cl))
        };
        self.first_possibly_free = id.to_index() + 1;
        id
    }

    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }

    pub fn num_learnt(&self) -> usize {
        self.num_clauses - self.num_fixed
    }

    pub fn all_clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.clauses
            .keys()
            .filter(move |&id| self.clauses[id].is_some())
    }

    pub fn bump_activity(&mut self, cl: ClauseId) {
        self[cl].activity += self.params.cla_inc;
        if self[cl].activity > 1e100_f64 {
            self.rescale_activities();
        }
    }

    pub fn decay_activities(&mut self) {
        self.params.cla_inc /= self.params.cla_decay;
    }

    fn rescale_activities(&mut self) {
        for cl in self.clauses.values_mut().flatten() {
            cl.activity *= 1e-100_f64;
        }
        self.params.cla_inc *= 1e-100_f64;
    }

    /// Deletes the lower-activity half of the non-locked learnt clauses,
    /// removing their watches.
    pub fn reduce_db<F: Fn(ClauseId) -> bool>(
        &mut self,
        locked: F,
        watches: &mut IndexMap<Lit, Vec<ClauseId>>,
    ) {
        let mut removable: Vec<(ClauseId, f64)> = self
            .all_clauses()
            .filter_map(|id| match &self.clauses[id] {
                Some(cl) if cl.learnt && !locked(id) => Some((id, cl.activity)),
                _ => None,
            })
            .collect();
        removable.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Equal));

        let to_delete: Vec<ClauseId> = removable
            .iter()
            .take(removable.len() / 2)
            .map(|&(id, _)| id)
            .collect();
        for id in to_delete {
            let num_watch = 2.min(self[id].disjuncts.len());
            for i in 0..num_watch {
                let watched = !self[id].disjuncts[i];
                watches[watched].retain(|&cl| cl != id);
            }
            self.clauses[id] = None;
            self.num_clauses -= 1;
        }

        self.first_possibly_free = 0;
    }
}

impl Index<ClauseId> for ClauseDb {
    type Output = Clause;
    fn index(&self, id: ClauseId) -> &Clause {
        self.clauses[id].as_ref().unwrap()
    }
}

impl IndexMut<ClauseId> for ClauseDb {
    fn index_mut(&mut self, id: ClauseId) -> &mut Clause {
        self.clauses[id].as_mut().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lit::BVar;

    #[test]
    fn simplify_removes_duplicates_and_tautologies() {
        let a = BVar::new(0).true_lit();
        let b = BVar::new(1).true_lit();

        let mut cl = Clause::new(&[a, b, a], false);
        cl.simplify();
        assert_eq!(cl.disjuncts.len(), 2);

        let mut taut = Clause::new(&[a, b, !a], false);
        taut.simplify();
        assert!(taut.disjuncts.is_empty());
    }

    #[test]
    fn slot_reuse_after_reduce() {
        let a = BVar::new(0).true_lit();
        let b = BVar::new(1).true_lit();
        let mut db = ClauseDb::new(ClausesParams::default());
        let mut watches: IndexMap<Lit, Vec<ClauseId>> = IndexMap::new_with(4, Vec::new);

        let c0 = db.add_clause(Clause::new(&[a, b], false));
        let learnt: Vec<ClauseId> = (0..4)
            .map(|_| db.add_clause(Clause::new(&[a, b], true)))
            .collect();
        for &id in &learnt {
            watches[!a].push(id);
            watches[!b].push(id);
        }
        db.bump_activity(learnt[2]);
        db.bump_activity(learnt[3]);
        assert_eq!(db.num_learnt(), 4);

        db.reduce_db(|_| false, &mut watches);
        assert_eq!(db.num_learnt(), 2);
        assert_eq!(db.num_clauses(), 3);
        // the fixed clause is untouched
        assert_eq!(db[c0].disjuncts.len(), 2);
        // freed slots are reused before growing
        let refill = db.add_clause(Clause::new(&[a], true));
        assert!(refill.to_index() <= learnt[3].to_index());
    }
}
