//! Incremental simple temporal network over integer timepoints.
//!
//! An edge `(source, target, weight)` represents the difference constraint
//! `target - source <= weight`. Edges are recorded inactive and participate
//! in propagation only once activated; activations are trailed so that the
//! network can backtrack to an earlier consistent state.

pub type Timepoint = u32;
pub type EdgeId = u32;
pub type W = i32;

/// Weights far enough from the integer limits that adding two of them
/// cannot overflow.
pub const INFTY: W = i32::MAX / 2;

pub const ORIGIN: Timepoint = 0;

#[derive(Copy, Clone, Debug)]
struct Constraint {
    /// Internal constraints (timepoint bounds) are omitted from explanations.
    internal: bool,
    active: bool,
    source: Timepoint,
    target: Timepoint,
    weight: W,
}

#[derive(Debug, Eq, PartialEq)]
pub enum NetworkStatus {
    Consistent,
    /// The active constraints admit no solution. Carries the non-internal
    /// edges of a negative cycle, to be turned into a conflict clause by the
    /// caller.
    Inconsistent(Vec<EdgeId>),
}

#[derive(Copy, Clone)]
struct Distance {
    /// Shortest-path distance from the origin; `ub` of the timepoint.
    forward: W,
    forward_cause: Option<EdgeId>,
    /// Shortest-path distance to the origin; `-lb` of the timepoint.
    backward: W,
    backward_cause: Option<EdgeId>,
}

enum Event {
    TimepointAdded,
    EdgeAdded,
    EdgeActivated(EdgeId),
}

/// Backtrack point, as returned by [`Stn::set_backtrack_point`].
pub type BacktrackMark = u32;

pub struct Stn {
    constraints: Vec<Constraint>,
    distances: Vec<Distance>,
    trail: Vec<Event>,
    marks: Vec<usize>,
}

impl Default for Stn {
    fn default() -> Self {
        Self::new()
    }
}

impl Stn {
    /// Creates a network containing only the origin timepoint, pinned to 0.
    pub fn new() -> Self {
        let mut stn = Stn {
            constraints: Vec::new(),
            distances: Vec::new(),
            trail: Vec::new(),
            marks: Vec::new(),
        };
        let origin = stn.add_timepoint(0, 0);
        debug_assert_eq!(origin, ORIGIN);
        stn
    }

    pub fn num_timepoints(&self) -> u32 {
        self.distances.len() as u32
    }

    pub fn num_edges(&self) -> u32 {
        self.constraints.len() as u32
    }

    /// Lower bound of the timepoint after the last consistent propagation.
    pub fn lb(&self, tp: Timepoint) -> W {
        -self.distances[tp as usize].backward
    }

    /// Upper bound of the timepoint after the last consistent propagation.
    pub fn ub(&self, tp: Timepoint) -> W {
        self.distances[tp as usize].forward
    }

    /// Adds a timepoint with domain `[lb, ub]`, implemented as two internal
    /// always-active edges to the origin.
    pub fn add_timepoint(&mut self, lb: W, ub: W) -> Timepoint {
        assert!(lb <= ub);
        let id = self.num_timepoints();
        self.distances.push(Distance {
            forward: ub,
            forward_cause: None,
            backward: -lb,
            backward_cause: None,
        });
        self.trail.push(Event::TimepointAdded);
        if id != ORIGIN {
            self.record(Constraint {
                internal: true,
                active: true,
                source: ORIGIN,
                target: id,
                weight: ub,
            });
            self.record(Constraint {
                internal: true,
                active: true,
                source: id,
                target: ORIGIN,
                weight: -lb,
            });
        }
        id
    }

    /// Records an inactive edge `target - source <= weight`.
    pub fn add_inactive_edge(&mut self, source: Timepoint, target: Timepoint, weight: W) -> EdgeId {
        self.record(Constraint {
            internal: false,
            active: false,
            source,
            target,
            weight,
        })
    }

    /// Records an edge and activates it immediately.
    pub fn add_edge(&mut self, source: Timepoint, target: Timepoint, weight: W) -> EdgeId {
        let e = self.add_inactive_edge(source, target, weight);
        self.mark_active(e);
        e
    }

    /// Activates a previously recorded edge. The change only takes effect on
    /// the next call to [`Stn::propagate_all`].
    pub fn mark_active(&mut self, edge: EdgeId) {
        let c = &mut self.constraints[edge as usize];
        if !c.active {
            c.active = true;
            self.trail.push(Event::EdgeActivated(edge));
        }
    }

    fn record(&mut self, c: Constraint) -> EdgeId {
        assert!(
            c.source < self.num_timepoints() && c.target < self.num_timepoints(),
            "unrecorded timepoint"
        );
        let id = self.num_edges();
        self.constraints.push(c);
        self.trail.push(Event::EdgeAdded);
        id
    }

    pub fn set_backtrack_point(&mut self) -> BacktrackMark {
        self.marks.push(self.trail.len());
        (self.marks.len() - 1) as BacktrackMark
    }

    /// Undoes everything recorded since the given mark (including later
    /// marks). Distances are recomputed by the next propagation.
    pub fn backtrack_to(&mut self, mark: BacktrackMark) {
        let trail_len = self.marks[mark as usize];
        self.marks.truncate(mark as usize);
        while self.trail.len() > trail_len {
            match self.trail.pop().unwrap() {
                Event::TimepointAdded => {
                    self.distances.pop();
                }
                Event::EdgeAdded => {
                    self.constraints.pop();
                }
                Event::EdgeActivated(e) => {
                    self.constraints[e as usize].active = false;
                }
            }
        }
    }

    /// Recomputes all distances from the active constraints (Bellman-Ford
    /// with early exit). On inconsistency the network must be backtracked
    /// before any further use.
    pub fn propagate_all(&mut self) -> NetworkStatus {
        let n = self.distances.len();

        // reset distances to the trivial ones
        for d in &mut self.distances {
            *d = Distance {
                forward: INFTY,
                forward_cause: None,
                backward: INFTY,
                backward_cause: None,
            };
        }
        self.distances[ORIGIN as usize].forward = 0;
        self.distances[ORIGIN as usize].backward = 0;

        let mut updated = false;
        for _ in 0..n {
            updated = false;
            for (id, c) in self.constraints.iter().enumerate() {
                if !c.active {
                    continue;
                }
                let s = c.source as usize;
                let t = c.target as usize;
                if self.distances[s].forward + c.weight < self.distances[t].forward {
                    self.distances[t].forward = self.distances[s].forward + c.weight;
                    self.distances[t].forward_cause = Some(id as EdgeId);
                    updated = true;
                }
                if self.distances[t].backward + c.weight < self.distances[s].backward {
                    self.distances[s].backward = self.distances[t].backward + c.weight;
                    self.distances[s].backward_cause = Some(id as EdgeId);
                    updated = true;
                }
            }
            if !updated {
                break;
            }
        }
        if updated {
            // distances still decreasing after n rounds: negative cycle
            let culprits = self.extract_culprits();
            log::debug!("negative cycle with {} culprit edges", culprits.len());
            NetworkStatus::Inconsistent(culprits)
        } else {
            NetworkStatus::Consistent
        }
    }

    /// Walks the forward-cause graph to a node that lies on a negative cycle
    /// and collects the non-internal edges of that cycle.
    fn extract_culprits(&self) -> Vec<EdgeId> {
        let n = self.distances.len();

        // find an edge that can still be relaxed
        let violated = self
            .constraints
            .iter()
            .enumerate()
            .find(|(_, c)| {
                c.active
                    && self.distances[c.source as usize].forward + c.weight
                        < self.distances[c.target as usize].forward
            })
            .map(|(id, _)| id as EdgeId)
            .expect("no relaxable edge despite detected inconsistency");

        // n cause steps land on the cycle itself
        let mut on_cycle = self.constraints[violated as usize].source;
        for _ in 0..n {
            let cause = self.distances[on_cycle as usize]
                .forward_cause
                .expect("no cause on a cycle member");
            on_cycle = self.constraints[cause as usize].source;
        }

        let mut culprits = Vec::new();
        let mut current = on_cycle;
        loop {
            let cause = self.distances[current as usize]
                .forward_cause
                .expect("no cause on a cycle member");
            let c = &self.constraints[cause as usize];
            if !c.internal {
                culprits.push(cause);
            }
            current = c.source;
            if current == on_cycle {
                break;
            }
        }
        culprits
    }
}
