/// An instance of the RCPSP/t: activities with per-tick resource demands
/// under time-dependent resource capacities.
///
/// Job 0 is the dummy source and job `njobs - 1` the dummy sink; both have
/// duration 0 and request nothing. The precedence graph is acyclic, the
/// source reaches every job and every job reaches the sink.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Number of activities, including the two dummies.
    pub njobs: usize,
    /// Planning horizon T.
    pub horizon: i32,
    /// Number of renewable resources.
    pub nresources: usize,
    pub successors: Vec<Vec<usize>>,
    pub predecessors: Vec<Vec<usize>>,
    pub durations: Vec<i32>,
    /// `requests[i][k][e]`: demand of activity `i` on resource `k` at the
    /// `e`-th tick of its execution, `e < durations[i]`.
    pub requests: Vec<Vec<Vec<i32>>>,
    /// `capacities[k][t]`: capacity of resource `k` at time `t < horizon`.
    pub capacities: Vec<Vec<i32>>,
}

impl Problem {
    pub fn new(njobs: usize, horizon: i32, nresources: usize) -> Self {
        Problem {
            njobs,
            horizon,
            nresources,
            successors: vec![Vec::new(); njobs],
            predecessors: vec![Vec::new(); njobs],
            durations: Vec::with_capacity(njobs),
            requests: vec![vec![Vec::new(); nresources]; njobs],
            capacities: vec![Vec::new(); nresources],
        }
    }

    pub fn source(&self) -> usize {
        0
    }

    pub fn sink(&self) -> usize {
        self.njobs - 1
    }

    /// Records a precedence edge `from -> to` in both adjacency lists.
    pub fn add_precedence(&mut self, from: usize, to: usize) {
        self.successors[from].push(to);
        self.predecessors[to].push(from);
    }

    pub fn duration(&self, job: usize) -> i32 {
        self.durations[job]
    }

    pub fn request(&self, job: usize, resource: usize, tick: usize) -> i32 {
        self.requests[job][resource][tick]
    }

    pub fn capacity(&self, resource: usize, t: i32) -> i32 {
        self.capacities[resource][t as usize]
    }
}
