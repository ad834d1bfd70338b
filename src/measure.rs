use std::fmt::Write as _;
use std::time::Instant;

/// Everything reported about one solver run. A snapshot is shared with the
/// signal watcher so that an aborted run still prints its current state.
#[derive(Debug, Clone)]
pub struct Measurements {
    /// Input file path, echoed in the result line.
    pub file: String,
    /// Number of Boolean variables in the encoding (including auxiliaries).
    pub n_boolv: i64,
    /// Number of integer variables in the encoding.
    pub n_intv: i64,
    /// Number of clauses in the encoding.
    pub n_clause: i64,
    /// Time spent encoding, in milliseconds.
    pub t_enc: u64,
    /// Accumulated time spent in satisfiability checks, in milliseconds.
    pub t_search: u64,
    /// Whether the best schedule passed the validity checker.
    pub valid: bool,
    /// True iff optimality or infeasibility was proven.
    pub certified: bool,
    /// Best schedule so far; empty iff no solution was found.
    pub schedule: Vec<i32>,
    started: Instant,
}

impl Measurements {
    pub fn new(file: String) -> Self {
        Measurements {
            file,
            n_boolv: 0,
            n_intv: 0,
            n_clause: 0,
            t_enc: 0,
            t_search: 0,
            valid: false,
            certified: false,
            schedule: Vec::new(),
            started: Instant::now(),
        }
    }

    /// The makespan of the best schedule: the start of the sink activity,
    /// or -1 when no schedule was found.
    pub fn makespan(&self) -> i32 {
        self.schedule.last().copied().unwrap_or(-1)
    }

    /// Formats the comma-separated result line:
    /// `file, nBoolVars, nIntVars, nClauses, t_enc, t_search, t_total,
    /// makespan, valid, certified, s0.s1.s2.`
    pub fn result_line(&self) -> String {
        let mut line = String::new();
        write!(
            line,
            "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, ",
            self.file,
            self.n_boolv,
            self.n_intv,
            self.n_clause,
            self.t_enc,
            self.t_search,
            self.started.elapsed().as_millis(),
            self.makespan(),
            self.valid as i32,
            self.certified as i32,
        )
        .unwrap();
        for start in &self.schedule {
            write!(line, "{}.", start).unwrap();
        }
        line
    }
}

/// Outcome of the destructive optimisation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The last schedule found is optimal.
    Optimal { schedule: Vec<i32> },
    /// No schedule exists within the bounds; proven.
    Infeasible,
    /// The search was interrupted; `best` is the last schedule found, if any.
    Interrupted { best: Option<Vec<i32>> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_line_format() {
        let mut m = Measurements::new("inst.sm".to_string());
        m.n_boolv = 12;
        m.n_intv = 5;
        m.n_clause = 60;
        m.valid = true;
        m.certified = true;
        m.schedule = vec![0, 0, 3, 4, 7];
        let line = m.result_line();
        assert!(line.starts_with("inst.sm, 12, 5, 60, "));
        assert!(line.ends_with(", 7, 1, 1, 0.0.3.4.7."));
    }

    #[test]
    fn empty_schedule_reports_no_makespan() {
        let m = Measurements::new("x".to_string());
        assert_eq!(m.makespan(), -1);
        assert!(m.result_line().ends_with("-1, 0, 0, "));
    }
}
