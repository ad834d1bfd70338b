use std::fmt::{Display, Error, Formatter};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Stats {
    pub solves: u64,
    pub restarts: u64,
    pub decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
    pub init_time: Instant,
    pub end_time: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        let now = Instant::now();
        Stats {
            solves: 0,
            restarts: 0,
            decisions: 0,
            conflicts: 0,
            propagations: 0,
            init_time: now,
            end_time: now,
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let cpu_time = (self.end_time - self.init_time).as_secs_f64();
        writeln!(f, "solves                : {:<12}", self.solves)?;
        writeln!(f, "restarts              : {:<12}", self.restarts)?;
        writeln!(
            f,
            "conflicts             : {:<12}   ({:.0} /sec)",
            self.conflicts,
            (self.conflicts as f64) / cpu_time
        )?;
        writeln!(
            f,
            "decisions             : {:<12}   ({:.0} /sec)",
            self.decisions,
            (self.decisions as f64) / cpu_time
        )?;
        writeln!(
            f,
            "propagations          : {:<12}   ({:.0} /sec)",
            self.propagations,
            (self.propagations as f64) / cpu_time
        )?;
        writeln!(f, "CPU time              : {} s", cpu_time)
    }
}
