use crate::problem::Problem;
use log::warn;

/// Checks that a schedule satisfies every precedence and every per-timestep
/// capacity constraint. Availabilities are tracked in a single flat buffer
/// indexed by `(resource, time)`.
pub fn check_valid(problem: &Problem, schedule: &[i32]) -> bool {
    if schedule.len() != problem.njobs {
        return false;
    }

    for job in 0..problem.njobs {
        for &pred in &problem.predecessors[job] {
            if schedule[job] < schedule[pred] + problem.durations[pred] {
                warn!(
                    "invalid precedence: job {} starts before job {} finishes",
                    job, pred
                );
                return false;
            }
        }
    }

    let horizon = problem.horizon as usize;
    let mut available: Vec<i32> = Vec::with_capacity(problem.nresources * horizon);
    for k in 0..problem.nresources {
        for t in 0..horizon {
            available.push(problem.capacities[k][t]);
        }
    }

    for job in 0..problem.njobs {
        for k in 0..problem.nresources {
            for e in 0..problem.durations[job] {
                let t = schedule[job] + e;
                if t < 0 || t >= problem.horizon {
                    warn!("job {} runs outside the horizon at t={}", job, t);
                    return false;
                }
                let slot = k * horizon + t as usize;
                available[slot] -= problem.requests[job][k][e as usize];
                if available[slot] < 0 {
                    warn!("resource {} demand exceeds availability at t={}", k, t);
                    return false;
                }
            }
        }
    }

    true
}
