//! Parser for the textual project description format (PSPLIB style, with
//! per-tick requests and capacities).
//!
//! The format is trusted: malformed input fails fast with a panic rather
//! than being diagnosed.

use crate::problem::Problem;

/// Parses a project instance. Sections are separated by lines of `*`;
/// indices in the file are 1-based and mapped to 0-based here.
pub fn parse_problem(input: &str) -> Problem {
    let mut njobs: Option<usize> = None;
    let mut horizon: Option<i32> = None;
    let mut nresources: Option<usize> = None;

    let mut lines = input.lines();
    let mut section = 0;

    // header sections, up to and including the one holding the sizes
    for line in &mut lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('*') {
            section += 1;
            if section > 2 {
                break;
            }
            continue;
        }
        if section != 2 {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first() {
            Some(&"jobs") => njobs = Some(parse_token(tokens.last().unwrap())),
            Some(&"horizon") => horizon = Some(parse_token(tokens.last().unwrap())),
            _ if tokens.last() == Some(&"R") => {
                nresources = Some(parse_token(tokens[tokens.len() - 2]))
            }
            _ => (),
        }
    }

    let njobs = njobs.expect("jobs count missing from header");
    let horizon = horizon.expect("horizon missing from header");
    let nresources = nresources.expect("resource count missing from header");
    let mut problem = Problem::new(njobs, horizon, nresources);

    let mut curr_job = 0usize;
    let mut curr_resource = 0usize;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('*') {
            section += 1;
            continue;
        }
        if section == 3 {
            // "PROJECT INFORMATION" carries nothing we need
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match section {
            4 => {
                // "PRECEDENCE RELATIONS"
                if tokens[0] == "PRECEDENCE" || tokens[0] == "jobnr." {
                    continue;
                }
                let job: usize = parse_token::<usize>(tokens[0]) - 1;
                let nsucc: usize = parse_token(tokens[2]);
                for i in 0..nsucc {
                    let successor = parse_token::<usize>(tokens[3 + i]) - 1;
                    problem.add_precedence(job, successor);
                }
            }
            5 => {
                // "REQUESTS/DURATIONS"
                if tokens[0] == "REQUESTS/DURATIONS:" || tokens[0] == "jobnr." || tokens[0].starts_with('-') {
                    continue;
                }
                if curr_resource == 0 && tokens.len() <= 3 {
                    // dummy job: single line, no demands
                    curr_job = parse_token::<usize>(tokens[0]) - 1;
                    problem.durations.push(0);
                    continue;
                }
                if curr_resource == 0 {
                    // first line of a job: jobnr, mode, duration, demands
                    curr_job = parse_token::<usize>(tokens[0]) - 1;
                    let duration: i32 = parse_token(tokens[2]);
                    problem.durations.push(duration);
                    problem.requests[curr_job][curr_resource] = tokens[3..3 + duration as usize]
                        .iter()
                        .map(|t| parse_token(t))
                        .collect();
                } else {
                    // remaining resource lines: demands only
                    let duration = problem.durations[curr_job] as usize;
                    problem.requests[curr_job][curr_resource] =
                        tokens[..duration].iter().map(|t| parse_token(t)).collect();
                }
                curr_resource = (curr_resource + 1) % nresources;
            }
            6 => {
                // "RESOURCEAVAILABILITIES": capacity rows, one per resource
                if tokens.len() <= 2 * nresources {
                    continue;
                }
                problem.capacities[curr_resource] = tokens.iter().map(|t| parse_token(t)).collect();
                curr_resource = (curr_resource + 1) % nresources;
            }
            _ => (),
        }
    }

    problem
}

fn parse_token<T: std::str::FromStr>(token: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    token.parse().expect("malformed token in project file")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE: &str = "\
************************************************************************
file with basedata
initial value random generator: 42
************************************************************************
projects                      :  1
jobs (incl. supersource/sink ):  4
horizon                       :  12
RESOURCES
  - renewable                 :  1   R
  - nonrenewable              :  0   N
************************************************************************
PROJECT INFORMATION:
pronr.  #jobs rel.date duedate tardcost  MPM-Time
    1      2      0       12       0       12
************************************************************************
PRECEDENCE RELATIONS:
jobnr.    #modes  #successors   successors
   1        1          2           2   3
   2        1          1           4
   3        1          1           4
   4        1          0
************************************************************************
REQUESTS/DURATIONS:
jobnr. mode duration  R 1
------------------------------------------------------------------------
  1      1     0
  2      1     3    1 1 1
  3      1     2    2 2
  4      1     0
************************************************************************
RESOURCEAVAILABILITIES:
R 1
2 2 2 2 2 2 2 2 2 2 2 2
************************************************************************
";

    #[test]
    fn parses_sections() {
        let p = parse_problem(INSTANCE);
        assert_eq!(p.njobs, 4);
        assert_eq!(p.horizon, 12);
        assert_eq!(p.nresources, 1);
        assert_eq!(p.successors[0], vec![1, 2]);
        assert_eq!(p.successors[1], vec![3]);
        assert_eq!(p.predecessors[3], vec![1, 2]);
        assert_eq!(p.durations, vec![0, 3, 2, 0]);
        assert_eq!(p.requests[1][0], vec![1, 1, 1]);
        assert_eq!(p.requests[2][0], vec![2, 2]);
        assert!(p.requests[0][0].is_empty());
        assert_eq!(p.capacities[0], vec![2; 12]);
    }
}
