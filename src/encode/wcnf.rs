//! Weighted-CNF export of the propositional encoding, for external MaxSAT
//! solvers, and the reverse map from a MaxSAT model back to a schedule.
//!
//! Variable indices are allocated start variables first (`1..=ny`), then
//! process variables (`ny+1..=ny+nx`), then ROBDD auxiliaries on demand.
//! Header comments record the variable counts and each activity's
//! earliest/latest start so that a model can be decoded later.

use crate::bdd::{BddNode, Robdd, FALSE_NODE, TRUE_NODE};
use crate::bounds::Bounds;
use crate::check::check_valid;
use crate::pb::resource_constraints;
use crate::preprocess::{critical_path_windows, TimeWindows};
use crate::problem::Problem;
use anyhow::Context;
use log::warn;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Weight of the hard clauses.
const TOP: i32 = i32::MAX / 2;

/// Encodes the instance and writes it as a WCNF file. An instance that is
/// already infeasible at preprocessing becomes a one-clause contradiction.
pub fn write_wcnf(problem: &Problem, bounds: Bounds, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let windows = match critical_path_windows(problem, bounds.ub) {
        Some(w) => w,
        None => {
            writeln!(out, "p wcnf 1 1 1")?;
            writeln!(out, "1 -1 0")?;
            return Ok(());
        }
    };

    let n = problem.njobs;
    let mut next_index = 0usize;
    let allocate = |count: usize, next_index: &mut usize| -> Vec<usize> {
        let row = (*next_index..*next_index + count).collect();
        *next_index += count;
        row
    };
    let y: Vec<Vec<usize>> = (0..n)
        .map(|i| allocate(windows.stw_len(i), &mut next_index))
        .collect();
    let ny = next_index;
    let x: Vec<Vec<usize>> = (0..n)
        .map(|i| allocate((windows.lc[i] - windows.es[i] + 1) as usize, &mut next_index))
        .collect();
    let nx = next_index - ny;

    writeln!(out, "c {} {}", ny, nx)?;
    writeln!(out, "c")?;
    for i in 0..n {
        writeln!(out, "c {} {} {}", i + 1, windows.es[i], windows.ls[i])?;
    }
    writeln!(out, "c")?;

    let mut precedence: Vec<String> = Vec::new();

    // consistency: starting at s implies running during [s, s + duration)
    for i in 0..n {
        for s in windows.es[i]..=windows.ls[i] {
            for t in s..s + problem.durations[i] {
                precedence.push(format!(
                    "{} -{} {} 0",
                    TOP,
                    1 + y[i][(s - windows.es[i]) as usize],
                    1 + x[i][(t - windows.es[i]) as usize]
                ));
            }
        }
    }

    // the source starts at 0
    precedence.push(format!("{} {} 0", TOP, 1 + y[0][0]));

    // precedence clauses
    for i in 1..n {
        for &j in &problem.predecessors[i] {
            for s in windows.es[i]..=windows.ls[i] {
                let mut clause = format!("{} -{}", TOP, 1 + y[i][(s - windows.es[i]) as usize]);
                let latest = (s - problem.durations[j]).min(windows.ls[j]);
                for t in windows.es[j]..=latest {
                    write!(clause, " {}", 1 + y[j][(t - windows.es[j]) as usize]).unwrap();
                }
                clause.push_str(" 0");
                precedence.push(clause);
            }
        }
    }

    // every non-source activity starts somewhere
    for i in 1..n {
        let mut clause = TOP.to_string();
        for s in windows.es[i]..=windows.ls[i] {
            write!(clause, " {}", 1 + y[i][(s - windows.es[i]) as usize]).unwrap();
        }
        clause.push_str(" 0");
        precedence.push(clause);
    }

    // redundant run-continuity clauses
    for i in 0..n {
        for c in windows.ec[i]..windows.lc[i] {
            precedence.push(format!(
                "{} -{} {} {} 0",
                TOP,
                1 + x[i][(c - windows.es[i]) as usize],
                1 + x[i][(c + 1 - windows.es[i]) as usize],
                1 + y[i][(c - problem.durations[i] + 1 - windows.es[i]) as usize]
            ));
        }
    }

    let mut resource: Vec<String> = Vec::new();
    for pb in resource_constraints(problem, &windows, bounds.ub) {
        let robdd = Robdd::compile(&pb);
        let order = robdd.reachable();
        if !order.contains(&FALSE_NODE) {
            continue;
        }
        let mut aux: Vec<Option<usize>> = vec![None; robdd.num_nodes()];
        let mut aux_of = |aux: &mut Vec<Option<usize>>, id: u32| -> usize {
            *aux[id as usize].get_or_insert_with(|| {
                let v = next_index;
                next_index += 1;
                v
            })
        };
        for &id in &order {
            if let BddNode::Internal { selector, lo, hi } = robdd.node(id) {
                let sel = y[selector.job][selector.offset];
                let a_lo = aux_of(&mut aux, lo);
                let a_hi = aux_of(&mut aux, hi);
                let a_n = aux_of(&mut aux, id);
                resource.push(format!("{} {} -{} 0", TOP, 1 + a_lo, 1 + a_n));
                resource.push(format!("{} {} -{} -{} 0", TOP, 1 + a_hi, 1 + sel, 1 + a_n));
            }
        }
        let a_root = aux_of(&mut aux, robdd.root());
        let a_false = aux_of(&mut aux, FALSE_NODE);
        let a_true = aux_of(&mut aux, TRUE_NODE);
        resource.push(format!("{} {} 0", TOP, 1 + a_root));
        resource.push(format!("{} -{} 0", TOP, 1 + a_false));
        resource.push(format!("{} {} 0", TOP, 1 + a_true));
    }

    // TODO: emit soft unit clauses over the sink start variables so that an
    // external MaxSAT solver minimises the makespan instead of only finding
    // a feasible schedule
    let nbclauses = precedence.len() + resource.len();
    writeln!(out, "p wcnf {} {} {}", next_index, nbclauses, TOP)?;
    for clause in precedence.iter().chain(resource.iter()) {
        writeln!(out, "{}", clause)?;
    }
    Ok(())
}

/// Decodes a space-separated MaxSAT model (a leading `-` marks a false
/// literal) back into a schedule, taking the first true start variable of
/// each activity. Returns `"<makespan>, <valid>, <s0.s1...>"`; an instance
/// that was infeasible at preprocessing maps to `"-1, 1, "`.
pub fn solution_from_model(problem: &Problem, bounds: Bounds, model: &str) -> String {
    let windows = match critical_path_windows(problem, bounds.ub) {
        Some(w) => w,
        None => return "-1, 1, ".to_string(),
    };

    let lits: Vec<bool> = model
        .split_whitespace()
        .map(|token| !token.starts_with('-'))
        .collect();
    let ny = num_start_vars(problem, &windows);
    if lits.len() < ny {
        // auxiliaries beyond the start variables are fine, missing start
        // variables are not; absent literals decode as false
        warn!(
            "model has {} literals but the encoding has {} start variables",
            lits.len(),
            ny
        );
    }

    let mut starts = vec![-1i32; problem.njobs];
    let mut curr = 0usize;
    for i in 0..problem.njobs {
        for t in windows.es[i]..=windows.ls[i] {
            if starts[i] < 0 && lits.get(curr).copied().unwrap_or(false) {
                starts[i] = t;
            }
            curr += 1;
        }
    }

    let makespan = starts.last().copied().unwrap_or(-1);
    let valid = check_valid(problem, &starts);
    let mut output = format!("{}, {}, ", makespan, valid as i32);
    for s in &starts {
        write!(output, "{}.", s).unwrap();
    }
    output
}

/// Number of start variables in the encoding of an instance, used to
/// validate the length of a decoded model.
pub fn num_start_vars(problem: &Problem, windows: &TimeWindows) -> usize {
    (0..problem.njobs).map(|i| windows.stw_len(i)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contention_problem() -> Problem {
        let mut p = Problem::new(4, 10, 1);
        p.add_precedence(0, 1);
        p.add_precedence(0, 2);
        p.add_precedence(1, 3);
        p.add_precedence(2, 3);
        p.durations = vec![0, 3, 3, 0];
        p.requests[1][0] = vec![1, 1, 1];
        p.requests[2][0] = vec![1, 1, 1];
        p.capacities[0] = vec![1; 10];
        p
    }

    #[test]
    fn wcnf_file_structure() {
        let p = contention_problem();
        let dir = std::env::temp_dir();
        let path = dir.join("makespan_wcnf_structure_test.wcnf");
        write_wcnf(&p, Bounds { lb: 0, ub: 10 }, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = content.lines();
        let first = lines.next().unwrap();
        assert!(first.starts_with("c "));
        let p_line = content
            .lines()
            .find(|l| l.starts_with("p wcnf "))
            .expect("missing p line");
        let fields: Vec<&str> = p_line.split_whitespace().collect();
        let nbvar: usize = fields[2].parse().unwrap();
        let nbclauses: usize = fields[3].parse().unwrap();
        let clause_lines = content
            .lines()
            .skip_while(|l| !l.starts_with("p wcnf"))
            .skip(1)
            .count();
        assert_eq!(clause_lines, nbclauses);
        assert!(nbvar > 0);
        // every clause is hard and zero-terminated
        for line in content.lines().skip_while(|l| !l.starts_with("p wcnf")).skip(1) {
            assert!(line.starts_with(&TOP.to_string()));
            assert!(line.ends_with(" 0"));
        }
    }

    #[test]
    fn infeasible_instance_writes_contradiction() {
        // a duration-3 job cannot close by an upper bound of 2
        let mut p = contention_problem();
        p.horizon = 2;
        p.capacities[0] = vec![1; 2];
        let path = std::env::temp_dir().join("makespan_wcnf_infeasible_test.wcnf");
        write_wcnf(&p, Bounds { lb: 0, ub: 2 }, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(content, "p wcnf 1 1 1\n1 -1 0\n");
    }

    #[test]
    fn model_decoding_takes_first_true_start() {
        let p = contention_problem();
        let windows = critical_path_windows(&p, 10).unwrap();
        let ny = num_start_vars(&p, &windows);

        // construct a model string asserting the schedule [0, 0, 3, 6]
        let schedule = [0, 0, 3, 6];
        let mut tokens: Vec<String> = Vec::new();
        for i in 0..p.njobs {
            for t in windows.es[i]..=windows.ls[i] {
                let index = tokens.len() + 1;
                if t == schedule[i] {
                    tokens.push(format!("{}", index));
                } else {
                    tokens.push(format!("-{}", index));
                }
            }
        }
        assert_eq!(tokens.len(), ny);
        let model = tokens.join(" ");

        let decoded = solution_from_model(&p, Bounds { lb: 0, ub: 10 }, &model);
        assert_eq!(decoded, "6, 1, 0.0.3.6.");
    }

    #[test]
    fn infeasible_model_decoding() {
        let mut p = contention_problem();
        p.horizon = 2;
        p.capacities[0] = vec![1; 2];
        let out = solution_from_model(&p, Bounds { lb: 0, ub: 2 }, "1 -2 3");
        assert_eq!(out, "-1, 1, ");
    }
}
