//! End-to-end scenarios on small hand-checked instances, driven through
//! both encoders and the WCNF export.

use makespan::bounds::priority_rule_bounds;
use makespan::check::check_valid;
use makespan::encode::{wcnf, Encoder, SatEncoder, SmtEncoder};
use makespan::measure::SolveOutcome;
use makespan::parser::parse_problem;
use makespan::preprocess::critical_path_windows;
use makespan::problem::Problem;
use std::sync::atomic::Ordering;

/// N=3 chain: a single two-tick job between the dummies.
fn trivial_chain() -> Problem {
    let mut p = Problem::new(3, 10, 1);
    p.add_precedence(0, 1);
    p.add_precedence(1, 2);
    p.durations = vec![0, 2, 0];
    p.requests[1][0] = vec![1, 1];
    p.capacities[0] = vec![1; 10];
    p
}

/// N=4 diamond on a unit resource: the middle jobs must serialise.
fn contention(horizon: i32) -> Problem {
    let mut p = Problem::new(4, horizon, 1);
    p.add_precedence(0, 1);
    p.add_precedence(0, 2);
    p.add_precedence(1, 3);
    p.add_precedence(2, 3);
    p.durations = vec![0, 3, 3, 0];
    p.requests[1][0] = vec![1, 1, 1];
    p.requests[2][0] = vec![1, 1, 1];
    p.capacities[0] = vec![1; horizon as usize];
    p
}

/// N=3 chain whose resource is closed at t=0 and t=3.
fn time_dependent_capacity() -> Problem {
    let mut p = trivial_chain();
    p.capacities[0] = vec![0, 1, 1, 0, 1, 1, 1, 1, 1, 1];
    p
}

fn solve(problem: Problem, smt: bool) -> (SolveOutcome, Problem) {
    let bounds = priority_rule_bounds(&problem);
    let copy = problem.clone();
    let mut encoder = if smt {
        Encoder::Smt(SmtEncoder::new(problem, bounds, "scenario".into()))
    } else {
        Encoder::Sat(SatEncoder::new(problem, bounds, "scenario".into()))
    };
    encoder.encode();
    (encoder.optimise(), copy)
}

fn assert_optimal(outcome: SolveOutcome, problem: &Problem, makespan: i32) -> Vec<i32> {
    match outcome {
        SolveOutcome::Optimal { schedule } => {
            assert_eq!(*schedule.last().unwrap(), makespan, "wrong makespan");
            assert!(check_valid(problem, &schedule), "schedule is invalid");
            schedule
        }
        other => panic!("expected an optimal outcome, got {:?}", other),
    }
}

#[test]
fn s1_trivial_feasible_sat() {
    let (outcome, p) = solve(trivial_chain(), false);
    let schedule = assert_optimal(outcome, &p, 2);
    assert_eq!(schedule, vec![0, 0, 2]);
}

#[test]
fn s1_trivial_feasible_smt() {
    let (outcome, p) = solve(trivial_chain(), true);
    let schedule = assert_optimal(outcome, &p, 2);
    assert_eq!(schedule, vec![0, 0, 2]);
}

#[test]
fn s2_contention_sat() {
    let (outcome, p) = solve(contention(10), false);
    let schedule = assert_optimal(outcome, &p, 6);
    assert_eq!(schedule[0], 0);
    assert!(schedule[1..3] == [0, 3] || schedule[1..3] == [3, 0]);
}

#[test]
fn s2_contention_smt() {
    let (outcome, p) = solve(contention(10), true);
    let schedule = assert_optimal(outcome, &p, 6);
    assert!(schedule[1..3] == [0, 3] || schedule[1..3] == [3, 0]);
}

#[test]
fn s3_time_dependent_capacity_sat() {
    let (outcome, p) = solve(time_dependent_capacity(), false);
    let schedule = assert_optimal(outcome, &p, 3);
    assert_eq!(schedule, vec![0, 1, 3]);
}

#[test]
fn s3_time_dependent_capacity_smt() {
    let (outcome, p) = solve(time_dependent_capacity(), true);
    let schedule = assert_optimal(outcome, &p, 3);
    assert_eq!(schedule[1], 1);
}

#[test]
fn s4_infeasible_at_bound_sat() {
    let (outcome, _) = solve(contention(4), false);
    assert_eq!(outcome, SolveOutcome::Infeasible);
}

#[test]
fn s4_infeasible_at_bound_smt() {
    let (outcome, _) = solve(contention(4), true);
    assert_eq!(outcome, SolveOutcome::Infeasible);
}

/// In-process variant of the interrupt scenario: the cooperative stop flag
/// is raised before the search begins, which must surface as an
/// uncertified interrupted outcome rather than a crash.
#[test]
fn s5_interrupt_reports_best_so_far() {
    let problem = contention(10);
    let bounds = priority_rule_bounds(&problem);
    let mut encoder = Encoder::Sat(SatEncoder::new(problem, bounds, "scenario".into()));
    encoder.encode();
    encoder.session().stop.store(true, Ordering::SeqCst);
    match encoder.optimise() {
        SolveOutcome::Interrupted { .. } => (),
        other => panic!("expected an interrupted outcome, got {:?}", other),
    }
    let line = encoder.result_line();
    assert!(
        line.ends_with("-1, 0, 0, "),
        "expected an uncertified empty result: {}",
        line
    );
}

/// WCNF round-trip: encode, "solve" externally by writing down the known
/// optimal model, and decode it back to the same schedule.
#[test]
fn s6_wcnf_round_trip() {
    let problem = contention(10);
    let bounds = priority_rule_bounds(&problem);

    let path = std::env::temp_dir().join("makespan_scenarios_round_trip.wcnf");
    wcnf::write_wcnf(&problem, bounds, &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    // header comments carry the start-variable count and the windows
    let header: Vec<&str> = content.lines().next().unwrap().split_whitespace().collect();
    let ny: usize = header[1].parse().unwrap();
    let windows = critical_path_windows(&problem, bounds.ub).unwrap();

    // an external MaxSAT solver would return a model; fabricate the one for
    // the optimal schedule [0, 0, 3, 6]
    let schedule = [0, 0, 3, 6];
    let mut tokens: Vec<String> = Vec::new();
    for i in 0..problem.njobs {
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

    let decoded = wcnf::solution_from_model(&problem, bounds, &tokens.join(" "));
    assert_eq!(decoded, "6, 1, 0.0.3.6.");
}

/// The full pipeline from the textual format: parse, bound, encode, solve.
#[test]
fn parses_and_solves_a_textual_instance() {
    let text = "\
************************************************************************
file with basedata
************************************************************************
projects                      :  1
jobs (incl. supersource/sink ):  3
horizon                       :  10
RESOURCES
  - renewable                 :  1   R
************************************************************************
PROJECT INFORMATION:
pronr.  #jobs rel.date duedate tardcost  MPM-Time
    1      1      0       10       0       10
************************************************************************
PRECEDENCE RELATIONS:
jobnr.    #modes  #successors   successors
   1        1          1           2
   2        1          1           3
   3        1          0
************************************************************************
REQUESTS/DURATIONS:
jobnr. mode duration  R 1
------------------------------------------------------------------------
  1      1     0
  2      1     2    1 1
  3      1     0
************************************************************************
RESOURCEAVAILABILITIES:
R 1
1 1 1 1 1 1 1 1 1 1
************************************************************************
";
    let problem = parse_problem(text);
    let (outcome, p) = solve(problem, false);
    let schedule = assert_optimal(outcome, &p, 2);
    assert_eq!(schedule, vec![0, 0, 2]);
}
