use anyhow::{Context, Result};
use env_logger::Target;
use log::{info, LevelFilter};
use makespan::bounds::{priority_rule_bounds, Bounds};
use makespan::encode::{wcnf, Encoder, SatEncoder, SmtEncoder};
use makespan::measure::SolveOutcome;
use makespan::parser::parse_problem;
use makespan::problem::Problem;
use makespan::interrupt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "makespan",
    about = "Exact RCPSP/t solver over SAT or integer difference logic"
)]
struct Opt {
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Optimise with the integer-difference-logic encoding.
    Smt { instance: PathBuf },
    /// Optimise with the pure propositional encoding.
    Sat { instance: PathBuf },
    /// Encode to a weighted-CNF file for an external MaxSAT solver.
    Maxsat { instance: PathBuf, output: PathBuf },
    /// Map a MaxSAT model back to a schedule.
    Mod2sol { instance: PathBuf, model: PathBuf },
}

fn main() {
    let opt = Opt::from_args();
    env_logger::builder()
        .filter_level(if opt.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .target(Target::Stdout)
        .init();

    if let Err(e) = run(opt.command) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    interrupt::install_handlers();
    match command {
        Command::Smt { instance } => {
            let (problem, bounds) = load(&instance)?;
            let encoder = SmtEncoder::new(problem, bounds, instance.display().to_string());
            optimise(Encoder::Smt(encoder))
        }
        Command::Sat { instance } => {
            let (problem, bounds) = load(&instance)?;
            let encoder = SatEncoder::new(problem, bounds, instance.display().to_string());
            optimise(Encoder::Sat(encoder))
        }
        Command::Maxsat { instance, output } => {
            let (problem, bounds) = load(&instance)?;
            let started = Instant::now();
            wcnf::write_wcnf(&problem, bounds, &output)?;
            println!("{}", started.elapsed().as_millis());
            Ok(())
        }
        Command::Mod2sol { instance, model } => {
            let (problem, bounds) = load(&instance)?;
            let model = std::fs::read_to_string(&model)
                .with_context(|| format!("cannot read model file {}", model.display()))?;
            println!(
                "{}, {}",
                instance.display(),
                wcnf::solution_from_model(&problem, bounds, &model)
            );
            Ok(())
        }
    }
}

fn load(instance: &Path) -> Result<(Problem, Bounds)> {
    let content = std::fs::read_to_string(instance)
        .with_context(|| format!("cannot read instance file {}", instance.display()))?;
    let problem = parse_problem(&content);
    let bounds = priority_rule_bounds(&problem);
    info!(
        "{} jobs, horizon {}, {} resources, bounds [{}, {}]",
        problem.njobs, problem.horizon, problem.nresources, bounds.lb, bounds.ub
    );
    Ok((problem, bounds))
}

fn optimise(mut encoder: Encoder) -> Result<()> {
    interrupt::register(encoder.session());
    encoder.encode();
    match encoder.optimise() {
        SolveOutcome::Optimal { schedule } => info!("optimal schedule: {:?}", schedule),
        SolveOutcome::Infeasible => info!("proven infeasible"),
        SolveOutcome::Interrupted { .. } => info!("interrupted, reporting best schedule so far"),
    }
    interrupt::deregister();
    println!("{}", encoder.result_line());
    Ok(())
}
