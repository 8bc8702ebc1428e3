//! Turn a free-text goal into a plan and run it against a desktop application.
//!
//! Reads one goal line from stdin, asks the configured planner for a plan,
//! prints it, executes it step by step, and prints each step's outcome.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use autopilot::core::plan::parse_plan;
use autopilot::core::script::ScriptBook;
use autopilot::core::state::AppState;
use autopilot::engine::execute_plan_with;
use autopilot::error::{PlanError, PlannerError};
use autopilot::exit_codes;
use autopilot::io::config::{DEFAULT_CONFIG_PATH, load_config};
use autopilot::io::planner::{CommandPlanner, Planner};
use autopilot::io::transport::OsascriptTransport;
use autopilot::logging;
use autopilot::tools::Toolbox;
use clap::Parser;
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "autopilot",
    version,
    about = "Plan and run scripted actions against a desktop application"
)]
struct Cli {
    /// Config file; defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run a saved plan (JSON array of steps) instead of asking the planner.
    #[arg(long, value_name = "FILE")]
    plan: Option<PathBuf>,

    /// Validate and print the plan without executing it.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config).context("load config")?;
    debug!(app = %cfg.app_name, config = %cli.config.display(), "config loaded");

    let plan = match &cli.plan {
        Some(path) => load_plan_file(path)?,
        None => {
            let goal = read_goal(&mut std::io::stdin().lock())?;
            println!("\nPlanning...");
            CommandPlanner::new(cfg.planner.clone(), cfg.app_name.as_str()).create_plan(&goal)?
        }
    };

    println!("\nPlan:");
    print_plan(&plan);

    if cli.dry_run {
        let calls = parse_plan(&plan)?;
        println!("\nPlan is valid ({} steps), not executing", calls.len());
        return Ok(());
    }

    let tools = Toolbox::new(
        OsascriptTransport::new(cfg.transport.clone()),
        ScriptBook::new(cfg.app_name.as_str()),
    );
    let mut state = AppState::default();

    println!("\nExecuting...");
    let outcomes = execute_plan_with(&plan, &tools, &mut state, |_, call| {
        println!("→ Executing {} {}", call.tool(), call.args());
    })?;

    println!("\nResults:");
    for outcome in &outcomes {
        println!("{outcome}");
    }
    Ok(())
}

/// Prompt for and read a single goal line.
fn read_goal<R: BufRead>(input: &mut R) -> Result<String> {
    print!("\nWhat do you want to do?\n> ");
    std::io::stdout().flush().context("flush stdout")?;

    let mut line = String::new();
    input.read_line(&mut line).context("read goal from stdin")?;
    let goal = line.trim();
    if goal.is_empty() {
        bail!("no goal given on stdin");
    }
    Ok(goal.to_string())
}

fn load_plan_file(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

fn print_plan(plan: &Value) {
    match plan.as_array() {
        Some(steps) => {
            for step in steps {
                println!("{step}");
            }
        }
        None => println!("{plan}"),
    }
}

/// Map an error chain onto a stable exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(plan_err) = err.downcast_ref::<PlanError>() {
        return if plan_err.is_rejection() {
            exit_codes::REJECTED
        } else {
            exit_codes::STEP_FAILED
        };
    }
    if err.downcast_ref::<PlannerError>().is_some() {
        return exit_codes::PLANNER;
    }
    exit_codes::INVALID
}
