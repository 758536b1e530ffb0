use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;

use anyhow::bail;
use botmaze_graph::CallGraph;
use botmaze_program::ast::visit_actions;
use botmaze_program::{validate_program, Program, Severity, StatementKind};
use botmaze_runtime::{
    ExecutorEvent, ExecutorState, InteractiveExecutor, ManualScheduler, OutcomeEvaluator, Scheduler,
    Simulator, WorldState,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::level::{read_level, read_program, RunConfig};

#[derive(Debug, Parser)]
#[command(name = "botmaze", version, about = "Run and check botmaze block programs")]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a program and report problems without running it
    Check(CheckArgs),
    /// Run a program to completion against a level, leaving no trace
    Simulate(RunArgs),
    /// Run a program step by step with the live executor
    Play(PlayArgs),
    /// Count the blocks a program uses
    Blocks(CheckArgs),
}

#[derive(Debug, Args, Clone)]
struct CheckArgs {
    #[arg(value_name = "PROGRAM")]
    program: PathBuf,
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args, Clone)]
struct RunArgs {
    #[arg(value_name = "PROGRAM")]
    program: PathBuf,
    /// Level file with `world` and `goal`
    #[arg(long)]
    level: PathBuf,
    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the step cap
    #[arg(long)]
    max_steps: Option<usize>,
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args, Clone)]
struct PlayArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Override the delay between steps
    #[arg(long)]
    step_delay_ms: Option<u64>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        init_logging(self.verbose);
        match self.command {
            Command::Check(args) => check(args),
            Command::Simulate(args) => simulate(args),
            Command::Play(args) => play(args),
            Command::Blocks(args) => blocks(args),
        }
    }
}

fn init_logging(verbose: u8) {
    let fallback_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// =============================================================================
// check
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Finding {
    severity: &'static str,
    path: Option<String>,
    message: String,
    hint: Option<String>,
}

fn check(args: CheckArgs) -> anyhow::Result<()> {
    let program = read_program(&args.program)?;
    let findings = findings(&program)?;
    let errors = findings.iter().filter(|f| f.severity == "error").count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        for finding in &findings {
            match &finding.path {
                Some(path) => println!("{}: {}: {}", finding.severity, path, finding.message),
                None => println!("{}: {}", finding.severity, finding.message),
            }
            if let Some(hint) = &finding.hint {
                println!("  hint: {}", hint);
            }
        }
        println!(
            "{}: {} block(s), {} error(s), {} warning(s)",
            args.program.display(),
            program.block_count,
            errors,
            findings.len() - errors
        );
    }

    if errors > 0 {
        bail!("{} has {} error(s)", args.program.display(), errors);
    }
    Ok(())
}

fn findings(program: &Program) -> anyhow::Result<Vec<Finding>> {
    let mut findings: Vec<Finding> = program
        .warnings
        .iter()
        .map(|w| Finding {
            severity: "warning",
            path: Some(w.path.clone()),
            message: w.message.clone(),
            hint: None,
        })
        .collect();

    findings.extend(validate_program(program).into_iter().map(|e| Finding {
        severity: match e.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        },
        path: Some(e.path),
        message: e.message,
        hint: e.hint,
    }));

    // Unresolved calls are already reported by validate_program.
    let graph = CallGraph::from_program(program)?;
    findings.extend(graph.validate().warnings.into_iter().map(|w| Finding {
        severity: "warning",
        path: None,
        message: w.message(),
        hint: None,
    }));

    Ok(findings)
}

// =============================================================================
// simulate
// =============================================================================

fn simulate(args: RunArgs) -> anyhow::Result<()> {
    let program = read_program(&args.program)?;
    let mut level = read_level(&args.level)?;
    let mut config = RunConfig::read(args.config.as_deref())?;
    if let Some(max_steps) = args.max_steps {
        config.executor.limits.max_steps = max_steps;
    }

    let simulation = Simulator::new(level.goal)
        .with_limits(config.executor.limits)
        .simulate(&program, &mut level.world);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&simulation)?);
    } else {
        for (i, action) in simulation.actions.iter().enumerate() {
            println!("{:>4}  {}", i + 1, action);
        }
        println!(
            "{}: {}",
            if simulation.outcome.won { "won" } else { "lost" },
            simulation.outcome.message
        );
    }

    if !simulation.outcome.won {
        bail!("level not solved: {}", simulation.outcome.message);
    }
    Ok(())
}

// =============================================================================
// play
// =============================================================================

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let run = args.run;
    let program = read_program(&run.program)?;
    let level = read_level(&run.level)?;
    let mut config = RunConfig::read(run.config.as_deref())?;
    if let Some(max_steps) = run.max_steps {
        config.executor.limits.max_steps = max_steps;
    }
    if let Some(delay) = args.step_delay_ms {
        config.executor.step_delay_ms = delay;
    }

    let mut executor = InteractiveExecutor::new(level.world, level.goal, ManualScheduler::new())
        .with_config(config.executor);
    executor.load(program);
    executor.start()?;

    drive_timers(&mut executor, |event| print_event(event, run.json))?;

    match executor.state() {
        ExecutorState::Completed { outcome } if outcome.won => Ok(()),
        ExecutorState::Completed { outcome } => bail!("level not solved: {}", outcome.message),
        ExecutorState::Failed { reason } => bail!("run failed: {}", reason),
        state => bail!("run ended in unexpected state {:?}", state),
    }
}

/// Stand in for a UI timer: sleep for each requested delay, then fire,
/// until nothing is scheduled.
fn drive_timers<W, E>(
    executor: &mut InteractiveExecutor<W, E, ManualScheduler>,
    mut on_event: impl FnMut(&ExecutorEvent) -> anyhow::Result<()>,
) -> anyhow::Result<()>
where
    W: WorldState,
    E: OutcomeEvaluator<W>,
{
    loop {
        for event in executor.drain_events() {
            on_event(&event)?;
        }

        let next = executor.scheduler().pending().next();
        let Some((id, delay)) = next else { break };
        executor.scheduler_mut().cancel(id);
        thread::sleep(delay);
        executor.on_timer(id);
    }
    Ok(())
}

fn print_event(event: &ExecutorEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        ExecutorEvent::Started { total } => println!("started ({} queued)", total),
        ExecutorEvent::Step {
            index,
            total,
            action,
        } => println!("[{}/{}] {}", index, total, action),
        ExecutorEvent::Finished { won, message } => {
            println!("{}: {}", if *won { "won" } else { "lost" }, message)
        }
        ExecutorEvent::Failed { reason, action } => match action {
            Some(action) => println!("failed at {}: {}", action, reason),
            None => println!("failed: {}", reason),
        },
        other => println!("{:?}", other),
    }
    Ok(())
}

// =============================================================================
// blocks
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockSummary {
    block_count: usize,
    node_count: usize,
    function_count: usize,
    unrolled: Vec<StatementKind>,
    kinds: BTreeMap<StatementKind, usize>,
}

fn summarize(program: &Program) -> BlockSummary {
    let mut kinds = BTreeMap::new();
    let mut tally = |node: &botmaze_program::ActionNode| {
        *kinds.entry(node.kind()).or_insert(0) += 1;
    };
    visit_actions(&program.actions, &mut tally);
    for function in program.functions.values() {
        visit_actions(&function.body, &mut tally);
    }

    BlockSummary {
        block_count: program.block_count,
        node_count: program.node_count(),
        function_count: program.functions.len(),
        unrolled: program.unrolled.iter().copied().collect(),
        kinds,
    }
}

fn blocks(args: CheckArgs) -> anyhow::Result<()> {
    let program = read_program(&args.program)?;
    let summary = summarize(&program);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("blocks:    {}", summary.block_count);
    println!("nodes:     {}", summary.node_count);
    println!("functions: {}", summary.function_count);
    for (kind, count) in &summary.kinds {
        println!("  {:<14}{}", kind.tag(), count);
    }
    for kind in &summary.unrolled {
        println!("  {:<14}unrolled", kind.tag());
    }
    Ok(())
}
