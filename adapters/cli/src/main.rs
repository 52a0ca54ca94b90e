#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays Maze Chase games.

mod history;
mod terminal;

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use maze_chase_core::AgentIndex;
use maze_chase_system_classic_rules::ClassicRules;
use maze_chase_system_scheduler::{
    Agent, IllegalActionPolicy, Phase, Scheduler, SchedulerConfig, ScriptedAgent,
};
use maze_chase_world::Layout;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{history::MoveHistory, terminal::TerminalDisplay};

/// Replays a recorded move history on an ASCII level.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", version, about)]
struct Cli {
    /// Level file: `%` wall, `.` food, `o` collectible, `P` controlled agent,
    /// `G` or `1`-`4` adversary.
    #[arg(long)]
    layout: PathBuf,
    /// JSON move history to replay; every agent stops when it runs out of moves.
    #[arg(long)]
    moves: Option<PathBuf>,
    /// Number of adversaries to seat; defaults to every adversary in the level.
    #[arg(long)]
    adversaries: Option<usize>,
    /// Crash agents that request impossible moves (default).
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,
    /// Replace impossible moves with a stop.
    #[arg(long)]
    lenient: bool,
    /// Capture agent diagnostics instead of printing them.
    #[arg(long)]
    mute: bool,
    /// Let agent faults abort the run and disable time budgets.
    #[arg(long)]
    debug: bool,
    /// Rounds to play before the game is called; defaults to the longest script.
    #[arg(long)]
    cycle_limit: Option<u64>,
    /// Where to write the moves that were actually applied.
    #[arg(long)]
    history_out: Option<PathBuf>,
    /// Print every board and log at debug level.
    #[arg(long, short)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the Maze Chase command-line interface.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let text = fs::read_to_string(&cli.layout)
        .with_context(|| format!("failed to read layout {}", cli.layout.display()))?;
    let layout: Layout = text
        .parse()
        .with_context(|| format!("invalid layout {}", cli.layout.display()))?;

    let recorded = match &cli.moves {
        Some(path) => MoveHistory::load(path)?,
        None => MoveHistory::default(),
    };

    let adversaries = cli
        .adversaries
        .unwrap_or_else(|| layout.adversary_count())
        .min(layout.adversary_count());
    let agent_count = adversaries + 1;
    if let Some(highest) = recorded.highest_agent() {
        if highest.get() >= agent_count {
            warn!(
                agent = %highest,
                agents = agent_count,
                "history mentions agents that are not seated; their moves are ignored"
            );
        }
    }

    let agents: Vec<Box<dyn Agent>> = (0..agent_count)
        .map(|index| {
            Box::new(ScriptedAgent::from_history(
                &recorded.moves,
                AgentIndex::new(index),
            )) as Box<dyn Agent>
        })
        .collect();

    let cycle_limit = cli
        .cycle_limit
        .unwrap_or_else(|| recorded.longest_script(agent_count).max(1) as u64);
    let rules = ClassicRules::new(layout).with_cycle_limit(Some(cycle_limit));

    let policy = if cli.lenient && !cli.strict {
        IllegalActionPolicy::Lenient
    } else {
        IllegalActionPolicy::Strict
    };
    let config = SchedulerConfig::new()
        .with_illegal_actions(policy)
        .with_mute_agents(cli.mute)
        .with_fault_tolerant(!cli.debug);

    info!(agents = agent_count, cycle_limit, "replaying game");
    let display = TerminalDisplay::stdout(cli.verbose);
    let mut scheduler = Scheduler::new(rules, display, agents, config);
    let outcome = scheduler.run().context("game aborted")?;

    match outcome.status {
        Phase::Crashed { agent } => {
            let fault = outcome
                .crash
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            println!("Agent {agent} crashed: {fault}");
        }
        _ => match scheduler.rules().ending() {
            Some(ending) => println!("Game over ({ending:?})"),
            None => println!("Game over"),
        },
    }
    println!("Score: {} after {} rounds", outcome.score, outcome.cycles);
    for (agent, fault) in &outcome.finalization_failures {
        println!("Agent {agent} failed to finalize: {fault}");
    }
    for report in outcome.agents.iter().filter(|report| !report.output.is_empty()) {
        info!(
            agent = %report.index,
            output = %report.output.trim_end(),
            "captured agent output"
        );
    }

    if let Some(path) = &cli.history_out {
        let applied = MoveHistory {
            moves: outcome.history.clone(),
            score: Some(outcome.score),
        };
        applied.save(path)?;
        info!(
            path = %path.display(),
            moves = applied.moves.len(),
            "move history written"
        );
    }

    Ok(())
}
