//! Headless match-3 runner (default binary).
//!
//! Plays a session without a presenter: every animation is acknowledged at once, moves
//! are picked by scanning for the first legal swap, and the final grid and stats are
//! printed as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use match3_cascade::core::{is_valid_swap, Config, Grid, TypeRegistry};
use match3_cascade::engine::{ActionOutcome, InstantPresenter, Match3Session};
use match3_cascade::types::{Mode, Position};

/// Match-3 grid and cascade engine.
#[derive(Debug, Parser)]
#[command(name = "match3-cascade", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a number of moves headlessly and print the result
    Sim(SimArgs),
}

#[derive(Debug, Args)]
struct SimArgs {
    /// Piece roster: easy or normal. Defaults to MATCH3_MODE or normal.
    #[arg(long, value_name = "MODE")]
    mode: Option<String>,

    /// RNG seed. Defaults to MATCH3_SEED or entropy.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Number of moves to play
    #[arg(long, default_value = "10", value_name = "N")]
    moves: u32,

    /// Grid rows
    #[arg(long, value_name = "R")]
    rows: Option<usize>,

    /// Grid columns
    #[arg(long, value_name = "C")]
    columns: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Sim(args) => sim(args).await,
    }
}

async fn sim(args: SimArgs) -> Result<()> {
    let mut config = Config::from_env().context("reading MATCH3_* environment")?;
    if let Some(mode) = args.mode.as_deref() {
        config.mode = Mode::from_str(mode).with_context(|| format!("unknown mode: {}", mode))?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }

    let mut session = Match3Session::setup(config, Arc::new(InstantPresenter))?;
    session.attach_event_log_from_env();
    session.start_playing();

    let mut played = 0u32;
    let mut cascade_rounds = 0u32;
    for _ in 0..args.moves {
        let registry = TypeRegistry::for_mode(session.config().mode);
        let Some((from, to)) = first_legal_swap(session.grid(), &registry, session.config().free_moves)
        else {
            break;
        };

        match session.action_move(from, to).await? {
            ActionOutcome::Accepted(summary) => {
                played += 1;
                cascade_rounds += summary.map_or(0, |s| s.rounds);
            }
            ActionOutcome::Rejected | ActionOutcome::Ignored => break,
        }
    }

    session.stop_playing();

    let report = json!({
        "mode": session.config().mode,
        "seed": session.config().seed,
        "moves_requested": args.moves,
        "moves_played": played,
        "cascade_rounds": cascade_rounds,
        "grid": session.grid().to_rows(),
        "stats": session.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    session.close().await;
    Ok(())
}

/// First swap in row-major order (right neighbour before the one below) that is legal
fn first_legal_swap(grid: &Grid, registry: &TypeRegistry, free_moves: bool) -> Option<(Position, Position)> {
    grid.positions().find_map(|from| {
        [from.offset(0, 1), from.offset(1, 0)]
            .into_iter()
            .filter(|&to| grid.is_valid_position(to))
            .find(|&to| is_valid_swap(grid, registry, from, to, free_moves))
            .map(|to| (from, to))
    })
}
