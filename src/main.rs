use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use corsi_engine::batch::{self, BatchReport};
use corsi_engine::config::EngineConfig;
use corsi_engine::events::RawEvent;
use corsi_engine::export;
use corsi_engine::loader::{self, ShiftClock};
use corsi_engine::shifts::{RawShift, Roster, RosterRow};
use corsi_engine::store;
use corsi_engine::synthetic;

#[derive(Parser)]
#[command(name = "corsi")]
#[command(about = "Balanced-strength Corsi from NHL shift and play-by-play data", long_about = None)]
struct Cli {
    /// Worker threads (overrides CORSI_PARALLELISM)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-player game Corsi from CSV inputs
    Compute {
        /// Shift rows (game_id, player_id, period, shift_start, shift_end)
        #[arg(long)]
        shifts: PathBuf,

        /// Play-by-play rows (game_id, team_id_for, team_id_against, event, period, periodType, periodTime)
        #[arg(long)]
        plays: PathBuf,

        /// Skater roster rows (game_id, player_id, team_id[, position])
        #[arg(long)]
        roster: PathBuf,

        /// SQLite output
        #[arg(long, default_value = "corsi.sqlite")]
        db: PathBuf,

        /// Shift start/end restart every period
        #[arg(long, default_value = "false")]
        period_relative_shifts: bool,
    },

    /// Export season rates from a results database to xlsx
    Export {
        #[arg(long, default_value = "corsi.sqlite")]
        db: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },

    /// Run the engine over generated games
    Simulate {
        #[arg(long, default_value = "82")]
        games: u32,

        #[arg(long, default_value = "1")]
        seed: u64,

        /// Optional SQLite output
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::from_env();
    if let Some(threads) = cli.threads {
        config.parallelism = threads.clamp(1, 64);
    }

    match cli.command {
        Commands::Compute {
            shifts,
            plays,
            roster,
            db,
            period_relative_shifts,
        } => {
            let clock = if period_relative_shifts {
                ShiftClock::PeriodRelative
            } else {
                ShiftClock::Cumulative
            };
            let shifts = loader::load_shifts_csv(&shifts, clock)?;
            let plays = loader::load_plays_csv(&plays)?;
            let roster = loader::load_roster_csv(&roster)?;
            println!(
                "Loaded {} shifts, {} plays, {} roster rows ({} undecodable)",
                shifts.rows.len(),
                plays.rows.len(),
                roster.rows.len(),
                shifts.failed + plays.failed + roster.failed
            );
            run_and_store(&shifts.rows, &plays.rows, roster.rows, Some(db), &config)
        }
        Commands::Export { db, out } => {
            let conn = store::open_db(&db)?;
            let players = store::load_player_game_rows(&conn)?;
            let teams = store::load_team_game_rows(&conn)?;
            let report = export::export_season_rates(&out, &players, &teams)?;
            println!("Export complete: {}", out.display());
            println!("Player seasons: {}", report.player_seasons);
            println!("Team games: {}", report.team_games);
            Ok(())
        }
        Commands::Simulate { games, seed, db } => {
            let mut shifts = Vec::new();
            let mut events = Vec::new();
            let mut roster = Vec::new();
            for n in 0..games {
                let game = synthetic::synthetic_game(seed, 2016020001 + u64::from(n));
                shifts.extend(game.shifts);
                events.extend(game.events);
                roster.extend(game.roster);
            }
            run_and_store(&shifts, &events, roster, db, &config)
        }
    }
}

fn run_and_store(
    shifts: &[RawShift],
    events: &[RawEvent],
    roster: Vec<RosterRow>,
    db: Option<PathBuf>,
    config: &EngineConfig,
) -> Result<()> {
    let started_at = Utc::now().to_rfc3339();
    let roster = Roster::from_rows(roster);
    let grouped = batch::group_games(shifts, events, &roster, config);
    let drops = &grouped.shift_drops;
    println!(
        "Shifts dropped: unrostered {}, goalies {}, degenerate {}, goalies by time on ice {}",
        drops.unrostered,
        drops.goalies,
        drops.degenerate,
        drops.heuristic_goalies.len()
    );
    let report = batch::compute_batch(&grouped.games, config);
    print_report(&report);

    if let Some(db) = db {
        let mut conn = store::open_db(&db)?;
        let summary = store::write_batch(&mut conn, &report, &started_at)
            .with_context(|| format!("write results to {}", db.display()))?;
        println!("DB: {} (run {})", db.display(), summary.run_id);
        println!("Player rows upserted: {}", summary.player_rows);
        println!("Team rows upserted: {}", summary.team_rows);
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("Games: {}/{}", report.outcomes.len(), report.games_total());
    println!(
        "Events counted: {}",
        report.outcomes.iter().map(|o| o.events_counted).sum::<usize>()
    );
    println!(
        "Events dropped: {} (irrelevant {}, shootout {}, unresolvable {}, excluded {})",
        report.drops.total(),
        report.drops.irrelevant,
        report.drops.shootout,
        report.drops.unresolvable,
        report.drops.excluded
    );
    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.len());
        for (game_id, reason) in report.skipped.iter().take(8) {
            println!(" - {game_id}: {reason}");
        }
    }
}
