use std::path::PathBuf;

use corsi_engine::batch::{BatchReport, compute_batch, group_games};
use corsi_engine::config::EngineConfig;
use corsi_engine::engine::{SkipReason, compute_game};
use corsi_engine::export::export_season_rates;
use corsi_engine::loader::{self, ShiftClock};
use corsi_engine::model::{Event, EventType, ShiftInterval};
use corsi_engine::shifts::Roster;
use corsi_engine::store;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_report() -> BatchReport {
    let config = EngineConfig::default();
    let shifts = loader::load_shifts_csv(&fixture("game_shifts.csv"), ShiftClock::Cumulative).unwrap();
    let plays = loader::load_plays_csv(&fixture("game_plays.csv")).unwrap();
    let roster = Roster::from_rows(loader::load_roster_csv(&fixture("game_skater_stats.csv")).unwrap().rows);
    let grouped = group_games(&shifts.rows, &plays.rows, &roster, &config);
    compute_batch(&grouped.games, &config)
}

#[test]
fn batch_round_trips_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("corsi.sqlite");
    let report = fixture_report();

    let mut conn = store::open_db(&db).unwrap();
    let summary = store::write_batch(&mut conn, &report, "2024-01-01T00:00:00Z").unwrap();
    assert_eq!(summary.games_total, 2);
    assert_eq!(summary.games_computed, 1);
    assert_eq!(summary.player_rows, 10);
    assert_eq!(summary.team_rows, 2);
    assert_eq!(summary.skipped, 1);

    assert_eq!(store::load_player_game_rows(&conn).unwrap(), report.player_rows());
    assert_eq!(store::load_team_game_rows(&conn).unwrap(), report.team_rows());
    assert_eq!(
        store::load_skipped_games(&conn).unwrap(),
        vec![(2016020002, "malformed_team_topology".to_string())]
    );
}

#[test]
fn rewriting_a_batch_upserts_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nested").join("corsi.sqlite");
    let report = fixture_report();

    let mut conn = store::open_db(&db).unwrap();
    let first = store::write_batch(&mut conn, &report, "2024-01-01T00:00:00Z").unwrap();
    let second = store::write_batch(&mut conn, &report, "2024-01-02T00:00:00Z").unwrap();
    assert!(second.run_id > first.run_id);

    let players = store::load_player_game_rows(&conn).unwrap();
    assert_eq!(players.len(), 10);
    assert_eq!(players, report.player_rows());
    assert_eq!(store::load_skipped_games(&conn).unwrap().len(), 1);

    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM compute_runs WHERE finished_at IS NOT NULL", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(runs, 2);
}

#[test]
fn export_writes_season_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("season.xlsx");
    let report = fixture_report();

    let summary = export_season_rates(&out, &report.player_rows(), &report.team_rows()).unwrap();
    assert_eq!(summary.player_seasons, 10);
    assert_eq!(summary.team_games, 2);
    assert!(out.exists());
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

fn small_game(players: &[(u32, u32)]) -> BatchReport {
    let shifts: Vec<ShiftInterval> = players
        .iter()
        .map(|&(player_id, team_id)| ShiftInterval {
            game_id: 1,
            player_id,
            team_id,
            start_sec: 0,
            end_sec: 60,
        })
        .collect();
    let shot = Event {
        game_id: 1,
        time_sec: 10,
        event_type: EventType::Shot,
        team_for: 10,
        team_against: 20,
    };
    let outcome = compute_game(1, &shifts, &[shot], &EngineConfig::default()).unwrap();
    BatchReport {
        outcomes: vec![outcome],
        ..BatchReport::default()
    }
}

#[test]
fn recomputed_or_skipped_game_leaves_no_stale_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = store::open_db(&dir.path().join("corsi.sqlite")).unwrap();

    store::write_batch(&mut conn, &small_game(&[(1, 10), (2, 10), (3, 20)]), "2024-01-01T00:00:00Z").unwrap();
    assert_eq!(store::load_player_game_rows(&conn).unwrap().len(), 3);

    let fewer = small_game(&[(1, 10), (3, 20)]);
    store::write_batch(&mut conn, &fewer, "2024-01-02T00:00:00Z").unwrap();
    assert_eq!(store::load_player_game_rows(&conn).unwrap(), fewer.player_rows());

    let skipped = BatchReport {
        skipped: vec![(1, SkipReason::MissingEvents)],
        ..BatchReport::default()
    };
    store::write_batch(&mut conn, &skipped, "2024-01-03T00:00:00Z").unwrap();
    assert!(store::load_player_game_rows(&conn).unwrap().is_empty());
    assert!(store::load_team_game_rows(&conn).unwrap().is_empty());
    assert_eq!(
        store::load_skipped_games(&conn).unwrap(),
        vec![(1, "missing_events".to_string())]
    );

    let unfinished: i64 = conn
        .query_row("SELECT COUNT(*) FROM compute_runs WHERE finished_at IS NULL", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(unfinished, 0);
}
