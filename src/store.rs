use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};

use crate::batch::BatchReport;
use crate::model::{PlayerGameCorsi, TeamGameCorsi};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: i64,
    pub games_total: usize,
    pub games_computed: usize,
    pub player_rows: usize,
    pub team_rows: usize,
    pub skipped: usize,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS player_game_corsi (
            game_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            corsi_for INTEGER NOT NULL,
            corsi_against INTEGER NOT NULL,
            corsi INTEGER NOT NULL,
            cf_percent REAL NOT NULL,
            toi_total_sec INTEGER NOT NULL,
            toi_balanced_sec INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, player_id)
        );
        CREATE INDEX IF NOT EXISTS idx_pgc_player ON player_game_corsi(player_id);
        CREATE INDEX IF NOT EXISTS idx_pgc_team ON player_game_corsi(team_id);

        CREATE TABLE IF NOT EXISTS team_game_corsi (
            game_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            corsi_for INTEGER NOT NULL,
            corsi_against INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS skipped_games (
            game_id INTEGER PRIMARY KEY,
            reason TEXT NOT NULL,
            detail TEXT NOT NULL,
            run_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS compute_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            games_total INTEGER NOT NULL,
            games_computed INTEGER NOT NULL,
            player_rows INTEGER NOT NULL,
            skipped_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Replaces every game in a batch and records the run. A recomputed game
/// keeps only its new rows; a skipped game keeps none, just its skip record.
pub fn write_batch(conn: &mut Connection, report: &BatchReport, started_at: &str) -> Result<RunSummary> {
    let tx = conn.transaction().context("begin write transaction")?;
    tx.execute(
        "INSERT INTO compute_runs(started_at, finished_at, games_total, games_computed, player_rows, skipped_json)
         VALUES (?1, NULL, ?2, 0, 0, '[]')",
        params![started_at, report.games_total() as i64],
    )
    .context("insert compute run")?;
    let run_id = tx.last_insert_rowid();

    let mut player_rows = 0usize;
    let mut team_rows = 0usize;
    for outcome in &report.outcomes {
        clear_game(&tx, outcome.game_id)?;
        tx.execute("DELETE FROM skipped_games WHERE game_id = ?1", params![outcome.game_id as i64])
            .context("clear skip record")?;
        for row in &outcome.players {
            upsert_player_row(&tx, row)?;
            player_rows += 1;
        }
        for row in &outcome.teams {
            upsert_team_row(&tx, row)?;
            team_rows += 1;
        }
    }
    for (game_id, reason) in &report.skipped {
        clear_game(&tx, *game_id)?;
        tx.execute(
            "INSERT INTO skipped_games(game_id, reason, detail, run_id) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(game_id) DO UPDATE SET
                reason = excluded.reason, detail = excluded.detail, run_id = excluded.run_id",
            params![*game_id as i64, reason.label(), reason.to_string(), run_id],
        )
        .context("upsert skip record")?;
    }

    let skipped: Vec<(u64, String)> = report
        .skipped
        .iter()
        .map(|(game_id, reason)| (*game_id, reason.to_string()))
        .collect();
    let skipped_json = serde_json::to_string(&skipped).unwrap_or_else(|_| "[]".to_string());
    tx.execute(
        "UPDATE compute_runs
         SET finished_at = ?1, games_computed = ?2, player_rows = ?3, skipped_json = ?4
         WHERE run_id = ?5",
        params![
            Utc::now().to_rfc3339(),
            report.outcomes.len() as i64,
            player_rows as i64,
            skipped_json,
            run_id
        ],
    )
    .context("update compute run")?;
    tx.commit().context("commit write transaction")?;

    Ok(RunSummary {
        run_id,
        games_total: report.games_total(),
        games_computed: report.outcomes.len(),
        player_rows,
        team_rows,
        skipped: report.skipped.len(),
    })
}

fn clear_game(tx: &Transaction<'_>, game_id: u64) -> Result<()> {
    tx.execute("DELETE FROM player_game_corsi WHERE game_id = ?1", params![game_id as i64])
        .context("clear player rows for game")?;
    tx.execute("DELETE FROM team_game_corsi WHERE game_id = ?1", params![game_id as i64])
        .context("clear team rows for game")?;
    Ok(())
}

fn upsert_player_row(tx: &Transaction<'_>, row: &PlayerGameCorsi) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO player_game_corsi (
            game_id, player_id, team_id, corsi_for, corsi_against, corsi,
            cf_percent, toi_total_sec, toi_balanced_sec, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(game_id, player_id) DO UPDATE SET
            team_id = excluded.team_id,
            corsi_for = excluded.corsi_for,
            corsi_against = excluded.corsi_against,
            corsi = excluded.corsi,
            cf_percent = excluded.cf_percent,
            toi_total_sec = excluded.toi_total_sec,
            toi_balanced_sec = excluded.toi_balanced_sec,
            updated_at = excluded.updated_at
        "#,
        params![
            row.game_id as i64,
            row.player_id,
            row.team_id,
            row.corsi_for,
            row.corsi_against,
            row.corsi(),
            row.cf_percent(),
            row.toi_total_sec,
            row.toi_balanced_sec,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert player corsi row")?;
    Ok(())
}

fn upsert_team_row(tx: &Transaction<'_>, row: &TeamGameCorsi) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO team_game_corsi (game_id, team_id, corsi_for, corsi_against, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(game_id, team_id) DO UPDATE SET
            corsi_for = excluded.corsi_for,
            corsi_against = excluded.corsi_against,
            updated_at = excluded.updated_at
        "#,
        params![
            row.game_id as i64,
            row.team_id,
            row.corsi_for,
            row.corsi_against,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert team corsi row")?;
    Ok(())
}

pub fn load_player_game_rows(conn: &Connection) -> Result<Vec<PlayerGameCorsi>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT game_id, player_id, team_id, corsi_for, corsi_against,
                   toi_total_sec, toi_balanced_sec
            FROM player_game_corsi
            ORDER BY game_id ASC, team_id ASC, player_id ASC
            "#,
        )
        .context("prepare load player rows query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PlayerGameCorsi {
                game_id: row.get::<_, u64>(0)?,
                player_id: row.get(1)?,
                team_id: row.get(2)?,
                corsi_for: row.get(3)?,
                corsi_against: row.get(4)?,
                toi_total_sec: row.get(5)?,
                toi_balanced_sec: row.get(6)?,
            })
        })
        .context("query player rows")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player corsi row")?);
    }
    Ok(out)
}

pub fn load_team_game_rows(conn: &Connection) -> Result<Vec<TeamGameCorsi>> {
    let mut stmt = conn
        .prepare(
            "SELECT game_id, team_id, corsi_for, corsi_against
             FROM team_game_corsi
             ORDER BY game_id ASC, team_id ASC",
        )
        .context("prepare load team rows query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TeamGameCorsi {
                game_id: row.get::<_, u64>(0)?,
                team_id: row.get(1)?,
                corsi_for: row.get(2)?,
                corsi_against: row.get(3)?,
            })
        })
        .context("query team rows")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode team corsi row")?);
    }
    Ok(out)
}

pub fn load_skipped_games(conn: &Connection) -> Result<Vec<(u64, String)>> {
    let mut stmt = conn
        .prepare("SELECT game_id, reason FROM skipped_games ORDER BY game_id ASC")
        .context("prepare skipped games query")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, u64>(0)?, row.get::<_, String>(1)?)))
        .context("query skipped games")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode skipped game row")?);
    }
    Ok(out)
}
