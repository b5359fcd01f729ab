//! CSV adapters for the public NHL game dataset layout
//! (`game_shifts.csv`, `game_plays.csv`, `game_skater_stats.csv`).
//!
//! Rows that cannot be decoded are counted and skipped; cells that hold
//! placeholders such as `NA` decode as missing values.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::clock::cumulative_seconds;
use crate::events::RawEvent;
use crate::model::{GameId, PlayerId, TeamId};
use crate::shifts::{RawShift, RosterRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftClock {
    #[default]
    Cumulative,
    /// Offsets restart every period and are shifted by the period start.
    PeriodRelative,
}

#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
struct ShiftRecord {
    game_id: GameId,
    player_id: PlayerId,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    period: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    shift_start: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    shift_end: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlayRecord {
    game_id: GameId,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    team_id_for: Option<TeamId>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    team_id_against: Option<TeamId>,
    event: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    period: Option<u32>,
    #[serde(default, rename = "periodType")]
    period_type: Option<String>,
    #[serde(default, rename = "periodTime")]
    period_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RosterRecord {
    game_id: GameId,
    player_id: PlayerId,
    team_id: TeamId,
    #[serde(default, alias = "primaryPosition")]
    position: Option<String>,
}

pub fn load_shifts_csv(path: &Path, clock: ShiftClock) -> Result<Loaded<RawShift>> {
    let file = File::open(path).with_context(|| format!("open shifts csv {}", path.display()))?;
    read_shifts(file, clock).with_context(|| format!("read shifts csv {}", path.display()))
}

pub fn load_plays_csv(path: &Path) -> Result<Loaded<RawEvent>> {
    let file = File::open(path).with_context(|| format!("open plays csv {}", path.display()))?;
    read_plays(file).with_context(|| format!("read plays csv {}", path.display()))
}

pub fn load_roster_csv(path: &Path) -> Result<Loaded<RosterRow>> {
    let file = File::open(path).with_context(|| format!("open roster csv {}", path.display()))?;
    read_roster(file).with_context(|| format!("read roster csv {}", path.display()))
}

pub fn read_shifts<R: Read>(reader: R, clock: ShiftClock) -> Result<Loaded<RawShift>> {
    read_records(reader, |rec: ShiftRecord| {
        let (start_sec, end_sec) = match clock {
            ShiftClock::Cumulative => (rec.shift_start, rec.shift_end),
            ShiftClock::PeriodRelative => {
                let base = rec
                    .period
                    .and_then(|p| cumulative_seconds(p, 0))
                    .map(f64::from);
                (
                    base.zip(rec.shift_start).map(|(b, v)| b + v),
                    base.zip(rec.shift_end).map(|(b, v)| b + v),
                )
            }
        };
        RawShift {
            game_id: rec.game_id,
            player_id: rec.player_id,
            start_sec,
            end_sec,
        }
    })
}

pub fn read_plays<R: Read>(reader: R) -> Result<Loaded<RawEvent>> {
    read_records(reader, |rec: PlayRecord| RawEvent {
        game_id: rec.game_id,
        event_type: rec.event,
        period: rec.period,
        period_type: rec.period_type.filter(|s| !s.trim().is_empty()),
        period_time: rec.period_time.filter(|s| !s.trim().is_empty()),
        team_for: rec.team_id_for,
        team_against: rec.team_id_against,
    })
}

pub fn read_roster<R: Read>(reader: R) -> Result<Loaded<RosterRow>> {
    read_records(reader, |rec: RosterRecord| RosterRow {
        game_id: rec.game_id,
        player_id: rec.player_id,
        team_id: rec.team_id,
        position: rec.position.filter(|s| !s.trim().is_empty()),
    })
}

fn read_records<D, T, R>(reader: R, map: impl Fn(D) -> T) -> Result<Loaded<T>>
where
    D: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    // Fail early on a missing or unreadable header row.
    csv_reader.headers().context("read csv header")?;

    let mut rows = Vec::new();
    let mut failed = 0usize;
    for record in csv_reader.deserialize::<D>() {
        match record {
            Ok(rec) => rows.push(map(rec)),
            Err(err) => {
                failed += 1;
                tracing::debug!(%err, "skipping undecodable csv row");
            }
        }
    }
    if failed > 0 {
        tracing::warn!(failed, kept = rows.len(), "csv rows skipped");
    }
    Ok(Loaded { rows, failed })
}
