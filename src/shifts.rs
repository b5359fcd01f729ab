use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{GameId, PlayerId, ShiftInterval, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawShift {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub start_sec: Option<f64>,
    pub end_sec: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RosterEntry {
    team_id: TeamId,
    goalie: Option<bool>,
}

/// (game, player) -> team lookup.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: HashMap<(GameId, PlayerId), RosterEntry>,
    games_with_positions: HashSet<GameId>,
}

impl Roster {
    pub fn from_rows(rows: impl IntoIterator<Item = RosterRow>) -> Self {
        let mut roster = Roster::default();
        for row in rows {
            roster.insert(row);
        }
        roster
    }

    pub fn insert(&mut self, row: RosterRow) {
        let goalie = row.position.as_deref().and_then(is_goalie_position);
        if goalie.is_some() {
            self.games_with_positions.insert(row.game_id);
        }
        self.entries.insert(
            (row.game_id, row.player_id),
            RosterEntry {
                team_id: row.team_id,
                goalie,
            },
        );
    }

    pub fn team_of(&self, game_id: GameId, player_id: PlayerId) -> Option<TeamId> {
        self.entries.get(&(game_id, player_id)).map(|e| e.team_id)
    }

    pub fn is_goalie(&self, game_id: GameId, player_id: PlayerId) -> bool {
        self.entries
            .get(&(game_id, player_id))
            .and_then(|e| e.goalie)
            .unwrap_or(false)
    }

    pub fn has_positions(&self, game_id: GameId) -> bool {
        self.games_with_positions.contains(&game_id)
    }
}

fn is_goalie_position(raw: &str) -> Option<bool> {
    let p = raw.trim().to_ascii_lowercase();
    if p.is_empty() {
        return None;
    }
    Some(p == "g" || p.starts_with("goal"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftDrops {
    pub unrostered: usize,
    pub goalies: usize,
    pub degenerate: usize,
    pub heuristic_goalies: Vec<(GameId, PlayerId)>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedShifts {
    pub intervals: Vec<ShiftInterval>,
    pub drops: ShiftDrops,
}

/// Joins raw shifts against the roster and keeps only clean skater intervals.
pub fn normalize_shifts(raw: &[RawShift], roster: &Roster, goalie_toi_secs: u32) -> NormalizedShifts {
    let mut out = NormalizedShifts::default();

    for row in raw {
        // Skater-only rosters leave goalies out, so most misses land here.
        let Some(team_id) = roster.team_of(row.game_id, row.player_id) else {
            out.drops.unrostered += 1;
            continue;
        };
        if roster.is_goalie(row.game_id, row.player_id) {
            out.drops.goalies += 1;
            continue;
        }
        let (Some(start_sec), Some(end_sec)) = (coerce_secs(row.start_sec), coerce_secs(row.end_sec))
        else {
            out.drops.degenerate += 1;
            continue;
        };
        if end_sec <= start_sec {
            out.drops.degenerate += 1;
            continue;
        }
        out.intervals.push(ShiftInterval {
            game_id: row.game_id,
            player_id: row.player_id,
            team_id,
            start_sec,
            end_sec,
        });
    }

    // No positions in the roster: fall back to guessing goalies by ice time.
    let unpositioned: HashSet<GameId> = out
        .intervals
        .iter()
        .map(|s| s.game_id)
        .filter(|game_id| !roster.has_positions(*game_id))
        .collect();
    if !unpositioned.is_empty() {
        let (kept, heuristic) =
            drop_goalies_by_toi(std::mem::take(&mut out.intervals), goalie_toi_secs, &unpositioned);
        out.intervals = kept;
        out.drops.heuristic_goalies = heuristic;
    }

    out
}

/// Drops every shift of players at or over `threshold_secs` in one of
/// `games`. Returns kept shifts and the sorted dropped (game, player) pairs.
pub fn drop_goalies_by_toi(
    shifts: Vec<ShiftInterval>,
    threshold_secs: u32,
    games: &HashSet<GameId>,
) -> (Vec<ShiftInterval>, Vec<(GameId, PlayerId)>) {
    let mut totals: HashMap<(GameId, PlayerId), u32> = HashMap::new();
    for s in shifts.iter().filter(|s| games.contains(&s.game_id)) {
        *totals.entry((s.game_id, s.player_id)).or_insert(0) += s.duration();
    }
    let mut dropped: Vec<(GameId, PlayerId)> = totals
        .into_iter()
        .filter(|(_, toi)| *toi >= threshold_secs)
        .map(|(key, _)| key)
        .collect();
    dropped.sort_unstable();

    if dropped.is_empty() {
        return (shifts, dropped);
    }
    for (game_id, player_id) in &dropped {
        tracing::warn!(game_id, player_id, threshold_secs, "treating player as goalie by time on ice");
    }
    let drop_set: HashSet<(GameId, PlayerId)> = dropped.iter().copied().collect();
    let kept = shifts
        .into_iter()
        .filter(|s| !drop_set.contains(&(s.game_id, s.player_id)))
        .collect();
    (kept, dropped)
}

fn coerce_secs(raw: Option<f64>) -> Option<u32> {
    let v = raw?;
    if !v.is_finite() || v < 0.0 || v > u32::MAX as f64 {
        return None;
    }
    Some(v.trunc() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(game_id: GameId, player_id: PlayerId, start: f64, end: f64) -> RawShift {
        RawShift {
            game_id,
            player_id,
            start_sec: Some(start),
            end_sec: Some(end),
        }
    }

    fn roster_row(player_id: PlayerId, team_id: TeamId, position: Option<&str>) -> RosterRow {
        RosterRow {
            game_id: 1,
            player_id,
            team_id,
            position: position.map(|p| p.to_string()),
        }
    }

    #[test]
    fn drops_unrostered_goalies_and_degenerate_rows() {
        let roster = Roster::from_rows(vec![
            roster_row(10, 1, Some("C")),
            roster_row(11, 1, Some("G")),
            roster_row(20, 2, Some("D")),
        ]);
        let rows = vec![
            raw(1, 10, 0.0, 45.0),
            raw(1, 11, 0.0, 1200.0),
            raw(1, 20, 30.0, 30.0),
            raw(1, 20, 31.9, 80.2),
            raw(1, 99, 0.0, 50.0),
        ];
        let out = normalize_shifts(&rows, &roster, 2700);
        assert_eq!(out.intervals.len(), 2);
        assert_eq!(out.intervals[1].start_sec, 31);
        assert_eq!(out.intervals[1].end_sec, 80);
        assert_eq!(out.drops.unrostered, 1);
        assert_eq!(out.drops.goalies, 1);
        assert_eq!(out.drops.degenerate, 1);
        assert!(out.drops.heuristic_goalies.is_empty());
    }

    #[test]
    fn heuristic_runs_only_without_positions() {
        let roster = Roster::from_rows(vec![roster_row(10, 1, None), roster_row(11, 1, None)]);
        let rows = vec![
            raw(1, 10, 0.0, 40.0),
            raw(1, 11, 0.0, 1200.0),
            raw(1, 11, 1200.0, 2400.0),
            raw(1, 11, 2400.0, 3600.0),
        ];
        let out = normalize_shifts(&rows, &roster, 2700);
        assert_eq!(out.intervals.len(), 1);
        assert_eq!(out.drops.heuristic_goalies, vec![(1, 11)]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = normalize_shifts(&[], &Roster::default(), 2700);
        assert!(out.intervals.is_empty());
    }
}
