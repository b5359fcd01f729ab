use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attribution::{CorsiLedger, ShiftIndex};
use crate::config::EngineConfig;
use crate::events::{EventDrops, filter_events};
use crate::model::{Event, GameId, PlayerGameCorsi, ShiftInterval, TeamGameCorsi, TeamId};
use crate::strength::{ExcludeTimeline, merge_counts};
use crate::timeline::skater_counts;
use crate::toi::{accumulate_toi, apply_toi};

const DEADLINE_CHECK_EVERY: usize = 256;

/// Why a game produced no rows. None of these abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("no usable shifts")]
    MissingShifts,
    #[error("no usable events")]
    MissingEvents,
    #[error("shifts resolve to {} team(s) {teams:?}, expected 2", teams.len())]
    MalformedTeamTopology { teams: Vec<TeamId> },
    #[error("exceeded the {budget_ms} ms game budget")]
    TimedOut { budget_ms: u64 },
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingShifts => "missing_shifts",
            SkipReason::MissingEvents => "missing_events",
            SkipReason::MalformedTeamTopology { .. } => "malformed_team_topology",
            SkipReason::TimedOut { .. } => "timed_out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub game_id: GameId,
    pub players: Vec<PlayerGameCorsi>,
    pub teams: Vec<TeamGameCorsi>,
    pub timeline: ExcludeTimeline,
    pub events_counted: usize,
    pub drops: EventDrops,
}

/// Runs the whole per-game pipeline: strength timeline, event filtering,
/// attribution and time on ice. Rows for other games are ignored.
pub fn compute_game(
    game_id: GameId,
    shifts: &[ShiftInterval],
    events: &[Event],
    config: &EngineConfig,
) -> Result<GameOutcome, SkipReason> {
    let deadline = config.game_timeout().map(Deadline::starting_now);

    let shifts: Vec<ShiftInterval> = shifts.iter().filter(|s| s.game_id == game_id).copied().collect();
    let events: Vec<Event> = events.iter().filter(|e| e.game_id == game_id).copied().collect();
    if shifts.is_empty() {
        return Err(SkipReason::MissingShifts);
    }
    if events.is_empty() {
        return Err(SkipReason::MissingEvents);
    }

    let [team_1, team_2] = two_teams(&shifts)?;
    let timeline = strength_timeline(&shifts, &events, [team_1, team_2], config);
    // Inconsistent shift data blows up the breakpoint count, so the budget is
    // checked here before any attribution work.
    check_deadline(deadline)?;

    let (kept, excluded) = filter_events(&events, &timeline);
    let index = ShiftIndex::new(&shifts);
    let mut ledger = CorsiLedger::for_game(game_id, &shifts, [team_1, team_2]);
    for chunk in kept.chunks(DEADLINE_CHECK_EVERY) {
        check_deadline(deadline)?;
        ledger.attribute_all(chunk, &index);
    }

    let toi = accumulate_toi(&shifts, &timeline);
    apply_toi(&mut ledger, &toi);
    let (players, teams) = ledger.into_rows();

    tracing::debug!(
        game_id,
        players = players.len(),
        events_counted = kept.len(),
        events_excluded = excluded,
        excluded_secs = timeline.excluded_secs(),
        "game computed"
    );

    Ok(GameOutcome {
        game_id,
        players,
        teams,
        timeline,
        events_counted: kept.len(),
        drops: EventDrops {
            excluded,
            ..EventDrops::default()
        },
    })
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    fn starting_now(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }
}

fn check_deadline(deadline: Option<Deadline>) -> Result<(), SkipReason> {
    match deadline {
        Some(d) if Instant::now() >= d.at => Err(SkipReason::TimedOut {
            budget_ms: u64::try_from(d.budget.as_millis()).unwrap_or(u64::MAX),
        }),
        _ => Ok(()),
    }
}

pub fn two_teams(shifts: &[ShiftInterval]) -> Result<[TeamId; 2], SkipReason> {
    let teams: BTreeSet<TeamId> = shifts.iter().map(|s| s.team_id).collect();
    let teams: Vec<TeamId> = teams.into_iter().collect();
    match teams.as_slice() {
        [a, b] => Ok([*a, *b]),
        _ => Err(SkipReason::MalformedTeamTopology { teams }),
    }
}

pub fn strength_timeline(
    shifts: &[ShiftInterval],
    events: &[Event],
    teams: [TeamId; 2],
    config: &EngineConfig,
) -> ExcludeTimeline {
    let side = |team_id: TeamId| -> Vec<ShiftInterval> {
        shifts.iter().filter(|s| s.team_id == team_id).copied().collect()
    };
    let counts_1 = skater_counts(&side(teams[0]));
    let counts_2 = skater_counts(&side(teams[1]));
    let breakpoints = merge_counts(&counts_1, &counts_2);

    // Every retained event has to land inside the timeline.
    let last_shift = shifts.iter().map(|s| s.end_sec).max().unwrap_or(0);
    let last_event = events
        .iter()
        .map(|e| e.time_sec.saturating_add(1))
        .max()
        .unwrap_or(0);
    ExcludeTimeline::build(&breakpoints, last_shift.max(last_event), config.strength_rule())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventType;

    fn shift(player_id: u32, team_id: TeamId, start_sec: u32, end_sec: u32) -> ShiftInterval {
        ShiftInterval {
            game_id: 1,
            player_id,
            team_id,
            start_sec,
            end_sec,
        }
    }

    fn shot(time_sec: u32) -> Event {
        Event {
            game_id: 1,
            time_sec,
            event_type: EventType::Shot,
            team_for: 10,
            team_against: 20,
        }
    }

    #[test]
    fn single_team_is_malformed() {
        let err = compute_game(1, &[shift(1, 10, 0, 50)], &[shot(5)], &EngineConfig::default())
            .unwrap_err();
        assert_eq!(err, SkipReason::MalformedTeamTopology { teams: vec![10] });
        assert_eq!(err.label(), "malformed_team_topology");
    }

    #[test]
    fn missing_inputs_skip() {
        let cfg = EngineConfig::default();
        assert_eq!(compute_game(1, &[], &[shot(5)], &cfg).unwrap_err(), SkipReason::MissingShifts);
        assert_eq!(
            compute_game(1, &[shift(1, 10, 0, 50), shift(2, 20, 0, 50)], &[], &cfg).unwrap_err(),
            SkipReason::MissingEvents
        );
    }

    #[test]
    fn other_games_are_ignored() {
        let mut foreign = shift(3, 30, 0, 50);
        foreign.game_id = 2;
        let outcome = compute_game(
            1,
            &[shift(1, 10, 0, 50), shift(2, 20, 0, 50), foreign],
            &[shot(5)],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome.players.len(), 2);
        assert_eq!(outcome.events_counted, 1);
    }

    #[test]
    fn timeline_extends_to_last_event() {
        let outcome = compute_game(
            1,
            &[shift(1, 10, 0, 50), shift(2, 20, 0, 50)],
            &[shot(80)],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome.timeline.game_end(), 81);
        assert_eq!(outcome.events_counted, 1);
        assert_eq!(outcome.players[0].corsi_for, 0);
    }

    #[test]
    fn spent_budget_times_out_before_attribution() {
        let cfg = EngineConfig {
            game_timeout_ms: Some(0),
            ..EngineConfig::default()
        };
        let err = compute_game(1, &[shift(1, 10, 0, 50), shift(2, 20, 0, 50)], &[shot(5)], &cfg)
            .unwrap_err();
        assert_eq!(err, SkipReason::TimedOut { budget_ms: 0 });
        assert_eq!(err.label(), "timed_out");
    }

    #[test]
    fn generous_budget_still_computes() {
        let cfg = EngineConfig {
            game_timeout_ms: Some(60_000),
            ..EngineConfig::default()
        };
        let outcome =
            compute_game(1, &[shift(1, 10, 0, 50), shift(2, 20, 0, 50)], &[shot(5)], &cfg).unwrap();
        assert_eq!(outcome.events_counted, 1);
    }
}
