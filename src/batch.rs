use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::engine::{GameOutcome, SkipReason, compute_game};
use crate::events::{EventDrops, RawEvent, prepare_events};
use crate::model::{Event, GameId, PlayerGameCorsi, ShiftInterval, TeamGameCorsi};
use crate::shifts::{RawShift, Roster, ShiftDrops, normalize_shifts};

#[derive(Debug, Clone, Default)]
pub struct GameInput {
    pub game_id: GameId,
    pub shifts: Vec<ShiftInterval>,
    pub events: Vec<Event>,
    pub drops: EventDrops,
}

#[derive(Debug, Clone, Default)]
pub struct GroupedGames {
    pub games: Vec<GameInput>,
    pub shift_drops: ShiftDrops,
}

/// Splits flat rows into per-game inputs ordered by game id.
pub fn group_games(
    raw_shifts: &[RawShift],
    raw_events: &[RawEvent],
    roster: &Roster,
    config: &EngineConfig,
) -> GroupedGames {
    let normalized = normalize_shifts(raw_shifts, roster, config.goalie_toi_secs);

    // A game seen in either source gets an input, so it can report a skip.

    let mut games: BTreeMap<GameId, GameInput> = BTreeMap::new();
    for game_id in raw_shifts.iter().map(|s| s.game_id).chain(raw_events.iter().map(|e| e.game_id)) {
        games.entry(game_id).or_insert_with(|| GameInput {
            game_id,
            ..GameInput::default()
        });
    }
    for shift in normalized.intervals {
        if let Some(game) = games.get_mut(&shift.game_id) {
            game.shifts.push(shift);
        }
    }

    let mut raw_by_game: BTreeMap<GameId, Vec<RawEvent>> = BTreeMap::new();
    for row in raw_events {
        raw_by_game.entry(row.game_id).or_default().push(row.clone());
    }
    for (game_id, rows) in raw_by_game {
        let prepared = prepare_events(&rows);
        if let Some(game) = games.get_mut(&game_id) {
            game.events = prepared.events;
            game.drops = prepared.drops;
        }
    }

    GroupedGames {
        games: games.into_values().collect(),
        shift_drops: normalized.drops,
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<GameOutcome>,
    pub skipped: Vec<(GameId, SkipReason)>,
    pub drops: EventDrops,
}

impl BatchReport {
    pub fn player_rows(&self) -> Vec<PlayerGameCorsi> {
        self.outcomes.iter().flat_map(|o| o.players.iter().copied()).collect()
    }

    pub fn team_rows(&self) -> Vec<TeamGameCorsi> {
        self.outcomes.iter().flat_map(|o| o.teams.iter().copied()).collect()
    }

    pub fn games_total(&self) -> usize {
        self.outcomes.len() + self.skipped.len()
    }
}

pub fn compute_batch(inputs: &[GameInput], config: &EngineConfig) -> BatchReport {
    let pool = build_pool(config.parallelism);
    let results: Vec<(GameId, EventDrops, Result<GameOutcome, SkipReason>)> = with_pool(&pool, || {
        inputs
            .par_iter()
            .map(|game| {
                (
                    game.game_id,
                    game.drops,
                    compute_game(game.game_id, &game.shifts, &game.events, config),
                )
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (game_id, pre_drops, result) in results {
        report.drops += pre_drops;
        match result {
            Ok(mut outcome) => {
                report.drops += outcome.drops;
                outcome.drops += pre_drops;
                report.outcomes.push(outcome);
            }
            Err(reason) => {
                tracing::warn!(game_id, reason = %reason, "skipping game");
                report.skipped.push((game_id, reason));
            }
        }
    }
    report.outcomes.sort_by_key(|o| o.game_id);
    report.skipped.sort_by_key(|(game_id, _)| *game_id);

    tracing::info!(
        games = report.games_total(),
        computed = report.outcomes.len(),
        skipped = report.skipped.len(),
        "batch finished"
    );
    report
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}

fn with_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
