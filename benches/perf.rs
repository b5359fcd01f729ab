use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use corsi_engine::batch::{GameInput, compute_batch, group_games};
use corsi_engine::config::EngineConfig;
use corsi_engine::engine::compute_game;
use corsi_engine::events::RawEvent;
use corsi_engine::shifts::{RawShift, Roster};
use corsi_engine::synthetic::synthetic_game;

fn season_rows(games: u64) -> (Vec<RawShift>, Vec<RawEvent>, Roster) {
    let mut shifts = Vec::new();
    let mut events = Vec::new();
    let mut roster = Vec::new();
    for n in 0..games {
        let game = synthetic_game(42, 2016020001 + n);
        shifts.extend(game.shifts);
        events.extend(game.events);
        roster.extend(game.roster);
    }
    (shifts, events, Roster::from_rows(roster))
}

fn grouped(games: u64, config: &EngineConfig) -> Vec<GameInput> {
    let (shifts, events, roster) = season_rows(games);
    group_games(&shifts, &events, &roster, config).games
}

fn bench_compute_game(c: &mut Criterion) {
    let config = EngineConfig::default();
    let game = grouped(1, &config).remove(0);
    c.bench_function("compute_game", |b| {
        b.iter(|| {
            let outcome = compute_game(
                black_box(game.game_id),
                black_box(&game.shifts),
                black_box(&game.events),
                &config,
            )
            .unwrap();
            black_box(outcome.players.len());
        })
    });
}

fn bench_group_games(c: &mut Criterion) {
    let config = EngineConfig::default();
    let (shifts, events, roster) = season_rows(82);
    c.bench_function("group_games_82", |b| {
        b.iter(|| {
            let grouped = group_games(black_box(&shifts), black_box(&events), &roster, &config);
            black_box(grouped.games.len());
        })
    });
}

fn bench_compute_batch(c: &mut Criterion) {
    let config = EngineConfig::default();
    let inputs = grouped(82, &config);
    c.bench_function("compute_batch_82", |b| {
        b.iter(|| {
            let report = compute_batch(black_box(&inputs), &config);
            black_box(report.outcomes.len());
        })
    });

    let serial = EngineConfig {
        parallelism: 1,
        ..EngineConfig::default()
    };
    c.bench_function("compute_batch_82_serial", |b| {
        b.iter(|| {
            let report = compute_batch(black_box(&inputs), &serial);
            black_box(report.outcomes.len());
        })
    });
}

criterion_group!(perf, bench_compute_game, bench_group_games, bench_compute_batch);
criterion_main!(perf);
