//! Seeded fake games for benches, demos and smoke tests.
//!
//! Each team dresses four forward lines, three defence pairs and a goalie.
//! Units rotate on their own clocks, penalties take one forward off for two
//! minutes, and shot attempts land at random times.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{PERIOD_SECS, REGULATION_SECS};
use crate::events::RawEvent;
use crate::model::{GameId, PlayerId, TeamId};
use crate::shifts::{RawShift, RosterRow};

const PENALTY_SECS: u32 = 120;

#[derive(Debug, Clone, Default)]
pub struct SyntheticGame {
    pub game_id: GameId,
    pub teams: [TeamId; 2],
    pub shifts: Vec<RawShift>,
    pub roster: Vec<RosterRow>,
    pub events: Vec<RawEvent>,
}

pub fn synthetic_game(seed: u64, game_id: GameId) -> SyntheticGame {
    let mut rng = StdRng::seed_from_u64(seed ^ game_id);
    let teams: [TeamId; 2] = [10, 20];
    let mut game = SyntheticGame {
        game_id,
        teams,
        ..SyntheticGame::default()
    };

    let penalties: Vec<(TeamId, u32)> = (0..rng.gen_range(1..=4))
        .map(|_| {
            let team = teams[rng.gen_range(0..2)];
            let start = rng.gen_range(60..REGULATION_SECS - PENALTY_SECS);
            (team, start)
        })
        .collect();

    for team_id in teams {
        let base = team_id * 100;
        let forwards: Vec<Vec<PlayerId>> = (0..4)
            .map(|line| (0..3).map(|slot| base + line * 3 + slot + 1).collect())
            .collect();
        let defence: Vec<Vec<PlayerId>> = (0..3)
            .map(|pair| (0..2).map(|slot| base + 20 + pair * 2 + slot + 1).collect())
            .collect();
        let goalie = base + 30;

        let windows: Vec<(u32, u32)> = penalties
            .iter()
            .filter(|(team, _)| *team == team_id)
            .map(|(_, start)| (*start, start + PENALTY_SECS))
            .collect();

        rotate_units(&mut game, &mut rng, team_id, &forwards, (38, 55), &windows, "F");
        rotate_units(&mut game, &mut rng, team_id, &defence, (45, 62), &[], "D");

        game.roster.push(RosterRow {
            game_id,
            player_id: goalie,
            team_id,
            position: Some("G".to_string()),
        });
        game.shifts.push(RawShift {
            game_id,
            player_id: goalie,
            start_sec: Some(0.0),
            end_sec: Some(f64::from(REGULATION_SECS)),
        });
    }

    let attempts = rng.gen_range(90..140);
    for _ in 0..attempts {
        let t = rng.gen_range(0..REGULATION_SECS);
        let for_idx = rng.gen_range(0..2);
        let roll: f64 = rng.gen_range(0.0..1.0);
        let event_type = if roll < 0.45 {
            "Shot"
        } else if roll < 0.65 {
            "Missed Shot"
        } else if roll < 0.90 {
            "Blocked Shot"
        } else if roll < 0.95 {
            "Goal"
        } else {
            "Faceoff"
        };
        game.events.push(RawEvent {
            game_id,
            event_type: event_type.to_string(),
            period: Some(t / PERIOD_SECS + 1),
            period_type: Some("REGULAR".to_string()),
            period_time: Some((t % PERIOD_SECS).to_string()),
            team_for: Some(teams[for_idx]),
            team_against: Some(teams[1 - for_idx]),
        });
    }

    game
}

/// Cycles `units` through regulation. During a penalty window the last
/// player of each unit sits.
fn rotate_units(
    game: &mut SyntheticGame,
    rng: &mut StdRng,
    team_id: TeamId,
    units: &[Vec<PlayerId>],
    shift_len: (u32, u32),
    penalties: &[(u32, u32)],
    position: &str,
) {
    for unit in units {
        for player_id in unit {
            game.roster.push(RosterRow {
                game_id: game.game_id,
                player_id: *player_id,
                team_id,
                position: Some(position.to_string()),
            });
        }
    }

    let mut t = 0u32;
    let mut idx = 0usize;
    while t < REGULATION_SECS {
        let end = (t + rng.gen_range(shift_len.0..=shift_len.1)).min(REGULATION_SECS);
        let unit = &units[idx % units.len()];
        for (slot, player_id) in unit.iter().enumerate() {
            let pieces = if slot + 1 == unit.len() {
                carve(t, end, penalties)
            } else {
                vec![(t, end)]
            };
            for (start, stop) in pieces {
                game.shifts.push(RawShift {
                    game_id: game.game_id,
                    player_id: *player_id,
                    start_sec: Some(f64::from(start)),
                    end_sec: Some(f64::from(stop)),
                });
            }
        }
        t = end;
        idx += 1;
    }
}

fn carve(start: u32, end: u32, windows: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut pieces = vec![(start, end)];
    for (w_start, w_end) in windows {
        pieces = pieces
            .into_iter()
            .flat_map(|(s, e)| {
                let left = (s, e.min(*w_start));
                let right = (s.max(*w_end), e);
                [left, right]
            })
            .filter(|(s, e)| e > s)
            .collect();
    }
    pieces
}
