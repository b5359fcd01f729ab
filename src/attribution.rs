use std::collections::HashMap;

use crate::model::{Event, GameId, PlayerGameCorsi, PlayerId, ShiftInterval, TeamGameCorsi, TeamId};

/// Shift arena sorted by start time for on-ice lookups.
#[derive(Debug, Clone, Default)]
pub struct ShiftIndex {
    shifts: Vec<ShiftInterval>,
    longest: u32,
}

impl ShiftIndex {
    pub fn new(shifts: &[ShiftInterval]) -> Self {
        let mut sorted = shifts.to_vec();
        sorted.sort_by_key(|s| (s.start_sec, s.end_sec, s.player_id));
        let longest = sorted.iter().map(|s| s.duration()).max().unwrap_or(0);
        Self {
            shifts: sorted,
            longest,
        }
    }

    pub fn on_ice(&self, time_sec: u32) -> impl Iterator<Item = &ShiftInterval> {
        // A covering shift starts in (t - longest, t].
        let floor = time_sec.saturating_sub(self.longest);
        let lo = self.shifts.partition_point(|s| s.start_sec < floor);
        let hi = self.shifts.partition_point(|s| s.start_sec <= time_sec);
        self.shifts[lo..hi].iter().filter(move |s| s.covers(time_sec))
    }
}

#[derive(Debug, Clone)]
pub struct CorsiLedger {
    players: HashMap<PlayerId, PlayerGameCorsi>,
    teams: HashMap<TeamId, TeamGameCorsi>,
}

impl CorsiLedger {
    pub fn for_game(game_id: GameId, shifts: &[ShiftInterval], teams: [TeamId; 2]) -> Self {
        // Zeroed rows up front so skaters never on ice for an attempt still get TOI.
        let mut players = HashMap::new();
        for s in shifts {
            players
                .entry(s.player_id)
                .or_insert_with(|| PlayerGameCorsi::new(game_id, s.player_id, s.team_id));
        }
        let teams = teams
            .into_iter()
            .map(|team_id| {
                (
                    team_id,
                    TeamGameCorsi {
                        game_id,
                        team_id,
                        corsi_for: 0,
                        corsi_against: 0,
                    },
                )
            })
            .collect();
        Self { players, teams }
    }

    /// Credits one attempt to everyone on ice, blocked shots inverted.
    pub fn attribute(&mut self, event: &Event, index: &ShiftIndex) {
        let (credit_for, credit_against) = event.credited_teams();

        if let Some(team) = self.teams.get_mut(&credit_for) {
            team.corsi_for += 1;
        }
        if let Some(team) = self.teams.get_mut(&credit_against) {
            team.corsi_against += 1;
        }

        let mut seen: Vec<PlayerId> = Vec::with_capacity(12);
        for shift in index.on_ice(event.time_sec) {
            if seen.contains(&shift.player_id) {
                continue;
            }
            seen.push(shift.player_id);
            let Some(row) = self.players.get_mut(&shift.player_id) else {
                continue;
            };
            if shift.team_id == credit_for {
                row.corsi_for += 1;
            } else if shift.team_id == credit_against {
                row.corsi_against += 1;
            }
        }
    }

    pub fn attribute_all(&mut self, events: &[Event], index: &ShiftIndex) {
        for event in events {
            self.attribute(event, index);
        }
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut PlayerGameCorsi> {
        self.players.values_mut()
    }

    pub fn into_rows(self) -> (Vec<PlayerGameCorsi>, Vec<TeamGameCorsi>) {
        let mut players: Vec<PlayerGameCorsi> = self.players.into_values().collect();
        players.sort_by_key(|r| (r.team_id, r.player_id));
        let mut teams: Vec<TeamGameCorsi> = self.teams.into_values().collect();
        teams.sort_by_key(|t| t.team_id);
        (players, teams)
    }
}
