use serde::{Deserialize, Serialize};

pub type GameId = u64;
pub type PlayerId = u32;
pub type TeamId = u32;

/// One continuous on-ice stint, in cumulative game-clock seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftInterval {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub start_sec: u32,
    pub end_sec: u32,
}

impl ShiftInterval {
    pub fn duration(&self) -> u32 {
        self.end_sec.saturating_sub(self.start_sec)
    }

    pub fn covers(&self, time_sec: u32) -> bool {
        self.start_sec <= time_sec && time_sec < self.end_sec
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub time_sec: u32,
    pub team_1_count: u32,
    pub team_2_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeInterval {
    pub start_sec: u32,
    pub end_sec: u32,
    pub excluded: bool,
}

impl ExcludeInterval {
    pub fn overlap(&self, start_sec: u32, end_sec: u32) -> u32 {
        let lo = self.start_sec.max(start_sec);
        let hi = self.end_sec.min(end_sec);
        hi.saturating_sub(lo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Shot,
    Goal,
    MissedShot,
    BlockedShot,
    Other,
}

impl EventType {
    pub fn parse(raw: &str) -> Self {
        // "Missed Shot" and "MISSED_SHOT" both reduce to "missedshot".
        let key: String = raw
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "shot" | "shotongoal" => EventType::Shot,
            "goal" => EventType::Goal,
            "missedshot" => EventType::MissedShot,
            "blockedshot" => EventType::BlockedShot,
            _ => EventType::Other,
        }
    }

    pub fn is_corsi(self) -> bool {
        !matches!(self, EventType::Other)
    }

    pub fn is_inverted(self) -> bool {
        // Blocked-shot rows name the shooter as team_for; credit runs the other way.
        matches!(self, EventType::BlockedShot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub game_id: GameId,
    pub time_sec: u32,
    pub event_type: EventType,
    pub team_for: TeamId,
    pub team_against: TeamId,
}

impl Event {
    pub fn credited_teams(&self) -> (TeamId, TeamId) {
        if self.event_type.is_inverted() {
            (self.team_against, self.team_for)
        } else {
            (self.team_for, self.team_against)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGameCorsi {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub corsi_for: u32,
    pub corsi_against: u32,
    pub toi_total_sec: u32,
    pub toi_balanced_sec: u32,
}

impl PlayerGameCorsi {
    pub fn new(game_id: GameId, player_id: PlayerId, team_id: TeamId) -> Self {
        Self {
            game_id,
            player_id,
            team_id,
            corsi_for: 0,
            corsi_against: 0,
            toi_total_sec: 0,
            toi_balanced_sec: 0,
        }
    }

    pub fn corsi(&self) -> i64 {
        crate::rates::corsi(self.corsi_for, self.corsi_against)
    }

    pub fn cf_percent(&self) -> f64 {
        crate::rates::cf_percent(self.corsi_for, self.corsi_against)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamGameCorsi {
    pub game_id: GameId,
    pub team_id: TeamId,
    pub corsi_for: u32,
    pub corsi_against: u32,
}

impl TeamGameCorsi {
    pub fn corsi(&self) -> i64 {
        crate::rates::corsi(self.corsi_for, self.corsi_against)
    }

    pub fn cf_percent(&self) -> f64 {
        crate::rates::cf_percent(self.corsi_for, self.corsi_against)
    }
}

pub fn season_of(game_id: GameId) -> u32 {
    // 2016020045 -> 2016
    u32::try_from(game_id / 1_000_000).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_accepts_both_spellings() {
        assert_eq!(EventType::parse("Missed Shot"), EventType::MissedShot);
        assert_eq!(EventType::parse("MISSED_SHOT"), EventType::MissedShot);
        assert_eq!(EventType::parse("Blocked Shot"), EventType::BlockedShot);
        assert_eq!(EventType::parse(" goal "), EventType::Goal);
        assert_eq!(EventType::parse("Faceoff"), EventType::Other);
    }

    #[test]
    fn season_from_game_id() {
        assert_eq!(season_of(2016020045), 2016);
        assert_eq!(season_of(2010030411), 2010);
    }
}
