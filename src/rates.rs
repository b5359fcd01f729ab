use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{PlayerGameCorsi, PlayerId, TeamId, season_of};

pub fn corsi(corsi_for: u32, corsi_against: u32) -> i64 {
    i64::from(corsi_for) - i64::from(corsi_against)
}

/// 0 when there were no attempts either way.
pub fn cf_percent(corsi_for: u32, corsi_against: u32) -> f64 {
    let total = u64::from(corsi_for) + u64::from(corsi_against);
    if total == 0 {
        return 0.0;
    }
    100.0 * corsi_for as f64 / total as f64
}

/// Attempts per 60 minutes of balanced ice time; `None` without ice time.
pub fn per_sixty(count: u64, toi_balanced_sec: u64) -> Option<f64> {
    if toi_balanced_sec == 0 {
        return None;
    }
    Some(count as f64 * 3600.0 / toi_balanced_sec as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerRates {
    pub corsi: i64,
    pub cf_percent: f64,
    pub cf60: Option<f64>,
    pub ca60: Option<f64>,
}

pub fn rates_for(row: &PlayerGameCorsi) -> PlayerRates {
    PlayerRates {
        corsi: corsi(row.corsi_for, row.corsi_against),
        cf_percent: cf_percent(row.corsi_for, row.corsi_against),
        cf60: per_sixty(u64::from(row.corsi_for), u64::from(row.toi_balanced_sec)),
        ca60: per_sixty(u64::from(row.corsi_against), u64::from(row.toi_balanced_sec)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeasonCorsi {
    pub season: u32,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub games: u32,
    pub corsi_for: u32,
    pub corsi_against: u32,
    pub toi_total_sec: u64,
    pub toi_balanced_sec: u64,
}

impl PlayerSeasonCorsi {
    pub fn rates(&self) -> PlayerRates {
        PlayerRates {
            corsi: corsi(self.corsi_for, self.corsi_against),
            cf_percent: cf_percent(self.corsi_for, self.corsi_against),
            cf60: per_sixty(u64::from(self.corsi_for), self.toi_balanced_sec),
            ca60: per_sixty(u64::from(self.corsi_against), self.toi_balanced_sec),
        }
    }
}

/// Sums game rows per (season, player, team). A player traded mid-season
/// gets one row per team. Output is ordered by that key.
pub fn aggregate_seasons(rows: &[PlayerGameCorsi]) -> Vec<PlayerSeasonCorsi> {
    let mut acc: BTreeMap<(u32, PlayerId, TeamId), PlayerSeasonCorsi> = BTreeMap::new();
    for row in rows {
        let season = season_of(row.game_id);
        let entry = acc
            .entry((season, row.player_id, row.team_id))
            .or_insert(PlayerSeasonCorsi {
                season,
                player_id: row.player_id,
                team_id: row.team_id,
                games: 0,
                corsi_for: 0,
                corsi_against: 0,
                toi_total_sec: 0,
                toi_balanced_sec: 0,
            });
        entry.games += 1;
        entry.corsi_for += row.corsi_for;
        entry.corsi_against += row.corsi_against;
        entry.toi_total_sec += u64::from(row.toi_total_sec);
        entry.toi_balanced_sec += u64::from(row.toi_balanced_sec);
    }
    acc.into_values().collect()
}
