use std::collections::HashMap;

use crate::attribution::CorsiLedger;
use crate::model::{PlayerId, ShiftInterval};
use crate::strength::ExcludeTimeline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toi {
    pub total_sec: u32,
    pub excluded_sec: u32,
}

impl Toi {
    pub fn balanced_sec(&self) -> u32 {
        self.total_sec.saturating_sub(self.excluded_sec)
    }
}

pub fn accumulate_toi(shifts: &[ShiftInterval], timeline: &ExcludeTimeline) -> HashMap<PlayerId, Toi> {
    let mut out: HashMap<PlayerId, Toi> = HashMap::new();
    for s in shifts {
        let toi = out.entry(s.player_id).or_default();
        toi.total_sec += s.duration();
        toi.excluded_sec += timeline.excluded_overlap(s.start_sec, s.end_sec);
    }
    out
}

pub fn apply_toi(ledger: &mut CorsiLedger, toi: &HashMap<PlayerId, Toi>) {
    for row in ledger.players_mut() {
        let Some(t) = toi.get(&row.player_id) else {
            continue;
        };
        row.toi_total_sec = t.total_sec;
        row.toi_balanced_sec = t.balanced_sec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Breakpoint;
    use crate::strength::StrengthRule;

    #[test]
    fn balanced_time_subtracts_excluded_overlap() {
        let bps = vec![
            Breakpoint { time_sec: 0, team_1_count: 5, team_2_count: 5 },
            Breakpoint { time_sec: 60, team_1_count: 5, team_2_count: 4 },
            Breakpoint { time_sec: 100, team_1_count: 5, team_2_count: 5 },
        ];
        let timeline = ExcludeTimeline::build(&bps, 200, StrengthRule::default());
        let shifts = vec![
            ShiftInterval { game_id: 1, player_id: 7, team_id: 1, start_sec: 40, end_sec: 80 },
            ShiftInterval { game_id: 1, player_id: 7, team_id: 1, start_sec: 90, end_sec: 150 },
            ShiftInterval { game_id: 1, player_id: 8, team_id: 1, start_sec: 100, end_sec: 130 },
        ];
        let toi = accumulate_toi(&shifts, &timeline);
        assert_eq!(toi[&7].total_sec, 100);
        assert_eq!(toi[&7].excluded_sec, 30);
        assert_eq!(toi[&7].balanced_sec(), 70);
        assert_eq!(toi[&8].balanced_sec(), 30);
    }
}
