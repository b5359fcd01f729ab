use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ShiftInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountPoint {
    pub time_sec: u32,
    pub count: u32,
}

/// One team's skater-count series, keeping only points where it changes.
pub fn skater_counts(intervals: &[ShiftInterval]) -> Vec<CountPoint> {
    // A change where one leaves as another arrives nets to zero at that instant.
    let mut deltas: BTreeMap<u32, i64> = BTreeMap::new();
    for s in intervals {
        *deltas.entry(s.start_sec).or_insert(0) += 1;
        *deltas.entry(s.end_sec).or_insert(0) -= 1;
    }

    let mut out: Vec<CountPoint> = Vec::new();
    let mut running = 0i64;
    for (time_sec, delta) in deltas {
        running += delta;
        let count = u32::try_from(running.max(0)).unwrap_or(0);
        if out.last().is_some_and(|prev| prev.count == count) {
            continue;
        }
        out.push(CountPoint { time_sec, count });
    }
    out
}

/// Count in effect at `time_sec`, or `None` before the first point.
pub fn count_at(series: &[CountPoint], time_sec: u32) -> Option<u32> {
    let idx = series.partition_point(|p| p.time_sec <= time_sec);
    idx.checked_sub(1).map(|i| series[i].count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(player_id: u32, start_sec: u32, end_sec: u32) -> ShiftInterval {
        ShiftInterval {
            game_id: 1,
            player_id,
            team_id: 1,
            start_sec,
            end_sec,
        }
    }

    #[test]
    fn simultaneous_change_nets_to_zero() {
        let series = skater_counts(&[shift(1, 0, 50), shift(2, 50, 100), shift(3, 0, 100)]);
        assert_eq!(
            series,
            vec![
                CountPoint { time_sec: 0, count: 2 },
                CountPoint { time_sec: 100, count: 0 },
            ]
        );
    }

    #[test]
    fn staggered_change_shows_both_steps() {
        let series = skater_counts(&[shift(1, 0, 50), shift(2, 52, 100)]);
        assert_eq!(
            series,
            vec![
                CountPoint { time_sec: 0, count: 1 },
                CountPoint { time_sec: 50, count: 0 },
                CountPoint { time_sec: 52, count: 1 },
                CountPoint { time_sec: 100, count: 0 },
            ]
        );
    }

    #[test]
    fn empty_is_empty() {
        assert!(skater_counts(&[]).is_empty());
    }

    #[test]
    fn count_at_uses_point_at_or_before() {
        let series = skater_counts(&[shift(1, 10, 50)]);
        assert_eq!(count_at(&series, 5), None);
        assert_eq!(count_at(&series, 10), Some(1));
        assert_eq!(count_at(&series, 49), Some(1));
        assert_eq!(count_at(&series, 50), Some(0));
    }
}
