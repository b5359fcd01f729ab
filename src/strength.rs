use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SKATER_CEILING;
use crate::model::{Breakpoint, ExcludeInterval};
use crate::timeline::{CountPoint, count_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthRule {
    pub skater_ceiling: u32,
    // Over-ceiling counts are usually overlapping shift records at a change.
    pub exclude_anomalies: bool,
}

impl Default for StrengthRule {
    fn default() -> Self {
        Self {
            skater_ceiling: DEFAULT_SKATER_CEILING,
            exclude_anomalies: false,
        }
    }
}

impl StrengthRule {
    pub fn is_excluded(&self, team_1_count: u32, team_2_count: u32) -> bool {
        if team_1_count == team_2_count {
            return false;
        }
        let plausible = team_1_count <= self.skater_ceiling && team_2_count <= self.skater_ceiling;
        plausible || self.exclude_anomalies
    }
}

/// Unions both teams' count series into one breakpoint series, forward
/// filling each side and collapsing repeated pairs.
pub fn merge_counts(team_1: &[CountPoint], team_2: &[CountPoint]) -> Vec<Breakpoint> {
    let times: BTreeSet<u32> = team_1
        .iter()
        .chain(team_2.iter())
        .map(|p| p.time_sec)
        .collect();

    let mut out: Vec<Breakpoint> = Vec::with_capacity(times.len());
    for time_sec in times {
        let bp = Breakpoint {
            time_sec,
            team_1_count: filled_count(team_1, time_sec),
            team_2_count: filled_count(team_2, time_sec),
        };
        if out
            .last()
            .is_some_and(|prev| prev.team_1_count == bp.team_1_count && prev.team_2_count == bp.team_2_count)
        {
            continue;
        }
        out.push(bp);
    }
    out
}

fn filled_count(series: &[CountPoint], time_sec: u32) -> u32 {
    // Leading gap takes the first count; a side with no shifts has no skaters.
    count_at(series, time_sec)
        .or_else(|| series.first().map(|p| p.count))
        .unwrap_or(0)
}

/// Ordered, gap-free strength timeline for one game, tiling `[0, game_end)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeTimeline {
    intervals: Vec<ExcludeInterval>,
}

impl ExcludeTimeline {
    pub fn build(breakpoints: &[Breakpoint], game_end: u32, rule: StrengthRule) -> Self {
        let mut intervals: Vec<ExcludeInterval> = Vec::with_capacity(breakpoints.len());
        for (idx, bp) in breakpoints.iter().enumerate() {
            // Leading gap back-filled from zero.
            let start_sec = if idx == 0 { 0 } else { bp.time_sec };
            let end_sec = breakpoints
                .get(idx + 1)
                .map(|next| next.time_sec)
                .unwrap_or(game_end)
                .max(start_sec);
            if end_sec == start_sec {
                continue;
            }
            let excluded = rule.is_excluded(bp.team_1_count, bp.team_2_count);
            if let Some(prev) = intervals.last_mut()
                && prev.excluded == excluded
                && prev.end_sec == start_sec
            {
                prev.end_sec = end_sec;
                continue;
            }
            intervals.push(ExcludeInterval {
                start_sec,
                end_sec,
                excluded,
            });
        }
        Self { intervals }
    }

    pub fn intervals(&self) -> &[ExcludeInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn game_end(&self) -> u32 {
        self.intervals.last().map(|i| i.end_sec).unwrap_or(0)
    }

    /// Interval starting at or before `time_sec`. Times before the first
    /// interval map to the first one and times past the end to the last.
    pub fn containing(&self, time_sec: u32) -> Option<&ExcludeInterval> {
        let idx = self.intervals.partition_point(|i| i.start_sec <= time_sec);
        self.intervals.get(idx.saturating_sub(1))
    }

    pub fn is_excluded(&self, time_sec: u32) -> Option<bool> {
        self.containing(time_sec).map(|i| i.excluded)
    }

    pub fn excluded_overlap(&self, start_sec: u32, end_sec: u32) -> u32 {
        let first = self.intervals.partition_point(|i| i.end_sec <= start_sec);
        self.intervals[first..]
            .iter()
            .take_while(|i| i.start_sec < end_sec)
            .filter(|i| i.excluded)
            .map(|i| i.overlap(start_sec, end_sec))
            .sum()
    }

    pub fn excluded_secs(&self) -> u32 {
        self.intervals
            .iter()
            .filter(|i| i.excluded)
            .map(|i| i.end_sec - i.start_sec)
            .sum()
    }
}
