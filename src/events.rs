use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::clock::{PeriodKind, cumulative_seconds, parse_clock};
use crate::model::{Event, EventType, GameId, TeamId};
use crate::strength::ExcludeTimeline;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub game_id: GameId,
    pub event_type: String,
    pub period: Option<u32>,
    #[serde(default)]
    pub period_type: Option<String>,
    pub period_time: Option<String>,
    pub team_for: Option<TeamId>,
    pub team_against: Option<TeamId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDrops {
    pub irrelevant: usize,
    pub shootout: usize,
    pub unresolvable: usize,
    pub excluded: usize,
}

impl EventDrops {
    pub fn total(&self) -> usize {
        self.irrelevant + self.shootout + self.unresolvable + self.excluded
    }
}

impl AddAssign for EventDrops {
    fn add_assign(&mut self, rhs: Self) {
        self.irrelevant += rhs.irrelevant;
        self.shootout += rhs.shootout;
        self.unresolvable += rhs.unresolvable;
        self.excluded += rhs.excluded;
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreparedEvents {
    pub events: Vec<Event>,
    pub drops: EventDrops,
}

/// Stamps Corsi-relevant rows with cumulative game-clock seconds; every
/// other row is dropped and counted.
pub fn prepare_events(raw: &[RawEvent]) -> PreparedEvents {
    let mut out = PreparedEvents::default();
    for row in raw {
        let event_type = EventType::parse(&row.event_type);
        if !event_type.is_corsi() {
            out.drops.irrelevant += 1;
            continue;
        }
        match stamp(row, event_type) {
            Stamped::Event(event) => out.events.push(event),
            Stamped::Shootout => out.drops.shootout += 1,
            Stamped::Unresolvable => out.drops.unresolvable += 1,
        }
    }
    out
}

enum Stamped {
    Event(Event),
    Shootout,
    Unresolvable,
}

fn stamp(row: &RawEvent, event_type: EventType) -> Stamped {
    let Some(period) = row.period else {
        return Stamped::Unresolvable;
    };
    if PeriodKind::classify(period, row.period_type.as_deref()) == PeriodKind::Shootout {
        return Stamped::Shootout;
    }
    let (Some(team_for), Some(team_against)) = (row.team_for, row.team_against) else {
        return Stamped::Unresolvable;
    };
    if team_for == team_against {
        return Stamped::Unresolvable;
    }
    let Some(time_sec) = row
        .period_time
        .as_deref()
        .and_then(parse_clock)
        .and_then(|offset| cumulative_seconds(period, offset))
    else {
        return Stamped::Unresolvable;
    };
    Stamped::Event(Event {
        game_id: row.game_id,
        time_sec,
        event_type,
        team_for,
        team_against,
    })
}

pub fn filter_events(events: &[Event], timeline: &ExcludeTimeline) -> (Vec<Event>, usize) {
    let mut kept = Vec::with_capacity(events.len());
    let mut excluded = 0usize;
    for event in events {
        // None means an empty timeline: no countable time at all.
        if timeline.is_excluded(event.time_sec) == Some(false) {
            kept.push(*event);
        } else {
            excluded += 1;
        }
    }
    (kept, excluded)
}
