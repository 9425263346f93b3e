//! Insulin-to-excursion correlation.
//!
//! Insulin is expected between a high and the following low. Each excursion's
//! insulin events are placed relative to its `[max_time, min_time]` interval,
//! and the distance from each extremum to the nearest insulin activity is
//! reported. When the relevant activity belongs to a neighboring excursion the
//! offset is a sentinel instead of a delta.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, warn};
use serde::{Serialize, Serializer};

use crate::core::config::Containment;
use crate::core::excursion::{fmt_hms, Excursion};
use crate::core::sample::{InsulinEvent, InsulinKind};

/// Time from an extremum to the insulin activity that explains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    /// Absolute time between the extremum and the insulin event.
    Known(TimeDelta),
    /// The extremum is explained by insulin of the next excursion.
    DeferToNext,
    /// The extremum is explained by insulin of the previous excursion.
    DeferToPrevious,
}

impl Offset {
    pub fn is_known(&self) -> bool {
        matches!(self, Offset::Known(_))
    }

    pub fn as_delta(&self) -> Option<TimeDelta> {
        match self {
            Offset::Known(d) => Some(*d),
            _ => None,
        }
    }

    /// Whole seconds for known offsets, `None` for sentinels.
    pub fn seconds(&self) -> Option<i64> {
        self.as_delta().map(|d| d.num_seconds())
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Known(d) => f.write_str(&fmt_hms(*d)),
            Offset::DeferToNext => f.write_str("NEXT"),
            Offset::DeferToPrevious => f.write_str("PREV"),
        }
    }
}

/// Known offsets serialize as seconds, sentinels as `"NEXT"` / `"PREV"`.
impl Serialize for Offset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Offset::Known(d) => serializer.serialize_i64(d.num_seconds()),
            Offset::DeferToNext => serializer.serialize_str("NEXT"),
            Offset::DeferToPrevious => serializer.serialize_str("PREV"),
        }
    }
}

/// Offsets of one insulin group from the excursion's max and min.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsulinOffsets {
    pub from_max: Offset,
    pub to_min: Offset,
}

impl InsulinOffsets {
    fn new(from_max: Offset, to_min: Offset) -> Self {
        Self { from_max, to_min }
    }
}

/// Insulin events of one excursion split by acting speed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsulinBySpeed {
    pub fast: Vec<InsulinEvent>,
    pub slow: Vec<InsulinEvent>,
}

impl Containment {
    /// Whether `x` falls in the interval between `max_time` and `min_time`.
    pub fn contains(
        &self,
        max_time: NaiveDateTime,
        min_time: NaiveDateTime,
        x: NaiveDateTime,
    ) -> bool {
        match self {
            Containment::Span => {
                let (lo, hi) = if max_time <= min_time {
                    (max_time, min_time)
                } else {
                    (min_time, max_time)
                };
                lo <= x && x <= hi
            }
            Containment::Wraparound => {
                if max_time <= min_time {
                    max_time <= x && x <= min_time
                } else {
                    max_time <= x || x <= min_time
                }
            }
        }
    }
}

/// Assign each insulin event to the first excursion whose end is at or after
/// the event.
///
/// Both inputs must be in chronological order; a single forward pointer walks
/// the excursions. Events after the last excursion are dropped.
pub fn split_by_excursion(
    events: &[InsulinEvent],
    excursions: &[Excursion],
) -> Vec<Vec<InsulinEvent>> {
    let mut groups: Vec<Vec<InsulinEvent>> = vec![Vec::new(); excursions.len()];
    let mut current = 0;
    let mut unassigned = 0;

    for event in events {
        while current < excursions.len() && excursions[current].end_time() < event.timestamp {
            current += 1;
        }
        match groups.get_mut(current) {
            Some(group) => group.push(*event),
            None => unassigned += 1,
        }
    }

    if unassigned > 0 {
        warn!("{unassigned} insulin events fall after the last excursion and were not assigned");
    }

    groups
}

/// Split one excursion's insulin events into fast- and slow-acting lists.
pub fn split_by_speed(events: &[InsulinEvent]) -> InsulinBySpeed {
    let (fast, slow): (Vec<InsulinEvent>, Vec<InsulinEvent>) = events
        .iter()
        .partition(|e| e.kind == InsulinKind::FastActing);
    InsulinBySpeed { fast, slow }
}

fn gap(a: NaiveDateTime, b: NaiveDateTime) -> TimeDelta {
    if a > b {
        a.signed_duration_since(b)
    } else {
        b.signed_duration_since(a)
    }
}

/// First and last timestamps of the events classified as inside.
fn inside_bounds(
    events: &[InsulinEvent],
    inside: &[bool],
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let mut kept = events
        .iter()
        .zip(inside)
        .filter(|(_, is_in)| **is_in)
        .map(|(e, _)| e.timestamp);
    let first = kept.next()?;
    let last = kept.last().unwrap_or(first);
    Some((first, last))
}

/// Place an insulin group relative to an excursion's max and min.
///
/// Returns `None` when `events` is empty.
///
/// The events are classified as inside or outside `[max_time, min_time]`:
/// - all inside: the group acts as one shot; offsets from its first event to
///   the max and from its last event to the min;
/// - all outside: depends on orientation and on whether the group comes before
///   or after the interval. An ascending excursion with insulin after the max
///   defers the min to the next excursion; with insulin before, the max is
///   deferred to the previous one. A descending excursion with insulin before
///   the max gets both offsets; with insulin after, both defer to the next;
/// - mixed: the extremum the group covers gets a real offset and the other is
///   deferred. A group that starts outside, enters and leaves again covers the
///   whole interval and defers both.
pub fn analyze_positions(
    excursion: &Excursion,
    events: &[InsulinEvent],
    containment: Containment,
) -> Option<InsulinOffsets> {
    let first_event = events.first()?.timestamp;
    let last_event = events.last()?.timestamp;

    let max_time = excursion.max_time();
    let min_time = excursion.min_time();
    let ascending = excursion.is_ascending();

    let inside: Vec<bool> = events
        .iter()
        .map(|e| containment.contains(max_time, min_time, e.timestamp))
        .collect();
    let inside_count = inside.iter().filter(|&&b| b).count();
    let transitions = inside.windows(2).filter(|w| w[0] != w[1]).count();

    let both = |start: NaiveDateTime, end: NaiveDateTime| {
        InsulinOffsets::new(
            Offset::Known(gap(start, max_time)),
            Offset::Known(gap(end, min_time)),
        )
    };

    let offsets = if inside_count == events.len() {
        both(first_event, last_event)
    } else if inside_count == 0 {
        if ascending {
            if first_event >= max_time {
                // min .. max .. insulin: the min it targets is in the next excursion.
                InsulinOffsets::new(Offset::Known(gap(first_event, max_time)), Offset::DeferToNext)
            } else {
                // insulin .. min .. max: the dose belongs to the previous high.
                InsulinOffsets::new(
                    Offset::DeferToPrevious,
                    Offset::Known(gap(last_event, min_time)),
                )
            }
        } else if last_event <= max_time {
            // insulin .. max .. min
            both(first_event, last_event)
        } else {
            // max .. min .. insulin
            InsulinOffsets::new(Offset::DeferToNext, Offset::DeferToNext)
        }
    } else if inside[0] {
        if ascending {
            // min .. insulin .. max .. insulin: covers the max.
            InsulinOffsets::new(Offset::Known(gap(first_event, max_time)), Offset::DeferToNext)
        } else {
            // max .. insulin .. min .. insulin: only the inside part acts on this min.
            let (start, end) = inside_bounds(events, &inside)?;
            both(start, end)
        }
    } else if transitions == 2 {
        // insulin .. extremum .. extremum .. insulin
        InsulinOffsets::new(Offset::DeferToPrevious, Offset::DeferToNext)
    } else if !ascending {
        // insulin .. max .. insulin .. min
        both(first_event, last_event)
    } else {
        // insulin .. min .. insulin .. max: only the inside part acts here.
        let (start, _) = inside_bounds(events, &inside)?;
        InsulinOffsets::new(Offset::Known(gap(start, max_time)), Offset::DeferToNext)
    };

    debug!(
        "analyze_positions: {} events ({} inside, {} transitions) -> max {}, min {}",
        events.len(),
        inside_count,
        transitions,
        offsets.from_max,
        offsets.to_min
    );

    Some(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::Sample;
    use chrono::NaiveDate;

    fn at(hour: i64, minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::hours(hour)
            + TimeDelta::minutes(minute)
    }

    /// Hourly excursion starting at 10:00.
    fn excursion(values: &[f64]) -> Excursion {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(at(10 + i as i64, 0), v))
            .collect();
        Excursion::new(samples).unwrap()
    }

    /// min at 10:00, max at 13:00
    fn rising() -> Excursion {
        excursion(&[80.0, 120.0, 160.0, 200.0, 150.0])
    }

    /// max at 10:00, min at 13:00
    fn falling() -> Excursion {
        excursion(&[200.0, 150.0, 100.0, 80.0, 120.0])
    }

    fn fast(hour: i64, minute: i64) -> InsulinEvent {
        InsulinEvent::new(at(hour, minute), InsulinKind::FastActing, 4.0)
    }

    fn slow(hour: i64) -> InsulinEvent {
        InsulinEvent::new(at(hour, 0), InsulinKind::SlowActing, 14.0)
    }

    fn known(hours: i64, minutes: i64) -> Offset {
        Offset::Known(TimeDelta::hours(hours) + TimeDelta::minutes(minutes))
    }

    fn analyze(e: &Excursion, events: &[InsulinEvent]) -> (Offset, Offset) {
        let o = analyze_positions(e, events, Containment::Span).unwrap();
        (o.from_max, o.to_min)
    }

    #[test]
    fn test_no_events() {
        assert!(analyze_positions(&rising(), &[], Containment::Span).is_none());
    }

    #[test]
    fn test_single_event_between_extrema() {
        let (from_max, to_min) = analyze(&rising(), &[fast(11, 0)]);
        assert_eq!(from_max, known(2, 0));
        assert_eq!(to_min, known(1, 0));
    }

    #[test]
    fn test_all_inside_uses_first_and_last() {
        let (from_max, to_min) = analyze(&rising(), &[fast(11, 0), fast(12, 30)]);
        assert_eq!(from_max, known(2, 0));
        assert_eq!(to_min, known(2, 30));
    }

    #[test]
    fn test_outside_after_rising() {
        let r = analyze(&rising(), &[fast(14, 0), fast(15, 0)]);
        assert_eq!(r, (known(1, 0), Offset::DeferToNext));
    }

    #[test]
    fn test_outside_before_rising() {
        let r = analyze(&rising(), &[fast(8, 0), fast(9, 0)]);
        assert_eq!(r, (Offset::DeferToPrevious, known(1, 0)));
    }

    #[test]
    fn test_outside_before_falling() {
        let r = analyze(&falling(), &[fast(8, 0), fast(9, 0)]);
        assert_eq!(r, (known(2, 0), known(4, 0)));
    }

    #[test]
    fn test_outside_after_falling() {
        let r = analyze(&falling(), &[fast(14, 0), fast(15, 0)]);
        assert_eq!(r, (Offset::DeferToNext, Offset::DeferToNext));
    }

    #[test]
    fn test_starts_inside_rising() {
        let r = analyze(&rising(), &[fast(12, 0), fast(14, 0)]);
        assert_eq!(r, (known(1, 0), Offset::DeferToNext));
    }

    #[test]
    fn test_starts_inside_falling_shrinks() {
        let r = analyze(&falling(), &[fast(11, 0), fast(12, 0), fast(14, 0)]);
        assert_eq!(r, (known(1, 0), known(1, 0)));
    }

    #[test]
    fn test_encloses_whole_interval() {
        let r = analyze(&falling(), &[fast(9, 0), fast(11, 0), fast(14, 0)]);
        assert_eq!(r, (Offset::DeferToPrevious, Offset::DeferToNext));
    }

    #[test]
    fn test_enters_falling() {
        let r = analyze(&falling(), &[fast(9, 0), fast(11, 0)]);
        assert_eq!(r, (known(1, 0), known(2, 0)));
    }

    #[test]
    fn test_enters_rising_shrinks() {
        let r = analyze(&rising(), &[fast(9, 0), fast(11, 0), fast(12, 0)]);
        assert_eq!(r, (known(2, 0), Offset::DeferToNext));
    }

    #[test]
    fn test_wraparound_containment() {
        // For a rising excursion the clock-style range is everything outside
        // 10:00..13:00, so 11:00 counts as outside and before the max.
        let o = analyze_positions(&rising(), &[fast(11, 0)], Containment::Wraparound).unwrap();
        assert_eq!((o.from_max, o.to_min), (Offset::DeferToPrevious, known(1, 0)));

        // Falling excursions are not affected.
        let o = analyze_positions(&falling(), &[fast(11, 0)], Containment::Wraparound).unwrap();
        assert_eq!((o.from_max, o.to_min), (known(1, 0), known(2, 0)));
    }

    #[test]
    fn test_containment_bounds_inclusive() {
        let (max_t, min_t) = (at(13, 0), at(10, 0));
        assert!(Containment::Span.contains(max_t, min_t, at(10, 0)));
        assert!(Containment::Span.contains(max_t, min_t, at(13, 0)));
        assert!(!Containment::Span.contains(max_t, min_t, at(13, 1)));
        assert!(Containment::Wraparound.contains(max_t, min_t, at(13, 0)));
        assert!(Containment::Wraparound.contains(max_t, min_t, at(9, 0)));
        assert!(!Containment::Wraparound.contains(max_t, min_t, at(12, 0)));
    }

    #[test]
    fn test_split_by_excursion() {
        // Excursions end at 14:00 and 19:00.
        let first = rising();
        let second = Excursion::new(
            (0..5)
                .map(|i| Sample::new(at(15 + i, 0), 100.0 + i as f64))
                .collect(),
        )
        .unwrap();
        let events = vec![fast(9, 0), fast(14, 0), slow(15), fast(18, 30), fast(20, 0)];
        let groups = split_by_excursion(&events, &[first, second]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![events[0], events[1]]);
        assert_eq!(groups[1], vec![events[2], events[3]]);
    }

    #[test]
    fn test_split_by_excursion_without_excursions() {
        let groups = split_by_excursion(&[fast(9, 0)], &[]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_split_by_speed() {
        let events = vec![fast(9, 0), slow(10), fast(11, 0)];
        let by_speed = split_by_speed(&events);
        assert_eq!(by_speed.fast, vec![events[0], events[2]]);
        assert_eq!(by_speed.slow, vec![events[1]]);
    }

    #[test]
    fn test_offset_rendering() {
        assert_eq!(known(1, 30).to_string(), "1:30:00");
        assert_eq!(Offset::DeferToNext.to_string(), "NEXT");
        assert_eq!(Offset::DeferToPrevious.to_string(), "PREV");
        assert_eq!(known(0, 2).seconds(), Some(120));
        assert_eq!(Offset::DeferToNext.seconds(), None);

        let offsets = InsulinOffsets::new(known(0, 1), Offset::DeferToPrevious);
        let json = serde_json::to_string(&offsets).unwrap();
        assert_eq!(json, r#"{"from_max":60,"to_min":"PREV"}"#);
    }
}
