//! Timetable entry model.
//!
//! An entry is one fact: "this class has this subject, with this teacher,
//! in this room, during this slot." Entries arrive without ids; ingest
//! assigns each one an [`EntryId`] equal to its position in canonical
//! order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::{Period, TimeSlot};
use crate::error::EntityKind;

/// Position of an entry in a validated, canonically ordered entry set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u32);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// One scheduled session as submitted by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Zero-based day index.
    pub day: u8,
    /// Time of day.
    pub slot: Period,
    pub subject_id: String,
    pub teacher_id: String,
    pub room_id: String,
    pub class_id: String,
}

impl Entry {
    /// Creates an entry.
    pub fn new(
        slot: TimeSlot,
        subject_id: impl Into<String>,
        teacher_id: impl Into<String>,
        room_id: impl Into<String>,
        class_id: impl Into<String>,
    ) -> Self {
        Self {
            day: slot.day,
            slot: slot.period(),
            subject_id: subject_id.into(),
            teacher_id: teacher_id.into(),
            room_id: room_id.into(),
            class_id: class_id.into(),
        }
    }

    /// The day-qualified slot of this entry.
    #[inline]
    pub fn time_slot(&self) -> TimeSlot {
        self.slot.on_day(self.day)
    }

    /// The id this entry references for a given entity kind.
    pub fn reference(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Teacher => &self.teacher_id,
            EntityKind::Room => &self.room_id,
            EntityKind::Subject => &self.subject_id,
            EntityKind::Class => &self.class_id,
        }
    }

    /// Canonical ordering: day, start time, class id, then the remaining
    /// fields as tie-breakers so the order is total.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.day
            .cmp(&other.day)
            .then_with(|| self.slot.start_time.cmp(&other.slot.start_time))
            .then_with(|| self.class_id.cmp(&other.class_id))
            .then_with(|| self.slot.end_time.cmp(&other.slot.end_time))
            .then_with(|| self.subject_id.cmp(&other.subject_id))
            .then_with(|| self.teacher_id.cmp(&other.teacher_id))
            .then_with(|| self.room_id.cmp(&other.room_id))
    }
}

/// An entry with its assigned id, as it appears in views and artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    pub id: EntryId,
    #[serde(flatten)]
    pub entry: Entry,
}

impl ScheduledEntry {
    /// Shorthand for `self.entry.time_slot()`.
    #[inline]
    pub fn time_slot(&self) -> TimeSlot {
        self.entry.time_slot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u8, start: &str, end: &str, class_id: &str) -> Entry {
        Entry::new(
            TimeSlot::parse(day, start, end).unwrap(),
            "S1",
            "T1",
            "R1",
            class_id,
        )
    }

    #[test]
    fn test_entry_time_slot() {
        let e = entry(2, "09:00", "09:50", "C1");
        assert_eq!(e.time_slot(), TimeSlot::parse(2, "09:00", "09:50").unwrap());
        assert_eq!(e.reference(EntityKind::Class), "C1");
        assert_eq!(e.reference(EntityKind::Room), "R1");
    }

    #[test]
    fn test_canonical_order() {
        let mut entries = vec![
            entry(1, "08:00", "09:00", "C1"),
            entry(0, "10:00", "11:00", "C1"),
            entry(0, "08:00", "09:00", "C2"),
            entry(0, "08:00", "09:00", "C1"),
        ];
        entries.sort_by(Entry::canonical_cmp);
        let keys: Vec<(u8, &str)> = entries
            .iter()
            .map(|e| (e.day, e.class_id.as_str()))
            .collect();
        assert_eq!(keys, vec![(0, "C1"), (0, "C2"), (0, "C1"), (1, "C1")]);
    }

    #[test]
    fn test_wire_shape() {
        let scheduled = ScheduledEntry {
            id: EntryId(7),
            entry: entry(0, "09:00", "10:00", "C1"),
        };
        let json = serde_json::to_value(&scheduled).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["slot"]["start_time"], "09:00");
        assert_eq!(json["class_id"], "C1");
        assert_eq!(EntryId(7).to_string(), "E7");
    }
}
