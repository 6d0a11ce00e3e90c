//! Conflict finding model.
//!
//! A finding is a non-fatal, reported violation of a resource or load
//! rule. A timetable may carry any number of findings; the caller decides
//! whether the timetable is acceptable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::{EntryId, Period};

/// Classification of conflict findings.
///
/// Declaration order is the tie-break order when findings share a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Two or more entries share a room and an identical slot.
    RoomDoubleBooked,
    /// Two or more entries share a teacher and an identical slot.
    TeacherDoubleBooked,
    /// An entry falls in one of the teacher's unavailable slots.
    TeacherUnavailable,
    /// The room seats fewer students than the class has.
    RoomCapacityExceeded,
    /// The room lacks a feature the subject requires.
    RoomFeatureMismatch,
    /// A teacher has more sessions on one day than allowed.
    TeacherOverloaded,
    /// A teacher's longest back-to-back run on one day is too long.
    TeacherOverConsecutive,
    /// The room is not open during the entry's slot.
    RoomUnavailable,
    /// An entry overlaps a configured break.
    BreakSlotViolation,
    /// A class has more sessions on one day than allowed.
    ClassOverloaded,
    /// The teacher is not qualified for the entry's subject.
    TeacherUnqualified,
    /// A class's sessions of one subject on one day are split into
    /// non-contiguous blocks.
    SubjectSplit,
}

impl ConflictKind {
    /// Severity (0-100, higher = worse).
    pub fn severity(self) -> i32 {
        match self {
            Self::RoomDoubleBooked | Self::TeacherDoubleBooked => 95,
            Self::TeacherUnavailable | Self::RoomUnavailable => 90,
            Self::RoomCapacityExceeded => 85,
            Self::RoomFeatureMismatch | Self::TeacherUnqualified => 75,
            Self::BreakSlotViolation => 70,
            Self::TeacherOverloaded | Self::ClassOverloaded => 60,
            Self::TeacherOverConsecutive => 50,
            Self::SubjectSplit => 30,
        }
    }

    /// Stable name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomDoubleBooked => "RoomDoubleBooked",
            Self::TeacherDoubleBooked => "TeacherDoubleBooked",
            Self::TeacherUnavailable => "TeacherUnavailable",
            Self::RoomCapacityExceeded => "RoomCapacityExceeded",
            Self::RoomFeatureMismatch => "RoomFeatureMismatch",
            Self::TeacherOverloaded => "TeacherOverloaded",
            Self::TeacherOverConsecutive => "TeacherOverConsecutive",
            Self::RoomUnavailable => "RoomUnavailable",
            Self::BreakSlotViolation => "BreakSlotViolation",
            Self::ClassOverloaded => "ClassOverloaded",
            Self::TeacherUnqualified => "TeacherUnqualified",
            Self::SubjectSplit => "SubjectSplit",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFinding {
    /// Conflict classification.
    pub kind: ConflictKind,
    /// Day of the anchoring slot.
    pub day: u8,
    /// Anchoring slot: the shared slot for double-bookings, the entry's
    /// slot for per-entry rules, the first involved slot for per-day rules.
    pub slot: Period,
    /// Offending entries, ascending.
    pub entry_ids: Vec<EntryId>,
    /// The teacher, room, or class the finding is about.
    pub entity_id: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ConflictFinding {
    /// Creates a finding. Entry ids are sorted and deduplicated.
    pub fn new(
        kind: ConflictKind,
        day: u8,
        slot: Period,
        mut entry_ids: Vec<EntryId>,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        entry_ids.sort_unstable();
        entry_ids.dedup();
        Self {
            kind,
            day,
            slot,
            entry_ids,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// Severity of this finding's kind.
    pub fn severity(&self) -> i32 {
        self.kind.severity()
    }

    /// Whether this finding references the given entry.
    pub fn involves(&self, id: EntryId) -> bool {
        self.entry_ids.binary_search(&id).is_ok()
    }

    /// Output order: day, slot, kind, then entry ids and entity.
    pub fn output_cmp(&self, other: &Self) -> Ordering {
        self.day
            .cmp(&other.day)
            .then_with(|| self.slot.cmp(&other.slot))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.entry_ids.cmp(&other.entry_ids))
            .then_with(|| self.entity_id.cmp(&other.entity_id))
    }
}
