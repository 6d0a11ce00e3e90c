//! Generated timetable (artifact) model.
//!
//! A [`GeneratedTimetable`] bundles the canonical entry list with its three
//! derived views, the conflict findings, and the stats mapping. Once
//! published it is immutable: fields are read through accessors only, and
//! a revision produces a new timetable with a new [`TimetableId`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ConflictFinding, ConflictKind, Entry, EntryId, ScheduledEntry};

/// Opaque timetable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimetableId(Uuid);

impl TimetableId {
    /// Allocates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TimetableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TimetableId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// All sessions of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTimetable {
    pub class_id: String,
    pub class_name: String,
    /// Sessions ordered by day, then start time.
    pub entries: Vec<ScheduledEntry>,
}

/// All sessions of one teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherTimetable {
    pub teacher_id: String,
    pub teacher_name: String,
    /// Sessions ordered by day, then start time.
    pub entries: Vec<ScheduledEntry>,
}

/// All sessions held in one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTimetable {
    pub room_id: String,
    pub room_name: String,
    /// Sessions ordered by day, then start time.
    pub entries: Vec<ScheduledEntry>,
}

/// The three derived groupings of one entry set.
///
/// Only ids with at least one entry appear as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableViews {
    pub class_timetables: BTreeMap<String, ClassTimetable>,
    pub teacher_timetables: BTreeMap<String, TeacherTimetable>,
    pub room_allocations: BTreeMap<String, RoomTimetable>,
}

impl TimetableViews {
    /// Entries reachable through the by-class view.
    pub fn class_entry_count(&self) -> usize {
        self.class_timetables.values().map(|t| t.entries.len()).sum()
    }

    /// Entries reachable through the by-teacher view.
    pub fn teacher_entry_count(&self) -> usize {
        self.teacher_timetables.values().map(|t| t.entries.len()).sum()
    }

    /// Entries reachable through the by-room view.
    pub fn room_entry_count(&self) -> usize {
        self.room_allocations.values().map(|t| t.entries.len()).sum()
    }
}

/// Lightweight listing record for stored timetables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSummary {
    pub id: TimetableId,
    pub parent_id: Option<TimetableId>,
    pub created_at: DateTime<Utc>,
    pub entry_count: usize,
    pub conflict_count: usize,
}

/// A published timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTimetable {
    id: TimetableId,
    #[serde(default)]
    parent_id: Option<TimetableId>,
    fingerprint: String,
    created_at: DateTime<Utc>,
    entries: Vec<ScheduledEntry>,
    #[serde(flatten)]
    views: TimetableViews,
    conflicts: Vec<ConflictFinding>,
    stats: BTreeMap<String, f64>,
}

impl GeneratedTimetable {
    /// Assembles a published timetable. Only the pipeline publishes.
    pub(crate) fn new(
        id: TimetableId,
        parent_id: Option<TimetableId>,
        fingerprint: String,
        entries: Vec<ScheduledEntry>,
        views: TimetableViews,
        conflicts: Vec<ConflictFinding>,
        stats: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            id,
            parent_id,
            fingerprint,
            created_at: Utc::now(),
            entries,
            views,
            conflicts,
            stats,
        }
    }

    pub fn id(&self) -> TimetableId {
        self.id
    }

    /// The timetable this one was revised from, if any.
    pub fn parent_id(&self) -> Option<TimetableId> {
        self.parent_id
    }

    /// Hex digest of the inputs this timetable was computed from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The canonical entry list, in id order.
    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    /// Looks up an entry by id.
    pub fn entry(&self, id: EntryId) -> Option<&ScheduledEntry> {
        self.entries.get(id.0 as usize)
    }

    /// The raw entries, as they would be resubmitted for a revision.
    pub fn raw_entries(&self) -> Vec<Entry> {
        self.entries.iter().map(|e| e.entry.clone()).collect()
    }

    pub fn views(&self) -> &TimetableViews {
        &self.views
    }

    pub fn class_timetable(&self, class_id: &str) -> Option<&ClassTimetable> {
        self.views.class_timetables.get(class_id)
    }

    pub fn teacher_timetable(&self, teacher_id: &str) -> Option<&TeacherTimetable> {
        self.views.teacher_timetables.get(teacher_id)
    }

    pub fn room_timetable(&self, room_id: &str) -> Option<&RoomTimetable> {
        self.views.room_allocations.get(room_id)
    }

    /// All findings, in output order.
    pub fn conflicts(&self) -> &[ConflictFinding] {
        &self.conflicts
    }

    /// Findings of one kind.
    pub fn conflicts_of(&self, kind: ConflictKind) -> Vec<&ConflictFinding> {
        self.conflicts.iter().filter(|c| c.kind == kind).collect()
    }

    /// Whether no findings were reported.
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn stats(&self) -> &BTreeMap<String, f64> {
        &self.stats
    }

    /// A single named metric.
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }

    /// Listing record.
    pub fn summary(&self) -> TimetableSummary {
        TimetableSummary {
            id: self.id,
            parent_id: self.parent_id,
            created_at: self.created_at,
            entry_count: self.entries.len(),
            conflict_count: self.conflicts.len(),
        }
    }
}
