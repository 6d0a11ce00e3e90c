//! Reference Catalog model.
//!
//! The four master entity collections a timetable is checked against:
//! teachers, rooms, subjects, and classes. The catalog is supplied fresh
//! on each computation and is never mutated by the pipeline.
//!
//! [`CatalogIndex`] provides O(1) lookup by id over a borrowed catalog.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::TimeSlot;
use crate::error::{EntityKind, Result, TimetableError};

/// A teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subject ids this teacher is qualified to teach.
    #[serde(default)]
    pub subjects: BTreeSet<String>,
    /// Maximum sessions per day. `None` = fall back to request constraints.
    #[serde(default)]
    pub max_hours_per_day: Option<u32>,
    /// Maximum run of back-to-back sessions. `None` = unlimited.
    #[serde(default)]
    pub max_consecutive_classes: Option<u32>,
    /// Slots in which the teacher cannot teach.
    #[serde(default)]
    pub unavailable_slots: BTreeSet<TimeSlot>,
}

impl Teacher {
    /// Creates a teacher with no limits and full availability.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            subjects: BTreeSet::new(),
            max_hours_per_day: None,
            max_consecutive_classes: None,
            unavailable_slots: BTreeSet::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a qualified subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subjects.insert(subject_id.into());
        self
    }

    /// Sets the daily session limit.
    pub fn with_max_hours_per_day(mut self, max: u32) -> Self {
        self.max_hours_per_day = Some(max);
        self
    }

    /// Sets the consecutive session limit.
    pub fn with_max_consecutive_classes(mut self, max: u32) -> Self {
        self.max_consecutive_classes = Some(max);
        self
    }

    /// Marks a slot as unavailable.
    pub fn with_unavailable(mut self, slot: TimeSlot) -> Self {
        self.unavailable_slots.insert(slot);
        self
    }

    /// Whether the teacher may teach the given subject.
    pub fn is_qualified_for(&self, subject_id: &str) -> bool {
        self.subjects.contains(subject_id)
    }

    /// Returns the first unavailable slot intersecting `slot`, if any.
    pub fn unavailability_at(&self, slot: &TimeSlot) -> Option<&TimeSlot> {
        self.unavailable_slots.iter().find(|u| u.intersects(slot))
    }
}

/// A room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Seats. Must be positive.
    pub capacity: i32,
    /// Feature tags (e.g. "projector", "lab").
    #[serde(default)]
    pub features: BTreeSet<String>,
    /// Slots in which the room may be used. Empty = always available.
    #[serde(default)]
    pub available_slots: Vec<TimeSlot>,
}

impl Room {
    /// Creates a room with the given capacity.
    pub fn new(id: impl Into<String>, capacity: i32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity,
            features: BTreeSet::new(),
            available_slots: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a feature tag.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    /// Adds an availability slot.
    pub fn with_available(mut self, slot: TimeSlot) -> Self {
        self.available_slots.push(slot);
        self
    }

    /// Features in `required` this room lacks, in sorted order.
    pub fn missing_features<'a>(&self, required: &'a BTreeSet<String>) -> Vec<&'a str> {
        required
            .iter()
            .filter(|f| !self.features.contains(*f))
            .map(String::as_str)
            .collect()
    }

    /// Whether the room may be used during `slot`.
    pub fn is_available_for(&self, slot: &TimeSlot) -> bool {
        self.available_slots.is_empty()
            || self
                .available_slots
                .iter()
                .any(|a| a.day == slot.day && a.period().covers(&slot.period()))
    }
}

/// A subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Weekly sessions each class taking this subject should receive.
    pub hours_per_week: u32,
    /// Room features this subject needs.
    #[serde(default, alias = "required_features")]
    pub requires_features: BTreeSet<String>,
    /// Preferred teacher ids, most preferred first.
    #[serde(default)]
    pub preferred_teachers: Vec<String>,
}

impl Subject {
    /// Creates a subject with the given weekly hours.
    pub fn new(id: impl Into<String>, hours_per_week: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            hours_per_week,
            requires_features: BTreeSet::new(),
            preferred_teachers: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a required room feature.
    pub fn with_required_feature(mut self, feature: impl Into<String>) -> Self {
        self.requires_features.insert(feature.into());
        self
    }

    /// Appends a preferred teacher.
    pub fn with_preferred_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.preferred_teachers.push(teacher_id.into());
        self
    }
}

/// A class (student group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Unique class identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subject ids the class must receive.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Number of students.
    pub students_count: u32,
}

impl Class {
    /// Creates a class with the given head count.
    pub fn new(id: impl Into<String>, students_count: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            subjects: Vec::new(),
            students_count,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a required subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subjects.push(subject_id.into());
        self
    }
}

/// The Reference Catalog: all master entities for one computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub classes: Vec<Class>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a class.
    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.push(class);
        self
    }

    /// Builds an id index over this catalog.
    pub fn index(&self) -> CatalogIndex<'_> {
        CatalogIndex::new(self)
    }

    /// The first entity kind with no entries, if any.
    pub fn first_empty_section(&self) -> Option<EntityKind> {
        if self.teachers.is_empty() {
            Some(EntityKind::Teacher)
        } else if self.rooms.is_empty() {
            Some(EntityKind::Room)
        } else if self.subjects.is_empty() {
            Some(EntityKind::Subject)
        } else if self.classes.is_empty() {
            Some(EntityKind::Class)
        } else {
            None
        }
    }
}

/// Id lookup over a borrowed [`Catalog`].
///
/// When ids repeat, the last occurrence wins; duplicate ids are rejected
/// by catalog validation before any index is relied on.
#[derive(Debug, Clone)]
pub struct CatalogIndex<'a> {
    catalog: &'a Catalog,
    teachers: HashMap<&'a str, &'a Teacher>,
    rooms: HashMap<&'a str, &'a Room>,
    subjects: HashMap<&'a str, &'a Subject>,
    classes: HashMap<&'a str, &'a Class>,
}

impl<'a> CatalogIndex<'a> {
    /// Indexes a catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            teachers: catalog.teachers.iter().map(|t| (t.id.as_str(), t)).collect(),
            rooms: catalog.rooms.iter().map(|r| (r.id.as_str(), r)).collect(),
            subjects: catalog.subjects.iter().map(|s| (s.id.as_str(), s)).collect(),
            classes: catalog.classes.iter().map(|c| (c.id.as_str(), c)).collect(),
        }
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn teacher(&self, id: &str) -> Option<&'a Teacher> {
        self.teachers.get(id).copied()
    }

    pub fn room(&self, id: &str) -> Option<&'a Room> {
        self.rooms.get(id).copied()
    }

    pub fn subject(&self, id: &str) -> Option<&'a Subject> {
        self.subjects.get(id).copied()
    }

    pub fn class(&self, id: &str) -> Option<&'a Class> {
        self.classes.get(id).copied()
    }

    /// Whether an entity of `kind` with this id exists.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Teacher => self.teachers.contains_key(id),
            EntityKind::Room => self.rooms.contains_key(id),
            EntityKind::Subject => self.subjects.contains_key(id),
            EntityKind::Class => self.classes.contains_key(id),
        }
    }

    /// Looks up a teacher that validation has already proven to exist.
    pub fn require_teacher(&self, id: &str) -> Result<&'a Teacher> {
        self.teacher(id)
            .ok_or_else(|| inconsistency(EntityKind::Teacher, id))
    }

    /// Looks up a room that validation has already proven to exist.
    pub fn require_room(&self, id: &str) -> Result<&'a Room> {
        self.room(id).ok_or_else(|| inconsistency(EntityKind::Room, id))
    }

    /// Looks up a subject that validation has already proven to exist.
    pub fn require_subject(&self, id: &str) -> Result<&'a Subject> {
        self.subject(id)
            .ok_or_else(|| inconsistency(EntityKind::Subject, id))
    }

    /// Looks up a class that validation has already proven to exist.
    pub fn require_class(&self, id: &str) -> Result<&'a Class> {
        self.class(id).ok_or_else(|| inconsistency(EntityKind::Class, id))
    }

    /// Sum of `hours_per_week` over a class's required subjects. A
    /// subject listed twice counts once.
    pub fn required_weekly_hours(&self, class: &Class) -> Result<u32> {
        class
            .subjects
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(|sid| self.require_subject(sid).map(|s| s.hours_per_week))
            .sum()
    }
}

fn inconsistency(kind: EntityKind, id: &str) -> TimetableError {
    tracing::error!(%kind, id, "catalog lookup failed after validation");
    TimetableError::CatalogInconsistency {
        kind,
        id: id.to_string(),
    }
}
