//! Entry Store: structural validation of a generation request.
//!
//! Checks the Reference Catalog and the submitted entries before any view
//! is built. Detects:
//! - Duplicate catalog ids, non-positive room capacity, malformed
//!   catalog slots, classes requiring unknown subjects
//! - Entries referencing unknown teacher/room/subject/class ids
//! - Malformed entry slots (`start_time >= end_time`) and days outside
//!   the configured week
//! - A class booked twice in an identical slot
//!
//! All defects are collected; a rejected request reports every one of
//! them. On success the entries are frozen in canonical order
//! (day, start time, class id) and numbered.

use std::collections::{HashMap, HashSet};

use crate::config::TimetableConstraints;
use crate::error::{EntityKind, SlotDefect, StructuralError};
use crate::models::{Catalog, Entry, EntryId, ScheduledEntry, TimeSlot};

/// Validation result for a whole request.
pub type IngestResult = Result<ValidEntrySet, Vec<StructuralError>>;

const ENTRY_REFERENCES: [EntityKind; 4] = [
    EntityKind::Teacher,
    EntityKind::Room,
    EntityKind::Subject,
    EntityKind::Class,
];

/// An immutable, validated, canonically ordered entry sequence.
///
/// Only [`ingest`] constructs one. `entries()[i].id == EntryId(i)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEntrySet {
    entries: Vec<ScheduledEntry>,
    days_per_week: u8,
}

impl ValidEntrySet {
    /// Entries in canonical order.
    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduledEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: EntryId) -> Option<&ScheduledEntry> {
        self.entries.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Week length the entries were validated against.
    pub fn days_per_week(&self) -> u8 {
        self.days_per_week
    }
}

impl<'a> IntoIterator for &'a ValidEntrySet {
    type Item = &'a ScheduledEntry;
    type IntoIter = std::slice::Iter<'a, ScheduledEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Validates the Reference Catalog on its own.
///
/// Checks:
/// 1. No duplicate ids within each entity kind
/// 2. Every room has positive capacity
/// 3. Teacher unavailability and room availability slots are well formed
/// 4. Every subject a class requires exists, and is listed once
pub fn validate_catalog(catalog: &Catalog) -> Result<(), Vec<StructuralError>> {
    let mut errors = Vec::new();

    check_unique(
        EntityKind::Teacher,
        catalog.teachers.iter().map(|t| t.id.as_str()),
        &mut errors,
    );
    check_unique(
        EntityKind::Room,
        catalog.rooms.iter().map(|r| r.id.as_str()),
        &mut errors,
    );
    check_unique(
        EntityKind::Subject,
        catalog.subjects.iter().map(|s| s.id.as_str()),
        &mut errors,
    );
    check_unique(
        EntityKind::Class,
        catalog.classes.iter().map(|c| c.id.as_str()),
        &mut errors,
    );

    for room in &catalog.rooms {
        if room.capacity <= 0 {
            errors.push(catalog_error(
                EntityKind::Room,
                &room.id,
                format!("capacity must be positive, got {}", room.capacity),
            ));
        }
        for slot in room.available_slots.iter().filter(|s| !s.period().is_well_formed()) {
            errors.push(catalog_error(
                EntityKind::Room,
                &room.id,
                format!("availability slot {slot} does not start before it ends"),
            ));
        }
    }

    for teacher in &catalog.teachers {
        for slot in teacher
            .unavailable_slots
            .iter()
            .filter(|s| !s.period().is_well_formed())
        {
            errors.push(catalog_error(
                EntityKind::Teacher,
                &teacher.id,
                format!("unavailable slot {slot} does not start before it ends"),
            ));
        }
    }

    let subject_ids: HashSet<&str> = catalog.subjects.iter().map(|s| s.id.as_str()).collect();
    for class in &catalog.classes {
        let mut listed = HashSet::new();
        for sid in &class.subjects {
            if !subject_ids.contains(sid.as_str()) {
                errors.push(catalog_error(
                    EntityKind::Class,
                    &class.id,
                    format!("requires unknown subject '{sid}'"),
                ));
            }
            if !listed.insert(sid.as_str()) {
                errors.push(catalog_error(
                    EntityKind::Class,
                    &class.id,
                    format!("lists subject '{sid}' more than once"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the constraints attached to a request.
///
/// Break periods must start before they end.
pub fn validate_constraints(constraints: &TimetableConstraints) -> Result<(), Vec<StructuralError>> {
    let errors: Vec<StructuralError> = constraints
        .break_slots
        .iter()
        .enumerate()
        .filter(|(_, period)| !period.is_well_formed())
        .map(|(i, period)| StructuralError::ConstraintIntegrity {
            field: format!("break_slots[{i}]"),
            reason: format!("break {period} does not start before it ends"),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a submitted entry list against a catalog.
///
/// Checks the catalog (see [`validate_catalog`]), the week length, then
/// every entry's references and slot shape, then class double-booking.
/// Returns the frozen entry set, or every structural error found.
pub fn ingest(entries: &[Entry], catalog: &Catalog, days_per_week: u8) -> IngestResult {
    let mut errors = validate_catalog(catalog).err().unwrap_or_default();
    let index = catalog.index();

    // An empty week would reject every entry; report it once instead.
    let week_is_usable = days_per_week > 0;
    if !week_is_usable {
        errors.push(StructuralError::ConstraintIntegrity {
            field: "days_per_week".into(),
            reason: "week must have at least one day".into(),
        });
    }

    for (entry_index, entry) in entries.iter().enumerate() {
        for kind in ENTRY_REFERENCES {
            let id = entry.reference(kind);
            if !index.contains(kind, id) {
                errors.push(StructuralError::ReferentialIntegrity {
                    entry_index,
                    kind,
                    id: id.to_string(),
                });
            }
        }

        if !entry.slot.is_well_formed() {
            errors.push(StructuralError::SlotIntegrity {
                entry_index,
                slot: entry.time_slot(),
                defect: SlotDefect::StartNotBeforeEnd,
            });
        }
        if week_is_usable && entry.day >= days_per_week {
            errors.push(StructuralError::SlotIntegrity {
                entry_index,
                slot: entry.time_slot(),
                defect: SlotDefect::DayOutOfRange { days_per_week },
            });
        }
    }

    detect_double_booked_classes(entries, &mut errors);

    if !errors.is_empty() {
        tracing::warn!(
            entries = entries.len(),
            errors = errors.len(),
            "entry set rejected"
        );
        return Err(errors);
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| entries[a].canonical_cmp(&entries[b]));

    let scheduled = order
        .into_iter()
        .enumerate()
        .map(|(position, original)| ScheduledEntry {
            id: EntryId(position as u32),
            entry: entries[original].clone(),
        })
        .collect::<Vec<_>>();

    tracing::debug!(entries = scheduled.len(), "entry set validated");

    Ok(ValidEntrySet {
        entries: scheduled,
        days_per_week,
    })
}

/// A class in two places at once makes the input self-contradictory.
fn detect_double_booked_classes(entries: &[Entry], errors: &mut Vec<StructuralError>) {
    let mut first_seen: HashMap<(&str, TimeSlot), usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        let key = (entry.class_id.as_str(), entry.time_slot());
        if let Some(&first_index) = first_seen.get(&key) {
            errors.push(StructuralError::DoubleBookedClass {
                class_id: entry.class_id.clone(),
                slot: key.1,
                first_index,
                second_index: index,
            });
        } else {
            first_seen.insert(key, index);
        }
    }
}

fn check_unique<'a>(
    kind: EntityKind,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<StructuralError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(catalog_error(kind, id, "duplicate id"));
        }
    }
}

fn catalog_error(kind: EntityKind, id: &str, reason: impl Into<String>) -> StructuralError {
    StructuralError::CatalogIntegrity {
        kind,
        id: id.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Class, Period, Room, Subject, Teacher};

    fn slot(day: u8, start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(day, start, end).unwrap()
    }

    fn sample_catalog() -> Catalog {
        Catalog::new()
            .with_teacher(Teacher::new("T1").with_name("Ada"))
            .with_teacher(Teacher::new("T2").with_name("Grace"))
            .with_room(Room::new("R1", 30).with_name("Room 1"))
            .with_room(Room::new("R2", 20).with_name("Room 2"))
            .with_subject(Subject::new("S1", 2))
            .with_class(Class::new("C1", 25).with_subject("S1"))
            .with_class(Class::new("C2", 18).with_subject("S1"))
    }

    fn entry(s: TimeSlot, teacher: &str, room: &str, class: &str) -> Entry {
        Entry::new(s, "S1", teacher, room, class)
    }

    #[test]
    fn test_valid_input_is_canonically_ordered() {
        let entries = vec![
            entry(slot(1, "08:00", "09:00"), "T1", "R1", "C1"),
            entry(slot(0, "10:00", "11:00"), "T1", "R1", "C1"),
            entry(slot(0, "08:00", "09:00"), "T2", "R2", "C2"),
            entry(slot(0, "08:00", "09:00"), "T1", "R1", "C1"),
        ];
        let set = ingest(&entries, &sample_catalog(), 5).unwrap();

        assert_eq!(set.len(), 4);
        let order: Vec<(u8, &str, &str)> = set
            .iter()
            .map(|e| (e.entry.day, e.entry.class_id.as_str(), e.entry.teacher_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![(0, "C1", "T1"), (0, "C2", "T2"), (0, "C1", "T1"), (1, "C1", "T1")]
        );
        for (i, e) in set.iter().enumerate() {
            assert_eq!(e.id, EntryId(i as u32));
        }
        assert_eq!(set.days_per_week(), 5);
    }

    #[test]
    fn test_empty_entry_list_is_valid() {
        let set = ingest(&[], &sample_catalog(), 5).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_unknown_references() {
        let entries = vec![Entry::new(slot(0, "09:00", "10:00"), "S9", "T9", "R1", "C1")];
        let errors = ingest(&entries, &sample_catalog(), 5).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&StructuralError::ReferentialIntegrity {
            entry_index: 0,
            kind: EntityKind::Teacher,
            id: "T9".into(),
        }));
        assert!(errors.contains(&StructuralError::ReferentialIntegrity {
            entry_index: 0,
            kind: EntityKind::Subject,
            id: "S9".into(),
        }));
    }

    #[test]
    fn test_slot_integrity() {
        let entries = vec![
            entry(slot(0, "10:00", "09:00"), "T1", "R1", "C1"),
            entry(slot(0, "10:00", "10:00"), "T1", "R1", "C2"),
            entry(slot(5, "09:00", "10:00"), "T1", "R1", "C1"),
        ];
        let errors = ingest(&entries, &sample_catalog(), 5).unwrap_err();

        let defects: Vec<(usize, &SlotDefect)> = errors
            .iter()
            .filter_map(|e| match e {
                StructuralError::SlotIntegrity {
                    entry_index, defect, ..
                } => Some((*entry_index, defect)),
                _ => None,
            })
            .collect();
        assert_eq!(
            defects,
            vec![
                (0, &SlotDefect::StartNotBeforeEnd),
                (1, &SlotDefect::StartNotBeforeEnd),
                (2, &SlotDefect::DayOutOfRange { days_per_week: 5 }),
            ]
        );
    }

    #[test]
    fn test_double_booked_class_regardless_of_other_fields() {
        let entries = vec![
            entry(slot(0, "09:00", "10:00"), "T1", "R1", "C1"),
            entry(slot(0, "09:00", "10:00"), "T2", "R2", "C1"),
        ];
        let errors = ingest(&entries, &sample_catalog(), 5).unwrap_err();
        assert_eq!(
            errors,
            vec![StructuralError::DoubleBookedClass {
                class_id: "C1".into(),
                slot: slot(0, "09:00", "10:00"),
                first_index: 0,
                second_index: 1,
            }]
        );
    }

    #[test]
    fn test_same_class_different_slots_is_fine() {
        let entries = vec![
            entry(slot(0, "09:00", "10:00"), "T1", "R1", "C1"),
            entry(slot(0, "10:00", "11:00"), "T1", "R1", "C1"),
            entry(slot(1, "09:00", "10:00"), "T1", "R1", "C1"),
        ];
        assert!(ingest(&entries, &sample_catalog(), 5).is_ok());
    }

    #[test]
    fn test_catalog_duplicates_and_capacity() {
        let catalog = sample_catalog()
            .with_teacher(Teacher::new("T1"))
            .with_room(Room::new("R0", 0));
        let errors = validate_catalog(&catalog).unwrap_err();

        assert!(errors.iter().any(|e| matches!(
            e,
            StructuralError::CatalogIntegrity { kind: EntityKind::Teacher, id, reason }
                if id == "T1" && reason == "duplicate id"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            StructuralError::CatalogIntegrity { kind: EntityKind::Room, id, .. } if id == "R0"
        )));
    }

    #[test]
    fn test_catalog_unknown_class_subject() {
        let catalog = sample_catalog().with_class(Class::new("C3", 10).with_subject("GHOST"));
        let errors = validate_catalog(&catalog).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("GHOST"));
    }

    #[test]
    fn test_catalog_class_repeats_subject() {
        let catalog = sample_catalog().with_class(Class::new("C3", 10).with_subject("S1").with_subject("S1"));
        let errors = validate_catalog(&catalog).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            StructuralError::CatalogIntegrity { kind: EntityKind::Class, id, .. } if id == "C3"
        ));
    }

    #[test]
    fn test_zero_day_week_reported_once() {
        let entries = vec![
            entry(slot(0, "09:00", "10:00"), "T1", "R1", "C1"),
            entry(slot(1, "09:00", "10:00"), "T1", "R1", "C1"),
        ];
        let errors = ingest(&entries, &sample_catalog(), 0).unwrap_err();
        assert_eq!(
            errors,
            vec![StructuralError::ConstraintIntegrity {
                field: "days_per_week".into(),
                reason: "week must have at least one day".into(),
            }]
        );
    }

    #[test]
    fn test_malformed_break_rejected() {
        let constraints = TimetableConstraints::new()
            .with_break(Period::parse("12:00", "12:30").unwrap())
            .with_break(Period::parse("15:00", "14:45").unwrap());
        let errors = validate_constraints(&constraints).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            StructuralError::ConstraintIntegrity { field, .. } if field == "break_slots[1]"
        ));
        assert!(validate_constraints(&TimetableConstraints::new()).is_ok());
    }

    #[test]
    fn test_catalog_malformed_unavailability() {
        let catalog = sample_catalog()
            .with_teacher(Teacher::new("T3").with_unavailable(slot(0, "11:00", "10:00")));
        assert!(validate_catalog(&catalog).is_err());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let catalog = sample_catalog().with_room(Room::new("R1", 10));
        let entries = vec![
            entry(slot(0, "09:00", "10:00"), "T1", "R404", "C1"),
            entry(slot(9, "09:00", "10:00"), "T1", "R1", "C2"),
        ];
        let errors = ingest(&entries, &catalog, 5).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
