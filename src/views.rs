//! View Materializer.
//!
//! Projects a validated entry set into three indices: by class, by
//! teacher, and by room. Each group carries the display name resolved from
//! the Reference Catalog.
//!
//! # Invariants
//! - Every entry lands in exactly one group of each view, so each view's
//!   entry count equals the entry set's length.
//! - Within a group entries are ordered by day, then start time (the
//!   canonical order of the entry set restricted to the group).
//! - Output is a pure function of its inputs.

use std::collections::btree_map::Entry as MapEntry;

use crate::error::Result;
use crate::models::{
    CatalogIndex, ClassTimetable, RoomTimetable, TeacherTimetable, TimetableViews,
};
use crate::validation::ValidEntrySet;

/// Builds the by-class, by-teacher, and by-room views in a single pass.
///
/// Fails only with [`crate::TimetableError::CatalogInconsistency`], when
/// `catalog` is not the catalog the entries were validated against.
pub fn materialize(entries: &ValidEntrySet, catalog: &CatalogIndex<'_>) -> Result<TimetableViews> {
    let mut views = TimetableViews::default();

    for scheduled in entries {
        let entry = &scheduled.entry;

        let class_view = match views.class_timetables.entry(entry.class_id.clone()) {
            MapEntry::Occupied(slot) => slot.into_mut(),
            MapEntry::Vacant(slot) => slot.insert(ClassTimetable {
                class_id: entry.class_id.clone(),
                class_name: catalog.require_class(&entry.class_id)?.name.clone(),
                entries: Vec::new(),
            }),
        };
        class_view.entries.push(scheduled.clone());

        let teacher_view = match views.teacher_timetables.entry(entry.teacher_id.clone()) {
            MapEntry::Occupied(slot) => slot.into_mut(),
            MapEntry::Vacant(slot) => slot.insert(TeacherTimetable {
                teacher_id: entry.teacher_id.clone(),
                teacher_name: catalog.require_teacher(&entry.teacher_id)?.name.clone(),
                entries: Vec::new(),
            }),
        };
        teacher_view.entries.push(scheduled.clone());

        let room_view = match views.room_allocations.entry(entry.room_id.clone()) {
            MapEntry::Occupied(slot) => slot.into_mut(),
            MapEntry::Vacant(slot) => slot.insert(RoomTimetable {
                room_id: entry.room_id.clone(),
                room_name: catalog.require_room(&entry.room_id)?.name.clone(),
                entries: Vec::new(),
            }),
        };
        room_view.entries.push(scheduled.clone());
    }

    tracing::debug!(
        classes = views.class_timetables.len(),
        teachers = views.teacher_timetables.len(),
        rooms = views.room_allocations.len(),
        "views materialized"
    );

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EntityKind, TimetableError};
    use crate::models::{Catalog, Class, Entry, Room, Subject, Teacher, TimeSlot};
    use crate::validation::ingest;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn catalog() -> Catalog {
        Catalog::new()
            .with_teacher(Teacher::new("T1").with_name("Ada"))
            .with_teacher(Teacher::new("T2").with_name("Grace"))
            .with_room(Room::new("R1", 30).with_name("Room 1"))
            .with_room(Room::new("R2", 30).with_name("Room 2"))
            .with_subject(Subject::new("S1", 3))
            .with_class(Class::new("C1", 25).with_name("1A").with_subject("S1"))
            .with_class(Class::new("C2", 25).with_name("1B").with_subject("S1"))
    }

    fn entry(day: u8, start: &str, end: &str, teacher: &str, room: &str, class: &str) -> Entry {
        Entry::new(TimeSlot::parse(day, start, end).unwrap(), "S1", teacher, room, class)
    }

    fn sample_entries() -> Vec<Entry> {
        vec![
            entry(1, "09:00", "10:00", "T1", "R1", "C1"),
            entry(0, "10:00", "11:00", "T2", "R1", "C2"),
            entry(0, "09:00", "10:00", "T1", "R2", "C1"),
            entry(0, "09:00", "10:00", "T2", "R1", "C2"),
        ]
    }

    #[test]
    fn test_groups_and_names() {
        let catalog = catalog();
        let set = ingest(&sample_entries(), &catalog, 5).unwrap();
        let views = materialize(&set, &catalog.index()).unwrap();

        assert_eq!(views.class_timetables["C1"].class_name, "1A");
        assert_eq!(views.class_timetables["C1"].entries.len(), 2);
        assert_eq!(views.teacher_timetables["T2"].teacher_name, "Grace");
        assert_eq!(views.teacher_timetables["T2"].entries.len(), 2);
        assert_eq!(views.room_allocations["R1"].room_name, "Room 1");
        assert_eq!(views.room_allocations["R1"].entries.len(), 3);
        assert_eq!(views.room_allocations["R2"].entries.len(), 1);
    }

    #[test]
    fn test_group_ordering() {
        let catalog = catalog();
        let set = ingest(&sample_entries(), &catalog, 5).unwrap();
        let views = materialize(&set, &catalog.index()).unwrap();

        for group in views.room_allocations.values() {
            let keys: Vec<_> = group
                .entries
                .iter()
                .map(|e| (e.entry.day, e.entry.slot.start_time))
                .collect();
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted);
        }
    }

    #[test]
    fn test_idempotent() {
        let catalog = catalog();
        let set = ingest(&sample_entries(), &catalog, 5).unwrap();
        let a = materialize(&set, &catalog.index()).unwrap();
        let b = materialize(&set, &catalog.index()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_conservation_randomized() {
        let catalog = catalog();
        let mut rng = SmallRng::seed_from_u64(42);
        let teachers = ["T1", "T2"];
        let rooms = ["R1", "R2"];
        let starts = ["08:00", "09:00", "10:00", "11:00", "13:00", "14:00"];
        let ends = ["08:50", "09:50", "10:50", "11:50", "13:50", "14:50"];

        for _ in 0..20 {
            let mut entries = Vec::new();
            for class in ["C1", "C2"] {
                for day in 0..5u8 {
                    for p in 0..starts.len() {
                        if rng.random_bool(0.5) {
                            entries.push(entry(
                                day,
                                starts[p],
                                ends[p],
                                teachers[rng.random_range(0..teachers.len())],
                                rooms[rng.random_range(0..rooms.len())],
                                class,
                            ));
                        }
                    }
                }
            }

            let set = ingest(&entries, &catalog, 5).unwrap();
            let views = materialize(&set, &catalog.index()).unwrap();
            assert_eq!(views.class_entry_count(), set.len());
            assert_eq!(views.teacher_entry_count(), set.len());
            assert_eq!(views.room_entry_count(), set.len());
        }
    }

    #[test]
    fn test_empty_set() {
        let catalog = catalog();
        let set = ingest(&[], &catalog, 5).unwrap();
        let views = materialize(&set, &catalog.index()).unwrap();
        assert_eq!(views, TimetableViews::default());
    }

    #[test]
    fn test_foreign_catalog_is_inconsistency() {
        let catalog = catalog();
        let set = ingest(&sample_entries(), &catalog, 5).unwrap();
        let other = Catalog::new().with_class(Class::new("C1", 1));
        let err = materialize(&set, &other.index()).unwrap_err();
        assert!(matches!(
            err,
            TimetableError::CatalogInconsistency {
                kind: EntityKind::Teacher,
                ..
            }
        ));
    }
}
