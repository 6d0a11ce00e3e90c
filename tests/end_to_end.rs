//! Full workflow: catalog in the store, entries from a producer, published
//! timetable out, then a revision and analytics.

use std::sync::Arc;

use u_timetable::logging;
use u_timetable::{
    Catalog, Class, ConflictKind, EngineConfig, Entry, EntryEdit, FixedEntries, MemoryStore, Room,
    Subject, Teacher, TimeSlot, TimetableConstraints, TimetableError, TimetableService,
    TimetableStore,
};

fn slot(day: u8, start: &str, end: &str) -> TimeSlot {
    TimeSlot::parse(day, start, end).unwrap()
}

fn single_class_catalog() -> Catalog {
    Catalog::new()
        .with_teacher(Teacher::new("T1").with_name("Kim"))
        .with_room(Room::new("R1", 30).with_name("Room 101"))
        .with_subject(Subject::new("S1", 2).with_name("Math"))
        .with_class(Class::new("C1", 25).with_name("1A").with_subject("S1"))
}

fn service_for(catalog: Catalog) -> (Arc<MemoryStore>, TimetableService) {
    logging::init_test();
    let store = Arc::new(MemoryStore::new(catalog));
    let service = TimetableService::new(store.clone(), EngineConfig::default()).unwrap();
    (store, service)
}

#[test]
fn two_sessions_fill_the_class() {
    let (store, service) = service_for(single_class_catalog());
    let producer = FixedEntries::new(vec![
        Entry::new(slot(0, "09:00", "10:00"), "S1", "T1", "R1", "C1"),
        Entry::new(slot(0, "10:00", "11:00"), "S1", "T1", "R1", "C1"),
    ]);

    let timetable = service.generate(&producer, &TimetableConstraints::new()).unwrap();

    assert!(timetable.conflicts().is_empty());
    assert_eq!(timetable.stat("C1_fill_ratio"), Some(1.0));
    assert_eq!(timetable.stat("T1_assigned_hours"), Some(2.0));
    assert_eq!(timetable.stat("R1_utilization"), Some(2.0 / 40.0));
    assert_eq!(timetable.stat("conflict_count"), Some(0.0));

    let class_view = timetable.class_timetable("C1").unwrap();
    assert_eq!(class_view.class_name, "1A");
    assert_eq!(class_view.entries.len(), 2);
    assert_eq!(timetable.teacher_timetable("T1").unwrap().teacher_name, "Kim");
    assert_eq!(timetable.room_timetable("R1").unwrap().room_name, "Room 101");

    let stored = store.get_timetable(timetable.id()).unwrap().unwrap();
    assert_eq!(stored, timetable);
}

#[test]
fn artifact_serializes_to_wire_shape() {
    let (_, service) = service_for(single_class_catalog());
    let timetable = service
        .generate_from_entries(
            vec![Entry::new(slot(0, "09:00", "10:00"), "S1", "T1", "R1", "C1")],
            &TimetableConstraints::new(),
        )
        .unwrap();

    let json = serde_json::to_value(&timetable).unwrap();
    assert_eq!(json["id"], timetable.id().to_string());
    assert_eq!(json["class_timetables"]["C1"]["class_id"], "C1");
    assert_eq!(
        json["class_timetables"]["C1"]["entries"][0]["slot"]["start_time"],
        "09:00"
    );
    assert_eq!(json["teacher_timetables"]["T1"]["entries"][0]["id"], 0);
    assert!(json["room_allocations"]["R1"]["entries"].is_array());
    assert!(json["conflicts"].as_array().unwrap().is_empty());
    assert_eq!(json["stats"]["C1_fill_ratio"], 0.5);
}

#[test]
fn conflicted_timetable_is_published_then_revised() {
    let catalog = single_class_catalog()
        .with_room(Room::new("R2", 20))
        .with_class(Class::new("C2", 22).with_subject("S1"));
    let (store, service) = service_for(catalog);
    let constraints = TimetableConstraints::new();

    let clashing = vec![
        Entry::new(slot(1, "09:00", "10:00"), "S1", "T1", "R2", "C1"),
        Entry::new(slot(1, "09:00", "10:00"), "S1", "T1", "R2", "C2"),
    ];
    let original = service.generate_from_entries(clashing, &constraints).unwrap();

    assert_eq!(original.conflicts_of(ConflictKind::RoomDoubleBooked).len(), 1);
    assert_eq!(original.conflicts_of(ConflictKind::TeacherDoubleBooked).len(), 1);
    assert_eq!(original.conflicts_of(ConflictKind::RoomCapacityExceeded).len(), 2);
    let room_clash = &original.conflicts_of(ConflictKind::RoomDoubleBooked)[0];
    assert_eq!(room_clash.entry_ids.len(), 2);

    let at = slot(1, "09:00", "10:00");
    let revised = service
        .revise(
            original.id(),
            &[
                EntryEdit::reassign_room("C1", at, "R1"),
                EntryEdit::move_session("C2", at, slot(1, "10:00", "11:00")),
            ],
            &constraints,
        )
        .unwrap();

    // C2 (22 students) still sits in R2 (capacity 20)
    assert_eq!(revised.conflicts().len(), 1);
    assert_eq!(revised.conflicts()[0].kind, ConflictKind::RoomCapacityExceeded);
    assert_eq!(revised.parent_id(), Some(original.id()));

    let listed: Vec<_> = service.list(10).unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(listed, vec![revised.id(), original.id()]);
    assert_eq!(store.get_timetable(original.id()).unwrap().unwrap().conflicts().len(), 4);

    let analytics = service.analyze(revised.id()).unwrap();
    assert!(analytics.efficiency_score > 0.0);
    assert!(analytics.room_utilization.values().all(|u| (0.0..=1.0).contains(u)));
}

#[test]
fn structural_errors_reject_the_whole_request() {
    let (store, service) = service_for(single_class_catalog());
    let entries = vec![
        Entry::new(slot(0, "09:00", "10:00"), "S1", "T1", "R1", "C1"),
        Entry::new(slot(0, "09:00", "10:00"), "S1", "T1", "R1", "C1"),
        Entry::new(slot(0, "11:00", "10:00"), "S1", "T7", "R1", "C1"),
    ];

    let err = service
        .generate_from_entries(entries, &TimetableConstraints::new())
        .unwrap_err();

    assert!(matches!(err, TimetableError::Rejected(_)));
    assert_eq!(err.structural_errors().len(), 3);
    assert!(store.list_timetables(10).unwrap().is_empty());
}
