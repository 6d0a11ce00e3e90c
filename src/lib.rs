//! School timetable assembly for the U-Engine ecosystem.
//!
//! Turns a finished entry list (from an optimizer or any other producer)
//! into a published timetable: validated, indexed by class, teacher, and
//! room, checked for conflicts, and summarized with utilization stats.
//! Searching for a good entry list is the producer's job, not this crate's.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Teacher`, `Room`, `Subject`, `Class`,
//!   `Catalog`, `Entry`, `TimeSlot`, `ConflictFinding`, `GeneratedTimetable`
//! - **`validation`**: Entry Store (catalog integrity, references, slots,
//!   class double-booking)
//! - **`views`**: By-class, by-teacher, and by-room views
//! - **`conflicts`**: Rule-based conflict detection
//! - **`stats`**: Utilization and load metrics
//! - **`assembler`**: The Draft → Validated → Materialized → Published pipeline
//! - **`revision`**: Edits to published timetables
//! - **`store`** / **`producer`** / **`service`**: Collaborators and the
//!   generation workflow
//!
//! # Example
//!
//! ```
//! use u_timetable::{Catalog, Class, Entry, Room, Subject, Teacher, TimeSlot};
//! use u_timetable::{TimetableAssembler, TimetableConstraints};
//!
//! let catalog = Catalog::new()
//!     .with_teacher(Teacher::new("T1"))
//!     .with_room(Room::new("R1", 30))
//!     .with_subject(Subject::new("S1", 2))
//!     .with_class(Class::new("C1", 25).with_subject("S1"));
//!
//! let entries = vec![
//!     Entry::new(TimeSlot::parse(0, "09:00", "10:00").unwrap(), "S1", "T1", "R1", "C1"),
//!     Entry::new(TimeSlot::parse(0, "10:00", "11:00").unwrap(), "S1", "T1", "R1", "C1"),
//! ];
//!
//! let timetable = TimetableAssembler::default()
//!     .assemble(entries, &catalog, &TimetableConstraints::new())
//!     .unwrap();
//! assert!(timetable.is_conflict_free());
//! assert_eq!(timetable.stat("C1_fill_ratio"), Some(1.0));
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent Research Directions in Automated Timetabling"

pub mod assembler;
pub mod config;
pub mod conflicts;
pub mod error;
pub mod logging;
pub mod models;
pub mod producer;
pub mod revision;
pub mod service;
pub mod stats;
pub mod store;
pub mod validation;
pub mod views;

pub use assembler::{AssemblyStage, TimetableAssembler};
pub use config::{DetectorConfig, EngineConfig, TimetableConstraints, WeekConfig};
pub use conflicts::{detect_conflicts, ConflictDetector, ConflictRule};
pub use error::{EntityKind, Result, StructuralError, TimetableError};
pub use models::{
    Catalog, Class, ConflictFinding, ConflictKind, Entry, EntryId, GeneratedTimetable, Period, Room,
    ScheduledEntry, Subject, Teacher, TimeSlot, TimetableId,
};
pub use producer::{EntryProducer, FixedEntries};
pub use revision::EntryEdit;
pub use service::TimetableService;
pub use stats::{TimetableAnalytics, TimetableStats};
pub use store::{MemoryStore, TimetableCache, TimetableStore};
pub use validation::{ingest, validate_catalog, validate_constraints, ValidEntrySet};
pub use views::materialize;
