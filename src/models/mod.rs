//! Timetable domain models.
//!
//! Provides the data types for the Reference Catalog, submitted entries,
//! derived views, conflict findings, and the published artifact.
//!
//! # Domain Mappings
//!
//! | u-timetable | School | College | Training Center |
//! |-------------|--------|---------|-----------------|
//! | Class | Form / Grade Group | Cohort | Course Run |
//! | Teacher | Teacher | Lecturer | Trainer |
//! | Room | Classroom | Lecture Hall | Lab |
//! | Entry | Lesson | Lecture | Session |

mod catalog;
mod entry;
mod finding;
mod time;
mod timetable;

pub use catalog::{Catalog, CatalogIndex, Class, Room, Subject, Teacher};
pub use entry::{Entry, EntryId, ScheduledEntry};
pub use finding::{ConflictFinding, ConflictKind};
pub use time::{parse_clock, Period, TimeSlot};
pub use timetable::{
    ClassTimetable, GeneratedTimetable, RoomTimetable, TeacherTimetable, TimetableId,
    TimetableSummary, TimetableViews,
};
