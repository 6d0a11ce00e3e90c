//! Built-in conflict rules.
//!
//! # Categories
//!
//! - **Double-booking**: room, teacher (group by `(day, slot, resource)`)
//! - **Per-entry**: teacher unavailable, room capacity, room features,
//!   room unavailable, break slots, teacher qualification
//! - **Per-day load**: teacher overload, teacher consecutive run, class
//!   overload, subject split
//!
//! Rules whose limit is not configured emit nothing.

use super::{ConflictRule, DetectionContext};
use crate::error::Result;
use crate::models::{ConflictFinding, ConflictKind, EntryId, ScheduledEntry};

fn ids(group: &[&ScheduledEntry]) -> Vec<EntryId> {
    group.iter().map(|e| e.id).collect()
}

fn class_list(group: &[&ScheduledEntry]) -> String {
    group
        .iter()
        .map(|e| e.entry.class_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn per_entry(
    scheduled: &ScheduledEntry,
    kind: ConflictKind,
    entity_id: &str,
    message: String,
) -> ConflictFinding {
    ConflictFinding::new(
        kind,
        scheduled.entry.day,
        scheduled.entry.slot,
        vec![scheduled.id],
        entity_id,
        message,
    )
}

// ======================== Double-booking ========================

/// Two or more entries in the same room at an identical slot.
#[derive(Debug, Clone, Copy)]
pub struct RoomDoubleBooking;

impl ConflictRule for RoomDoubleBooking {
    fn name(&self) -> &'static str {
        "room-double-booking"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::RoomDoubleBooked
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        Ok(ctx
            .group_by(|e| (e.day, e.slot, e.room_id.as_str()))
            .into_iter()
            .filter(|(_, group)| group.len() > 1)
            .map(|((day, slot, room_id), group)| {
                ConflictFinding::new(
                    self.kind(),
                    day,
                    slot,
                    ids(&group),
                    room_id,
                    format!(
                        "room '{room_id}' is booked {} times on day {day} at {slot} (classes {})",
                        group.len(),
                        class_list(&group)
                    ),
                )
            })
            .collect())
    }

    fn description(&self) -> &'static str {
        "Room used by more than one session at the same time"
    }
}

/// Two or more entries with the same teacher at an identical slot.
#[derive(Debug, Clone, Copy)]
pub struct TeacherDoubleBooking;

impl ConflictRule for TeacherDoubleBooking {
    fn name(&self) -> &'static str {
        "teacher-double-booking"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::TeacherDoubleBooked
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        Ok(ctx
            .group_by(|e| (e.day, e.slot, e.teacher_id.as_str()))
            .into_iter()
            .filter(|(_, group)| group.len() > 1)
            .map(|((day, slot, teacher_id), group)| {
                ConflictFinding::new(
                    self.kind(),
                    day,
                    slot,
                    ids(&group),
                    teacher_id,
                    format!(
                        "teacher '{teacher_id}' is booked {} times on day {day} at {slot} (classes {})",
                        group.len(),
                        class_list(&group)
                    ),
                )
            })
            .collect())
    }

    fn description(&self) -> &'static str {
        "Teacher teaching more than one session at the same time"
    }
}

// ======================== Per-entry ========================

/// Entry intersects one of the teacher's unavailable slots.
#[derive(Debug, Clone, Copy)]
pub struct TeacherAvailability;

impl ConflictRule for TeacherAvailability {
    fn name(&self) -> &'static str {
        "teacher-availability"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::TeacherUnavailable
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for scheduled in ctx.entries {
            let entry = &scheduled.entry;
            let teacher = ctx.catalog.require_teacher(&entry.teacher_id)?;
            if let Some(blocked) = teacher.unavailability_at(&entry.time_slot()) {
                findings.push(per_entry(
                    scheduled,
                    self.kind(),
                    &teacher.id,
                    format!(
                        "teacher '{}' is unavailable at {blocked}, but teaches class '{}' at {}",
                        teacher.id,
                        entry.class_id,
                        entry.time_slot()
                    ),
                ));
            }
        }
        Ok(findings)
    }
}

/// Room seats fewer students than the class has.
#[derive(Debug, Clone, Copy)]
pub struct RoomCapacity;

impl ConflictRule for RoomCapacity {
    fn name(&self) -> &'static str {
        "room-capacity"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::RoomCapacityExceeded
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for scheduled in ctx.entries {
            let entry = &scheduled.entry;
            let room = ctx.catalog.require_room(&entry.room_id)?;
            let class = ctx.catalog.require_class(&entry.class_id)?;
            if i64::from(room.capacity) < i64::from(class.students_count) {
                findings.push(per_entry(
                    scheduled,
                    self.kind(),
                    &room.id,
                    format!(
                        "room '{}' seats {} but class '{}' has {} students",
                        room.id, room.capacity, class.id, class.students_count
                    ),
                ));
            }
        }
        Ok(findings)
    }
}

/// Room lacks a feature the subject requires.
#[derive(Debug, Clone, Copy)]
pub struct RoomFeatures;

impl ConflictRule for RoomFeatures {
    fn name(&self) -> &'static str {
        "room-features"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::RoomFeatureMismatch
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for scheduled in ctx.entries {
            let entry = &scheduled.entry;
            let room = ctx.catalog.require_room(&entry.room_id)?;
            let subject = ctx.catalog.require_subject(&entry.subject_id)?;
            let missing = room.missing_features(&subject.requires_features);
            if !missing.is_empty() {
                findings.push(per_entry(
                    scheduled,
                    self.kind(),
                    &room.id,
                    format!(
                        "room '{}' lacks {} required by subject '{}'",
                        room.id,
                        missing.join(", "),
                        subject.id
                    ),
                ));
            }
        }
        Ok(findings)
    }
}

/// Room has availability windows and the entry falls outside all of them.
#[derive(Debug, Clone, Copy)]
pub struct RoomAvailability;

impl ConflictRule for RoomAvailability {
    fn name(&self) -> &'static str {
        "room-availability"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::RoomUnavailable
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for scheduled in ctx.entries {
            let slot = scheduled.time_slot();
            let room = ctx.catalog.require_room(&scheduled.entry.room_id)?;
            if !room.is_available_for(&slot) {
                findings.push(per_entry(
                    scheduled,
                    self.kind(),
                    &room.id,
                    format!("room '{}' is not open at {slot}", room.id),
                ));
            }
        }
        Ok(findings)
    }
}

/// Entry overlaps a break period.
#[derive(Debug, Clone, Copy)]
pub struct BreakSlots;

impl ConflictRule for BreakSlots {
    fn name(&self) -> &'static str {
        "break-slots"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::BreakSlotViolation
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let breaks = &ctx.constraints.break_slots;
        if breaks.is_empty() {
            return Ok(Vec::new());
        }
        Ok(ctx
            .entries
            .iter()
            .filter_map(|scheduled| {
                let entry = &scheduled.entry;
                breaks.iter().find(|b| b.overlaps(&entry.slot)).map(|b| {
                    per_entry(
                        scheduled,
                        self.kind(),
                        &entry.class_id,
                        format!(
                            "class '{}' has a session at {} during the {b} break",
                            entry.class_id,
                            entry.time_slot()
                        ),
                    )
                })
            })
            .collect())
    }
}

/// Teacher teaches a subject outside their qualification set.
///
/// Active only with `DetectorConfig::check_teacher_qualifications`.
#[derive(Debug, Clone, Copy)]
pub struct TeacherQualification;

impl ConflictRule for TeacherQualification {
    fn name(&self) -> &'static str {
        "teacher-qualification"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::TeacherUnqualified
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        if !ctx.config.check_teacher_qualifications {
            return Ok(Vec::new());
        }
        let mut findings = Vec::new();
        for scheduled in ctx.entries {
            let entry = &scheduled.entry;
            let teacher = ctx.catalog.require_teacher(&entry.teacher_id)?;
            if !teacher.is_qualified_for(&entry.subject_id) {
                findings.push(per_entry(
                    scheduled,
                    self.kind(),
                    &teacher.id,
                    format!(
                        "teacher '{}' is not qualified for subject '{}'",
                        teacher.id, entry.subject_id
                    ),
                ));
            }
        }
        Ok(findings)
    }
}

// ======================== Per-day load ========================

/// Teacher has more sessions on one day than allowed.
///
/// Limit: the teacher's own `max_hours_per_day`, else the request's.
#[derive(Debug, Clone, Copy)]
pub struct TeacherDailyLoad;

impl ConflictRule for TeacherDailyLoad {
    fn name(&self) -> &'static str {
        "teacher-daily-load"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::TeacherOverloaded
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for ((teacher_id, day), group) in ctx.group_by(|e| (e.teacher_id.as_str(), e.day)) {
            let teacher = ctx.catalog.require_teacher(teacher_id)?;
            let Some(limit) = teacher
                .max_hours_per_day
                .or(ctx.constraints.max_hours_per_day)
            else {
                continue;
            };
            if group.len() > limit as usize {
                findings.push(ConflictFinding::new(
                    self.kind(),
                    day,
                    group[0].entry.slot,
                    ids(&group),
                    teacher_id,
                    format!(
                        "teacher '{teacher_id}' has {} sessions on day {day}, limit is {limit}",
                        group.len()
                    ),
                ));
            }
        }
        Ok(findings)
    }
}

/// Teacher's longest back-to-back run on one day exceeds
/// `max_consecutive_classes`.
#[derive(Debug, Clone, Copy)]
pub struct TeacherConsecutiveRun;

impl ConflictRule for TeacherConsecutiveRun {
    fn name(&self) -> &'static str {
        "teacher-consecutive-run"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::TeacherOverConsecutive
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for ((teacher_id, day), group) in ctx.group_by(|e| (e.teacher_id.as_str(), e.day)) {
            let teacher = ctx.catalog.require_teacher(teacher_id)?;
            let Some(limit) = teacher.max_consecutive_classes else {
                continue;
            };

            let runs = ctx.contiguous_runs(&group);
            // First longest run wins ties.
            let Some(longest) = runs
                .iter()
                .fold(None::<&Vec<_>>, |best, run| match best {
                    Some(b) if b.len() >= run.len() => Some(b),
                    _ => Some(run),
                })
            else {
                continue;
            };
            if longest.len() <= limit as usize {
                continue;
            }

            let run_ids = group
                .iter()
                .filter(|e| longest.contains(&e.entry.slot))
                .map(|e| e.id)
                .collect();
            findings.push(ConflictFinding::new(
                self.kind(),
                day,
                longest[0],
                run_ids,
                teacher_id,
                format!(
                    "teacher '{teacher_id}' teaches {} back-to-back sessions on day {day} from {}, limit is {limit}",
                    longest.len(),
                    longest[0]
                ),
            ));
        }
        Ok(findings)
    }
}

/// Class has more sessions on one day than `constraints.max_hours_per_day`.
#[derive(Debug, Clone, Copy)]
pub struct ClassDailyLoad;

impl ConflictRule for ClassDailyLoad {
    fn name(&self) -> &'static str {
        "class-daily-load"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::ClassOverloaded
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let Some(limit) = ctx.constraints.max_hours_per_day else {
            return Ok(Vec::new());
        };
        Ok(ctx
            .group_by(|e| (e.class_id.as_str(), e.day))
            .into_iter()
            .filter(|(_, group)| group.len() > limit as usize)
            .map(|((class_id, day), group)| {
                ConflictFinding::new(
                    self.kind(),
                    day,
                    group[0].entry.slot,
                    ids(&group),
                    class_id,
                    format!(
                        "class '{class_id}' has {} sessions on day {day}, limit is {limit}",
                        group.len()
                    ),
                )
            })
            .collect())
    }
}

/// A class's sessions of one subject on one day form several blocks.
///
/// Active only when the request sets `allow_split_subjects` to `false`.
#[derive(Debug, Clone, Copy)]
pub struct SubjectContiguity;

impl ConflictRule for SubjectContiguity {
    fn name(&self) -> &'static str {
        "subject-contiguity"
    }

    fn kind(&self) -> ConflictKind {
        ConflictKind::SubjectSplit
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        if ctx.constraints.allow_split_subjects != Some(false) {
            return Ok(Vec::new());
        }
        let mut findings = Vec::new();
        for ((class_id, subject_id, day), group) in
            ctx.group_by(|e| (e.class_id.as_str(), e.subject_id.as_str(), e.day))
        {
            let blocks = ctx.contiguous_runs(&group).len();
            if blocks > 1 {
                findings.push(ConflictFinding::new(
                    self.kind(),
                    day,
                    group[0].entry.slot,
                    ids(&group),
                    class_id,
                    format!(
                        "class '{class_id}' has subject '{subject_id}' split into {blocks} blocks on day {day}"
                    ),
                ));
            }
        }
        Ok(findings)
    }
}
