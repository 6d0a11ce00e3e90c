//! Revisions of published timetables.
//!
//! A published timetable is never modified. Edits are applied to a copy
//! of its entry list, which then reruns the whole pipeline and publishes
//! a new timetable whose `parent_id` is the original.

use serde::{Deserialize, Serialize};

use crate::assembler::TimetableAssembler;
use crate::config::TimetableConstraints;
use crate::error::{Result, TimetableError};
use crate::models::{Catalog, Entry, GeneratedTimetable, TimeSlot};

/// One change to an entry list.
///
/// Existing entries are addressed by class and slot, which is unique in
/// any list that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryEdit {
    /// Moves a class session to another slot.
    Move {
        class_id: String,
        from: TimeSlot,
        to: TimeSlot,
    },
    /// Changes the teacher and/or room of a class session.
    Reassign {
        class_id: String,
        at: TimeSlot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        teacher_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    /// Adds a session.
    Add { entry: Entry },
    /// Removes a class session.
    Remove { class_id: String, at: TimeSlot },
}

impl EntryEdit {
    pub fn move_session(class_id: impl Into<String>, from: TimeSlot, to: TimeSlot) -> Self {
        Self::Move {
            class_id: class_id.into(),
            from,
            to,
        }
    }

    pub fn reassign_teacher(class_id: impl Into<String>, at: TimeSlot, teacher_id: impl Into<String>) -> Self {
        Self::Reassign {
            class_id: class_id.into(),
            at,
            teacher_id: Some(teacher_id.into()),
            room_id: None,
        }
    }

    pub fn reassign_room(class_id: impl Into<String>, at: TimeSlot, room_id: impl Into<String>) -> Self {
        Self::Reassign {
            class_id: class_id.into(),
            at,
            teacher_id: None,
            room_id: Some(room_id.into()),
        }
    }

    pub fn remove(class_id: impl Into<String>, at: TimeSlot) -> Self {
        Self::Remove {
            class_id: class_id.into(),
            at,
        }
    }
}

/// Applies edits in order.
///
/// # Errors
/// [`TimetableError::EditTarget`] naming the first edit whose target
/// session does not exist (or a reassignment that changes nothing).
pub fn apply_edits(mut entries: Vec<Entry>, edits: &[EntryEdit]) -> Result<Vec<Entry>> {
    for (index, edit) in edits.iter().enumerate() {
        match edit {
            EntryEdit::Move { class_id, from, to } => {
                let target = locate(&entries, index, class_id, from)?;
                let entry = &mut entries[target];
                entry.day = to.day;
                entry.slot = to.period();
            }
            EntryEdit::Reassign {
                class_id,
                at,
                teacher_id,
                room_id,
            } => {
                if teacher_id.is_none() && room_id.is_none() {
                    return Err(TimetableError::EditTarget {
                        index,
                        reason: "reassignment names neither a teacher nor a room".into(),
                    });
                }
                let target = locate(&entries, index, class_id, at)?;
                let entry = &mut entries[target];
                if let Some(teacher_id) = teacher_id {
                    entry.teacher_id = teacher_id.clone();
                }
                if let Some(room_id) = room_id {
                    entry.room_id = room_id.clone();
                }
            }
            EntryEdit::Add { entry } => entries.push(entry.clone()),
            EntryEdit::Remove { class_id, at } => {
                let target = locate(&entries, index, class_id, at)?;
                entries.remove(target);
            }
        }
    }
    Ok(entries)
}

fn locate(entries: &[Entry], index: usize, class_id: &str, at: &TimeSlot) -> Result<usize> {
    entries
        .iter()
        .position(|e| e.class_id == class_id && e.time_slot() == *at)
        .ok_or_else(|| TimetableError::EditTarget {
            index,
            reason: format!("class '{class_id}' has no session at {at}"),
        })
}

impl TimetableAssembler {
    /// Applies `edits` to `timetable` and publishes the result as its
    /// child. The original is left untouched.
    pub fn revise(
        &self,
        timetable: &GeneratedTimetable,
        edits: &[EntryEdit],
        catalog: &Catalog,
        constraints: &TimetableConstraints,
    ) -> Result<GeneratedTimetable> {
        let entries = apply_edits(timetable.raw_entries(), edits)?;
        tracing::debug!(
            parent = %timetable.id(),
            edits = edits.len(),
            entries = entries.len(),
            "revising timetable"
        );
        self.assemble_revision(entries, catalog, constraints, timetable.id())
    }
}
