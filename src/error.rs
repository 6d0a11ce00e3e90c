//! Error types.
//!
//! Two layers:
//! - [`StructuralError`]: one input defect found while ingesting a
//!   generation request. Ingest collects every defect before failing.
//! - [`TimetableError`]: crate-level failures. A rejected generation
//!   carries its structural errors in [`TimetableError::Rejected`].
//!
//! Conflict findings are not errors; see [`crate::conflicts`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{TimeSlot, TimetableId};

/// The four kinds of Reference Catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Teacher,
    Room,
    Subject,
    Class,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Teacher => "teacher",
            Self::Room => "room",
            Self::Subject => "subject",
            Self::Class => "class",
        };
        f.write_str(name)
    }
}

/// Why a slot failed shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotDefect {
    /// `start_time >= end_time`.
    StartNotBeforeEnd,
    /// `day` is not below the configured week length.
    DayOutOfRange { days_per_week: u8 },
}

impl fmt::Display for SlotDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartNotBeforeEnd => f.write_str("start time is not before end time"),
            Self::DayOutOfRange { days_per_week } => {
                write!(f, "day is outside the {days_per_week}-day week")
            }
        }
    }
}

/// A structural defect that invalidates a whole generation request.
///
/// `entry_index` always refers to the position in the list as submitted,
/// so the caller can locate the offending entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum StructuralError {
    /// An entry references an id missing from the Reference Catalog.
    #[error("entry #{entry_index}: unknown {kind} id '{id}'")]
    ReferentialIntegrity {
        entry_index: usize,
        kind: EntityKind,
        id: String,
    },

    /// An entry's slot is malformed or outside the configured week.
    #[error("entry #{entry_index}: invalid slot {slot}: {defect}")]
    SlotIntegrity {
        entry_index: usize,
        slot: TimeSlot,
        defect: SlotDefect,
    },

    /// Two entries put the same class in the same slot.
    #[error("class '{class_id}' is booked twice at {slot} (entries #{first_index} and #{second_index})")]
    DoubleBookedClass {
        class_id: String,
        slot: TimeSlot,
        first_index: usize,
        second_index: usize,
    },

    /// A request constraint can never be satisfied or never applies.
    #[error("constraint {field}: {reason}")]
    ConstraintIntegrity { field: String, reason: String },

    /// The Reference Catalog itself is inconsistent.
    #[error("catalog {kind} '{id}': {reason}")]
    CatalogIntegrity {
        kind: EntityKind,
        id: String,
        reason: String,
    },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// Ingest rejected the request; every detected defect is listed.
    #[error("generation rejected with {} structural error(s)", .0.len())]
    Rejected(Vec<StructuralError>),

    /// A catalog lookup failed after validation had passed.
    ///
    /// Signals a caller bug: the catalog given to a later stage differs
    /// from the one used at ingest.
    #[error("catalog inconsistency: {kind} '{id}' missing after validation")]
    CatalogInconsistency { kind: EntityKind, id: String },

    /// A generation request was made with an empty catalog section.
    #[error("catalog has no {0} entries")]
    EmptyCatalog(EntityKind),

    /// No stored timetable has this id.
    #[error("timetable not found: {0}")]
    NotFound(TimetableId),

    /// A revision edit could not be applied.
    #[error("edit #{index}: {reason}")]
    EditTarget { index: usize, reason: String },

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The entry producer failed.
    #[error("producer failed: {0}")]
    Producer(String),

    /// The timetable store failed.
    #[error("store failed: {0}")]
    Store(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TimetableError {
    /// Structural errors of a rejected generation (empty otherwise).
    pub fn structural_errors(&self) -> &[StructuralError] {
        match self {
            Self::Rejected(errors) => errors,
            _ => &[],
        }
    }
}

/// Crate result alias.
pub type Result<T, E = TimetableError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_messages() {
        let err = StructuralError::ReferentialIntegrity {
            entry_index: 3,
            kind: EntityKind::Room,
            id: "R9".into(),
        };
        assert_eq!(err.to_string(), "entry #3: unknown room id 'R9'");

        let slot = TimeSlot::parse(6, "09:00", "10:00").unwrap();
        let err = StructuralError::SlotIntegrity {
            entry_index: 0,
            slot,
            defect: SlotDefect::DayOutOfRange { days_per_week: 5 },
        };
        assert!(err.to_string().contains("outside the 5-day week"));
    }

    #[test]
    fn test_rejected_exposes_errors() {
        let err = TimetableError::Rejected(vec![StructuralError::CatalogIntegrity {
            kind: EntityKind::Teacher,
            id: "T1".into(),
            reason: "duplicate id".into(),
        }]);
        assert_eq!(err.structural_errors().len(), 1);
        assert_eq!(
            err.to_string(),
            "generation rejected with 1 structural error(s)"
        );
        assert!(TimetableError::Config("x".into())
            .structural_errors()
            .is_empty());
    }

    #[test]
    fn test_structural_error_serde_tag() {
        let err = StructuralError::DoubleBookedClass {
            class_id: "C1".into(),
            slot: TimeSlot::parse(0, "09:00", "10:00").unwrap(),
            first_index: 0,
            second_index: 1,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "double_booked_class");
        assert_eq!(json["class_id"], "C1");
    }
}
