//! Conflict Detector.
//!
//! Reports resource double-bookings, availability violations,
//! capacity/feature mismatches, and load-limit violations in a validated
//! entry set. Findings are reported, never rejected: a timetable may
//! legitimately carry conflicts.
//!
//! # Usage
//!
//! ```
//! use u_timetable::conflicts::{rules, ConflictDetector};
//!
//! let detector = ConflictDetector::new()
//!     .with_rule(rules::RoomDoubleBooking)
//!     .with_rule(rules::TeacherDoubleBooking);
//! assert_eq!(detector.rule_names(), vec!["room-double-booking", "teacher-double-booking"]);
//! ```
//!
//! # Strategy
//! Every rule groups entries by its key (e.g. `(day, slot, room)`) and
//! compares within groups, so no rule scans entry pairs quadratically.

mod context;
mod detector;
pub mod rules;

pub use context::DetectionContext;
pub use detector::{detect_conflicts, ConflictDetector};

use crate::error::Result;
use crate::models::{ConflictFinding, ConflictKind};
use std::fmt::Debug;

/// A conflict rule.
///
/// Each rule detects one [`ConflictKind`] independently of the others; an
/// entry may contribute to findings of several rules.
pub trait ConflictRule: Send + Sync + Debug {
    /// Rule name (e.g., "room-double-booking").
    fn name(&self) -> &'static str;

    /// The kind of finding this rule emits.
    fn kind(&self) -> ConflictKind;

    /// Detects all findings of this rule's kind.
    ///
    /// Fails only on catalog inconsistency.
    fn detect(&self, context: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>>;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
