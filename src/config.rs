//! Engine configuration and per-request constraints.
//!
//! [`EngineConfig`] is long-lived: week shape and detector switches.
//! [`TimetableConstraints`] arrives with each generation request and may
//! override the week length.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TimetableError};
use crate::models::Period;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub week: WeekConfig,
    pub detector: DetectorConfig,
}

/// Shape of the teaching week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekConfig {
    /// Number of teaching days; valid day indices are `0..days_per_week`.
    pub days_per_week: u8,
    /// Teaching periods per day, used as the utilization denominator.
    pub periods_per_day: u32,
}

impl Default for WeekConfig {
    fn default() -> Self {
        Self {
            days_per_week: 5,
            periods_per_day: 8,
        }
    }
}

/// Conflict detector switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Largest gap (minutes) between two slots that still counts as
    /// back-to-back.
    pub max_gap_minutes: i64,
    /// Report `TeacherUnqualified` when a teacher teaches a subject
    /// outside their qualification set.
    pub check_teacher_qualifications: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_gap_minutes: 10,
            check_teacher_qualifications: false,
        }
    }
}

/// One period per minute of the day.
pub const MAX_PERIODS_PER_DAY: u32 = 24 * 60;

impl EngineConfig {
    /// Parses a config from JSON.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Rejects values no computation can use.
    pub fn validate(&self) -> Result<()> {
        if self.week.days_per_week == 0 {
            return Err(TimetableError::Config(
                "week.days_per_week must be at least 1".into(),
            ));
        }
        if self.week.periods_per_day == 0 {
            return Err(TimetableError::Config(
                "week.periods_per_day must be at least 1".into(),
            ));
        }
        if self.week.periods_per_day > MAX_PERIODS_PER_DAY {
            return Err(TimetableError::Config(format!(
                "week.periods_per_day must be at most {MAX_PERIODS_PER_DAY}"
            )));
        }
        if self.detector.max_gap_minutes < 0 {
            return Err(TimetableError::Config(
                "detector.max_gap_minutes must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Effective week length for a request.
    pub fn days_per_week(&self, constraints: &TimetableConstraints) -> u8 {
        constraints.days_per_week.unwrap_or(self.week.days_per_week)
    }

    /// Total slots in the week for a request.
    pub fn week_slots(&self, constraints: &TimetableConstraints) -> u32 {
        self.week_slots_for(self.days_per_week(constraints))
    }

    /// Total slots in a week of `days` days.
    pub fn week_slots_for(&self, days: u8) -> u32 {
        u32::from(days).saturating_mul(self.week.periods_per_day)
    }

    /// Sets the week length.
    pub fn with_days_per_week(mut self, days: u8) -> Self {
        self.week.days_per_week = days;
        self
    }

    /// Sets the number of periods per day.
    pub fn with_periods_per_day(mut self, periods: u32) -> Self {
        self.week.periods_per_day = periods;
        self
    }

    /// Sets the back-to-back gap tolerance.
    pub fn with_max_gap_minutes(mut self, minutes: i64) -> Self {
        self.detector.max_gap_minutes = minutes;
        self
    }

    /// Enables qualification checks.
    pub fn with_qualification_checks(mut self) -> Self {
        self.detector.check_teacher_qualifications = true;
        self
    }
}

/// Constraints attached to one generation request.
///
/// These are enforced upstream by the producer; the detector re-checks
/// the ones it can observe in a finished entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableConstraints {
    /// Per-day session limit for classes, and fallback for teachers
    /// without their own limit.
    pub max_hours_per_day: Option<u32>,
    /// Overrides [`WeekConfig::days_per_week`].
    pub days_per_week: Option<u8>,
    /// `Some(false)` reports subjects split into non-contiguous blocks
    /// within a day. `None` and `Some(true)` do not check.
    pub allow_split_subjects: Option<bool>,
    /// Break periods, applied on every day.
    pub break_slots: Vec<Period>,
}

impl TimetableConstraints {
    /// Creates empty constraints.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_hours_per_day(mut self, max: u32) -> Self {
        self.max_hours_per_day = Some(max);
        self
    }

    pub fn with_days_per_week(mut self, days: u8) -> Self {
        self.days_per_week = Some(days);
        self
    }

    pub fn with_allow_split_subjects(mut self, allow: bool) -> Self {
        self.allow_split_subjects = Some(allow);
        self
    }

    pub fn with_break(mut self, period: Period) -> Self {
        self.break_slots.push(period);
        self
    }
}
