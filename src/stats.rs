//! Timetable utilization and load metrics.
//!
//! Computes summary indicators from the materialized views.
//!
//! # Metrics
//!
//! | Key | Definition |
//! |-----|-----------|
//! | `{teacher}_assigned_hours` | Sum of session durations, in hours |
//! | `{room}_utilization` | Distinct occupied slots / week slots, in [0, 1] |
//! | `{class}_fill_ratio` | Sessions / required weekly hours |
//! | `conflict_count` | Number of conflict findings |
//! | `entry_count` | Number of entries |
//!
//! Every catalog teacher, room, and class gets its key, even when it has
//! no sessions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::models::{CatalogIndex, ConflictFinding, ScheduledEntry, TimeSlot, TimetableViews};

/// Utilization and load metrics for one timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableStats {
    /// Assigned teaching hours per teacher.
    pub teacher_hours: BTreeMap<String, f64>,
    /// Fraction of week slots each room is occupied (0.0..=1.0).
    pub room_utilization: BTreeMap<String, f64>,
    /// Scheduled sessions over required weekly hours, per class.
    pub class_fill_ratio: BTreeMap<String, f64>,
    /// Number of conflict findings.
    pub conflict_count: usize,
    /// Number of entries.
    pub entry_count: usize,
}

impl TimetableStats {
    /// Computes stats from views, findings, and the catalog.
    ///
    /// # Arguments
    /// * `views` - Materialized views of the timetable.
    /// * `conflicts` - Full conflict list.
    /// * `catalog` - Catalog the entries were validated against.
    /// * `week_slots` - Teaching slots per week (utilization denominator).
    pub fn aggregate(
        views: &TimetableViews,
        conflicts: &[ConflictFinding],
        catalog: &CatalogIndex<'_>,
        week_slots: u32,
    ) -> Result<Self> {
        let source = catalog.catalog();

        let teacher_hours = source
            .teachers
            .iter()
            .map(|t| {
                let minutes: i64 = views
                    .teacher_timetables
                    .get(&t.id)
                    .map(|v| v.entries.iter().map(|e| e.time_slot().duration_minutes()).sum())
                    .unwrap_or(0);
                (t.id.clone(), minutes.max(0) as f64 / 60.0)
            })
            .collect();

        let room_utilization = source
            .rooms
            .iter()
            .map(|r| {
                let used = views
                    .room_allocations
                    .get(&r.id)
                    .map(|v| distinct_slots(&v.entries))
                    .unwrap_or(0);
                (r.id.clone(), fraction(used, week_slots))
            })
            .collect();

        let mut class_fill_ratio = BTreeMap::new();
        for class in &source.classes {
            let scheduled = views
                .class_timetables
                .get(&class.id)
                .map(|v| v.entries.len())
                .unwrap_or(0);
            let required = catalog.required_weekly_hours(class)?;
            let ratio = if required == 0 {
                0.0
            } else {
                scheduled as f64 / f64::from(required)
            };
            class_fill_ratio.insert(class.id.clone(), ratio);
        }

        Ok(Self {
            teacher_hours,
            room_utilization,
            class_fill_ratio,
            conflict_count: conflicts.len(),
            entry_count: views.class_entry_count(),
        })
    }

    /// Flattens into the named-metric mapping carried by the artifact.
    pub fn to_metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        for (id, hours) in &self.teacher_hours {
            metrics.insert(format!("{id}_assigned_hours"), *hours);
        }
        for (id, util) in &self.room_utilization {
            metrics.insert(format!("{id}_utilization"), *util);
        }
        for (id, ratio) in &self.class_fill_ratio {
            metrics.insert(format!("{id}_fill_ratio"), *ratio);
        }
        metrics.insert("conflict_count".into(), self.conflict_count as f64);
        metrics.insert("entry_count".into(), self.entry_count as f64);
        metrics
    }

    /// Mean room utilization (0.0 with no rooms).
    pub fn avg_room_utilization(&self) -> f64 {
        mean(self.room_utilization.values())
    }
}

/// Analytics over a published timetable's views.
///
/// Only teachers, rooms, and classes with at least one session appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableAnalytics {
    /// Fraction of week slots each teacher teaches.
    pub teacher_utilization: BTreeMap<String, f64>,
    /// Fraction of week slots each room is occupied.
    pub room_utilization: BTreeMap<String, f64>,
    /// Week slots each class has free.
    pub free_periods_distribution: BTreeMap<String, u32>,
    /// Mean of all teacher and room utilizations; 0.0 if either is empty.
    pub efficiency_score: f64,
}

impl TimetableAnalytics {
    /// Computes analytics from views.
    pub fn calculate(views: &TimetableViews, week_slots: u32) -> Self {
        let teacher_utilization: BTreeMap<String, f64> = views
            .teacher_timetables
            .iter()
            .map(|(id, v)| (id.clone(), fraction(distinct_slots(&v.entries), week_slots)))
            .collect();

        let room_utilization: BTreeMap<String, f64> = views
            .room_allocations
            .iter()
            .map(|(id, v)| (id.clone(), fraction(distinct_slots(&v.entries), week_slots)))
            .collect();

        let free_periods_distribution = views
            .class_timetables
            .iter()
            .map(|(id, v)| {
                let used = u32::try_from(v.entries.len()).unwrap_or(u32::MAX);
                (id.clone(), week_slots.saturating_sub(used))
            })
            .collect();

        let efficiency_score = if teacher_utilization.is_empty() || room_utilization.is_empty() {
            0.0
        } else {
            mean(teacher_utilization.values().chain(room_utilization.values()))
        };

        Self {
            teacher_utilization,
            room_utilization,
            free_periods_distribution,
            efficiency_score,
        }
    }
}

fn distinct_slots(entries: &[ScheduledEntry]) -> usize {
    entries
        .iter()
        .map(ScheduledEntry::time_slot)
        .collect::<BTreeSet<TimeSlot>>()
        .len()
}

fn fraction(used: usize, week_slots: u32) -> f64 {
    if week_slots == 0 {
        return 0.0;
    }
    (used as f64 / f64::from(week_slots)).clamp(0.0, 1.0)
}

fn mean<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
