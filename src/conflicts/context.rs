//! Detection context shared by all conflict rules.

use chrono::NaiveTime;
use std::collections::BTreeMap;

use crate::config::{DetectorConfig, TimetableConstraints};
use crate::models::{CatalogIndex, Entry, Period, ScheduledEntry};
use crate::validation::ValidEntrySet;

/// Read-only inputs for one detection run.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub entries: &'a ValidEntrySet,
    pub catalog: &'a CatalogIndex<'a>,
    pub constraints: &'a TimetableConstraints,
    pub config: &'a DetectorConfig,
}

impl<'a> DetectionContext<'a> {
    /// Creates a context.
    pub fn new(
        entries: &'a ValidEntrySet,
        catalog: &'a CatalogIndex<'a>,
        constraints: &'a TimetableConstraints,
        config: &'a DetectorConfig,
    ) -> Self {
        Self {
            entries,
            catalog,
            constraints,
            config,
        }
    }

    /// Groups entries by a key. Groups keep canonical entry order and
    /// iterate in key order.
    pub fn group_by<K, F>(&self, key: F) -> BTreeMap<K, Vec<&'a ScheduledEntry>>
    where
        K: Ord,
        F: Fn(&'a Entry) -> K,
    {
        let mut groups: BTreeMap<K, Vec<&'a ScheduledEntry>> = BTreeMap::new();
        for scheduled in self.entries.entries() {
            groups.entry(key(&scheduled.entry)).or_default().push(scheduled);
        }
        groups
    }

    /// Splits a group's distinct periods into back-to-back runs.
    ///
    /// A period joins the current run when it starts no more than
    /// `max_gap_minutes` after the latest end seen in that run. Repeated
    /// periods count once.
    pub fn contiguous_runs(&self, group: &[&ScheduledEntry]) -> Vec<Vec<Period>> {
        let mut periods: Vec<Period> = group.iter().map(|e| e.entry.slot).collect();
        periods.sort();
        periods.dedup();

        let mut runs: Vec<(Vec<Period>, NaiveTime)> = Vec::new();
        for period in periods {
            match runs.last_mut() {
                Some((run, run_end))
                    if (period.start_time - *run_end).num_minutes() <= self.config.max_gap_minutes =>
                {
                    *run_end = (*run_end).max(period.end_time);
                    run.push(period);
                }
                _ => runs.push((vec![period], period.end_time)),
            }
        }
        runs.into_iter().map(|(run, _)| run).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, Class, Room, Subject, Teacher, TimeSlot};
    use crate::validation::ingest;

    fn fixture() -> (Catalog, Vec<Entry>) {
        let catalog = Catalog::new()
            .with_teacher(Teacher::new("T1"))
            .with_room(Room::new("R1", 30))
            .with_subject(Subject::new("S1", 5))
            .with_class(Class::new("C1", 20));
        let slots = [
            ("08:00", "08:50"),
            ("09:00", "09:50"),
            ("10:00", "10:50"),
            ("13:00", "13:50"),
        ];
        let entries = slots
            .iter()
            .map(|(s, e)| Entry::new(TimeSlot::parse(0, s, e).unwrap(), "S1", "T1", "R1", "C1"))
            .collect();
        (catalog, entries)
    }

    #[test]
    fn test_group_by_key_order() {
        let (catalog, entries) = fixture();
        let set = ingest(&entries, &catalog, 5).unwrap();
        let index = catalog.index();
        let constraints = TimetableConstraints::default();
        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&set, &index, &constraints, &config);

        let groups = ctx.group_by(|e| e.teacher_id.as_str());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["T1"].len(), 4);
    }

    #[test]
    fn test_contiguous_runs_with_gap_tolerance() {
        let (catalog, entries) = fixture();
        let set = ingest(&entries, &catalog, 5).unwrap();
        let index = catalog.index();
        let constraints = TimetableConstraints::default();
        let group: Vec<&ScheduledEntry> = set.iter().collect();

        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&set, &index, &constraints, &config);
        let runs = ctx.contiguous_runs(&group);
        assert_eq!(runs.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 1]);

        let strict = DetectorConfig {
            max_gap_minutes: 0,
            ..DetectorConfig::default()
        };
        let ctx = DetectionContext::new(&set, &index, &constraints, &strict);
        assert_eq!(ctx.contiguous_runs(&group).len(), 4);
    }

    #[test]
    fn test_contiguous_runs_bridge_through_long_period() {
        let catalog = Catalog::new()
            .with_teacher(Teacher::new("T1"))
            .with_room(Room::new("R1", 30))
            .with_subject(Subject::new("S1", 5))
            .with_class(Class::new("C1", 20));
        let entries: Vec<Entry> = [("08:00", "12:00"), ("09:00", "09:50"), ("11:00", "11:50")]
            .iter()
            .map(|(s, e)| Entry::new(TimeSlot::parse(0, s, e).unwrap(), "S1", "T1", "R1", "C1"))
            .collect();
        let set = ingest(&entries, &catalog, 5).unwrap();
        let index = catalog.index();
        let constraints = TimetableConstraints::default();
        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&set, &index, &constraints, &config);

        let group: Vec<&ScheduledEntry> = set.iter().collect();
        let runs = ctx.contiguous_runs(&group);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 3);
    }
}
