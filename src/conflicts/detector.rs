//! Conflict detector: runs a rule set and orders the findings.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{rules, ConflictRule, DetectionContext};
use crate::config::{DetectorConfig, TimetableConstraints};
use crate::error::Result;
use crate::models::{CatalogIndex, ConflictFinding, ConflictKind};
use crate::validation::ValidEntrySet;

/// A composable set of conflict rules.
///
/// Every rule runs to completion; there is no early exit on findings.
/// Output is sorted by (day, slot, kind) with entry ids as the final
/// tie-break, so it is stable across runs.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    rules: Vec<Arc<dyn ConflictRule>>,
}

impl ConflictDetector {
    /// Creates a detector with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector with every built-in rule.
    pub fn standard() -> Self {
        Self::new()
            .with_rule(rules::RoomDoubleBooking)
            .with_rule(rules::TeacherDoubleBooking)
            .with_rule(rules::TeacherAvailability)
            .with_rule(rules::RoomCapacity)
            .with_rule(rules::RoomFeatures)
            .with_rule(rules::TeacherDailyLoad)
            .with_rule(rules::TeacherConsecutiveRun)
            .with_rule(rules::RoomAvailability)
            .with_rule(rules::BreakSlots)
            .with_rule(rules::ClassDailyLoad)
            .with_rule(rules::TeacherQualification)
            .with_rule(rules::SubjectContiguity)
    }

    /// Adds a rule.
    pub fn with_rule<R: ConflictRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Names of the configured rules, in run order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule and returns the ordered findings.
    pub fn detect(&self, context: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            findings.extend(rule.detect(context)?);
        }
        findings.sort_by(ConflictFinding::output_cmp);

        if !findings.is_empty() {
            let mut by_kind: BTreeMap<ConflictKind, usize> = BTreeMap::new();
            for f in &findings {
                *by_kind.entry(f.kind).or_insert(0) += 1;
            }
            tracing::debug!(total = findings.len(), ?by_kind, "conflicts detected");
        }

        Ok(findings)
    }
}

/// Runs the standard detector over a validated entry set.
pub fn detect_conflicts(
    entries: &ValidEntrySet,
    catalog: &CatalogIndex<'_>,
    constraints: &TimetableConstraints,
    config: &DetectorConfig,
) -> Result<Vec<ConflictFinding>> {
    let context = DetectionContext::new(entries, catalog, constraints, config);
    ConflictDetector::standard().detect(&context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, Class, Entry, EntryId, Room, Subject, Teacher, TimeSlot};
    use crate::validation::ingest;

    fn slot(day: u8, start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(day, start, end).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .with_teacher(Teacher::new("T1").with_unavailable(slot(1, "08:00", "12:00")))
            .with_teacher(Teacher::new("T2"))
            .with_room(Room::new("R1", 20))
            .with_room(Room::new("R2", 40))
            .with_subject(Subject::new("S1", 3))
            .with_class(Class::new("C1", 25).with_subject("S1"))
            .with_class(Class::new("C2", 10).with_subject("S1"))
    }

    fn entries() -> Vec<Entry> {
        vec![
            // Same room, same slot; C1 does not fit R1.
            Entry::new(slot(0, "09:00", "10:00"), "S1", "T1", "R1", "C1"),
            Entry::new(slot(0, "09:00", "10:00"), "S1", "T2", "R1", "C2"),
            // T1 unavailable on day 1 morning.
            Entry::new(slot(1, "09:00", "10:00"), "S1", "T1", "R2", "C1"),
            Entry::new(slot(0, "08:00", "09:00"), "S1", "T2", "R2", "C2"),
        ]
    }

    fn run(entries: &[Entry]) -> Vec<ConflictFinding> {
        let catalog = catalog();
        let set = ingest(entries, &catalog, 5).unwrap();
        detect_conflicts(
            &set,
            &catalog.index(),
            &TimetableConstraints::default(),
            &DetectorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_standard_rule_set() {
        assert_eq!(ConflictDetector::standard().rule_names().len(), 12);
        assert!(ConflictDetector::new().rule_names().is_empty());
    }

    #[test]
    fn test_findings_sorted_by_day_slot_kind() {
        let findings = run(&entries());
        let kinds: Vec<(u8, ConflictKind)> = findings.iter().map(|f| (f.day, f.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, ConflictKind::RoomDoubleBooked),
                (0, ConflictKind::RoomCapacityExceeded),
                (1, ConflictKind::TeacherUnavailable),
            ]
        );
        // Canonical ids: day 0 08:00 C2 = 0, 09:00 C1 = 1, 09:00 C2 = 2, day 1 = 3.
        assert_eq!(findings[0].entry_ids, vec![EntryId(1), EntryId(2)]);
        assert_eq!(findings[1].entry_ids, vec![EntryId(1)]);
        assert_eq!(findings[2].entry_ids, vec![EntryId(3)]);
    }

    #[test]
    fn test_entry_may_contribute_to_several_findings() {
        let findings = run(&entries());
        let involving = findings.iter().filter(|f| f.involves(EntryId(1))).count();
        assert_eq!(involving, 2);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let a = run(&entries());
        let b = run(&entries());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_input_order_does_not_change_output() {
        let mut reversed = entries();
        reversed.reverse();
        assert_eq!(run(&entries()), run(&reversed));
    }

    #[test]
    fn test_custom_rule_subset() {
        let catalog = catalog();
        let set = ingest(&entries(), &catalog, 5).unwrap();
        let index = catalog.index();
        let constraints = TimetableConstraints::default();
        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&set, &index, &constraints, &config);

        let only_capacity = ConflictDetector::new().with_rule(rules::RoomCapacity);
        let findings = only_capacity.detect(&ctx).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ConflictKind::RoomCapacityExceeded);
    }
}
