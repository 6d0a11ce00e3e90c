//! Timetable Assembler: the generation pipeline.
//!
//! # Stages
//!
//! ```text
//! Draft ──validate──▶ Validated ──materialize──▶ Materialized ──publish──▶ Published
//!   │
//!   └── structural errors ──▶ Rejected
//! ```
//!
//! Each stage is its own type and consumes the previous one, so no stage
//! can be re-entered or mutated after the fact. A correction restarts from
//! [`DraftTimetable`] with a new entry list and yields a new identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{EngineConfig, TimetableConstraints};
use crate::conflicts::{ConflictDetector, DetectionContext};
use crate::error::{Result, TimetableError};
use crate::models::{
    Catalog, ConflictFinding, Entry, GeneratedTimetable, TimetableId, TimetableViews,
};
use crate::stats::TimetableStats;
use crate::store::fingerprint;
use crate::validation::{ingest, validate_constraints, ValidEntrySet};
use crate::views::materialize;

/// Pipeline stage of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStage {
    Draft,
    Validated,
    Materialized,
    Published,
    Rejected,
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Validated => "validated",
            Self::Materialized => "materialized",
            Self::Published => "published",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Submitted entries, not yet validated.
#[derive(Debug, Clone)]
pub struct DraftTimetable<'a> {
    entries: Vec<Entry>,
    catalog: &'a Catalog,
    constraints: &'a TimetableConstraints,
    config: &'a EngineConfig,
    parent_id: Option<TimetableId>,
}

impl<'a> DraftTimetable<'a> {
    pub fn new(
        entries: Vec<Entry>,
        catalog: &'a Catalog,
        constraints: &'a TimetableConstraints,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            entries,
            catalog,
            constraints,
            config,
            parent_id: None,
        }
    }

    /// Marks the draft as a revision of `parent`.
    pub fn with_parent(mut self, parent: TimetableId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn stage(&self) -> AssemblyStage {
        AssemblyStage::Draft
    }

    /// Input fingerprint: identical inputs give identical fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        fingerprint(&self.entries, self.catalog, self.constraints, self.config)
    }

    /// Runs the Entry Store and checks the request constraints.
    ///
    /// # Errors
    /// [`TimetableError::Rejected`] with every structural defect found.
    pub fn validate(self) -> Result<ValidatedTimetable<'a>> {
        let fingerprint = self.fingerprint()?;
        let days_per_week = self.config.days_per_week(self.constraints);

        let constraint_errors = validate_constraints(self.constraints).err().unwrap_or_default();
        let ingested = match ingest(&self.entries, self.catalog, days_per_week) {
            Ok(entries) if constraint_errors.is_empty() => Ok(entries),
            Ok(_) => Err(constraint_errors),
            Err(mut errors) => {
                errors.extend(constraint_errors);
                Err(errors)
            }
        };

        match ingested {
            Ok(entries) => Ok(ValidatedTimetable {
                entries,
                catalog: self.catalog,
                constraints: self.constraints,
                config: self.config,
                parent_id: self.parent_id,
                fingerprint,
            }),
            Err(errors) => {
                tracing::info!(
                    stage = %AssemblyStage::Rejected,
                    errors = errors.len(),
                    fingerprint = %fingerprint,
                    "timetable rejected"
                );
                Err(TimetableError::Rejected(errors))
            }
        }
    }
}

/// Entries that passed structural validation.
#[derive(Debug, Clone)]
pub struct ValidatedTimetable<'a> {
    entries: ValidEntrySet,
    catalog: &'a Catalog,
    constraints: &'a TimetableConstraints,
    config: &'a EngineConfig,
    parent_id: Option<TimetableId>,
    fingerprint: String,
}

impl<'a> ValidatedTimetable<'a> {
    pub fn stage(&self) -> AssemblyStage {
        AssemblyStage::Validated
    }

    pub fn entries(&self) -> &ValidEntrySet {
        &self.entries
    }

    /// Builds the views, runs every conflict rule, and aggregates stats.
    ///
    /// All three are computed in full regardless of how many findings
    /// there are.
    pub fn materialize(self, detector: &ConflictDetector) -> Result<MaterializedTimetable> {
        let index = self.catalog.index();
        let views = materialize(&self.entries, &index)?;

        let context = DetectionContext::new(
            &self.entries,
            &index,
            self.constraints,
            &self.config.detector,
        );
        let conflicts = detector.detect(&context)?;

        let week_slots = self.config.week_slots_for(self.entries.days_per_week());
        let stats = TimetableStats::aggregate(&views, &conflicts, &index, week_slots)?;

        tracing::debug!(
            stage = %AssemblyStage::Materialized,
            entries = self.entries.len(),
            classes = views.class_timetables.len(),
            teachers = views.teacher_timetables.len(),
            rooms = views.room_allocations.len(),
            conflicts = conflicts.len(),
            "timetable materialized"
        );

        Ok(MaterializedTimetable {
            entries: self.entries,
            views,
            conflicts,
            stats,
            parent_id: self.parent_id,
            fingerprint: self.fingerprint,
        })
    }
}

/// Views, findings, and stats computed; identity not yet assigned.
#[derive(Debug, Clone)]
pub struct MaterializedTimetable {
    entries: ValidEntrySet,
    views: TimetableViews,
    conflicts: Vec<ConflictFinding>,
    stats: TimetableStats,
    parent_id: Option<TimetableId>,
    fingerprint: String,
}

impl MaterializedTimetable {
    pub fn stage(&self) -> AssemblyStage {
        AssemblyStage::Materialized
    }

    pub fn views(&self) -> &TimetableViews {
        &self.views
    }

    pub fn conflicts(&self) -> &[ConflictFinding] {
        &self.conflicts
    }

    pub fn stats(&self) -> &TimetableStats {
        &self.stats
    }

    /// Assigns a fresh identity and freezes the artifact.
    pub fn publish(self) -> GeneratedTimetable {
        let metrics: BTreeMap<String, f64> = self.stats.to_metrics();
        let timetable = GeneratedTimetable::new(
            TimetableId::generate(),
            self.parent_id,
            self.fingerprint,
            self.entries.entries().to_vec(),
            self.views,
            self.conflicts,
            metrics,
        );
        tracing::info!(
            stage = %AssemblyStage::Published,
            id = %timetable.id(),
            parent = ?timetable.parent_id(),
            entries = timetable.entries().len(),
            conflicts = timetable.conflicts().len(),
            "timetable published"
        );
        timetable
    }
}

/// Runs the whole pipeline with one configuration and rule set.
#[derive(Debug, Clone)]
pub struct TimetableAssembler {
    config: EngineConfig,
    detector: ConflictDetector,
}

impl Default for TimetableAssembler {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            detector: ConflictDetector::standard(),
        }
    }
}

impl TimetableAssembler {
    /// Creates an assembler with the standard conflict rules.
    ///
    /// # Errors
    /// [`TimetableError::Config`] if `config` fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: ConflictDetector::standard(),
        })
    }

    /// Replaces the conflict rule set.
    pub fn with_detector(mut self, detector: ConflictDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Starts a draft bound to this assembler's configuration.
    pub fn draft<'a>(
        &'a self,
        entries: Vec<Entry>,
        catalog: &'a Catalog,
        constraints: &'a TimetableConstraints,
    ) -> DraftTimetable<'a> {
        DraftTimetable::new(entries, catalog, constraints, &self.config)
    }

    /// Draft → Validated → Materialized → Published.
    pub fn assemble(
        &self,
        entries: Vec<Entry>,
        catalog: &Catalog,
        constraints: &TimetableConstraints,
    ) -> Result<GeneratedTimetable> {
        self.run(self.draft(entries, catalog, constraints))
    }

    /// Same as [`assemble`](Self::assemble), recording `parent` as the
    /// timetable this one revises.
    pub fn assemble_revision(
        &self,
        entries: Vec<Entry>,
        catalog: &Catalog,
        constraints: &TimetableConstraints,
        parent: TimetableId,
    ) -> Result<GeneratedTimetable> {
        self.run(self.draft(entries, catalog, constraints).with_parent(parent))
    }

    fn run(&self, draft: DraftTimetable<'_>) -> Result<GeneratedTimetable> {
        Ok(draft.validate()?.materialize(&self.detector)?.publish())
    }
}
