//! Timetable service: the generation workflow over a store.
//!
//! # Workflow
//!
//! 1. Read the Reference Catalog from the store (refuse empty sections).
//! 2. Ask the producer for an entry list.
//! 3. Return the cached timetable if the input fingerprint was seen.
//! 4. Otherwise assemble, save, and cache.

use std::sync::Arc;

use crate::assembler::TimetableAssembler;
use crate::config::{EngineConfig, TimetableConstraints};
use crate::error::{Result, TimetableError};
use crate::models::{Catalog, Entry, GeneratedTimetable, TimetableId, TimetableSummary};
use crate::producer::{EntryProducer, FixedEntries};
use crate::revision::EntryEdit;
use crate::stats::TimetableAnalytics;
use crate::store::{fingerprint, TimetableCache, TimetableStore};

/// Generation, lookup, revision, and analysis of timetables.
pub struct TimetableService {
    store: Arc<dyn TimetableStore>,
    assembler: TimetableAssembler,
    cache: TimetableCache,
}

impl std::fmt::Debug for TimetableService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimetableService")
            .field("assembler", &self.assembler)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl TimetableService {
    /// # Errors
    /// [`TimetableError::Config`] if `config` fails validation.
    pub fn new(store: Arc<dyn TimetableStore>, config: EngineConfig) -> Result<Self> {
        Ok(Self::with_assembler(store, TimetableAssembler::new(config)?))
    }

    /// Uses a preconfigured assembler (e.g. a custom rule set).
    pub fn with_assembler(store: Arc<dyn TimetableStore>, assembler: TimetableAssembler) -> Self {
        Self {
            store,
            assembler,
            cache: TimetableCache::new(),
        }
    }

    pub fn assembler(&self) -> &TimetableAssembler {
        &self.assembler
    }

    pub fn cache(&self) -> &TimetableCache {
        &self.cache
    }

    /// Generates a timetable from whatever `producer` supplies.
    ///
    /// # Errors
    /// - [`TimetableError::EmptyCatalog`] if any catalog section is empty
    /// - [`TimetableError::Rejected`] if the entries fail validation
    /// - producer and store failures
    pub fn generate(
        &self,
        producer: &dyn EntryProducer,
        constraints: &TimetableConstraints,
    ) -> Result<GeneratedTimetable> {
        let catalog = self.catalog()?;
        let entries = producer.produce(&catalog, constraints)?;
        tracing::debug!(
            producer = producer.name(),
            entries = entries.len(),
            "entries produced"
        );

        let key = fingerprint(&entries, &catalog, constraints, self.assembler.config())?;
        if let Some(cached) = self.cache.get(&key).filter(|t| t.parent_id().is_none()) {
            tracing::debug!(id = %cached.id(), fingerprint = %key, "cache hit");
            return Ok(cached);
        }

        let timetable = self.assembler.assemble(entries, &catalog, constraints)?;
        self.store.save_timetable(&timetable)?;
        self.cache.insert(&timetable);
        Ok(timetable)
    }

    /// Generates a timetable from a finished entry list.
    pub fn generate_from_entries(
        &self,
        entries: Vec<Entry>,
        constraints: &TimetableConstraints,
    ) -> Result<GeneratedTimetable> {
        self.generate(&FixedEntries::new(entries), constraints)
    }

    /// Loads a stored timetable.
    pub fn get(&self, id: TimetableId) -> Result<GeneratedTimetable> {
        self.store
            .get_timetable(id)?
            .ok_or(TimetableError::NotFound(id))
    }

    /// Applies edits to a stored timetable and saves the result as a new
    /// timetable. The stored original is left as it was.
    pub fn revise(
        &self,
        id: TimetableId,
        edits: &[EntryEdit],
        constraints: &TimetableConstraints,
    ) -> Result<GeneratedTimetable> {
        let parent = self.get(id)?;
        let catalog = self.catalog()?;
        // Not cached: a later fresh generation must not inherit this lineage.
        let revised = self.assembler.revise(&parent, edits, &catalog, constraints)?;
        self.store.save_timetable(&revised)?;
        Ok(revised)
    }

    /// Utilization analytics of a stored timetable over the configured week.
    pub fn analyze(&self, id: TimetableId) -> Result<TimetableAnalytics> {
        let timetable = self.get(id)?;
        let week_slots = self
            .assembler
            .config()
            .week_slots(&TimetableConstraints::default());
        Ok(TimetableAnalytics::calculate(timetable.views(), week_slots))
    }

    /// Summaries of stored timetables, most recent first.
    pub fn list(&self, limit: usize) -> Result<Vec<TimetableSummary>> {
        self.store.list_timetables(limit)
    }

    fn catalog(&self) -> Result<Catalog> {
        let catalog = self.store.catalog()?;
        if let Some(kind) = catalog.first_empty_section() {
            tracing::warn!(%kind, "generation refused: empty catalog section");
            return Err(TimetableError::EmptyCatalog(kind));
        }
        Ok(catalog)
    }
}
