//! Storage collaborators and the input-fingerprint cache.
//!
//! The core never owns persistence: it reads the Reference Catalog from a
//! [`TimetableStore`] once per computation and hands back finished
//! artifacts to save. [`MemoryStore`] is the in-process implementation.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::{EngineConfig, TimetableConstraints};
use crate::error::{Result, TimetableError};
use crate::models::{Catalog, Entry, GeneratedTimetable, TimetableId, TimetableSummary};

/// Persistent store of the Reference Catalog and published timetables.
pub trait TimetableStore: Send + Sync {
    /// The current Reference Catalog.
    fn catalog(&self) -> Result<Catalog>;

    /// Persists a published timetable. Saving an existing id replaces it.
    fn save_timetable(&self, timetable: &GeneratedTimetable) -> Result<()>;

    /// Loads a timetable by id.
    fn get_timetable(&self, id: TimetableId) -> Result<Option<GeneratedTimetable>>;

    /// Summaries of stored timetables, most recent first.
    fn list_timetables(&self, limit: usize) -> Result<Vec<TimetableSummary>>;
}

#[derive(Debug, Default)]
struct Saved {
    by_id: HashMap<TimetableId, GeneratedTimetable>,
    /// Ids in save order.
    order: Vec<TimetableId>,
}

/// In-memory [`TimetableStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
    saved: RwLock<Saved>,
}

impl MemoryStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            saved: RwLock::new(Saved::default()),
        }
    }

    /// Replaces the Reference Catalog. Stored timetables are kept.
    pub fn set_catalog(&self, catalog: Catalog) -> Result<()> {
        let mut guard = self.catalog.write().map_err(poisoned)?;
        *guard = catalog;
        Ok(())
    }

    /// Number of stored timetables.
    pub fn len(&self) -> usize {
        self.saved.read().map(|s| s.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimetableStore for MemoryStore {
    fn catalog(&self) -> Result<Catalog> {
        Ok(self.catalog.read().map_err(poisoned)?.clone())
    }

    fn save_timetable(&self, timetable: &GeneratedTimetable) -> Result<()> {
        let mut saved = self.saved.write().map_err(poisoned)?;
        let id = timetable.id();
        if saved.by_id.insert(id, timetable.clone()).is_some() {
            saved.order.retain(|existing| *existing != id);
        }
        saved.order.push(id);
        tracing::debug!(%id, stored = saved.order.len(), "timetable saved");
        Ok(())
    }

    fn get_timetable(&self, id: TimetableId) -> Result<Option<GeneratedTimetable>> {
        Ok(self.saved.read().map_err(poisoned)?.by_id.get(&id).cloned())
    }

    fn list_timetables(&self, limit: usize) -> Result<Vec<TimetableSummary>> {
        let saved = self.saved.read().map_err(poisoned)?;
        Ok(saved
            .order
            .iter()
            .rev()
            .filter_map(|id| saved.by_id.get(id))
            .take(limit)
            .map(GeneratedTimetable::summary)
            .collect())
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> TimetableError {
    TimetableError::Store(format!("lock poisoned: {err}"))
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    entries: Vec<&'a Entry>,
    catalog: &'a Catalog,
    constraints: &'a TimetableConstraints,
    config: &'a EngineConfig,
}

const FINGERPRINT_DOMAIN: &[u8] = b"u-timetable:generation:v1\0";

/// Hex-encoded blake3 digest of a generation request.
///
/// Entries are hashed in canonical order, so submission order does not
/// change the fingerprint.
pub fn fingerprint(
    entries: &[Entry],
    catalog: &Catalog,
    constraints: &TimetableConstraints,
    config: &EngineConfig,
) -> Result<String> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.canonical_cmp(b));

    let bytes = serde_json::to_vec(&FingerprintInput {
        entries: sorted,
        catalog,
        constraints,
        config,
    })?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(FINGERPRINT_DOMAIN);
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// Published timetables keyed by input fingerprint.
///
/// Recomputation is deterministic, so entries may be dropped at any time.
/// A poisoned lock behaves as an empty cache.
#[derive(Debug, Default)]
pub struct TimetableCache {
    entries: RwLock<HashMap<String, GeneratedTimetable>>,
}

impl TimetableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &str) -> Option<GeneratedTimetable> {
        self.entries.read().ok()?.get(fingerprint).cloned()
    }

    pub fn insert(&self, timetable: &GeneratedTimetable) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(timetable.fingerprint().to_string(), timetable.clone());
        }
    }

    /// Drops every cached timetable.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
