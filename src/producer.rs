//! Entry producers.
//!
//! A producer supplies the raw entry list for a generation request. The
//! core places no contract on how the list was computed, only that it
//! conforms to the [`Entry`] shape; every list goes through the same
//! validation.

use std::path::Path;

use crate::config::TimetableConstraints;
use crate::error::Result;
use crate::models::{Catalog, Entry};

/// Source of raw timetable entries.
///
/// Any `Fn(&Catalog, &TimetableConstraints) -> Result<Vec<Entry>>`
/// closure is a producer.
pub trait EntryProducer: Send + Sync {
    /// Producer name, for logging.
    fn name(&self) -> &str {
        "producer"
    }

    /// Produces an entry list for the given catalog and constraints.
    fn produce(&self, catalog: &Catalog, constraints: &TimetableConstraints) -> Result<Vec<Entry>>;
}

impl<F> EntryProducer for F
where
    F: Fn(&Catalog, &TimetableConstraints) -> Result<Vec<Entry>> + Send + Sync,
{
    fn produce(&self, catalog: &Catalog, constraints: &TimetableConstraints) -> Result<Vec<Entry>> {
        self(catalog, constraints)
    }
}

/// A precomputed entry list, returned as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedEntries {
    entries: Vec<Entry>,
}

impl FixedEntries {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Parses a JSON array of entries.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    /// Reads a JSON array of entries from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fixed = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), entries = fixed.entries.len(), "loaded entry list");
        Ok(fixed)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl EntryProducer for FixedEntries {
    fn name(&self) -> &str {
        "fixed"
    }

    fn produce(&self, _catalog: &Catalog, _constraints: &TimetableConstraints) -> Result<Vec<Entry>> {
        Ok(self.entries.clone())
    }
}
