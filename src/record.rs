//! Records, datasets and dataset roles.
//!
//! A [`Record`] is a fixed-arity tuple of optional string fields; its schema is
//! positional and supplied by the owning [`Dataset`]'s header. Records are never
//! mutated once built: extraction and readers create them, the deduplicator and
//! joiner consume them.

use crate::error::{ReconcileError, ReconcileResult};
use crate::normalize::is_blank;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Field names of the customer dataset scraped from log dumps.
pub const CUSTOMER_FIELDS: [&str; 4] = ["customerId", "cardId", "account", "terminalId"];

/// Mandatory field names of the database export dataset.
pub const EXPORT_FIELDS: [&str; 5] = ["F0UCUS1", "F0UIDPL", "F0UEAN", "F0USCRD", "F0USCON"];

/// Optional trailing export field.
pub const EXPORT_OPTIONAL_FIELD: &str = "SCACT";

/// An ordered, fixed-arity tuple of optional fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record(pub Vec<Option<String>>);

impl Record {
    /// Build a record from fully populated values.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(|v| Some(v.into())).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field at position `idx`, `None` when absent or out of range.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).and_then(Option::as_deref)
    }

    /// `true` when every field is absent or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|f| is_blank(f.as_deref()))
    }

    /// Comparison key where an absent field equals an empty one.
    pub(crate) fn identity(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.as_deref().unwrap_or("")).collect()
    }
}

/// Which side of a join a dataset plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetRole {
    /// Database export (`F0U*` columns).
    Left,
    /// Customer data scraped from log dumps.
    Right,
}

/// Decide a dataset's role from its header.
///
/// Header names are compared after trimming. The customer layout is checked
/// first; the export layout accepts the optional `SCACT` column.
///
/// # Errors
/// Returns [`ReconcileError::UnrecognizedDataset`] if the header matches
/// neither layout.
pub fn classify_header<S: AsRef<str>>(header: &[S]) -> ReconcileResult<DatasetRole> {
    let names: HashSet<&str> = header.iter().map(|h| h.as_ref().trim()).collect();
    if CUSTOMER_FIELDS.iter().all(|f| names.contains(f)) {
        return Ok(DatasetRole::Right);
    }
    if EXPORT_FIELDS.iter().all(|f| names.contains(f)) {
        return Ok(DatasetRole::Left);
    }
    Err(ReconcileError::UnrecognizedDataset {
        header: header.iter().map(|h| h.as_ref().to_string()).collect(),
    })
}

/// An ordered sequence of records plus the header naming their positions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Human-readable name used in error messages (usually the file name).
    pub name: String,
    pub header: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new<S: Into<String>>(name: S, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            records: Vec::new(),
        }
    }

    /// Builder-style helper to attach records.
    #[must_use]
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `field` in the header (exact match after trimming).
    ///
    /// # Errors
    /// [`ReconcileError::SchemaMismatch`] when the header lacks `field`.
    pub fn column(&self, field: &str) -> ReconcileResult<usize> {
        self.header
            .iter()
            .position(|h| h.trim() == field)
            .ok_or_else(|| ReconcileError::SchemaMismatch {
                dataset: self.name.clone(),
                field: field.to_string(),
            })
    }

    /// Whether the header carries `field`.
    #[must_use]
    pub fn has_column(&self, field: &str) -> bool {
        self.column(field).is_ok()
    }

    /// Classify this dataset by its header.
    ///
    /// # Errors
    /// See [`classify_header`].
    pub fn role(&self) -> ReconcileResult<DatasetRole> {
        classify_header(&self.header)
    }
}
