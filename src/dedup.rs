//! Streaming, order-preserving deduplication.
//!
//! [`Deduplicator`] is an explicit state object scoped to one run: create it,
//! feed it tokens, then [`finish`](Deduplicator::finish) it to obtain the unique
//! keys in first-seen order together with the number of discarded duplicates.
//! Nothing survives between runs.
//!
//! Tokens are compared by their [`normalize`]d form; tokens that normalize to
//! the empty string are dropped without being counted as duplicates.

use crate::normalize::normalize;
use crate::progress::{NoProgress, ProgressObserver};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What happened to a single pushed token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// First occurrence; appended to the output.
    New,
    /// Already seen; counted and discarded.
    Duplicate,
    /// Normalized to nothing; ignored.
    Empty,
}

/// Result of a deduplication run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupOutcome {
    /// Unique normalized keys in order of first occurrence.
    pub keys: Vec<String>,
    /// Number of non-empty tokens discarded as repeats.
    pub duplicates: usize,
}

impl DedupOutcome {
    /// Count of tokens with a non-empty normalized key.
    #[must_use]
    pub fn admitted(&self) -> usize {
        self.keys.len() + self.duplicates
    }
}

/// Single-pass unique-set builder.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    keys: Vec<String>,
    duplicates: usize,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and admit one token.
    pub fn push(&mut self, token: &str) -> Admission {
        let key = normalize(token);
        if key.is_empty() {
            return Admission::Empty;
        }
        if self.seen.contains(&key) {
            self.duplicates += 1;
            return Admission::Duplicate;
        }
        self.seen.insert(key.clone());
        self.keys.push(key);
        Admission::New
    }

    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    #[must_use]
    pub fn finish(self) -> DedupOutcome {
        DedupOutcome {
            keys: self.keys,
            duplicates: self.duplicates,
        }
    }
}

/// Deduplicate a finite token stream.
///
/// # Example
/// ```
/// use ironjoin::dedup_tokens;
///
/// let out = dedup_tokens(["a b", "ab", " ", "c", "ab"]);
/// assert_eq!(out.keys, vec!["ab", "c"]);
/// assert_eq!(out.duplicates, 2);
/// ```
pub fn dedup_tokens<I, S>(tokens: I) -> DedupOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedup_tokens_with_progress(tokens, None, &mut NoProgress)
}

/// Same as [`dedup_tokens`], reporting every consumed token to `observer`.
///
/// `total` is the expected input length if the caller knows it.
pub fn dedup_tokens_with_progress<I, S>(
    tokens: I,
    total: Option<usize>,
    observer: &mut dyn ProgressObserver,
) -> DedupOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut dedup = Deduplicator::new();
    let mut consumed = 0usize;
    for token in tokens {
        dedup.push(token.as_ref());
        consumed += 1;
        observer.on_progress(consumed, total);
    }
    observer.on_finish(consumed);
    tracing::debug!(
        consumed,
        unique = dedup.unique_count(),
        duplicates = dedup.duplicates(),
        "deduplicated tokens"
    );
    dedup.finish()
}

/// Streaming remover of records identical in every field.
///
/// An absent field compares equal to an empty one. Only the first occurrence
/// of each record is kept; repeats are counted and dropped on arrival.
#[derive(Debug, Default)]
pub struct RowDeduplicator {
    seen: HashSet<Vec<String>>,
    rows: Vec<Record>,
    removed: usize,
}

impl RowDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `record` unless an identical one was pushed before.
    pub fn push(&mut self, record: Record) -> Admission {
        let key: Vec<String> = record.identity().into_iter().map(str::to_string).collect();
        if self.seen.insert(key) {
            self.rows.push(record);
            Admission::New
        } else {
            self.removed += 1;
            Admission::Duplicate
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed
    }

    /// Kept records in first-seen order and the number removed.
    #[must_use]
    pub fn finish(self) -> (Vec<Record>, usize) {
        (self.rows, self.removed)
    }
}

/// Remove records identical in every field, keeping first occurrences.
///
/// An absent field compares equal to an empty one. Returns the unique records
/// and the number removed.
#[must_use]
pub fn dedup_rows<I>(records: I) -> (Vec<Record>, usize)
where
    I: IntoIterator<Item = Record>,
{
    let mut rows = RowDeduplicator::new();
    for record in records {
        rows.push(record);
    }
    rows.finish()
}
