//! # Ironjoin
//!
//! Reconciliation of identifiers pulled from log dumps against database
//! exports.
//!
//! The crate is a small core of pure, sequence-in/sequence-out components plus
//! thin file adapters:
//!
//! - [`normalize`] strips every Unicode whitespace character from a token.
//! - [`Deduplicator`] keeps the first occurrence of each normalized token and
//!   counts the rest.
//! - [`extract::RuleSet`] pulls field tuples out of unstructured lines, with an
//!   explicit all-or-nothing or best-effort [`extract::MatchMode`].
//! - [`full_outer_join`] joins two datasets on a normalized key.
//! - [`sort_rows`] orders joined rows by [`CompletenessGroup`].
//! - [`BatchPartitioner`] packs items into prefix/suffix-wrapped payloads under
//!   a byte budget or an item count.
//!
//! The [`workflow`] module strings these together over files and the
//! `ironjoin` binary exposes each step as a subcommand.
//!
//! ## Quick Start
//!
//! ```
//! use ironjoin::{BatchPartitioner, Limits, Template, dedup_tokens};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let ids = dedup_tokens(["T 1", "T1", "T2", " "]);
//! assert_eq!(ids.keys, vec!["T1", "T2"]);
//! assert_eq!(ids.duplicates, 1);
//!
//! let parts = BatchPartitioner::new(Template::new("(", ")", ", "), Limits::count(1));
//! let batches = parts.partition_by_count(ids.keys)?;
//! assert_eq!(batches[1].rendered, "(T2)");
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `io-csv` (default) - CSV adapters, the [`workflow`] steps and the binary.
//!
//! ## Logging
//!
//! Library code emits `tracing` events and never installs a subscriber; the
//! binary does, filtered by `RUST_LOG`.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod batch;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod io;
pub mod join;
pub mod normalize;
pub mod progress;
pub mod record;
pub mod report;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod workflow;

pub use batch::{Batch, BatchPartitioner, Limits, PartitionMode, Template};
pub use classify::{CompletenessGroup, sort_by_completeness, sort_rows};
pub use config::ReconcileConfig;
pub use dedup::{Admission, DedupOutcome, Deduplicator, RowDeduplicator, dedup_rows, dedup_tokens};
pub use error::{ReconcileError, ReconcileResult};
pub use join::{JoinKey, JoinOutput, JoinedRow, Projection, full_outer_join};
pub use normalize::{is_blank, normalize};
pub use record::{Dataset, DatasetRole, Record, classify_header};
pub use report::RunReport;
