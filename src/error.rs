//! Typed errors raised by the reconciliation core.
//!
//! File adapters and the workflow layer wrap these in [`anyhow::Error`] with
//! path context; the core itself only ever returns [`ReconcileError`].

use thiserror::Error;

/// Result alias for core operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A required field or join key is missing from a dataset header.
    #[error("dataset `{dataset}` has no field `{field}`")]
    SchemaMismatch { dataset: String, field: String },

    /// A single item cannot fit a batch even on its own.
    #[error("item `{item}` needs {len} bytes but the batch budget is {budget}")]
    ValueTooLarge {
        item: String,
        len: usize,
        budget: usize,
    },

    /// A header matched neither known dataset layout.
    #[error("unrecognized dataset header: [{}]", header.join(", "))]
    UnrecognizedDataset { header: Vec<String> },

    /// An extraction rule failed to compile.
    #[error("invalid extraction rule `{name}`: {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("invalid batch limits: {0}")]
    InvalidLimits(String),

    /// A joined row does not have the block widths of its join.
    #[error("row width {actual} does not match join width {expected}")]
    WidthMismatch { expected: usize, actual: usize },
}
