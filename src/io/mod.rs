//! File adapters around the core.
//!
//! The core only sees sequences of tokens, lines, records and batches; these
//! modules produce and persist them.

pub mod glob;
pub mod text;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;
