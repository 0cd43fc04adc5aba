//! Two-source full outer join over keyed projections.
//!
//! Each side is reduced to a `key -> projected values` index (keys are
//! [`normalize`]d; a key seen twice on one side keeps the **later** record's
//! projection). The join then emits exactly one [`JoinedRow`] per key in the
//! union of both indexes, filling the absent side with empty fields.
//!
//! ## Output order
//! Rows come out as left keys in first-seen order followed by right-only keys
//! in first-seen order. Callers should not rely on this; order for review is
//! imposed afterwards by [`sort_by_completeness`](crate::sort_by_completeness).
//!
//! ## Errors
//! A key or projected field missing from a header fails the whole join with
//! [`SchemaMismatch`](crate::error::ReconcileError::SchemaMismatch) before
//! any record of either side is read.

use crate::error::ReconcileResult;
use crate::normalize::normalize;
use crate::record::{Dataset, EXPORT_OPTIONAL_FIELD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which field keys a dataset and which fields are carried into the output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub key_field: String,
    pub columns: Vec<String>,
}

impl Projection {
    pub fn new<K, I, S>(key_field: K, columns: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_field: key_field.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// One joined output row: left block then right block.
///
/// A block is all `None` when its side had no record for the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinedRow {
    pub left: Vec<Option<String>>,
    pub right: Vec<Option<String>>,
}

impl JoinedRow {
    pub fn new(left: Vec<Option<String>>, right: Vec<Option<String>>) -> Self {
        Self { left, right }
    }

    /// Both blocks concatenated, for tabular writers.
    #[must_use]
    pub fn cells(&self) -> Vec<Option<&str>> {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(Option::as_deref)
            .collect()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.left.len() + self.right.len()
    }
}

/// Rows of a finished join plus the constant block widths.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutput {
    pub left_width: usize,
    pub right_width: usize,
    pub rows: Vec<JoinedRow>,
}

struct KeyIndex {
    order: Vec<String>,
    values: HashMap<String, Vec<Option<String>>>,
}

/// Header positions of a projection's key and columns.
struct Columns {
    key: usize,
    values: Vec<usize>,
}

fn resolve(dataset: &Dataset, projection: &Projection) -> ReconcileResult<Columns> {
    let key = dataset.column(&projection.key_field)?;
    let values = projection
        .columns
        .iter()
        .map(|c| dataset.column(c))
        .collect::<ReconcileResult<Vec<_>>>()?;
    Ok(Columns { key, values })
}

fn index_side(dataset: &Dataset, cols: &Columns) -> KeyIndex {
    let mut index = KeyIndex {
        order: Vec::new(),
        values: HashMap::new(),
    };
    for record in &dataset.records {
        let key = normalize(record.get(cols.key).unwrap_or(""));
        if key.is_empty() {
            continue;
        }
        let projected: Vec<Option<String>> = cols
            .values
            .iter()
            .map(|&c| record.get(c).map(str::to_string))
            .collect();
        if index.values.insert(key.clone(), projected).is_none() {
            index.order.push(key);
        }
    }
    index
}

/// Full outer join of `left` and `right` on their projections' key fields.
///
/// # Errors
/// [`crate::error::ReconcileError::SchemaMismatch`] if either dataset lacks its key field or
/// a projected column.
///
/// # Example
/// ```
/// use ironjoin::{Dataset, Projection, Record, full_outer_join};
///
/// # fn main() -> Result<(), ironjoin::ReconcileError> {
/// let header = vec!["k".to_string(), "v".to_string()];
/// let left = Dataset::new("left", header.clone()).with_records(vec![
///     Record::from_values(["A", "1"]),
///     Record::from_values(["B", "2"]),
/// ]);
/// let right = Dataset::new("right", header)
///     .with_records(vec![Record::from_values(["A", "x"])]);
/// let proj = Projection::new("k", ["v"]);
///
/// let out = full_outer_join(&left, &proj, &right, &proj)?;
/// assert_eq!(out.rows.len(), 2);
/// # Ok(()) }
/// ```
pub fn full_outer_join(
    left: &Dataset,
    left_projection: &Projection,
    right: &Dataset,
    right_projection: &Projection,
) -> ReconcileResult<JoinOutput> {
    let left_cols = resolve(left, left_projection)?;
    let right_cols = resolve(right, right_projection)?;
    let mut left_index = index_side(left, &left_cols);
    let mut right_index = index_side(right, &right_cols);
    let left_width = left_projection.width();
    let right_width = right_projection.width();

    let mut rows = Vec::with_capacity(left_index.order.len() + right_index.order.len());
    for key in &left_index.order {
        let l = left_index.values.remove(key).unwrap_or_else(|| vec![None; left_width]);
        let r = right_index
            .values
            .remove(key)
            .unwrap_or_else(|| vec![None; right_width]);
        rows.push(JoinedRow::new(l, r));
    }
    for key in &right_index.order {
        // Keys shared with the left side were consumed above.
        if let Some(r) = right_index.values.remove(key) {
            rows.push(JoinedRow::new(vec![None; left_width], r));
        }
    }

    tracing::debug!(
        left = %left.name,
        right = %right.name,
        left_keys = left_index.order.len(),
        right_keys = right_index.order.len(),
        rows = rows.len(),
        "full outer join"
    );
    Ok(JoinOutput {
        left_width,
        right_width,
        rows,
    })
}

/// Identifier that both datasets share and can be joined on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    Customer,
    Card,
    Account,
}

/// Output header of the export (left) block, without the optional column.
pub const EXPORT_OUTPUT_HEADER: [&str; 5] =
    ["eq_cus", "eq_card", "eq_account", "eq_type", "eq_contract"];

/// Output name of the optional export column.
pub const EXPORT_OPTIONAL_OUTPUT: &str = "eq_scact";

/// Output header of the customer (right) block.
pub const CUSTOMER_OUTPUT_HEADER: [&str; 4] =
    ["kibana_cus", "kibana_card", "kibana_account", "kibana_terminal"];

impl JoinKey {
    /// `(export field, customer field)` holding this identifier.
    #[must_use]
    pub const fn fields(self) -> (&'static str, &'static str) {
        match self {
            Self::Customer => ("F0UCUS1", "customerId"),
            Self::Card => ("F0UIDPL", "cardId"),
            Self::Account => ("F0UEAN", "account"),
        }
    }

    /// Short label used in output file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "CUS",
            Self::Card => "Card",
            Self::Account => "Account",
        }
    }

    /// Projection of an export dataset; `SCACT` is carried when present.
    #[must_use]
    pub fn export_projection(self, export: &Dataset) -> Projection {
        let mut columns: Vec<&str> = crate::record::EXPORT_FIELDS.to_vec();
        if export.has_column(EXPORT_OPTIONAL_FIELD) {
            columns.push(EXPORT_OPTIONAL_FIELD);
        }
        Projection::new(self.fields().0, columns)
    }

    #[must_use]
    pub fn customer_projection(self) -> Projection {
        Projection::new(self.fields().1, crate::record::CUSTOMER_FIELDS)
    }
}

/// Output header for an export/customer join of the given left width.
#[must_use]
pub fn joined_header(left_width: usize) -> Vec<String> {
    let mut header: Vec<String> = EXPORT_OUTPUT_HEADER.iter().map(|s| s.to_string()).collect();
    if left_width > EXPORT_OUTPUT_HEADER.len() {
        header.push(EXPORT_OPTIONAL_OUTPUT.to_string());
    }
    header.extend(CUSTOMER_OUTPUT_HEADER.iter().map(|s| s.to_string()));
    header
}
