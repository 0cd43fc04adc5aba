//! Completeness classification and stable group ordering of joined rows.
//!
//! A field is *empty* when it is absent or whitespace-only. Each row falls in
//! exactly one [`CompletenessGroup`], decided only by field emptiness:
//!
//! | group | left block   | right block  |
//! |-------|--------------|--------------|
//! | 0     | all filled   | all filled   |
//! | 1     | all filled   | all empty    |
//! | 2     | all empty    | all filled   |
//! | 3     | anything else | |
//!
//! Sorting is a stable partition: groups ascend, rows keep their input order
//! within a group. No secondary key is applied.

use crate::error::{ReconcileError, ReconcileResult};
use crate::join::JoinedRow;
use crate::normalize::is_blank;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompletenessGroup {
    /// Both sides fully populated.
    Complete = 0,
    /// Only the left side, fully populated.
    LeftOnly = 1,
    /// Only the right side, fully populated.
    RightOnly = 2,
    /// Partial or mixed.
    Partial = 3,
}

impl CompletenessGroup {
    pub const ALL: [Self; 4] = [Self::Complete, Self::LeftOnly, Self::RightOnly, Self::Partial];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Classify a pair of blocks.
    #[must_use]
    pub fn of_blocks(left: &[Option<String>], right: &[Option<String>]) -> Self {
        let filled = |b: &[Option<String>]| b.iter().all(|v| !is_blank(v.as_deref()));
        let any = |b: &[Option<String>]| b.iter().any(|v| !is_blank(v.as_deref()));
        let (left_all, right_all) = (filled(left), filled(right));
        if left_all && right_all {
            Self::Complete
        } else if left_all && !any(right) {
            Self::LeftOnly
        } else if right_all && !any(left) {
            Self::RightOnly
        } else {
            Self::Partial
        }
    }
}

impl JoinedRow {
    #[must_use]
    pub fn group(&self) -> CompletenessGroup {
        CompletenessGroup::of_blocks(&self.left, &self.right)
    }
}

/// Stable-partition rows by completeness group.
#[must_use]
pub fn sort_by_completeness(rows: Vec<JoinedRow>) -> Vec<JoinedRow> {
    let mut buckets: [Vec<JoinedRow>; 4] = Default::default();
    for row in rows {
        buckets[row.group().index()].push(row);
    }
    let [complete, left_only, right_only, partial] = buckets;
    let mut out = complete;
    out.extend(left_only);
    out.extend(right_only);
    out.extend(partial);
    out
}

/// [`sort_by_completeness`] with a check that every row has the join's block
/// widths.
///
/// # Errors
/// [`ReconcileError::WidthMismatch`] for the first row of the wrong shape.
pub fn sort_rows(
    rows: Vec<JoinedRow>,
    left_width: usize,
    right_width: usize,
) -> ReconcileResult<Vec<JoinedRow>> {
    if let Some(bad) = rows
        .iter()
        .find(|r| r.left.len() != left_width || r.right.len() != right_width)
    {
        return Err(ReconcileError::WidthMismatch {
            expected: left_width + right_width,
            actual: bad.width(),
        });
    }
    Ok(sort_by_completeness(rows))
}

/// Split flat rows at `left_width` and sort them.
///
/// # Errors
/// [`ReconcileError::WidthMismatch`] if a row is not `left_width + right_width`
/// wide.
pub fn sort_flat_rows(
    rows: Vec<Vec<Option<String>>>,
    left_width: usize,
    right_width: usize,
) -> ReconcileResult<Vec<JoinedRow>> {
    let expected = left_width + right_width;
    let joined = rows
        .into_iter()
        .map(|mut cells| {
            if cells.len() != expected {
                return Err(ReconcileError::WidthMismatch {
                    expected,
                    actual: cells.len(),
                });
            }
            let right = cells.split_off(left_width);
            Ok(JoinedRow::new(cells, right))
        })
        .collect::<ReconcileResult<Vec<_>>>()?;
    Ok(sort_by_completeness(joined))
}

/// Number of rows in each group, indexed by [`CompletenessGroup::index`].
#[must_use]
pub fn group_counts(rows: &[JoinedRow]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for row in rows {
        counts[row.group().index()] += 1;
    }
    counts
}
