//! Greedy partitioning of items into bounded, template-wrapped batches.
//!
//! Both modes share one packing loop and differ only in the admission test:
//!
//! - **Byte budget** ([`PartitionMode::Bytes`]): a group accepts the next item
//!   while `prefix + body + suffix` stays within
//!   `max_total_bytes - reserved_bytes`. Length is tracked exactly as items are
//!   added (separator included), so a group never has to give an item back.
//! - **Count budget** ([`PartitionMode::Count`]): a group closes after
//!   `max_items_per_group` items; the last group may be short.
//!
//! Items are opaque and never split across groups. Every finished group is
//! rendered as `prefix + body + suffix`, where `body` joins the items with the
//! template's separator.
//!
//! ## Trailing delimiters
//! Multi-line items (for example search DSL clauses) often end in a delimiter
//! such as `,` so that they can be concatenated. A template with a
//! [`trailing_delimiter`](Template::trailing_delimiter) strips it from the last
//! item of each group before wrapping, leaving a well-formed container.
//!
//! ## Example
//! ```
//! use ironjoin::batch::{BatchPartitioner, Limits, Template};
//!
//! # fn main() -> Result<(), ironjoin::ReconcileError> {
//! let t = Template::new("(", ")", ", ");
//! let parts = BatchPartitioner::new(t, Limits::bytes(12, 0))
//!     .partition_by_bytes(["AAAA", "BBBB", "CCCC"])?;
//! let rendered: Vec<&str> = parts.iter().map(|b| b.rendered.as_str()).collect();
//! assert_eq!(rendered, vec!["(AAAA, BBBB)", "(CCCC)"]);
//! # Ok(()) }
//! ```

use crate::error::{ReconcileError, ReconcileResult};
use serde::{Deserialize, Serialize};

/// Wrapper applied to every emitted group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub prefix: String,
    pub suffix: String,
    pub separator: String,
    /// Delimiter every item ends with; removed from the last item of a group.
    #[serde(default)]
    pub trailing_delimiter: Option<String>,
}

const SHOULD_PREFIX: &str = "{\n  \"query\": {\n    \"bool\": {\n      \"should\": [\n";
const SHOULD_SUFFIX: &str = "\n  ],\n      \"minimum_should_match\": 1\n    }\n  }\n}\n";

impl Template {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            separator: separator.into(),
            trailing_delimiter: None,
        }
    }

    #[must_use]
    pub fn with_trailing_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.trailing_delimiter = Some(delimiter.into());
        self
    }

    /// Search DSL `bool.should` wrapper around [`match_phrase_item`] clauses.
    #[must_use]
    pub fn search_should() -> Self {
        Self::new(SHOULD_PREFIX, SHOULD_SUFFIX, "\n").with_trailing_delimiter(",")
    }

    /// SQL `IN (...)` wrapper; `prefix` must end with the opening parenthesis.
    pub fn sql_in(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::new(prefix, suffix, ", ")
    }

    /// Bytes taken by prefix and suffix.
    #[must_use]
    pub fn overhead(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    /// `item` as it appears when it closes a group.
    #[must_use]
    pub fn closing_form<'a>(&self, item: &'a str) -> &'a str {
        match &self.trailing_delimiter {
            Some(d) => {
                let trimmed = item.trim_end();
                trimmed.strip_suffix(d.as_str()).unwrap_or(item)
            }
            None => item,
        }
    }

    /// Render a group.
    #[must_use]
    pub fn wrap<S: AsRef<str>>(&self, items: &[S]) -> String {
        let mut out = String::with_capacity(self.overhead() + items.len() * 16);
        out.push_str(&self.prefix);
        let last = items.len().saturating_sub(1);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.separator);
            }
            if i == last {
                out.push_str(self.closing_form(item.as_ref()));
            } else {
                out.push_str(item.as_ref());
            }
        }
        out.push_str(&self.suffix);
        out
    }

    /// Recover the items of a group rendered with this template.
    ///
    /// Returns `None` if `rendered` does not carry the prefix and suffix.
    /// Exact only when items do not themselves contain the separator (or, with
    /// a trailing delimiter, the delimiter followed by the separator). With a
    /// trailing delimiter every recovered item ends in it.
    ///
    /// Groups are never empty, so an empty body is one empty item.
    #[must_use]
    pub fn split_rendered(&self, rendered: &str) -> Option<Vec<String>> {
        let body = rendered
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        let items = match &self.trailing_delimiter {
            Some(d) => {
                let joint = format!("{d}{}", self.separator);
                body.split(joint.as_str()).map(|s| format!("{s}{d}")).collect()
            }
            None => body
                .split(self.separator.as_str())
                .map(str::to_string)
                .collect(),
        };
        Some(items)
    }
}

/// Size limits for a partition run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_total_bytes: usize,
    pub reserved_bytes: usize,
    pub max_items_per_group: Option<usize>,
}

impl Limits {
    #[must_use]
    pub const fn bytes(max_total_bytes: usize, reserved_bytes: usize) -> Self {
        Self {
            max_total_bytes,
            reserved_bytes,
            max_items_per_group: None,
        }
    }

    #[must_use]
    pub const fn count(max_items_per_group: usize) -> Self {
        Self {
            max_total_bytes: usize::MAX,
            reserved_bytes: 0,
            max_items_per_group: Some(max_items_per_group),
        }
    }

    /// Bytes a rendered batch may occupy.
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.max_total_bytes.saturating_sub(self.reserved_bytes)
    }

    /// # Errors
    /// [`ReconcileError::InvalidLimits`] when the reservation swallows the
    /// whole budget or the per-group count is zero.
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.reserved_bytes >= self.max_total_bytes {
            return Err(ReconcileError::InvalidLimits(format!(
                "reserved_bytes ({}) must be below max_total_bytes ({})",
                self.reserved_bytes, self.max_total_bytes
            )));
        }
        if self.max_items_per_group == Some(0) {
            return Err(ReconcileError::InvalidLimits(
                "max_items_per_group must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which budget closes a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionMode {
    Bytes,
    Count,
}

/// One finalized, wrapped group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Items in group order, exactly as supplied.
    pub items: Vec<String>,
    /// `prefix + body + suffix`.
    pub rendered: String,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rendered size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.rendered.len()
    }
}

/// Running state of the group under construction.
struct Group {
    items: Vec<String>,
    /// Body length with every item in its full (non-closing) form.
    body_len: usize,
}

impl Group {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            body_len: 0,
        }
    }

    /// Exact rendered size if `item` were appended as the closing item.
    fn len_with(&self, template: &Template, item: &str) -> usize {
        let sep = if self.items.is_empty() {
            0
        } else {
            template.separator.len()
        };
        template.overhead() + self.body_len + sep + template.closing_form(item).len()
    }

    fn push(&mut self, template: &Template, item: String) {
        if !self.items.is_empty() {
            self.body_len += template.separator.len();
        }
        self.body_len += item.len();
        self.items.push(item);
    }
}

/// Packs items into batches under a [`Template`] and [`Limits`].
#[derive(Clone, Debug)]
pub struct BatchPartitioner {
    template: Template,
    limits: Limits,
}

impl BatchPartitioner {
    #[must_use]
    pub fn new(template: Template, limits: Limits) -> Self {
        Self { template, limits }
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Whether `item` fits a batch on its own under the byte budget.
    #[must_use]
    pub fn fits(&self, item: &str) -> bool {
        Group::new().len_with(&self.template, item) <= self.limits.budget()
    }

    /// Partition under the byte budget.
    ///
    /// # Errors
    /// - [`ReconcileError::InvalidLimits`] from [`Limits::validate`].
    /// - [`ReconcileError::ValueTooLarge`] naming the first item that cannot
    ///   fit even alone; no batches are returned in that case.
    pub fn partition_by_bytes<I, S>(&self, items: I) -> ReconcileResult<Vec<Batch>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.limits.validate()?;
        self.pack(items, PartitionMode::Bytes)
    }

    /// Partition under the per-group item count.
    ///
    /// Produces `ceil(n / max_items_per_group)` batches; zero items give zero
    /// batches.
    ///
    /// # Errors
    /// [`ReconcileError::InvalidLimits`] if `max_items_per_group` is unset or zero.
    pub fn partition_by_count<I, S>(&self, items: I) -> ReconcileResult<Vec<Batch>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.limits.max_items_per_group {
            None => Err(ReconcileError::InvalidLimits(
                "count partitioning needs max_items_per_group".to_string(),
            )),
            Some(0) => Err(ReconcileError::InvalidLimits(
                "max_items_per_group must be positive".to_string(),
            )),
            Some(_) => self.pack(items, PartitionMode::Count),
        }
    }

    fn admits(&self, group: &Group, item: &str, mode: PartitionMode) -> bool {
        match mode {
            PartitionMode::Bytes => {
                group.len_with(&self.template, item) <= self.limits.budget()
            }
            PartitionMode::Count => {
                group.items.len() < self.limits.max_items_per_group.unwrap_or(usize::MAX)
            }
        }
    }

    fn pack<I, S>(&self, items: I, mode: PartitionMode) -> ReconcileResult<Vec<Batch>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batches = Vec::new();
        let mut group = Group::new();
        for item in items {
            let item: String = item.into();
            if mode == PartitionMode::Bytes && !self.fits(&item) {
                return Err(ReconcileError::ValueTooLarge {
                    len: Group::new().len_with(&self.template, &item),
                    budget: self.limits.budget(),
                    item,
                });
            }
            if !group.items.is_empty() && !self.admits(&group, &item, mode) {
                batches.push(self.finalize(std::mem::replace(&mut group, Group::new()), mode));
            }
            group.push(&self.template, item);
        }
        if !group.items.is_empty() {
            batches.push(self.finalize(group, mode));
        }
        tracing::debug!(
            mode = ?mode,
            batches = batches.len(),
            budget = self.limits.budget(),
            "partitioned items"
        );
        Ok(batches)
    }

    fn finalize(&self, group: Group, mode: PartitionMode) -> Batch {
        let rendered = self.template.wrap(&group.items);
        if mode == PartitionMode::Bytes {
            debug_assert!(
                rendered.len() <= self.limits.budget(),
                "batch of {} bytes exceeds budget {}",
                rendered.len(),
                self.limits.budget()
            );
        }
        Batch {
            items: group.items,
            rendered,
        }
    }
}

/// Quote `value` as a SQL string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Five-line search DSL `match_phrase` clause for `field == value`, ending in
/// `},` so clauses can be concatenated under [`Template::search_should`].
#[must_use]
pub fn match_phrase_item(field: &str, value: &str) -> String {
    let field = serde_json::Value::String(field.to_string());
    let value = serde_json::Value::String(value.to_string());
    format!("{{\n  \"match_phrase\": {{\n    {field}: {value}\n  }}\n}},")
}
