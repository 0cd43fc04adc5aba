//! Run configuration.
//!
//! [`ReconcileConfig`] is read from a JSON file. Every field has a default, so
//! a partial file (or no file at all) is valid:
//!
//! ```json
//! {
//!   "max_total_bytes": 10000,
//!   "sql": { "prefix_template": "SELECT * FROM {schema1}.T WHERE {filter} IN (\n" }
//! }
//! ```

use crate::batch::{Limits, Template};
use crate::error::ReconcileResult;
use crate::extract::{MatchMode, RuleSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Built-in SQL prefix. Placeholders: `{schema1}`, `{schema2}`, `{filter}`.
pub const DEFAULT_PREFIX_TEMPLATE: &str = "SELECT F0UCUS1, F0UIDPL, F0UEAN, F0USCRD, F0USCON\n\n\
FROM {schema1}.F0UPF\n\n\
INNER JOIN {schema2}.GFPF ON F0UCUS1=GFCUS\n\n\
WHERE 1=1\n\n\
AND {filter} IN (\n";

const PLACEHOLDERS: [&str; 3] = ["schema1", "schema2", "filter"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    pub prefix_template: String,
    pub suffix: String,
    pub item_separator: String,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            prefix_template: DEFAULT_PREFIX_TEMPLATE.to_string(),
            suffix: "\n)\n;\n".to_string(),
            item_separator: ", ".to_string(),
        }
    }
}

/// One configured extraction rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub max_total_bytes: usize,
    pub reserved_bytes: usize,
    pub max_items_per_group: usize,
    pub sql: SqlConfig,
    pub left_key_field: Option<String>,
    pub right_key_field: Option<String>,
    /// Overrides the built-in customer rules when non-empty.
    pub rules: Vec<RuleSpec>,
    pub mode: MatchMode,
    /// Emit a progress event every this many items.
    pub progress_every: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: 800,
            reserved_bytes: 300,
            max_items_per_group: 3500,
            sql: SqlConfig::default(),
            left_key_field: None,
            right_key_field: None,
            rules: Vec::new(),
            mode: MatchMode::AllOrNothing,
            progress_every: 1000,
        }
    }
}

impl ReconcileConfig {
    /// Load from `path`; a missing file yields the defaults.
    ///
    /// A blank `sql.prefix_template` is replaced by the built-in one and line
    /// endings in it are normalized to `\n`.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut cfg: Self =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        if cfg.sql.prefix_template.trim().is_empty() {
            cfg.sql.prefix_template = DEFAULT_PREFIX_TEMPLATE.to_string();
        } else {
            cfg.sql.prefix_template = cfg.sql.prefix_template.replace("\r\n", "\n").replace('\r', "\n");
        }
        Ok(cfg)
    }

    /// Load from `path` if given, defaults otherwise.
    ///
    /// # Errors
    /// See [`ReconcileConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn byte_limits(&self) -> Limits {
        Limits::bytes(self.max_total_bytes, self.reserved_bytes)
    }

    #[must_use]
    pub fn count_limits(&self) -> Limits {
        Limits::count(self.max_items_per_group)
    }

    /// SQL `IN` template for the given unit schemas and filter column.
    #[must_use]
    pub fn sql_template(&self, schema1: &str, schema2: &str, filter: &str) -> Template {
        let prefix = render_prefix(&self.sql.prefix_template, schema1, schema2, filter);
        let mut t = Template::sql_in(prefix, self.sql.suffix.clone());
        t.separator.clone_from(&self.sql.item_separator);
        t
    }

    /// Configured rules, or the built-in customer rules when none are set.
    ///
    /// # Errors
    /// [`crate::ReconcileError::InvalidRule`] for a pattern that fails to compile.
    pub fn rule_set(&self) -> ReconcileResult<RuleSet> {
        if self.rules.is_empty() {
            return Ok(crate::extract::customer_rules());
        }
        let specs: Vec<(&str, &str)> = self
            .rules
            .iter()
            .map(|r| (r.name.as_str(), r.pattern.as_str()))
            .collect();
        RuleSet::from_patterns(self.mode, &specs)
    }
}

/// Fill `{schema1}`, `{schema2}` and `{filter}` in `template`.
///
/// `{{` and `}}` stand for literal braces. A template that uses any other
/// `{name}` placeholder falls back to [`DEFAULT_PREFIX_TEMPLATE`].
#[must_use]
pub fn render_prefix(template: &str, schema1: &str, schema2: &str, filter: &str) -> String {
    let values = [schema1, schema2, filter];
    match fill(template, &values) {
        Ok(rendered) => rendered,
        Err(name) => {
            tracing::warn!(placeholder = %name, "unknown placeholder in SQL template, using built-in template");
            fill(DEFAULT_PREFIX_TEMPLATE, &values)
                .unwrap_or_else(|_| DEFAULT_PREFIX_TEMPLATE.to_string())
        }
    }
}

/// Substitute [`PLACEHOLDERS`] by `values`, collapsing doubled braces.
///
/// Returns the first unknown identifier placeholder as the error. Braces that
/// do not enclose an identifier are copied as-is.
fn fill<'t>(template: &'t str, values: &[&str; 3]) -> Result<String, &'t str> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
            continue;
        }
        if let Some(inner) = tail.strip_prefix('{')
            && let Some(close) = inner.find('}')
        {
            let name = &inner[..close];
            let is_ident =
                !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if is_ident {
                match PLACEHOLDERS.iter().position(|p| *p == name) {
                    Some(i) => out.push_str(values[i]),
                    None => return Err(name),
                }
                rest = &inner[close + 1..];
                continue;
            }
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out.push_str(rest);
    Ok(out)
}
