//! Pattern-rule extraction of field tuples from unstructured lines.
//!
//! A [`RuleSet`] is an ordered list of `(field name, matcher)` pairs plus an
//! explicit [`MatchMode`]:
//!
//! - [`MatchMode::AllOrNothing`]: every rule must match somewhere in the line,
//!   otherwise the line yields no record.
//! - [`MatchMode::BestEffort`]: each rule is tried independently; a rule that
//!   does not match leaves its field empty. Any non-blank line yields a record.
//!
//! Each rule takes the **first** match in the line. Rules are independent of
//! one another, so their matches may overlap in the source text. To pull out
//! *every* `label=VALUE` occurrence of a single label use [`LabelScanner`].
//!
//! A rule's value is its first capture group when the pattern has one, or the
//! whole match otherwise.

use crate::error::{ReconcileError, ReconcileResult};
use crate::record::Record;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a [`RuleSet`] treats rules that fail to match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    AllOrNothing,
    BestEffort,
}

/// A named field matcher.
#[derive(Clone, Debug)]
pub struct Rule {
    name: String,
    regex: Regex,
}

impl Rule {
    /// Compile a rule from a raw pattern.
    ///
    /// # Errors
    /// [`ReconcileError::InvalidRule`] if `pattern` is not a valid regex.
    pub fn new(name: impl Into<String>, pattern: &str) -> ReconcileResult<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| ReconcileError::InvalidRule {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, regex })
    }

    /// Rule for `name=VALUE` where VALUE matches `value_pattern` and ends on a
    /// word boundary. The extracted value excludes the `name=` prefix.
    ///
    /// # Errors
    /// See [`Rule::new`].
    pub fn labeled(name: impl Into<String>, value_pattern: &str) -> ReconcileResult<Self> {
        let name = name.into();
        let pattern = format!(r"{}=({value_pattern})\b", regex::escape(&name));
        Self::new(name, &pattern)
    }

    /// Rule for a bare token matching `value_pattern` between word boundaries.
    ///
    /// # Errors
    /// See [`Rule::new`].
    pub fn bare(name: impl Into<String>, value_pattern: &str) -> ReconcileResult<Self> {
        Self::new(name, &format!(r"\b({value_pattern})\b"))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First match of this rule in `line`.
    #[must_use]
    pub fn find<'l>(&self, line: &'l str) -> Option<&'l str> {
        let caps = self.regex.captures(line)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }
}

/// Ordered rules plus the mode that decides what a partial match means.
#[derive(Clone, Debug)]
pub struct RuleSet {
    mode: MatchMode,
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(mode: MatchMode, rules: Vec<Rule>) -> Self {
        Self { mode, rules }
    }

    /// Compile a rule set from `(name, raw pattern)` pairs.
    ///
    /// # Errors
    /// The first rule that fails to compile.
    pub fn from_patterns<N, P>(mode: MatchMode, specs: &[(N, P)]) -> ReconcileResult<Self>
    where
        N: AsRef<str>,
        P: AsRef<str>,
    {
        let rules = specs
            .iter()
            .map(|(n, p)| Rule::new(n.as_ref(), p.as_ref()))
            .collect::<ReconcileResult<Vec<_>>>()?;
        Ok(Self::new(mode, rules))
    }

    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Field names in rule order; the header of extracted records.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }

    /// Apply every rule to `line` according to the set's mode.
    ///
    /// # Example
    /// ```
    /// use ironjoin::extract::customer_rules;
    ///
    /// let rules = customer_rules();
    /// let line = "x customerId=A9WH99 cardId=468 account=9817 terminalId=228038";
    /// let rec = rules.extract(line).unwrap();
    /// assert_eq!(rec.get(0), Some("A9WH99"));
    /// assert!(rules.extract("customerId=A9WH99 only").is_none());
    /// ```
    #[must_use]
    pub fn extract(&self, line: &str) -> Option<Record> {
        match self.mode {
            MatchMode::AllOrNothing => {
                let mut fields = Vec::with_capacity(self.rules.len());
                for rule in &self.rules {
                    fields.push(Some(rule.find(line)?.to_string()));
                }
                Some(Record(fields))
            }
            MatchMode::BestEffort => {
                if line.trim().is_empty() {
                    return None;
                }
                Some(Record(
                    self.rules
                        .iter()
                        .map(|r| r.find(line).map(str::to_string))
                        .collect(),
                ))
            }
        }
    }

    /// Extract records from every line, silently skipping lines that yield none.
    pub fn extract_all<'a, I>(&'a self, lines: I) -> impl Iterator<Item = Record> + 'a
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: 'a,
    {
        lines.into_iter().filter_map(move |l| self.extract(l))
    }
}

/// Yields every `label=VALUE` occurrence in a line, left to right.
#[derive(Clone, Debug)]
pub struct LabelScanner {
    label: String,
    regex: Regex,
}

/// Default value pattern used when scanning labeled tokens.
pub const DEFAULT_VALUE_PATTERN: &str = "[A-Z0-9]+";

impl LabelScanner {
    /// # Errors
    /// [`ReconcileError::InvalidRule`] if `value_pattern` is not a valid regex.
    pub fn new(label: impl Into<String>, value_pattern: &str) -> ReconcileResult<Self> {
        let label = label.into();
        let pattern = format!("{}=({value_pattern})", regex::escape(&label));
        let regex = Regex::new(&pattern).map_err(|e| ReconcileError::InvalidRule {
            name: label.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { label, regex })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bare values (label stripped) of every match in `line`.
    pub fn scan<'l>(&self, line: &'l str) -> impl Iterator<Item = &'l str> {
        self.regex
            .captures_iter(line)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
    }
}

/// One-shot form of [`LabelScanner::scan`].
///
/// # Errors
/// See [`LabelScanner::new`].
pub fn scan_labeled<'l>(
    line: &'l str,
    label: &str,
    value_pattern: &str,
) -> ReconcileResult<Vec<&'l str>> {
    Ok(LabelScanner::new(label, value_pattern)?.scan(line).collect())
}

/// Customer tuple scraped from log lines: all four labels must be present.
///
/// Patterns are fixed and known-valid.
#[must_use]
pub fn customer_rules() -> RuleSet {
    let specs = [
        ("customerId", "[A-Z0-9]{6}"),
        ("cardId", "[0-9]+"),
        ("account", "[0-9]+"),
        ("terminalId", "[0-9]+"),
    ];
    RuleSet::new(
        MatchMode::AllOrNothing,
        specs
            .iter()
            .filter_map(|(n, p)| Rule::labeled(*n, p).ok())
            .collect(),
    )
}

/// Database export columns recovered from free text, best effort.
#[must_use]
pub fn export_rules() -> RuleSet {
    let specs = [
        ("F0UCUS1", "[A-Z0-9]{6}"),
        ("F0UIDPL", "[0-9]{8,11}"),
        ("F0UEAN", "[0-9]{18,22}"),
        ("F0USCRD", "[A-Z0-9]{2,3}"),
        ("F0USCON", "[A-Z0-9]{4,7}"),
        ("SCACT", "[A-Z]{2,3}"),
    ];
    RuleSet::new(
        MatchMode::BestEffort,
        specs
            .iter()
            .filter_map(|(n, p)| Rule::bare(*n, p).ok())
            .collect(),
    )
}
