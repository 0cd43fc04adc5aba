//! Key normalization.
//!
//! Identifiers pulled out of log dumps and exports often carry stray spaces,
//! tabs or line breaks (wrapped cells, copy/paste artefacts). Two tokens are
//! treated as the same identifier iff their [`normalize`]d forms are equal.

/// Remove every whitespace character (Unicode `White_Space`) from `token`,
/// keeping all other characters in order.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
///
/// # Example
/// ```
/// use ironjoin::normalize;
///
/// assert_eq!(normalize(" ab\tc\r\n"), "abc");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(token: &str) -> String {
    token.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `true` if the field is absent or holds only whitespace.
#[inline]
#[must_use]
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Strip a leading `label=` from `value`, if present.
#[must_use]
pub fn strip_label<'a>(value: &'a str, label: &str) -> &'a str {
    value
        .strip_prefix(label)
        .and_then(|rest| rest.strip_prefix('='))
        .unwrap_or(value)
}
