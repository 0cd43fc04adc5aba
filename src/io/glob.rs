//! Input file discovery.
//!
//! Workflows read every input file of one kind from a directory. Discovery is
//! strict: a file with a foreign extension aborts the run so that stray files
//! are never silently mixed into (or left out of) a reconciliation.
//!
//! # Examples
//!
//! ```no_run
//! use ironjoin::io::glob::{expand_glob, list_inputs};
//!
//! let files = expand_glob("dumps/*.csv")?;
//! let inputs = list_inputs("dumps", &["csv", "txt"], &["csv_general.txt"])?;
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```

use anyhow::{Context, Result, bail};
use glob::{Pattern, glob};
use std::path::{Path, PathBuf};

/// Expand a glob pattern into a sorted vector of matching files.
///
/// Directories are skipped. No match is not an error.
///
/// # Errors
/// Returns an error if the pattern is invalid or an entry cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Sorted input files of `dir` whose extension is in `allowed`.
///
/// Files named in `produced` (outputs of a previous run) are ignored.
/// Extensions compare case-insensitively and are given without the dot.
///
/// # Errors
/// - `dir` is not a directory.
/// - A file with an extension outside `allowed` is present.
pub fn list_inputs(
    dir: impl AsRef<Path>,
    allowed: &[&str],
    produced: &[&str],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut inputs = Vec::new();
    for path in expand_glob(&pattern)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if produced.contains(&name.as_str()) {
            continue;
        }
        let ext = extension_of(&path);
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
            bail!(
                "unexpected file {} in {} (allowed: {})",
                name,
                dir.display(),
                allowed.join(", ")
            );
        }
        inputs.push(path);
    }
    tracing::debug!(dir = %dir.display(), files = inputs.len(), "listed inputs");
    Ok(inputs)
}

/// Keep only paths with the given extension.
#[must_use]
pub fn with_extension(paths: &[PathBuf], ext: &str) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|p| extension_of(p).eq_ignore_ascii_case(ext))
        .cloned()
        .collect()
}
