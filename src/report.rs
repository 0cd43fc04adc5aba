//! Run reports.
//!
//! Each workflow step returns a [`RunReport`]: named counters (duplicates,
//! unique values, files, batches, ...) plus the files it wrote. Reports can be
//! logged, printed, or saved as JSON.
//!
//! # Example
//!
//! ```no_run
//! use ironjoin::report::RunReport;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut report = RunReport::new("trace-groups");
//! report.set("unique", 42);
//! report.increment("files", 1);
//! report.log();
//! report.save_to_file("report.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Counters and outputs of one workflow step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub step: String,
    pub counters: BTreeMap<String, u64>,
    pub outputs: Vec<PathBuf>,
    pub elapsed_ms: Option<u128>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl RunReport {
    /// Start a report; the clock starts now.
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            counters: BTreeMap::new(),
            outputs: Vec::new(),
            elapsed_ms: None,
            started: Some(Instant::now()),
        }
    }

    pub fn set(&mut self, name: &str, value: u64) {
        self.counters.insert(name.to_string(), value);
    }

    pub fn increment(&mut self, name: &str, by: u64) {
        *self.counters.entry(name.to_string()).or_insert(0) += by;
    }

    /// Counter value, zero if never set.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn add_output(&mut self, path: impl Into<PathBuf>) {
        self.outputs.push(path.into());
    }

    /// Stop the clock.
    #[must_use]
    pub fn finish(mut self) -> Self {
        if let Some(start) = self.started.take() {
            self.elapsed_ms = Some(start.elapsed().as_millis());
        }
        self
    }

    /// Emit the report as one `info` event.
    pub fn log(&self) {
        tracing::info!(
            step = %self.step,
            counters = ?self.counters,
            outputs = self.outputs.len(),
            elapsed_ms = ?self.elapsed_ms,
            "step finished"
        );
    }

    /// Human-readable summary for terminal output.
    pub fn print(&self) {
        println!("\n========== {} ==========", self.step);
        if let Some(ms) = self.elapsed_ms {
            println!("Execution Time: {:.3}s", ms as f64 / 1000.0);
        }
        for (name, value) in &self.counters {
            println!("{name}: {value}");
        }
        for path in &self.outputs {
            println!("wrote {}", path.display());
        }
    }

    /// Save the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let formatted = serde_json::to_string_pretty(self)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}
