//! End-to-end reconciliation steps over files.
//!
//! Each step reads its inputs through [`crate::io`], runs the core, writes its
//! outputs next to the inputs and returns a [`RunReport`]:
//!
//! 1. [`group_trace_ids`]: dedupe trace ids, emit search DSL query groups.
//! 2. [`collect_values`]: scan log dumps for one labeled identifier and for
//!    complete customer tuples.
//! 3. [`build_sql_batches`]: pack values into size-bounded SQL `IN` queries.
//! 4. [`merge_exports`] / [`extract_exports`]: assemble database export rows.
//! 5. [`join_exports`]: full outer join of export and customer data, sorted
//!    by completeness.

use crate::batch::{BatchPartitioner, Template, match_phrase_item, quote_sql_literal};
use crate::classify::{CompletenessGroup, group_counts, sort_rows};
use crate::config::ReconcileConfig;
use crate::dedup::{Deduplicator, RowDeduplicator};
use crate::extract::{DEFAULT_VALUE_PATTERN, LabelScanner, export_rules};
use crate::io::csv::{read_dataset, read_projected, write_joined, write_records};
use crate::io::glob::{list_inputs, with_extension};
use crate::io::text::{count_lines, lines, read_values, write_batches, write_lines};
use crate::join::{JoinKey, full_outer_join, joined_header};
use crate::normalize::strip_label;
use crate::progress::{LogProgress, ProgressObserver};
use crate::record::{DatasetRole, EXPORT_FIELDS, EXPORT_OPTIONAL_FIELD};
use crate::report::RunReport;
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Field name of trace ids in search DSL clauses.
pub const TRACE_ID_FIELD: &str = "traceId";
/// Sub-directory receiving DSL query groups.
pub const DSL_OUTPUT_DIR: &str = "output";
/// File stem of DSL query groups.
pub const DSL_GROUP_STEM: &str = "dsl_group";
/// Unique labeled values collected from dumps.
pub const VALUES_FILE: &str = "csv_general.txt";
/// Customer tuples collected from dumps.
pub const CUSTOMER_FILE: &str = "customer_data.csv";
/// Merged database export rows.
pub const EXPORT_FILE: &str = "export_data.csv";
/// Export rows recovered from free text.
pub const EXPORT_EXTRACT_FILE: &str = "export_extract.csv";

/// Output file name of a join on `key`.
#[must_use]
pub fn join_output_name(key: JoinKey) -> String {
    format!("All_join_data-{}.csv", key.label())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Deduplicate the trace ids in `source` and write them as search DSL query
/// groups of at most `max_items_per_group` clauses to
/// `out_dir/output/dsl_group-{n}.txt`.
///
/// # Errors
/// I/O failures, or invalid count limits in `cfg`.
pub fn group_trace_ids(source: &Path, out_dir: &Path, cfg: &ReconcileConfig) -> Result<RunReport> {
    let mut report = RunReport::new("trace-groups");
    let total = count_lines(source)?;
    let mut progress = LogProgress::new("trace ids", cfg.progress_every);
    let mut dedup = Deduplicator::new();
    let mut consumed = 0usize;
    for line in lines(source)? {
        let line = line.with_context(|| format!("read {}", source.display()))?;
        dedup.push(&line);
        consumed += 1;
        progress.on_progress(consumed, Some(total));
    }
    progress.on_finish(consumed);
    let outcome = dedup.finish();
    tracing::info!(
        unique = outcome.keys.len(),
        duplicates = outcome.duplicates,
        "trace ids deduplicated"
    );

    let partitioner = BatchPartitioner::new(Template::search_should(), cfg.count_limits());
    let batches = partitioner.partition_by_count(
        outcome
            .keys
            .iter()
            .map(|id| match_phrase_item(TRACE_ID_FIELD, id)),
    )?;
    let written = write_batches(out_dir.join(DSL_OUTPUT_DIR), DSL_GROUP_STEM, &batches)?;

    report.set("lines", consumed as u64);
    report.set("unique", outcome.keys.len() as u64);
    report.set("duplicates", outcome.duplicates as u64);
    report.set("groups", batches.len() as u64);
    report.outputs.extend(written);
    Ok(report.finish())
}

/// Scan every CSV dump in `dir`.
///
/// Writes each distinct `filter_key=VALUE` value, first-seen order, to
/// `csv_general.txt`, and every complete customer tuple (per `cfg`'s rule set)
/// to `customer_data.csv` with fully identical rows removed.
///
/// # Errors
/// - `dir` holds files other than `.csv`/`.txt` dumps and previous outputs,
///   or no CSV dump at all.
/// - An extraction rule in `cfg` does not compile.
/// - I/O failures.
pub fn collect_values(dir: &Path, filter_key: &str, cfg: &ReconcileConfig) -> Result<RunReport> {
    let mut report = RunReport::new("collect");
    let filter_key = filter_key.trim();
    if filter_key.is_empty() {
        bail!("filter key must not be empty");
    }
    let inputs = list_inputs(dir, &["csv", "txt"], &[VALUES_FILE, CUSTOMER_FILE])?;
    let dumps = with_extension(&inputs, "csv");
    if dumps.is_empty() {
        bail!("no CSV files in {}", dir.display());
    }

    let scanner = LabelScanner::new(filter_key, DEFAULT_VALUE_PATTERN)?;
    let rules = cfg.rule_set()?;
    let mut values = Deduplicator::new();
    let mut rows = RowDeduplicator::new();
    let mut progress = LogProgress::new("dumps", 1);
    for (i, dump) in dumps.iter().enumerate() {
        for line in lines(dump)? {
            let line = line.with_context(|| format!("read {}", dump.display()))?;
            for value in scanner.scan(&line) {
                values.push(value);
            }
            if let Some(record) = rules.extract(&line) {
                rows.push(record);
            }
        }
        progress.on_progress(i + 1, Some(dumps.len()));
    }
    progress.on_finish(dumps.len());

    let outcome = values.finish();
    let values_path = dir.join(VALUES_FILE);
    write_lines(&values_path, &outcome.keys)?;

    let (rows, removed) = rows.finish();
    let extracted = rows.len() + removed;
    let customer_path = dir.join(CUSTOMER_FILE);
    write_records(&customer_path, &rules.header(), &rows)?;

    tracing::info!(
        filter = filter_key,
        unique = outcome.keys.len(),
        duplicates = outcome.duplicates,
        rows = rows.len(),
        "collected values"
    );
    report.set("files", dumps.len() as u64);
    report.set("unique", outcome.keys.len() as u64);
    report.set("duplicates", outcome.duplicates as u64);
    report.set("rows_extracted", extracted as u64);
    report.set("rows", rows.len() as u64);
    report.set("row_duplicates", removed as u64);
    report.add_output(values_path);
    report.add_output(customer_path);
    Ok(report.finish())
}

/// Pack the values of `source` (one per line) into SQL `IN` queries no larger
/// than the configured byte budget, written as `{stem}-{n}.txt` beside
/// `source`.
///
/// The prefix template is rendered with schemas `AFIL{unit}` and `KFIL{unit}`
/// and the filter column `filter`. Values are quoted as SQL literals; a
/// trailing `,` or a leading `{filter}=` left by earlier tooling is dropped.
///
/// # Errors
/// - A value cannot fit a query on its own
///   ([`crate::ReconcileError::ValueTooLarge`]).
/// - Invalid byte limits in `cfg`.
/// - I/O failures.
pub fn build_sql_batches(
    source: &Path,
    unit: &str,
    filter: &str,
    cfg: &ReconcileConfig,
) -> Result<RunReport> {
    let mut report = RunReport::new("sql");
    let unit = unit.trim();
    let filter = filter.trim();
    if unit.is_empty() || filter.is_empty() {
        bail!("unit and filter must not be empty");
    }
    let template = cfg.sql_template(&format!("AFIL{unit}"), &format!("KFIL{unit}"), filter);
    let partitioner = BatchPartitioner::new(template, cfg.byte_limits());

    let values = read_values(source)?;
    let items: Vec<String> = values
        .iter()
        .map(|v| strip_label(v.strip_suffix(',').unwrap_or(v.as_str()).trim_end(), filter))
        .filter(|v| !v.is_empty())
        .map(quote_sql_literal)
        .collect();
    let batches = partitioner
        .partition_by_bytes(items.iter().map(String::as_str))
        .with_context(|| format!("partition values of {}", source.display()))?;

    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sql".to_string());
    let written = write_batches(dir, &stem, &batches)?;

    report.set("values", items.len() as u64);
    report.set("batches", batches.len() as u64);
    report.outputs.extend(written);
    Ok(report.finish())
}

fn export_columns() -> Vec<&'static str> {
    let mut cols = EXPORT_FIELDS.to_vec();
    cols.push(EXPORT_OPTIONAL_FIELD);
    cols
}

/// Merge every export CSV of `dir` into `export_data.csv`.
///
/// Only the six export columns are kept (missing ones are filled empty) and
/// fully identical rows are removed, first occurrence winning.
///
/// # Errors
/// Foreign files in `dir`, no inputs, or I/O failures.
pub fn merge_exports(dir: &Path) -> Result<RunReport> {
    let mut report = RunReport::new("merge");
    let inputs = list_inputs(dir, &["csv"], &[EXPORT_FILE, EXPORT_EXTRACT_FILE])?;
    if inputs.is_empty() {
        bail!("no export files in {}", dir.display());
    }
    let columns = export_columns();
    let mut rows = RowDeduplicator::new();
    for path in &inputs {
        let dataset = read_projected(path, &columns)?;
        tracing::debug!(file = %dataset.name, rows = dataset.len(), "read export");
        for record in dataset.records {
            rows.push(record);
        }
    }
    let (rows, removed) = rows.finish();
    let read = rows.len() + removed;
    let header: Vec<String> = columns.iter().map(|s| s.to_string()).collect();
    let out = dir.join(EXPORT_FILE);
    write_records(&out, &header, &rows)?;

    report.set("files", inputs.len() as u64);
    report.set("rows_read", read as u64);
    report.set("rows", rows.len() as u64);
    report.set("row_duplicates", removed as u64);
    report.add_output(out);
    Ok(report.finish())
}

/// Recover export rows from unstructured dumps in `dir`, best effort: every
/// non-blank line yields a row, fields that do not match stay empty. Output is
/// `export_extract.csv`.
///
/// # Errors
/// Foreign files in `dir`, no inputs, or I/O failures.
pub fn extract_exports(dir: &Path) -> Result<RunReport> {
    let mut report = RunReport::new("extract");
    let inputs = list_inputs(dir, &["csv", "txt"], &[EXPORT_FILE, EXPORT_EXTRACT_FILE])?;
    if inputs.is_empty() {
        bail!("no dump files in {}", dir.display());
    }
    let rules = export_rules();
    let mut rows = Vec::new();
    for path in &inputs {
        for line in lines(path)? {
            let line = line.with_context(|| format!("read {}", path.display()))?;
            if let Some(record) = rules.extract(&line) {
                rows.push(record);
            }
        }
    }
    let out = dir.join(EXPORT_EXTRACT_FILE);
    write_records(&out, &rules.header(), &rows)?;

    report.set("files", inputs.len() as u64);
    report.set("rows", rows.len() as u64);
    report.add_output(out);
    Ok(report.finish())
}

/// Join the export and customer CSVs of `dir` on `key`.
///
/// `dir` must hold exactly two CSV files (earlier join outputs aside), one of
/// each layout. The join is a full outer join; rows are ordered by
/// completeness group and written to `All_join_data-{label}.csv`.
///
/// Key fields from `cfg` override the defaults of `key`.
///
/// # Errors
/// - Not exactly two inputs, or their layouts are not one export plus one
///   customer file.
/// - A required column is missing ([`crate::ReconcileError::SchemaMismatch`]).
/// - I/O failures.
pub fn join_exports(dir: &Path, key: JoinKey, cfg: &ReconcileConfig) -> Result<RunReport> {
    let mut report = RunReport::new("join");
    let produced: Vec<String> = [JoinKey::Customer, JoinKey::Card, JoinKey::Account]
        .into_iter()
        .map(join_output_name)
        .collect();
    let produced: Vec<&str> = produced.iter().map(String::as_str).collect();
    let inputs = list_inputs(dir, &["csv"], &produced)?;
    if inputs.len() != 2 {
        bail!(
            "expected exactly two CSV files in {}, found {}",
            dir.display(),
            inputs.len()
        );
    }

    let mut export = None;
    let mut customer = None;
    for path in &inputs {
        let dataset = read_dataset(path)?;
        let role = dataset
            .role()
            .with_context(|| format!("classify {}", file_name(path)))?;
        tracing::debug!(file = %dataset.name, ?role, rows = dataset.len(), "classified");
        match role {
            DatasetRole::Left => export = Some(dataset),
            DatasetRole::Right => customer = Some(dataset),
        }
    }
    let (Some(export), Some(customer)) = (export, customer) else {
        bail!(
            "could not tell export and customer files apart in {}",
            dir.display()
        );
    };

    let mut left = key.export_projection(&export);
    let mut right = key.customer_projection();
    if let Some(k) = &cfg.left_key_field {
        left.key_field.clone_from(k);
    }
    if let Some(k) = &cfg.right_key_field {
        right.key_field.clone_from(k);
    }

    let joined = full_outer_join(&export, &left, &customer, &right)?;
    let rows = sort_rows(joined.rows, joined.left_width, joined.right_width)?;
    let counts = group_counts(&rows);
    let out = dir.join(join_output_name(key));
    write_joined(&out, &joined_header(joined.left_width), &rows)?;

    tracing::info!(key = key.label(), rows = rows.len(), ?counts, "joined");
    report.set("rows", rows.len() as u64);
    for group in CompletenessGroup::ALL {
        report.set(&format!("group_{}", group.index()), counts[group.index()] as u64);
    }
    report.add_output(out);
    Ok(report.finish())
}
