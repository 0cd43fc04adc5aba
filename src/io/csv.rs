//! CSV adapters for datasets and joined rows.
//!
//! This module provides:
//! - **Dataset reading**: [`read_dataset`] (header taken from the file) and
//!   [`read_projected`] (a fixed expected column set, matched leniently)
//! - **Writers**: [`write_records`] and [`write_joined`]
//!
//! # Design notes
//! - The header is the first row with any non-blank cell; leading blank rows
//!   are skipped.
//! - Rows are read as ragged records, so a short row simply yields empty
//!   trailing fields.
//! - Empty cells become `None`; writers emit `None` as an empty cell.

use crate::join::JoinedRow;
use crate::record::{Dataset, Record};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::fs::{File, create_dir_all};
use std::path::Path;

fn cell(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

fn is_blank_row(row: &StringRecord) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Header row and data rows of a CSV file, blank rows dropped.
fn read_rows(path: &Path) -> Result<Option<(StringRecord, Vec<StringRecord>)>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(f);
    let mut header: Option<StringRecord> = None;
    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
        if is_blank_row(&rec) {
            continue;
        }
        if header.is_none() {
            header = Some(rec);
        } else {
            rows.push(rec);
        }
    }
    Ok(header.map(|h| (h, rows)))
}

/// Read a CSV file into a [`Dataset`] using the file's own header.
///
/// Records are padded or truncated to the header width. A file with no
/// non-blank row yields an empty dataset with an empty header.
///
/// # Errors
/// Returns an error if the file cannot be opened or parsed as CSV.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let mut dataset = Dataset::new(dataset_name(path), Vec::new());
    let Some((header, rows)) = read_rows(path)? else {
        return Ok(dataset);
    };
    dataset.header = header.iter().map(|h| h.trim().to_string()).collect();
    let width = dataset.header.len();
    for row in rows {
        let mut fields: Vec<Option<String>> = row.iter().take(width).map(cell).collect();
        fields.resize(width, None);
        dataset.push(Record(fields));
    }
    Ok(dataset)
}

/// Read only the `expected` columns of a CSV file, in `expected` order.
///
/// Column names are matched case-insensitively after trimming. Missing columns
/// are filled empty (and logged); rows empty in every expected column are
/// skipped. The returned dataset's header is `expected`.
///
/// # Errors
/// Returns an error if the file cannot be opened or parsed as CSV.
pub fn read_projected(path: impl AsRef<Path>, expected: &[&str]) -> Result<Dataset> {
    let path = path.as_ref();
    let header_out: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    let mut dataset = Dataset::new(dataset_name(path), header_out);
    let Some((header, rows)) = read_rows(path)? else {
        return Ok(dataset);
    };
    let by_name: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty())
        .map(|(i, h)| (h.trim().to_uppercase(), i))
        .collect();
    let picks: Vec<Option<usize>> = expected
        .iter()
        .map(|e| by_name.get(&e.to_uppercase()).copied())
        .collect();
    let missing: Vec<&str> = expected
        .iter()
        .zip(&picks)
        .filter(|(_, p)| p.is_none())
        .map(|(e, _)| *e)
        .collect();
    if !missing.is_empty() {
        tracing::warn!(file = %dataset.name, ?missing, "columns missing, filling empty");
    }
    for row in rows {
        let record = Record(
            picks
                .iter()
                .map(|p| p.and_then(|i| row.get(i)).and_then(cell))
                .collect(),
        );
        if !record.is_blank() {
            dataset.push(record);
        }
    }
    Ok(dataset)
}

fn writer_for(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(WriterBuilder::new().flexible(true).from_writer(f))
}

fn write_all<'a, I>(path: &Path, header: &[String], rows: I) -> Result<usize>
where
    I: IntoIterator<Item = Vec<Option<&'a str>>>,
{
    let mut wtr = writer_for(path)?;
    wtr.write_record(header)
        .with_context(|| format!("write header to {}", path.display()))?;
    let mut n = 0usize;
    for row in rows {
        n += 1;
        wtr.write_record(row.iter().map(|c| c.unwrap_or("")))
            .with_context(|| format!("serialize CSV row #{n}"))?;
    }
    wtr.flush()?;
    Ok(n)
}

/// Write `header` then `records`.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if the file/dirs cannot be created or a row fails to write.
pub fn write_records(path: impl AsRef<Path>, header: &[String], records: &[Record]) -> Result<usize> {
    write_all(
        path.as_ref(),
        header,
        records
            .iter()
            .map(|r| r.0.iter().map(Option::as_deref).collect()),
    )
}

/// Write `header` then every joined row, left block first.
///
/// # Errors
/// Returns an error if the file/dirs cannot be created or a row fails to write.
pub fn write_joined(path: impl AsRef<Path>, header: &[String], rows: &[JoinedRow]) -> Result<usize> {
    write_all(path.as_ref(), header, rows.iter().map(JoinedRow::cells))
}
