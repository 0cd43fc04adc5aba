//! Integration tests for input discovery.

use anyhow::Result;
use ironjoin::io::glob::{expand_glob, list_inputs, with_extension};
use std::fs::{self, create_dir_all};
use tempfile::TempDir;

#[test]
fn lists_sorted_inputs_and_skips_outputs() -> Result<()> {
    let dir = TempDir::new()?;
    let base = dir.path();
    fs::write(base.join("b.csv"), "")?;
    fs::write(base.join("a.CSV"), "")?;
    fs::write(base.join("notes.txt"), "")?;
    fs::write(base.join("out.csv"), "")?;
    create_dir_all(base.join("sub"))?;

    let inputs = list_inputs(base, &["csv", "txt"], &["out.csv"])?;
    let names: Vec<String> = inputs
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, vec!["a.CSV", "b.csv", "notes.txt"]);

    let csvs = with_extension(&inputs, "csv");
    assert_eq!(csvs.len(), 2);
    Ok(())
}

#[test]
fn foreign_extension_aborts() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("a.csv"), "")?;
    fs::write(dir.path().join("a.xlsx"), "")?;
    let err = list_inputs(dir.path(), &["csv"], &[]).unwrap_err();
    assert!(err.to_string().contains("a.xlsx"));
    Ok(())
}

#[test]
fn not_a_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let file = dir.path().join("f.csv");
    fs::write(&file, "")?;
    assert!(list_inputs(&file, &["csv"], &[]).is_err());
    Ok(())
}

#[test]
fn glob_skips_directories_and_allows_no_match() -> Result<()> {
    let dir = TempDir::new()?;
    let base = dir.path();
    fs::write(base.join("x.txt"), "")?;
    create_dir_all(base.join("y.txt"))?;
    let pattern = format!("{}/*.txt", base.display());
    assert_eq!(expand_glob(&pattern)?, vec![base.join("x.txt")]);
    let none = format!("{}/*.nope", base.display());
    assert!(expand_glob(&none)?.is_empty());
    assert!(expand_glob("[").is_err());
    Ok(())
}
