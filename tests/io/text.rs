use anyhow::Result;
use ironjoin::io::text::{LossyLines, count_lines, read_values, write_batches, write_lines};
use ironjoin::{BatchPartitioner, Limits, Template};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

#[test]
fn lossy_lines_strip_terminators_and_replace_bad_bytes() -> Result<()> {
    let bytes = b"one\r\ntw\xFFo\n\nlast".to_vec();
    let lines: Vec<String> = LossyLines::new(Cursor::new(bytes)).collect::<Result<_, _>>()?;
    assert_eq!(lines, vec!["one", "tw\u{FFFD}o", "", "last"]);
    Ok(())
}

#[test]
fn values_are_trimmed_and_blank_lines_dropped() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("v.txt");
    fs::write(&path, " A \n\n\tB\r\n   \nC")?;
    assert_eq!(read_values(&path)?, vec!["A", "B", "C"]);
    assert_eq!(count_lines(&path)?, 4);
    Ok(())
}

#[test]
fn lines_get_exactly_one_newline() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("deep").join("out.txt");
    let n = write_lines(&path, ["a", "b\n", "c"])?;
    assert_eq!(n, 3);
    assert_eq!(fs::read_to_string(&path)?, "a\nb\nc\n");
    Ok(())
}

#[test]
fn batches_are_numbered_from_one() -> Result<()> {
    let dir = TempDir::new()?;
    let p = BatchPartitioner::new(Template::new("(", ")", ", "), Limits::count(2));
    let batches = p.partition_by_count(["a", "b", "c"])?;
    let written = write_batches(dir.path().join("out"), "q", &batches)?;
    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("q-1.txt"));
    assert_eq!(fs::read_to_string(&written[0])?, "(a, b)");
    assert_eq!(fs::read_to_string(dir.path().join("out").join("q-2.txt"))?, "(c)");
    Ok(())
}
