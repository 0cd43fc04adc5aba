use anyhow::Result;
use ironjoin::io::csv::{read_dataset, read_projected, write_joined, write_records};
use ironjoin::{JoinedRow, Record};
use std::fs;
use tempfile::TempDir;

#[test]
fn header_is_first_non_blank_row_and_rows_are_padded() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("data.csv");
    fs::write(&path, ",,\n\n id , name ,extra\n1,alice\n,,\n2, bob ,x,overflow\n")?;

    let ds = read_dataset(&path)?;
    assert_eq!(ds.name, "data.csv");
    assert_eq!(ds.header, vec!["id", "name", "extra"]);
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[0], Record(vec![Some("1".into()), Some("alice".into()), None]));
    assert_eq!(ds.records[1].get(1), Some("bob"));
    assert_eq!(ds.records[1].len(), 3);
    Ok(())
}

#[test]
fn empty_file_is_an_empty_dataset() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("empty.csv");
    fs::write(&path, "")?;
    let ds = read_dataset(&path)?;
    assert!(ds.header.is_empty());
    assert!(ds.is_empty());
    Ok(())
}

#[test]
fn projection_matches_columns_leniently() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("export.csv");
    fs::write(&path, "Other, f0ucus1 ,F0UEAN\nz,AAA111,99\nz,,\n")?;

    let ds = read_projected(&path, &["F0UCUS1", "F0UIDPL", "F0UEAN"])?;
    assert_eq!(ds.header, vec!["F0UCUS1", "F0UIDPL", "F0UEAN"]);
    assert_eq!(ds.len(), 1);
    assert_eq!(
        ds.records[0],
        Record(vec![Some("AAA111".into()), None, Some("99".into())])
    );
    Ok(())
}

#[test]
fn writers_emit_header_and_empty_cells() -> Result<()> {
    let dir = TempDir::new()?;
    let records = dir.path().join("nested").join("records.csv");
    let header = vec!["a".to_string(), "b".to_string()];
    let n = write_records(
        &records,
        &header,
        &[Record(vec![Some("1".into()), None]), Record::from_values(["x,y", "2"])],
    )?;
    assert_eq!(n, 2);
    assert_eq!(fs::read_to_string(&records)?, "a,b\n1,\n\"x,y\",2\n");

    let joined = dir.path().join("joined.csv");
    let rows = vec![JoinedRow::new(vec![Some("L".into())], vec![None])];
    write_joined(&joined, &header, &rows)?;
    assert_eq!(fs::read_to_string(&joined)?, "a,b\nL,\n");
    Ok(())
}

#[test]
fn missing_file_names_the_path() {
    let err = read_dataset("definitely/not/here.csv").unwrap_err();
    assert!(format!("{err:#}").contains("here.csv"));
}
