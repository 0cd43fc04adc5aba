//! End-to-end tests of the file workflow steps.
#![cfg(feature = "io-csv")]

use anyhow::Result;
use ironjoin::ReconcileError;
use ironjoin::config::ReconcileConfig;
use ironjoin::io::csv::read_dataset;
use ironjoin::join::JoinKey;
use ironjoin::workflow::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn trace_ids_become_dsl_groups() -> Result<()> {
    let dir = TempDir::new()?;
    let source = dir.path().join("trace.txt");
    fs::write(&source, "t1\nt 1\nt2\n\nt3\n")?;
    let cfg = ReconcileConfig {
        max_items_per_group: 2,
        ..ReconcileConfig::default()
    };

    let report = group_trace_ids(&source, dir.path(), &cfg)?;
    assert_eq!(report.get("unique"), 3);
    assert_eq!(report.get("duplicates"), 1);
    assert_eq!(report.get("groups"), 2);
    assert_eq!(report.outputs.len(), 2);
    assert!(report.elapsed_ms.is_some());

    let first = fs::read_to_string(dir.path().join("output").join("dsl_group-1.txt"))?;
    let v: serde_json::Value = serde_json::from_str(&first)?;
    let should = v["query"]["bool"]["should"].as_array().cloned().unwrap_or_default();
    assert_eq!(should.len(), 2);
    assert_eq!(should[0]["match_phrase"]["traceId"], "t1");
    assert_eq!(should[1]["match_phrase"]["traceId"], "t2");

    let second = fs::read_to_string(dir.path().join("output").join("dsl_group-2.txt"))?;
    assert!(second.contains("\"t3\""));
    Ok(())
}

const FULL: &str = r#"2024-05-01,INFO,"customerId=A9WH99 cardId=468 account=9817 terminalId=228038""#;

#[test]
fn collect_values_and_customer_tuples() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("dump1.csv"),
        format!("ts,level,msg\n{FULL}\n2024-05-01,INFO,\"customerId=B1XY22 alone\"\n"),
    )?;
    fs::write(dir.path().join("dump2.csv"), format!("{FULL}\n"))?;
    fs::write(dir.path().join("notes.txt"), "customerId=ZZZZZZ\n")?;

    let report = collect_values(dir.path(), "customerId", &ReconcileConfig::default())?;
    assert_eq!(report.get("files"), 2);
    assert_eq!(report.get("unique"), 2);
    assert_eq!(report.get("duplicates"), 1);
    assert_eq!(report.get("rows"), 1);
    assert_eq!(report.get("row_duplicates"), 1);

    let values = fs::read_to_string(dir.path().join(VALUES_FILE))?;
    assert_eq!(values, "A9WH99\nB1XY22\n");
    let customers = read_dataset(dir.path().join(CUSTOMER_FILE))?;
    assert_eq!(
        customers.header,
        vec!["customerId", "cardId", "account", "terminalId"]
    );
    assert_eq!(customers.len(), 1);
    assert_eq!(customers.records[0].get(3), Some("228038"));

    // outputs of the previous run are not inputs of the next one
    let again = collect_values(dir.path(), "customerId", &ReconcileConfig::default())?;
    assert_eq!(again.get("files"), 2);
    Ok(())
}

#[test]
fn collect_rejects_foreign_files() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("dump.csv"), FULL)?;
    fs::write(dir.path().join("report.xlsx"), "")?;
    assert!(collect_values(dir.path(), "customerId", &ReconcileConfig::default()).is_err());
    Ok(())
}

#[test]
fn sql_batches_stay_within_budget() -> Result<()> {
    let dir = TempDir::new()?;
    let source = dir.path().join("values.txt");
    let values: Vec<String> = (0..120).map(|i| format!("C{i:05}")).collect();
    fs::write(&source, values.join("\n"))?;
    let cfg = ReconcileConfig::default();

    let report = build_sql_batches(&source, "01", "F0UCUS1", &cfg)?;
    assert_eq!(report.get("values"), 120);
    let n = report.get("batches") as usize;
    assert!(n > 1);
    assert_eq!(report.outputs.len(), n);

    let template = cfg.sql_template("AFIL01", "KFIL01", "F0UCUS1");
    let mut recovered = Vec::new();
    for i in 1..=n {
        let text = fs::read_to_string(dir.path().join(format!("values-{i}.txt")))?;
        assert!(text.len() <= 500);
        assert!(text.contains("FROM AFIL01.F0UPF"));
        recovered.extend(template.split_rendered(&text).unwrap_or_default());
    }
    let expected: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
    assert_eq!(recovered, expected);
    Ok(())
}

#[test]
fn sql_reports_values_that_cannot_fit() -> Result<()> {
    let dir = TempDir::new()?;
    let source = dir.path().join("values.txt");
    fs::write(&source, "C00001\n")?;
    let cfg = ReconcileConfig {
        max_total_bytes: 400,
        reserved_bytes: 300,
        ..ReconcileConfig::default()
    };
    let err = build_sql_batches(&source, "01", "F0UCUS1", &cfg).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReconcileError>(),
        Some(ReconcileError::ValueTooLarge { budget: 100, .. })
    ));
    Ok(())
}

const EXPORT_HEADER: &str = "F0UCUS1,F0UIDPL,F0UEAN,F0USCRD,F0USCON,SCACT";

#[test]
fn merge_keeps_six_columns_and_drops_repeats() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("a.csv"),
        format!("{EXPORT_HEADER},EXTRA\nAAA111,1,2,X1,C1,AC,junk\nBBB222,3,4,X2,C2,,junk\n"),
    )?;
    fs::write(
        dir.path().join("b.csv"),
        "f0ucus1,F0UIDPL,F0UEAN,F0USCRD,F0USCON\nBBB222,3,4,X2,C2\nCCC333,5,6,X3,C3\n",
    )?;

    let report = merge_exports(dir.path())?;
    assert_eq!(report.get("rows_read"), 4);
    assert_eq!(report.get("rows"), 3);
    assert_eq!(report.get("row_duplicates"), 1);

    let merged = read_dataset(dir.path().join(EXPORT_FILE))?;
    assert_eq!(merged.header.len(), 6);
    assert_eq!(merged.header[5], "SCACT");
    let cus: Vec<Option<&str>> = merged.records.iter().map(|r| r.get(0)).collect();
    assert_eq!(cus, vec![Some("AAA111"), Some("BBB222"), Some("CCC333")]);
    Ok(())
}

#[test]
fn extract_exports_from_free_text() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("dump.txt"),
        "row ABC123 12345678 end\n\n   \nnothing here\n",
    )?;
    let report = extract_exports(dir.path())?;
    assert_eq!(report.get("rows"), 2);
    let out = read_dataset(dir.path().join(EXPORT_EXTRACT_FILE))?;
    assert_eq!(out.header[0], "F0UCUS1");
    assert_eq!(out.records[0].get(0), Some("ABC123"));
    Ok(())
}

fn write_join_inputs(dir: &std::path::Path) -> Result<()> {
    fs::write(
        dir.join("export.csv"),
        format!("{EXPORT_HEADER}\nC00001,11,21,T1,K1,AC\nC00002,12,22,T2,K2,AC\n"),
    )?;
    fs::write(
        dir.join("customers.csv"),
        "customerId,cardId,account,terminalId\nC00003,13,23,9\n C00001,11,21,8\n",
    )?;
    Ok(())
}

#[test]
fn join_orders_rows_by_completeness() -> Result<()> {
    let dir = TempDir::new()?;
    write_join_inputs(dir.path())?;

    let report = join_exports(dir.path(), JoinKey::Customer, &ReconcileConfig::default())?;
    assert_eq!(report.get("rows"), 3);
    assert_eq!(report.get("group_0"), 1);
    assert_eq!(report.get("group_1"), 1);
    assert_eq!(report.get("group_2"), 1);
    assert_eq!(report.get("group_3"), 0);

    let out = read_dataset(dir.path().join(join_output_name(JoinKey::Customer)))?;
    assert_eq!(out.header.len(), 10);
    assert_eq!(out.header[0], "eq_cus");
    assert_eq!(out.header[9], "kibana_terminal");
    let firsts: Vec<(Option<&str>, Option<&str>)> =
        out.records.iter().map(|r| (r.get(0), r.get(6))).collect();
    assert_eq!(
        firsts,
        vec![
            (Some("C00001"), Some("C00001")),
            (Some("C00002"), None),
            (None, Some("C00003")),
        ]
    );

    // a rerun ignores its own output
    join_exports(dir.path(), JoinKey::Customer, &ReconcileConfig::default())?;
    Ok(())
}

#[test]
fn join_needs_exactly_one_file_of_each_layout() -> Result<()> {
    let dir = TempDir::new()?;
    write_join_inputs(dir.path())?;
    fs::write(dir.path().join("third.csv"), "a,b\n1,2\n")?;
    assert!(join_exports(dir.path(), JoinKey::Card, &ReconcileConfig::default()).is_err());

    let dir = TempDir::new()?;
    fs::write(dir.path().join("one.csv"), "a,b\n1,2\n")?;
    fs::write(dir.path().join("two.csv"), "c,d\n1,2\n")?;
    let err = join_exports(dir.path(), JoinKey::Card, &ReconcileConfig::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReconcileError>(),
        Some(ReconcileError::UnrecognizedDataset { .. })
    ));
    Ok(())
}
