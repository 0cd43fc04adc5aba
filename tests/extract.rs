use ironjoin::ReconcileError;
use ironjoin::extract::{
    DEFAULT_VALUE_PATTERN, LabelScanner, MatchMode, Rule, RuleSet, customer_rules, export_rules,
    scan_labeled,
};

const FULL: &str =
    r#"2024-05-01,INFO,"req customerId=A9WH99 cardId=468 account=9817 terminalId=228038 ok""#;

#[test]
fn all_or_nothing_extracts_complete_tuples() {
    let rules = customer_rules();
    assert_eq!(rules.mode(), MatchMode::AllOrNothing);
    assert_eq!(
        rules.header(),
        vec!["customerId", "cardId", "account", "terminalId"]
    );
    let rec = rules.extract(FULL).expect("complete line");
    assert_eq!(rec.get(0), Some("A9WH99"));
    assert_eq!(rec.get(1), Some("468"));
    assert_eq!(rec.get(2), Some("9817"));
    assert_eq!(rec.get(3), Some("228038"));
}

#[test]
fn all_or_nothing_drops_partial_lines() {
    let rules = customer_rules();
    assert!(rules.extract("customerId=A9WH99 cardId=468 account=9817").is_none());
    assert!(rules.extract("").is_none());
}

#[test]
fn first_match_is_taken() {
    let rules = customer_rules();
    let line = "customerId=AAAAA1 customerId=BBBBB2 cardId=1 account=2 terminalId=3";
    assert_eq!(rules.extract(line).and_then(|r| r.get(0).map(String::from)), Some("AAAAA1".into()));
}

#[test]
fn extract_all_skips_non_matching_lines() {
    let rules = customer_rules();
    let lines = [FULL, "noise", FULL];
    assert_eq!(rules.extract_all(lines).count(), 2);
}

#[test]
fn best_effort_leaves_missing_fields_empty() {
    let rules = export_rules();
    assert_eq!(rules.mode(), MatchMode::BestEffort);
    let rec = rules.extract("row ABC123 12345678 end").expect("non-blank line");
    assert_eq!(rec.len(), 6);
    assert_eq!(rec.get(0), Some("ABC123"));
    assert_eq!(rec.get(1), Some("12345678"));
    assert_eq!(rec.get(2), None);

    let nothing = rules.extract("no ids here").expect("non-blank line");
    assert!(nothing.is_blank());
    assert!(rules.extract("   ").is_none());
}

#[test]
fn custom_rules_from_patterns() -> anyhow::Result<()> {
    let rules = RuleSet::from_patterns(
        MatchMode::BestEffort,
        &[("user", r"user=(\w+)"), ("code", r"\b\d{3}\b")],
    )?;
    let rec = rules.extract("GET user=bob 404").expect("record");
    assert_eq!(rec.get(0), Some("bob"));
    assert_eq!(rec.get(1), Some("404"));
    Ok(())
}

#[test]
fn invalid_pattern_is_rejected() {
    let err = Rule::new("broken", "(unclosed").unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidRule { ref name, .. } if name == "broken"));
}

#[test]
fn labeled_rule_requires_word_boundary() -> anyhow::Result<()> {
    let rule = Rule::labeled("cardId", "[0-9]+")?;
    assert_eq!(rule.name(), "cardId");
    assert_eq!(rule.find("cardId=123 x"), Some("123"));
    assert_eq!(rule.find("cardId=123abc"), None);
    Ok(())
}

#[test]
fn scanner_yields_every_occurrence() -> anyhow::Result<()> {
    let scanner = LabelScanner::new("filter", DEFAULT_VALUE_PATTERN)?;
    assert_eq!(scanner.label(), "filter");
    let found: Vec<&str> = scanner
        .scan("a filter=AB12 b filter=CD34,filter=ef filter=GH")
        .collect();
    assert_eq!(found, vec!["AB12", "CD34", "GH"]);
    assert_eq!(scanner.scan("nothing").count(), 0);
    Ok(())
}

#[test]
fn one_shot_scan() -> anyhow::Result<()> {
    let found = scan_labeled("id=7 x id=42", "id", "[0-9]+")?;
    assert_eq!(found, vec!["7", "42"]);
    assert!(scan_labeled("id=7", "id", "[").is_err());
    Ok(())
}
