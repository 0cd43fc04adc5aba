use ironjoin::classify::{group_counts, sort_flat_rows};
use ironjoin::{CompletenessGroup, JoinedRow, ReconcileError, sort_by_completeness, sort_rows};

fn row(tag: &str, left: [Option<&str>; 2], right: [Option<&str>; 2]) -> JoinedRow {
    let mut l: Vec<Option<String>> = vec![Some(tag.to_string())];
    l.extend(left.iter().map(|v| v.map(str::to_string)));
    JoinedRow::new(l, right.iter().map(|v| v.map(str::to_string)).collect())
}

fn tags(rows: &[JoinedRow]) -> Vec<&str> {
    rows.iter().filter_map(|r| r.left[0].as_deref()).collect()
}

#[test]
fn groups_are_decided_by_emptiness() {
    let full = row("a", [Some("1"), Some("2")], [Some("3"), Some("4")]);
    assert_eq!(full.group(), CompletenessGroup::Complete);
    let left = row("b", [Some("1"), Some("2")], [None, Some("  ")]);
    assert_eq!(left.group(), CompletenessGroup::LeftOnly);
    let partial = row("c", [Some("1"), None], [Some("3"), Some("4")]);
    assert_eq!(partial.group(), CompletenessGroup::Partial);

    let right_only = JoinedRow::new(
        vec![None, Some(" ".into())],
        vec![Some("x".into()), Some("y".into())],
    );
    assert_eq!(right_only.group(), CompletenessGroup::RightOnly);
    let empty = JoinedRow::new(vec![None], vec![None]);
    assert_eq!(empty.group(), CompletenessGroup::Partial);
}

#[test]
fn sort_is_a_stable_partition() {
    let rows = vec![
        row("p1", [None, Some("x")], [None, None]),
        row("l1", [Some("1"), Some("2")], [None, None]),
        row("c1", [Some("1"), Some("2")], [Some("3"), Some("4")]),
        row("l2", [Some("5"), Some("6")], [None, None]),
        row("p2", [Some("1"), Some("2")], [Some("3"), None]),
        row("c2", [Some("9"), Some("9")], [Some("9"), Some("9")]),
    ];
    let sorted = sort_by_completeness(rows);
    assert_eq!(tags(&sorted), vec!["c1", "c2", "l1", "l2", "p1", "p2"]);
    let groups: Vec<_> = sorted.iter().map(JoinedRow::group).collect();
    assert!(groups.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn sorting_twice_changes_nothing() {
    let rows = vec![
        row("l", [Some("1"), Some("2")], [None, None]),
        row("c", [Some("1"), Some("2")], [Some("3"), Some("4")]),
    ];
    let once = sort_by_completeness(rows);
    let twice = sort_by_completeness(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn width_mismatch_is_rejected() {
    let rows = vec![JoinedRow::new(vec![Some("a".into())], vec![None, None])];
    assert_eq!(
        sort_rows(rows, 1, 1).unwrap_err(),
        ReconcileError::WidthMismatch {
            expected: 2,
            actual: 3
        }
    );
}

#[test]
fn flat_rows_are_split_then_sorted() -> anyhow::Result<()> {
    let rows = vec![
        vec![None, Some("r".into())],
        vec![Some("l".into()), Some("r".into())],
    ];
    let sorted = sort_flat_rows(rows, 1, 1)?;
    assert_eq!(sorted[0].group(), CompletenessGroup::Complete);
    assert_eq!(sorted[1].group(), CompletenessGroup::RightOnly);
    assert!(sort_flat_rows(vec![vec![None]], 1, 1).is_err());
    Ok(())
}

#[test]
fn counts_per_group() {
    let rows = vec![
        row("c", [Some("1"), Some("2")], [Some("3"), Some("4")]),
        row("l", [Some("1"), Some("2")], [None, None]),
        row("l", [Some("1"), Some("2")], [None, None]),
    ];
    assert_eq!(group_counts(&rows), [1, 2, 0, 0]);
    assert_eq!(CompletenessGroup::Partial.index(), 3);
}
