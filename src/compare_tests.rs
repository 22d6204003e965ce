use std::sync::{Arc, Mutex};

use super::*;
use crate::model::{Cell, SourceKind};

fn dataset(name: &str, headers: &[&str], rows: Vec<Vec<(&str, Cell)>>) -> Dataset {
    let rows = rows
        .into_iter()
        .map(|pairs| Row::from_pairs(pairs.into_iter().map(|(k, v)| (k.to_string(), v))))
        .collect();
    Dataset::new(name, headers.iter().map(|h| h.to_string()).collect(), SourceKind::File).with_rows(rows)
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn find<'a>(result: &'a ComparisonResult, key: &str) -> &'a ComparisonRow {
    result
        .rows
        .iter()
        .find(|r| r.key_string() == key)
        .unwrap_or_else(|| panic!("no row with key {key:?} in {:?}", result.rows.iter().map(ComparisonRow::key_string).collect::<Vec<_>>()))
}

#[test]
fn scenario_match_differ_and_exclusives_with_single_key() {
    let a = dataset(
        "A",
        &["ID", "NAME"],
        vec![
            vec![("ID", text("1")), ("NAME", text("Alice"))],
            vec![("ID", text("2")), ("NAME", text("Bob"))],
            vec![("ID", text("3")), ("NAME", text("Carol"))],
        ],
    );
    let b = dataset(
        "B",
        &["ID", "NAME"],
        vec![
            vec![("ID", text("1")), ("NAME", text("Alice"))],
            vec![("ID", text("2")), ("NAME", text("Bobby"))],
            vec![("ID", text("4")), ("NAME", text("Dan"))],
        ],
    );
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(result.summary.total, 4);
    assert_eq!(result.summary.matched, 1);
    assert_eq!(result.summary.differ, 1);
    assert_eq!(result.summary.only_in_a, 1);
    assert_eq!(result.summary.only_in_b, 1);

    assert_eq!(find(&result, "1").status, RowStatus::Match);
    let row2 = find(&result, "2");
    assert_eq!(row2.status, RowStatus::Differ);
    assert_eq!(row2.differences.len(), 1);
    assert_eq!(row2.differences[0].field_name, "NAME");
    assert_eq!(find(&result, "3").status, RowStatus::OnlyInA);
    assert_eq!(find(&result, "4").status, RowStatus::OnlyInB);
}

#[test]
fn scenario_adaptive_threshold_boundary_surfaces_in_differences() {
    let a = dataset("A", &["ID", "DESC"], vec![vec![("ID", text("1")), ("DESC", text("hello world"))]]);
    let b = dataset("B", &["ID", "DESC"], vec![vec![("ID", text("1")), ("DESC", text("hello WORLD"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];
    options.change_ratio_threshold = 0.5;

    let result = compare(&a, &b, &options, None).unwrap();
    let row = find(&result, "1");
    assert_eq!(row.status, RowStatus::Differ);
    assert_eq!(row.differences[0].kind, crate::diff::FieldDiffKind::CharDiff);

    options.change_ratio_threshold = 0.4;
    let result = compare(&a, &b, &options, None).unwrap();
    let row = find(&result, "1");
    assert_eq!(row.differences[0].kind, crate::diff::FieldDiffKind::CellDiff);
}

#[test]
fn scenario_composite_keys_with_duplicates_pair_positionally() {
    let a = dataset(
        "A",
        &["S", "T", "V"],
        vec![
            vec![("S", text("X")), ("T", text("1")), ("V", text("a"))],
            vec![("S", text("X")), ("T", text("1")), ("V", text("b"))],
        ],
    );
    let b = dataset(
        "B",
        &["S", "T", "V"],
        vec![vec![("S", text("X")), ("T", text("1")), ("V", text("a"))]],
    );
    let mut options = Options::default();
    options.key_columns = vec!["S".to_string(), "T".to_string()];

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(result.summary.total, 2);
    assert_eq!(result.summary.matched, 1);
    assert_eq!(result.summary.only_in_a, 1);

    let base = format!("X{}1", crate::index::KEY_DELIMITER);
    let first = find(&result, &format!("{base}#1"));
    assert_eq!(first.status, RowStatus::Match);
    let second = find(&result, &format!("{base}#2"));
    assert_eq!(second.status, RowStatus::OnlyInA);

    assert_eq!(result.duplicate_keys_a, vec![(base, 2)]);
    assert!(result.duplicate_keys_b.is_empty());
}

#[test]
fn scenario_normalized_dates_across_locales_match() {
    let a = dataset("A", &["ID", "D"], vec![vec![("ID", text("1")), ("D", text("2024-01-05"))]]);
    let b = dataset("B", &["ID", "D"], vec![vec![("ID", text("1")), ("D", text("5-1-2024"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];
    options.value_mode = ValueMode::Normalized;

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(find(&result, "1").status, RowStatus::Match);
}

#[test]
fn scenario_case_insensitive_field_names_still_diff_by_value() {
    let a = dataset("A", &["Id", "City"], vec![vec![("Id", text("1")), ("City", text("Lyon"))]]);
    let b = dataset("B", &["ID", "CITY"], vec![vec![("ID", text("1")), ("CITY", text("Paris"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["id".to_string()];
    options.field_name_mode = FieldNameMode::CaseInsensitive;

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(result.summary.total, 1);
    let row = find(&result, "1");
    assert_eq!(row.status, RowStatus::Differ);
    assert_eq!(row.differences[0].field_name, "city");
}

#[test]
fn cancellation_aborts_without_a_partial_result() {
    let a = dataset("A", &["ID"], vec![vec![("ID", text("1"))], vec![("ID", text("2"))]]);
    let b = dataset("B", &["ID"], vec![vec![("ID", text("1"))], vec![("ID", text("2"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];

    let token = CancellationToken::new();
    token.cancel();
    let err = compare(&a, &b, &options, Some(&token)).unwrap_err();
    assert!(matches!(err, CompareError::Cancelled));
}

#[test]
fn key_column_not_common_is_rejected() {
    let a = dataset("A", &["ID"], vec![vec![("ID", text("1"))]]);
    let b = dataset("B", &["OTHER"], vec![vec![("OTHER", text("1"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];

    let err = compare(&a, &b, &options, None).unwrap_err();
    assert!(matches!(err, CompareError::KeyColumnsNotCommon(ref f) if f == "ID"));
}

#[test]
fn empty_inputs_yield_a_valid_empty_result_not_an_error() {
    let a = dataset("A", &["ID"], vec![]);
    let b = dataset("B", &["ID"], vec![]);
    let options = Options::default();

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(result.summary.total, 0);
    assert!(result.rows.is_empty());
}

#[test]
fn invalid_dataset_rejects_empty_source_name() {
    let a = dataset("", &["ID"], vec![vec![("ID", text("1"))]]);
    let b = dataset("B", &["ID"], vec![vec![("ID", text("1"))]]);
    let options = Options::default();

    let err = compare(&a, &b, &options, None).unwrap_err();
    assert!(matches!(err, CompareError::InvalidDataset { .. }));
}

#[test]
fn invalid_dataset_rejects_duplicate_headers() {
    let a = dataset("A", &["ID", "ID"], vec![vec![("ID", text("1"))]]);
    let b = dataset("B", &["ID"], vec![vec![("ID", text("1"))]]);
    let options = Options::default();

    let err = compare(&a, &b, &options, None).unwrap_err();
    assert!(matches!(err, CompareError::InvalidDataset { .. }));
}

#[test]
fn by_position_mode_pairs_rows_by_ordinal_regardless_of_value() {
    let a = dataset("A", &["V"], vec![vec![("V", text("a"))], vec![("V", text("b"))]]);
    let b = dataset("B", &["V"], vec![vec![("V", text("a"))], vec![("V", text("x"))], vec![("V", text("c"))]]);
    let mut options = Options::default();
    options.match_mode = MatchMode::ByPosition;

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(result.summary.total, 3);
    assert_eq!(find(&result, "Row 1").status, RowStatus::Match);
    assert_eq!(find(&result, "Row 2").status, RowStatus::Differ);
    assert_eq!(find(&result, "Row 3").status, RowStatus::OnlyInB);
}

#[test]
fn comparison_is_deterministic_across_repeated_runs() {
    let a = dataset("A", &["ID", "V"], vec![vec![("ID", text("2")), ("V", text("x"))], vec![("ID", text("1")), ("V", text("y"))]]);
    let b = dataset("B", &["ID", "V"], vec![vec![("ID", text("1")), ("V", text("y"))], vec![("ID", text("2")), ("V", text("z"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];

    let first = compare(&a, &b, &options, None).unwrap();
    let second = compare(&a, &b, &options, None).unwrap();
    let keys_first: Vec<String> = first.rows.iter().map(ComparisonRow::key_string).collect();
    let keys_second: Vec<String> = second.rows.iter().map(ComparisonRow::key_string).collect();
    assert_eq!(keys_first, keys_second);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn every_row_is_accounted_for_in_the_summary() {
    let a = dataset("A", &["ID"], vec![vec![("ID", text("1"))], vec![("ID", text("2"))]]);
    let b = dataset("B", &["ID"], vec![vec![("ID", text("2"))], vec![("ID", text("3"))]]);
    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];

    let result = compare(&a, &b, &options, None).unwrap();
    let accounted = result.summary.matched + result.summary.differ + result.summary.only_in_a + result.summary.only_in_b;
    assert_eq!(accounted, result.summary.total);
    assert_eq!(result.rows.len(), result.summary.total);
}

#[test]
fn progress_callback_fires_at_the_documented_stride_and_once_at_completion() {
    let rows: Vec<Vec<(&str, Cell)>> = (1..=250).map(|i| vec![("ID", Cell::Number(i as f64))]).collect();
    let a = dataset("A", &["ID"], rows.clone());
    let b = dataset("B", &["ID"], rows);

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let collector = events.clone();

    let mut options = Options::default();
    options.key_columns = vec!["ID".to_string()];
    options.progress_callback = Some(Arc::new(move |event| collector.lock().unwrap().push(event)));

    let result = compare(&a, &b, &options, None).unwrap();
    assert_eq!(result.summary.total, 250);

    let events = events.lock().unwrap();
    // Stride of 100 over 250 keys reports at 100 and 200, plus one final
    // call at completion (processed == total, phase == Done).
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].processed, 100);
    assert_eq!(events[0].phase, ProgressPhase::Comparing);
    assert_eq!(events[1].processed, 200);
    assert_eq!(events[1].phase, ProgressPhase::Comparing);
    assert_eq!(events[2].processed, 250);
    assert_eq!(events[2].total, 250);
    assert_eq!(events[2].phase, ProgressPhase::Done);
    assert!((events[2].percent - 100.0).abs() < 1e-9);
}
