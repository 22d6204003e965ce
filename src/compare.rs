//! Comparator: the orchestrator. Reconciles columns, indexes (or
//! positionally aligns) both sides, walks the union of keys, computes
//! per-field differences, and emits a sorted `ComparisonResult`.

use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::cancel::CancellationToken;
use crate::diff::adaptive_diff;
use crate::error::{CompareError, Result};
use crate::index::{KeyIndex, KEY_DELIMITER};
use crate::model::{
    Cell, ComparisonResult, ComparisonRow, Dataset, FieldNameMode, MatchMode, Options,
    ProgressEvent, ProgressPhase, Row, RowStatus, Summary, ValueMode,
};
use crate::normalize::compare_values;
use crate::reconcile::{reconcile, FieldMapping};

/// Cadence (in processed keys) at which the progress callback and the
/// cancellation poll both fire, per the crate's concurrency notes.
const PROGRESS_STRIDE: usize = 100;

/// Public entry point (§6.1 `compare`). No network or file I/O;
/// deterministic given the same inputs and `Options`.
pub fn compare(
    dataset_a: &Dataset,
    dataset_b: &Dataset,
    options: &Options,
    cancellation_token: Option<&CancellationToken>,
) -> Result<ComparisonResult> {
    validate_dataset(dataset_a)?;
    validate_dataset(dataset_b)?;

    if dataset_a.rows.is_empty() && dataset_b.rows.is_empty() {
        debug!(
            "compare: '{}' and '{}' both have zero rows, returning an empty result",
            dataset_a.source_name, dataset_b.source_name
        );
        return Ok(empty_result(dataset_a, dataset_b));
    }

    let ci = options.field_name_mode == FieldNameMode::CaseInsensitive;
    let reconciled = reconcile(&dataset_a.headers, &dataset_b.headers, options.field_name_mode);
    debug!(
        "compare: reconciled {} common field(s), {} only in A, {} only in B",
        reconciled.common.len(),
        reconciled.only_in_a.len(),
        reconciled.only_in_b.len()
    );

    let by_canonical: HashMap<String, &FieldMapping> = reconciled
        .common_mapped
        .iter()
        .map(|m| (m.canonical.clone(), m))
        .collect();

    for kc in &options.key_columns {
        if !by_canonical.contains_key(&canonicalize(kc, ci)) {
            return Err(CompareError::KeyColumnsNotCommon(kc.clone()));
        }
    }

    let compare_fields = effective_compare_fields(&reconciled.common, &options.compare_fields, ci);

    match options.match_mode {
        MatchMode::ByKey => {
            compare_by_key(dataset_a, dataset_b, options, &by_canonical, &compare_fields, ci, cancellation_token)
        }
        MatchMode::ByPosition => {
            compare_by_position(dataset_a, dataset_b, options, &by_canonical, &compare_fields, ci, cancellation_token)
        }
    }
}

fn canonicalize(name: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

fn effective_compare_fields(common: &[String], requested: &[String], ci: bool) -> Vec<String> {
    if requested.is_empty() {
        return common.to_vec();
    }
    let wanted: HashSet<String> = requested.iter().map(|f| canonicalize(f, ci)).collect();
    common.iter().filter(|c| wanted.contains(c.as_str())).cloned().collect()
}

fn validate_dataset(dataset: &Dataset) -> Result<()> {
    if dataset.source_name.trim().is_empty() {
        return Err(CompareError::InvalidDataset {
            source: dataset.source_name.clone(),
            reason: "source name must not be empty".to_string(),
        });
    }
    let mut seen = HashSet::with_capacity(dataset.headers.len());
    for h in &dataset.headers {
        if !seen.insert(h.as_str()) {
            return Err(CompareError::InvalidDataset {
                source: dataset.source_name.clone(),
                reason: format!("duplicate header '{h}'"),
            });
        }
    }
    Ok(())
}

fn empty_result(dataset_a: &Dataset, dataset_b: &Dataset) -> ComparisonResult {
    ComparisonResult {
        source_name_a: dataset_a.source_name.clone(),
        source_name_b: dataset_b.source_name.clone(),
        table_label: table_label(dataset_a, dataset_b),
        summary: Summary::default(),
        rows: Vec::new(),
        duplicate_keys_a: Vec::new(),
        duplicate_keys_b: Vec::new(),
    }
}

fn table_label(dataset_a: &Dataset, dataset_b: &Dataset) -> String {
    format!("{} vs {}", dataset_a.source_name, dataset_b.source_name)
}

fn summarize(rows: &[ComparisonRow]) -> Summary {
    let mut summary = Summary {
        total: rows.len(),
        ..Summary::default()
    };
    for row in rows {
        match row.status {
            RowStatus::Match => summary.matched += 1,
            RowStatus::Differ => summary.differ += 1,
            RowStatus::OnlyInA => summary.only_in_a += 1,
            RowStatus::OnlyInB => summary.only_in_b += 1,
        }
    }
    summary
}

fn maybe_report_progress(options: &Options, processed: usize, total: usize, done: bool) {
    let Some(callback) = &options.progress_callback else {
        return;
    };
    if !done && processed % PROGRESS_STRIDE != 0 {
        return;
    }
    let percent = if total == 0 {
        100.0
    } else {
        (processed as f64 / total as f64) * 100.0
    };
    callback(ProgressEvent {
        phase: if done { ProgressPhase::Done } else { ProgressPhase::Comparing },
        processed,
        total,
        percent,
    });
}

/// `presentation_key` carries the only place a duplicate-key `#N` suffix
/// lives (see `compare_by_key`'s `suffix_needed` logic). When the key is
/// built from real `key_columns` rather than the synthetic `KEY` field,
/// the suffix must still end up somewhere in `key` or two duplicate
/// occurrences of the same base key would produce indistinguishable
/// `ComparisonRow`s — violating the "a composite key never appears more
/// than once per side" invariant. So: append the suffix onto the last key
/// column's value whenever `presentation_key` is the unsuffixed key plus
/// a `#<digits>` tail. `by_position` mode's synthetic `"Row {i}"` key
/// never matches that shape (it isn't a suffix of any real column value),
/// so this leaves position-mode keys untouched.
fn build_key_field(
    options: &Options,
    by_canonical: &HashMap<String, &FieldMapping>,
    ci: bool,
    presentation_key: &str,
    row_a: Option<&Row>,
    row_b: Option<&Row>,
) -> Vec<(String, Cell)> {
    if options.key_columns.is_empty() {
        return vec![("KEY".to_string(), Cell::Text(presentation_key.to_string()))];
    }
    let mut key: Vec<(String, Cell)> = options
        .key_columns
        .iter()
        .map(|kc| {
            let mapping = by_canonical.get(&canonicalize(kc, ci));
            let value = mapping
                .and_then(|m| row_a.map(|r| r.get(&m.a)))
                .filter(|c| !c.is_null())
                .or_else(|| mapping.and_then(|m| row_b.map(|r| r.get(&m.b))))
                .unwrap_or(Cell::Null);
            (kc.clone(), value)
        })
        .collect();

    let unsuffixed = key
        .iter()
        .map(|(_, cell)| cell.stringify())
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER);
    if let Some(suffix) = presentation_key.strip_prefix(&unsuffixed) {
        if suffix.starts_with('#') && suffix[1..].chars().all(|c| c.is_ascii_digit()) && !suffix[1..].is_empty() {
            if let Some((_, last_value)) = key.last_mut() {
                let mut suffixed = last_value.stringify();
                suffixed.push_str(suffix);
                *last_value = Cell::Text(suffixed);
            }
        }
    }
    key
}

#[allow(clippy::too_many_arguments)]
fn build_comparison_row(
    options: &Options,
    by_canonical: &HashMap<String, &FieldMapping>,
    compare_fields: &[String],
    ci: bool,
    presentation_key: &str,
    row_a: Option<&Row>,
    row_b: Option<&Row>,
    index_a: Option<usize>,
    index_b: Option<usize>,
) -> ComparisonRow {
    let key = build_key_field(options, by_canonical, ci, presentation_key, row_a, row_b);

    match (row_a, row_b) {
        (Some(a), Some(b)) => {
            let normalized = options.value_mode == ValueMode::Normalized;
            let mut differences = Vec::new();
            for field in compare_fields {
                let Some(mapping) = by_canonical.get(field.as_str()) else {
                    continue;
                };
                let av = a.get(&mapping.a);
                let bv = b.get(&mapping.b);
                if !compare_values(&av, &bv, normalized, options.serial_dates) {
                    let fd = adaptive_diff(&av.stringify(), &bv.stringify(), options.change_ratio_threshold)
                        .with_field_name(field.clone());
                    differences.push(fd);
                }
            }
            let status = if differences.is_empty() { RowStatus::Match } else { RowStatus::Differ };
            ComparisonRow {
                key,
                status,
                data_a: Some(a.clone()),
                data_b: Some(b.clone()),
                differences,
                index_a,
                index_b,
            }
        }
        (Some(a), None) => ComparisonRow {
            key,
            status: RowStatus::OnlyInA,
            data_a: Some(a.clone()),
            data_b: None,
            differences: Vec::new(),
            index_a,
            index_b,
        },
        (None, Some(b)) => ComparisonRow {
            key,
            status: RowStatus::OnlyInB,
            data_a: None,
            data_b: Some(b.clone()),
            differences: Vec::new(),
            index_a,
            index_b,
        },
        (None, None) => unreachable!("a row pairing must have at least one side present"),
    }
}

fn sort_rows(rows: &mut [ComparisonRow]) {
    rows.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.key_string().cmp(&b.key_string())));
}

fn check_cancelled(token: Option<&CancellationToken>) -> Result<()> {
    if token.is_some_and(CancellationToken::is_cancelled) {
        warn!("compare: cancellation token tripped, aborting without a partial result");
        return Err(CompareError::Cancelled);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn compare_by_key(
    dataset_a: &Dataset,
    dataset_b: &Dataset,
    options: &Options,
    by_canonical: &HashMap<String, &FieldMapping>,
    compare_fields: &[String],
    ci: bool,
    token: Option<&CancellationToken>,
) -> Result<ComparisonResult> {
    let key_cols_a: Vec<String> = options
        .key_columns
        .iter()
        .filter_map(|kc| by_canonical.get(&canonicalize(kc, ci)).map(|m| m.a.clone()))
        .collect();
    let key_cols_b: Vec<String> = options
        .key_columns
        .iter()
        .filter_map(|kc| by_canonical.get(&canonicalize(kc, ci)).map(|m| m.b.clone()))
        .collect();

    let idx_a = KeyIndex::build(&dataset_a.rows, &key_cols_a);
    let idx_b = KeyIndex::build(&dataset_b.rows, &key_cols_b);

    if !idx_a.duplicates.is_empty() || !idx_b.duplicates.is_empty() {
        trace!(
            "compare: {} duplicate base key(s) in A, {} in B",
            idx_a.duplicates.len(),
            idx_b.duplicates.len()
        );
    }

    // Union of base keys: A's first-seen order, then B's keys not already seen.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut base_keys: Vec<&str> = Vec::new();
    for k in idx_a.base_keys_in_order() {
        if seen.insert(k.as_str()) {
            base_keys.push(k.as_str());
        }
    }
    for k in idx_b.base_keys_in_order() {
        if seen.insert(k.as_str()) {
            base_keys.push(k.as_str());
        }
    }

    let total = base_keys.len();
    let mut rows_out = Vec::new();
    for (processed, base_key) in base_keys.into_iter().enumerate() {
        check_cancelled(token)?;

        let occ_a = idx_a.occurrences(base_key);
        let occ_b = idx_b.occurrences(base_key);
        let n = occ_a.len().max(occ_b.len());
        // Duplicates on either side are paired positionally: occurrence i
        // of A against occurrence i of B, so a base key present on both
        // sides but with different multiplicities still pairs its shared
        // occurrences and reports the extras as only_in_a/only_in_b.
        let suffix_needed = n > 1;
        for i in 0..n {
            let row_a = occ_a.get(i).map(|&idx| &dataset_a.rows[idx]);
            let row_b = occ_b.get(i).map(|&idx| &dataset_b.rows[idx]);
            let presentation_key = if suffix_needed {
                format!("{base_key}#{}", i + 1)
            } else {
                base_key.to_string()
            };
            rows_out.push(build_comparison_row(
                options,
                by_canonical,
                compare_fields,
                ci,
                &presentation_key,
                row_a,
                row_b,
                occ_a.get(i).copied(),
                occ_b.get(i).copied(),
            ));
        }

        maybe_report_progress(options, processed + 1, total, false);
    }
    maybe_report_progress(options, total, total, true);

    sort_rows(&mut rows_out);
    let summary = summarize(&rows_out);

    Ok(ComparisonResult {
        source_name_a: dataset_a.source_name.clone(),
        source_name_b: dataset_b.source_name.clone(),
        table_label: table_label(dataset_a, dataset_b),
        summary,
        rows: rows_out,
        duplicate_keys_a: idx_a.duplicates,
        duplicate_keys_b: idx_b.duplicates,
    })
}

fn compare_by_position(
    dataset_a: &Dataset,
    dataset_b: &Dataset,
    options: &Options,
    by_canonical: &HashMap<String, &FieldMapping>,
    compare_fields: &[String],
    ci: bool,
    token: Option<&CancellationToken>,
) -> Result<ComparisonResult> {
    let total = dataset_a.rows.len().max(dataset_b.rows.len());
    let mut rows_out = Vec::with_capacity(total);

    for i in 0..total {
        check_cancelled(token)?;

        let row_a = dataset_a.rows.get(i);
        let row_b = dataset_b.rows.get(i);
        let presentation_key = format!("Row {}", i + 1);
        rows_out.push(build_comparison_row(
            options,
            by_canonical,
            compare_fields,
            ci,
            &presentation_key,
            row_a,
            row_b,
            row_a.map(|_| i),
            row_b.map(|_| i),
        ));

        maybe_report_progress(options, i + 1, total, false);
    }
    maybe_report_progress(options, total, total, true);

    sort_rows(&mut rows_out);
    let summary = summarize(&rows_out);

    Ok(ComparisonResult {
        source_name_a: dataset_a.source_name.clone(),
        source_name_b: dataset_b.source_name.clone(),
        table_label: table_label(dataset_a, dataset_b),
        summary,
        rows: rows_out,
        duplicate_keys_a: Vec::new(),
        duplicate_keys_b: Vec::new(),
    })
}

#[cfg(test)]
mod compare_tests;
