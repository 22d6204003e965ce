//! Column Reconciler: computes the fields common to two header lists,
//! under either exact or case-insensitive matching, plus the fields
//! unique to each side.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::FieldNameMode;

/// One common field's canonical name and its original spelling on each
/// side. Under `case_sensitive` matching `canonical == a == b`; under
/// `case_insensitive` matching `canonical` is the lower-cased form and
/// `a`/`b` retain whatever casing each source actually used, so the
/// Comparator can still look cells up in each source's rows without
/// renaming anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub canonical: String,
    pub a: String,
    pub b: String,
}

/// Output of a single reconciliation. Its lifetime is at most one
/// `compare()` call — it is not meant to be cached across calls with
/// different header lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledFields {
    pub common: Vec<String>,
    pub common_mapped: Vec<FieldMapping>,
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    pub is_exact_match: bool,
}

/// Computes the common and side-exclusive field sets for two header
/// lists. `common` (and `common_mapped`) preserve the A-side header
/// order; there are no failure modes, only empty outputs for empty
/// inputs.
pub fn reconcile(headers_a: &[String], headers_b: &[String], field_name_mode: FieldNameMode) -> ReconciledFields {
    match field_name_mode {
        FieldNameMode::CaseSensitive => reconcile_case_sensitive(headers_a, headers_b),
        FieldNameMode::CaseInsensitive => reconcile_case_insensitive(headers_a, headers_b),
    }
}

fn reconcile_case_sensitive(headers_a: &[String], headers_b: &[String]) -> ReconciledFields {
    let set_b: HashSet<&str> = headers_b.iter().map(String::as_str).collect();
    let set_a: HashSet<&str> = headers_a.iter().map(String::as_str).collect();

    let mut common = Vec::new();
    let mut common_mapped = Vec::new();
    for h in headers_a {
        if set_b.contains(h.as_str()) {
            common.push(h.clone());
            common_mapped.push(FieldMapping {
                canonical: h.clone(),
                a: h.clone(),
                b: h.clone(),
            });
        }
    }

    let only_in_a: Vec<String> = headers_a
        .iter()
        .filter(|h| !set_b.contains(h.as_str()))
        .cloned()
        .collect();
    let only_in_b: Vec<String> = headers_b
        .iter()
        .filter(|h| !set_a.contains(h.as_str()))
        .cloned()
        .collect();

    let is_exact_match = only_in_a.is_empty() && only_in_b.is_empty();
    ReconciledFields {
        common,
        common_mapped,
        only_in_a,
        only_in_b,
        is_exact_match,
    }
}

fn reconcile_case_insensitive(headers_a: &[String], headers_b: &[String]) -> ReconciledFields {
    let lower_b: HashSet<String> = headers_b.iter().map(|h| h.to_lowercase()).collect();
    let lower_a: HashSet<String> = headers_a.iter().map(|h| h.to_lowercase()).collect();

    let mut common = Vec::new();
    let mut common_mapped = Vec::new();
    for h in headers_a {
        let lower = h.to_lowercase();
        if lower_b.contains(&lower) {
            let original_b = headers_b
                .iter()
                .find(|b| b.to_lowercase() == lower)
                .cloned()
                .unwrap_or_else(|| lower.clone());
            common.push(lower.clone());
            common_mapped.push(FieldMapping {
                canonical: lower,
                a: h.clone(),
                b: original_b,
            });
        }
    }

    let only_in_a: Vec<String> = headers_a
        .iter()
        .filter(|h| !lower_b.contains(&h.to_lowercase()))
        .cloned()
        .collect();
    let only_in_b: Vec<String> = headers_b
        .iter()
        .filter(|h| !lower_a.contains(&h.to_lowercase()))
        .cloned()
        .collect();

    let is_exact_match = only_in_a.is_empty() && only_in_b.is_empty();
    ReconciledFields {
        common,
        common_mapped,
        only_in_a,
        only_in_b,
        is_exact_match,
    }
}

#[cfg(test)]
mod reconcile_tests;
