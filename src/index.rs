//! Key Indexer: groups rows by composite key for one side of a
//! comparison, in original row order, and reports which base keys
//! recurred. Suffixing a duplicate base key into `{base}#1 .. {base}#n`
//! is a presentation concern that depends on *both* sides' occurrence
//! counts (see `compare::pair_occurrences`), so this component exposes
//! the raw occurrence groups rather than baking a suffix into its own
//! lookup keys.

use std::collections::HashMap;

use crate::model::Row;

/// The three-byte delimiter joining key-column values into a composite
/// key. Chosen to be absent from any plausible business data; any
/// textual serialization of a key must preserve these bytes exactly (see
/// crate docs on the NUL-delimited composite key).
pub const KEY_DELIMITER: &str = "\u{0}|\u{0}";

/// Composite key for one row under the given key columns. A missing
/// cell stringifies to the empty string, same as everywhere else in the
/// engine.
pub fn composite_key(row: &Row, key_columns: &[String]) -> String {
    key_columns
        .iter()
        .map(|c| row.get(c).stringify())
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

/// Rows of one `Dataset` grouped by composite (base) key, in original
/// row order. Built and consumed within a single comparison.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    groups: HashMap<String, Vec<usize>>,
    /// Base keys in first-seen order; this is the per-side deterministic
    /// iteration order the Comparator walks.
    order: Vec<String>,
    /// Base keys with more than one occurrence, and their multiplicity.
    pub duplicates: Vec<(String, usize)>,
}

impl KeyIndex {
    /// Groups `rows` by composite key. Every row is retained: a base key
    /// with `n` occurrences keeps all `n` row positions, in original
    /// order, under that one base key.
    pub fn build(rows: &[Row], key_columns: &[String]) -> Self {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let base_key = composite_key(row, key_columns);
            if !groups.contains_key(&base_key) {
                order.push(base_key.clone());
            }
            groups.entry(base_key).or_default().push(i);
        }

        let duplicates = order
            .iter()
            .filter_map(|k| {
                let n = groups[k].len();
                (n > 1).then(|| (k.clone(), n))
            })
            .collect();

        Self {
            groups,
            order,
            duplicates,
        }
    }

    /// Base keys in this side's deterministic first-seen order.
    pub fn base_keys_in_order(&self) -> &[String] {
        &self.order
    }

    /// Original row positions for a base key, in original order. Empty
    /// if the key does not occur on this side.
    pub fn occurrences(&self, base_key: &str) -> &[usize] {
        self.groups.get(base_key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, base_key: &str) -> bool {
        self.groups.contains_key(base_key)
    }

    pub fn row_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod index_tests;
