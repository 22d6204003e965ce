//! Core data model shared by every component of the comparison engine:
//! the caller-supplied inputs (`Dataset`, `Cell`, `Options`) and the final
//! output (`ComparisonResult`, `ComparisonRow`, `Summary`).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single cell value, tagged by its original shape.
///
/// Modeling this as a tagged union (rather than a string blob re-parsed at
/// every comparison) means each value is interpreted once, at ingestion
/// time, by whichever external collaborator built the `Dataset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Canonical ISO `YYYY-MM-DD`. Callers that already know a cell is a
    /// date are expected to normalize it to this form before handing it
    /// to the engine; the Value Normalizer (`normalize::normalize_date`)
    /// is available for that purpose but is not invoked implicitly here.
    Date(String),
    /// Unparsed input the caller could not classify; still a candidate
    /// for date/number normalization under `value_mode = normalized`.
    Raw(String),
}

impl Cell {
    /// Lossless stringification used for strict comparison and for
    /// composite-key construction. Every variant round-trips through
    /// this without losing information needed for equality.
    pub fn stringify(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) | Cell::Date(s) | Cell::Raw(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Boolean(b) => b.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

/// Formats an `f64` the way a spreadsheet or SQL client would: no trailing
/// `.0` for integral values, full precision otherwise.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let mut s = format!("{n}");
        if !s.contains('.') && !s.contains('e') && !s.contains('E') {
            s.push_str(".0");
        }
        s
    }
}

/// One record. The field set need not equal the owning `Dataset`'s
/// `headers` — a field present in `headers` but absent from a given row's
/// map is treated as an empty cell everywhere in the engine.
///
/// Backed by an ordered `Vec` of pairs rather than a `HashMap`: field
/// order must be preserved from the input dataset (§6.3) and survive
/// `#[derive(Serialize)]` unchanged, and a `HashMap` guarantees neither.
/// Row field counts are small, so the linear lookup in `get` costs
/// nothing in practice — the same tradeoff `ComparisonRow.key` already
/// makes for the same reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row(pub Vec<(String, Cell)>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I: IntoIterator<Item = (String, Cell)>>(pairs: I) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Exact-name lookup. Missing fields read as `Cell::Null`, matching
    /// the "missing ≡ empty" rule.
    pub fn get(&self, field: &str) -> Cell {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, cell)| cell.clone())
            .unwrap_or(Cell::Null)
    }
}

/// Informational tag describing where a `Dataset` came from. The engine
/// never branches on it; it exists purely so callers can label output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    OracleTable,
    OracleSql,
    File,
}

/// An already-materialized input to the engine. The engine reads this; it
/// never mutates it and never performs I/O to build or refresh it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub source_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub source_kind: SourceKind,
}

impl Dataset {
    pub fn new(source_name: impl Into<String>, headers: Vec<String>, source_kind: SourceKind) -> Self {
        Self {
            source_name: source_name.into(),
            headers,
            rows: Vec::new(),
            source_kind,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    ByKey,
    ByPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    Strict,
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNameMode {
    CaseSensitive,
    CaseInsensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Comparing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub processed: usize,
    pub total: usize,
    pub percent: f64,
}

/// A pure sink invoked by the Comparator as it walks the union of keys.
/// The engine treats this strictly as output: it must not be able to
/// mutate engine state, which is why it receives an owned `ProgressEvent`
/// rather than a handle into anything the engine is still building.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Controls one `compare()` call. This is the engine's entire
/// configuration surface — there is no file-backed settings layer inside
/// the engine itself; an embedding application that wants to remember a
/// user's preferred `Options` across runs persists it on its own side.
#[derive(Clone)]
pub struct Options {
    pub key_columns: Vec<String>,
    pub compare_fields: Vec<String>,
    pub match_mode: MatchMode,
    pub value_mode: ValueMode,
    pub field_name_mode: FieldNameMode,
    pub change_ratio_threshold: f64,
    /// Opt-in for 5-digit spreadsheet serial-date parsing in the Value
    /// Normalizer. Off by default: a column of plain numeric identifiers
    /// would otherwise risk being misread as dates (see crate docs on the
    /// serial-date heuristic).
    pub serial_dates: bool,
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("key_columns", &self.key_columns)
            .field("compare_fields", &self.compare_fields)
            .field("match_mode", &self.match_mode)
            .field("value_mode", &self.value_mode)
            .field("field_name_mode", &self.field_name_mode)
            .field("change_ratio_threshold", &self.change_ratio_threshold)
            .field("serial_dates", &self.serial_dates)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            key_columns: Vec::new(),
            compare_fields: Vec::new(),
            match_mode: MatchMode::ByKey,
            value_mode: ValueMode::Strict,
            field_name_mode: FieldNameMode::CaseSensitive,
            change_ratio_threshold: 0.5,
            serial_dates: false,
            progress_callback: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    // Ordered by sort rank: differ < only_in_a < only_in_b < match.
    Differ,
    OnlyInA,
    OnlyInB,
    Match,
}

/// One output record. `key` is an ordered list rather than a map so it
/// serializes deterministically and preserves the caller-supplied
/// `key_columns` order even when there are zero key columns (in which
/// case it holds the single synthetic `KEY` field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub key: Vec<(String, Cell)>,
    pub status: RowStatus,
    pub data_a: Option<Row>,
    pub data_b: Option<Row>,
    pub differences: Vec<crate::diff::FieldDiff>,
    pub index_a: Option<usize>,
    pub index_b: Option<usize>,
}

impl ComparisonRow {
    /// The composite-key string as it would appear in `duplicate_keys_*`
    /// reporting and in any textual serialization of `key` (see the
    /// crate's notes on the NUL-delimited composite key).
    pub fn key_string(&self) -> String {
        self.key
            .iter()
            .map(|(_, cell)| cell.stringify())
            .collect::<Vec<_>>()
            .join("\u{0}|\u{0}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    #[serde(rename = "match")]
    pub matched: usize,
    pub differ: usize,
    pub only_in_a: usize,
    pub only_in_b: usize,
}

/// Final output of a `compare()` call. Owns its row data independently of
/// the input `Dataset`s, so the caller may drop those immediately after
/// the call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub source_name_a: String,
    pub source_name_b: String,
    pub table_label: String,
    pub summary: Summary,
    pub rows: Vec<ComparisonRow>,
    pub duplicate_keys_a: Vec<(String, usize)>,
    pub duplicate_keys_b: Vec<(String, usize)>,
}

#[cfg(test)]
mod model_tests;
