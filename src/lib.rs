//! A row-by-row tabular dataset comparison engine for heterogeneous
//! sources. Callers materialize two [`Dataset`]s from whatever they came
//! from — a database query, a CSV, a spreadsheet — and hand them to
//! [`compare`] along with [`Options`] describing how rows should be
//! matched and values compared.
//!
//! The engine does no I/O of its own: it never opens a connection, reads a
//! file, or writes anything. It also installs no logger; it only emits
//! `log` records for whatever subscriber the embedding application sets up.

mod cancel;
mod compare;
mod diff;
mod error;
mod index;
mod model;
mod normalize;
mod reconcile;

pub use cancel::CancellationToken;
pub use compare::compare;
pub use diff::{change_ratio, char_diff, diff_cells, word_diff, FieldDiff, FieldDiffKind, Segment, SegmentKind};
pub use error::{CompareError, Result};
pub use index::{composite_key, KeyIndex, KEY_DELIMITER};
pub use model::{
    Cell, ComparisonResult, ComparisonRow, Dataset, FieldNameMode, MatchMode, Options,
    ProgressCallback, ProgressEvent, ProgressPhase, Row, RowStatus, SourceKind, Summary, ValueMode,
};
pub use reconcile::{reconcile, FieldMapping, ReconciledFields};
