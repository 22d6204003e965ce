use thiserror::Error;

/// Errors the comparison engine can return.
///
/// Every variant is fatal for the call that produced it: the engine never
/// returns a partial `ComparisonResult` alongside an error. Unparseable
/// values are *not* represented here — per the normalizer's contract they
/// fall through to string comparison instead of failing the whole run.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("key column '{0}' is not present among the reconciled common fields")]
    KeyColumnsNotCommon(String),

    #[error("comparison cancelled")]
    Cancelled,

    #[error("invalid dataset '{source}': {reason}")]
    InvalidDataset { source: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CompareError>;
