// ⚠️ Error Taxonomy
// Validation problems are recovered where they happen, range problems go back to the caller

use thiserror::Error;

/// Malformed upstream data (dates, amounts, status strings)
///
/// Normalization never returns this as an `Err`: the offending field falls back
/// to its display placeholder and the error is reported next to the output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unparsable deadline {value:?}")]
    Deadline { value: String },

    #[error("invalid budget amount {value}")]
    Budget { value: f64 },

    #[error("unknown tender status {value:?}")]
    Status { value: String },

    #[error("unknown notice type {value:?}")]
    NoticeType { value: String },

    #[error("field {field} is required")]
    Required { field: &'static str },

    #[error("invalid contact email {value:?}")]
    Email { value: String },

    #[error("a tender titled {title:?} with the same details already exists")]
    Duplicate { title: String },
}

/// Caller asked for something outside the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("page {requested} is out of range (valid pages: 1..={total_pages})")]
    PageOutOfRange { requested: usize, total_pages: usize },

    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Library-level error
#[derive(Debug, Error)]
pub enum TenderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("tender {0} not found")]
    NotFound(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
