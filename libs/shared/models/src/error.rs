use thiserror::Error;

/// Rejections raised while validating raw input at the core's boundary.
///
/// None of these reach callers of the query or staging operations; the
/// component that hits one logs it and drops the offending record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed schedule entry: {0}")]
    MalformedEntry(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM between 00:00 and 23:59")]
    InvalidTime(String),

    #[error("Interval start {start} must be before end {end}")]
    EmptyInterval { start: String, end: String },
}
