//! Error types for the reconciliation engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ReconError>;

/// Errors that can occur while reconciling a transaction export.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Report serialization error
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reporting window with no days in it
    #[error("Invalid reporting window: days must be at least 1, got {days}")]
    EmptyWindow { days: u32 },

    /// Reporting window too large to resolve against the calendar
    #[error("Invalid reporting window: {days} days exceeds the supported calendar range")]
    OversizedWindow { days: u32 },

    /// Reporting window whose end precedes its start
    #[error("Invalid reporting window: end date {end} is before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// Transaction record that cannot be correlated with anything
    #[error("Transaction {index} in batch has neither an invoice id nor a record id")]
    MissingCorrelationKey { index: usize },
}
