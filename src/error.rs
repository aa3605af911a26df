//! Custom error types for the data wrangling pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Errors are
//! serializable so they can be embedded in machine-readable reports
//! (`--json` output) as a `code` + `message` pair.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the wrangling pipeline.
#[derive(Error, Debug)]
pub enum WrangleError {
    /// Input file does not exist or is not a readable file.
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid (non-null) values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A cleaning operation failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// A join failed.
    #[error("Failed to merge tables: {0}")]
    MergeFailed(String),

    /// Deriving a feature column failed.
    #[error("Failed to derive column: {0}")]
    DerivationFailed(String),

    /// Computing summary statistics failed.
    #[error("Failed to summarize data: {0}")]
    SummaryFailed(String),

    /// Rendering a plot failed.
    #[error("Failed to render plot: {0}")]
    PlotFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WrangleError>,
    },
}

impl WrangleError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        WrangleError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::MergeFailed(_) => "MERGE_FAILED",
            Self::DerivationFailed(_) => "DERIVATION_FAILED",
            Self::SummaryFailed(_) => "SUMMARY_FAILED",
            Self::PlotFailed(_) => "PLOT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is fatal to the whole run (as opposed to a
    /// configuration problem the caller can fix and retry).
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

/// Serialize implementation for report embedding.
///
/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for WrangleError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("WrangleError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for wrangling operations.
pub type Result<T> = std::result::Result<T, WrangleError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| WrangleError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            WrangleError::FileNotFound(PathBuf::from("missing.csv")).error_code(),
            "FILE_NOT_FOUND"
        );
        assert_eq!(
            WrangleError::ColumnNotFound("Age".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = WrangleError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = WrangleError::ColumnNotFound("hhid".to_string()).with_context("During merge");
        assert!(error.to_string().contains("During merge"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Preserves original code
    }

    #[test]
    fn test_is_config_error() {
        assert!(WrangleError::InvalidConfig("bad".to_string()).is_config_error());
        assert!(!WrangleError::NoValidValues("x".to_string()).is_config_error());
    }
}
