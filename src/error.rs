//! Error types for differential expression runs

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for differential expression analysis
#[derive(Error, Debug)]
pub enum DiffExprError {
    #[error("Failed to load expression table {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("Gene '{gene}' in table {table}: {reason}")]
    Numeric {
        gene: String,
        table: String,
        reason: String,
    },

    #[error(
        "Gene '{gene}' has {observed} observation(s) in the {table} group, at least 2 are required for a confidence interval"
    )]
    InsufficientSample {
        gene: String,
        table: String,
        observed: usize,
    },

    #[error("Gene '{gene}': pooled standard error is zero, z statistic is undefined")]
    DegenerateVariance { gene: String },

    #[error(
        "Unknown p-value correction method '{0}' (expected one of: {names})",
        names = crate::testing::correction::CorrectionMethod::names().join(", ")
    )]
    InvalidMethod(String),

    #[error("Alpha must lie strictly between 0 and 1, got {0}")]
    InvalidAlpha(f64),

    #[error("Empty p-value array")]
    EmptyInput,

    #[error("Invalid p-value at index {index}: {value}")]
    InvalidPValue { index: usize, value: f64 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DiffExprError {
    /// Whether the error describes a single gene that the skip policy may drop.
    pub fn is_degenerate_gene(&self) -> bool {
        matches!(
            self,
            DiffExprError::InsufficientSample { .. } | DiffExprError::DegenerateVariance { .. }
        )
    }
}

/// Result type alias for differential expression operations
pub type Result<T> = std::result::Result<T, DiffExprError>;
