// Error types for the pattern classification pipeline
//
// This module defines custom error types for corpus loading and classifier
// evaluation, providing structured error handling with error codes suitable
// for run reports and diagnostics.

use log::warn;
use std::fmt;
use std::path::PathBuf;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent skip-reason reporting
/// across the batch pipeline.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log a corpus data error with structured context
///
/// Per-item data errors are recoverable: the affected track or file is
/// skipped and the batch continues, so these are logged as warnings.
pub fn log_data_error(err: &DataError, context: &str) {
    warn!(
        "Data error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Log an evaluation error with structured context
///
/// Family-level evaluation errors are recoverable: the affected pattern
/// family is skipped and the remaining families proceed.
pub fn log_eval_error(err: &EvalError, context: &str) {
    warn!(
        "Evaluation error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Corpus data errors
///
/// These errors cover per-item failures while loading pattern files and
/// joining them against the metadata tables. Each one excludes a single
/// track (or file) from the run; none of them abort the batch.
///
/// Error code ranges: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// File could not be read from disk
    Unreadable { path: PathBuf, reason: String },

    /// File was read but its structured content could not be parsed
    Malformed { path: PathBuf, reason: String },

    /// Track has no entry in the genre-label table for the active dataset
    MissingGenre { track_id: String, dataset: String },

    /// Track has no entry in the tick-resolution table
    MissingResolution { track_id: String },

    /// Track has a combined-pattern file but no rhythm-pattern file
    MissingRhythmFile { track_id: String },
}

impl ErrorCode for DataError {
    fn code(&self) -> i32 {
        match self {
            DataError::Unreadable { .. } => 1001,
            DataError::Malformed { .. } => 1002,
            DataError::MissingGenre { .. } => 1003,
            DataError::MissingResolution { .. } => 1004,
            DataError::MissingRhythmFile { .. } => 1005,
        }
    }

    fn message(&self) -> String {
        match self {
            DataError::Unreadable { path, reason } => {
                format!("Failed to read {}: {}", path.display(), reason)
            }
            DataError::Malformed { path, reason } => {
                format!("Failed to parse {}: {}", path.display(), reason)
            }
            DataError::MissingGenre { track_id, dataset } => {
                format!(
                    "Track {} has no genre labels in dataset {}",
                    track_id, dataset
                )
            }
            DataError::MissingResolution { track_id } => {
                format!("Track {} has no ticks-per-quarter-note entry", track_id)
            }
            DataError::MissingRhythmFile { track_id } => {
                format!("Track {} has no rhythm-pattern file", track_id)
            }
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for DataError {}

/// Classifier evaluation errors
///
/// These errors cover pattern families that cannot be cross-validated
/// meaningfully. The family's entry is omitted from the results (and the
/// omission recorded); other families proceed.
///
/// Error code ranges: 2001-2003
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Fewer than 2 distinct genre labels observed across the family
    DegenerateLabels { family: String, classes: usize },

    /// Feature matrix has no rows or no columns
    EmptyFeatures { family: String },

    /// Fewer tracks than cross-validation folds
    TooFewRows {
        family: String,
        rows: usize,
        folds: usize,
    },
}

impl ErrorCode for EvalError {
    fn code(&self) -> i32 {
        match self {
            EvalError::DegenerateLabels { .. } => 2001,
            EvalError::EmptyFeatures { .. } => 2002,
            EvalError::TooFewRows { .. } => 2003,
        }
    }

    fn message(&self) -> String {
        match self {
            EvalError::DegenerateLabels { family, classes } => {
                format!(
                    "Family {} has {} observed class(es); need at least 2",
                    family, classes
                )
            }
            EvalError::EmptyFeatures { family } => {
                format!("Family {} has an empty feature matrix", family)
            }
            EvalError::TooFewRows {
                family,
                rows,
                folds,
            } => {
                format!(
                    "Family {} has {} track(s); need at least {} for {}-fold cross-validation",
                    family, rows, folds, folds
                )
            }
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvalError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for EvalError {}
