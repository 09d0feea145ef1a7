//! # Error Module
//!
//! Error types for the camera-trap sorter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, field names, what went wrong
//! - **Per-file errors stay local** - a bad image is skipped, never fatal
//! - **Interruption is not failure** - pausing produces `Interrupted`, which
//!   callers treat as transient

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TrapError {
    #[error("Metadata error: {0}")]
    Format(#[from] FormatError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or missing camera metadata in a single image.
///
/// Always non-fatal for a directory scan: the file is skipped and logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("No MakerNote tag in {path}")]
    MissingMakerNote { path: PathBuf },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Unreadable EXIF block in {path}: {reason}")]
    Exif { path: PathBuf, reason: String },

    #[error("MakerNote version field is missing")]
    MissingVersion,

    #[error("MakerNote version {found:#06x} does not match expected {expected:#06x}")]
    VersionMismatch { expected: u16, found: u16 },

    #[error("Field '{field}' needs {required} bytes but only {available} are available")]
    Truncated {
        field: &'static str,
        required: usize,
        available: usize,
    },

    #[error("MakerNote has no field at table row {index}")]
    UnknownField { index: usize },

    #[error("Required field '{field}' could not be decoded")]
    MissingField { field: &'static str },

    #[error("Invalid capture date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidDateTime {
        year: u16,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
    },
}

/// Errors that occur while scanning directories
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No camera trap images found in {path}")]
    NoImages { path: PathBuf },

    #[error("Scan was interrupted")]
    Interrupted,

    #[error("Not all class directories found under {root}: missing {missing:?}")]
    MissingClassDirectories { root: PathBuf, missing: Vec<String> },
}

impl ScanError {
    /// Whether the error only means "try again later"
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ScanError::Interrupted)
    }
}

/// Errors raised by a classifier
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Classification was interrupted")]
    Interrupted,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Failed to prepare image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Model returned {found} scores for {expected} labels")]
    LabelMismatch { expected: usize, found: usize },

    #[error("Model labels {found:?} do not match configured labels {expected:?}")]
    VocabularyMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl ClassifyError {
    /// Whether the error only means "try again later"
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ClassifyError::Interrupted)
    }
}

/// Errors that occur while writing sorted output folders
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Class directory already exists: {path}")]
    TargetExists { path: PathBuf },

    #[error("Labels {labels:?} are not among the export labels")]
    UnknownLabels { labels: Vec<String> },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TrapError>;
