//! # Core Module
//!
//! The GUI-agnostic engine.
//!
//! ## Modules
//! - `makernote` - Decodes the vendor MakerNote block
//! - `metadata` - Pulls the MakerNote out of a JPEG's EXIF data
//! - `table` - Per-directory image records
//! - `consolidate` - Event keys, duplicate flags and event merging
//! - `scanner` - Reads one directory into a table
//! - `worktree` - Directories to process and their state
//! - `pipeline` - Background worker and its controller
//! - `preprocess` - Model input preparation
//! - `classifier` - Labels images
//! - `export` - Writes one folder per label

pub mod classifier;
pub mod consolidate;
pub mod export;
pub mod makernote;
pub mod metadata;
pub mod pipeline;
pub mod preprocess;
pub mod scanner;
pub mod table;
pub mod worktree;

// Re-export commonly used types
pub use consolidate::{DuplicatePolicy, EventConsolidator};
pub use pipeline::{ClassificationOptions, Pipeline, PipelineController};
pub use scanner::{DirectoryScan, DirectoryScanner, ScanConfig};
pub use table::{DuplicateFlag, EventTable, ImageRecord};
pub use worktree::{ProcessState, WorkItemId};
