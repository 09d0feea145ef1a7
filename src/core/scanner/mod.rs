//! # Scanner Module
//!
//! Turns a directory of camera-trap JPEGs into an [`EventTable`].
//!
//! ## Behaviour
//! - Non-recursive: only files directly inside the directory are read
//! - `.jpg` / `.jpeg` in any letter case
//! - Unreadable files and files with bad metadata are skipped and logged
//! - Progress is reported about every 2% of files; a `false` answer from the
//!   progress callback aborts the scan with [`ScanError::Interrupted`]
//! - A directory without a single valid image fails with
//!   [`ScanError::NoImages`]
//!
//! ## Example
//! ```rust,ignore
//! use trap_sorter::core::scanner::{DirectoryScan, DirectoryScanner, ScanConfig};
//!
//! let scanner = DirectoryScanner::new(ScanConfig::default());
//! let table = scanner.scan(Path::new("/traps/site_a"), &mut |pct| {
//!     println!("{}%", pct);
//!     true
//! })?;
//! ```

mod directory;
mod filter;
mod labeled;

pub use directory::DirectoryScanner;
pub use filter::{ImageFilter, DEFAULT_EXTENSIONS};
pub use labeled::read_labeled_directories;

use crate::core::consolidate::DEFAULT_MERGE_WINDOW_SECS;
use crate::core::makernote::HYPERFIRE_VERSION;
use crate::core::table::EventTable;
use crate::error::ScanError;
use std::path::Path;

/// Configuration for directory scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Window for merging subsequent events, in seconds
    pub merge_window_secs: i64,
    /// MakerNote version magic that marks a supported camera
    pub expected_version: u16,
    /// Whether to include hidden files
    pub include_hidden: bool,
    /// Custom extensions to include (None = jpg/jpeg)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            merge_window_secs: DEFAULT_MERGE_WINDOW_SECS,
            expected_version: HYPERFIRE_VERSION,
            include_hidden: false,
            extensions: None,
        }
    }
}

/// Trait for directory scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait DirectoryScan: Send + Sync {
    /// Scan one directory, reporting progress in percent.
    ///
    /// Returning `false` from `progress` must abort the scan with
    /// [`ScanError::Interrupted`].
    fn scan(
        &self,
        dir: &Path,
        progress: &mut dyn FnMut(u8) -> bool,
    ) -> Result<EventTable, ScanError>;

    /// Scan without progress reporting
    fn scan_to_end(&self, dir: &Path) -> Result<EventTable, ScanError> {
        self.scan(dir, &mut |_| true)
    }
}
