//! Single-directory scanner.

use super::{filter::ImageFilter, DirectoryScan, ScanConfig};
use crate::core::consolidate::EventConsolidator;
use crate::core::makernote::MakerNoteDecoder;
use crate::core::metadata::extract_record;
use crate::core::table::EventTable;
use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Progress is reported roughly every 1/PROGRESS_STEPS of the files
const PROGRESS_STEPS: usize = 50;

/// Reads the camera metadata of every image in one directory
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    filter: ImageFilter,
    decoder: MakerNoteDecoder,
    consolidator: EventConsolidator,
}

impl DirectoryScanner {
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);
        if let Some(extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self {
            filter,
            decoder: MakerNoteDecoder::with_expected_version(config.expected_version),
            consolidator: EventConsolidator::new(config.merge_window_secs),
        }
    }

    pub fn consolidator(&self) -> &EventConsolidator {
        &self.consolidator
    }

    /// Candidate image files directly inside `dir`, sorted by name
    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| ScanError::ReadDirectory {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            })?;

            if entry.path().is_file() && self.filter.should_include(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl DirectoryScan for DirectoryScanner {
    fn scan(
        &self,
        dir: &Path,
        progress: &mut dyn FnMut(u8) -> bool,
    ) -> Result<EventTable, ScanError> {
        if !dir.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        info!(path = %dir.display(), "Scanning directory");
        let files = self.list_images(dir)?;
        let total = files.len();
        let step = (total / PROGRESS_STEPS).max(1);
        info!(count = total, "Found candidate image files");

        let mut records = Vec::with_capacity(total);
        for (i, path) in files.iter().enumerate() {
            match extract_record(path, &self.decoder) {
                Ok(record) => records.push(record),
                Err(err) => warn!(file = %path.display(), %err, "Skipping file"),
            }

            if i % step == 0 {
                let percent = (i * 100 / total) as u8;
                if !progress(percent) {
                    debug!(path = %dir.display(), "Scan interrupted");
                    return Err(ScanError::Interrupted);
                }
            }
        }
        // Every file is read; a late pause does not discard the result
        progress(100);

        if records.is_empty() {
            return Err(ScanError::NoImages {
                path: dir.to_path_buf(),
            });
        }

        let table = EventTable::new(self.consolidator.consolidate(records));
        info!(
            path = %dir.display(),
            images = table.len(),
            events = table.event_count(),
            "Directory scanned"
        );
        Ok(table)
    }
}
