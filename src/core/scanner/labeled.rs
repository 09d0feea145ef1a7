//! Reader for already sorted (labeled) image collections.
//!
//! Expects one subdirectory per class, e.g.
//!
//! ```text
//! root/
//!   Cheetah/   -> label "Cheetah"
//!   Leopard_2018/ -> label "Leopard"
//!   Unknown/
//! ```
//!
//! A subdirectory belongs to the first class name contained in its name.

use super::{DirectoryScan, DirectoryScanner};
use crate::core::table::EventTable;
use crate::error::ScanError;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

/// Read every class subdirectory of `root`, label its rows and consolidate
/// the combined table.
///
/// Duplicate detection runs after labeling, so copies of the same frame
/// filed under different classes are flagged as conflicts.
pub fn read_labeled_directories(
    scanner: &DirectoryScanner,
    root: &Path,
    class_names: &[String],
) -> Result<EventTable, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut found = BTreeSet::new();
    let mut records = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| ScanError::ReadDirectory {
            path: root.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;

        if !entry.path().is_dir() {
            continue;
        }

        let dir_name = entry.file_name().to_string_lossy();
        let Some(label) = class_names.iter().find(|name| dir_name.contains(name.as_str())) else {
            continue;
        };

        info!(path = %entry.path().display(), %label, "Reading class directory");
        let table = scanner.scan_to_end(entry.path())?;
        records.extend(table.into_records().into_iter().map(|mut record| {
            record.label = Some(label.clone());
            record
        }));
        found.insert(label.clone());
    }

    let missing: Vec<String> = class_names
        .iter()
        .filter(|name| !found.contains(*name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ScanError::MissingClassDirectories {
            root: root.to_path_buf(),
            missing,
        });
    }

    Ok(EventTable::new(scanner.consolidator().reconsolidate(records)))
}
