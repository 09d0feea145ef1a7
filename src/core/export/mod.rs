//! # Export Module
//!
//! Writes a classified table out as one folder per label.
//!
//! ```text
//! output_dir/
//!   Cheetah/IMG_0001.JPG -> /traps/site_a/IMG_0001.JPG
//!   Leopard/IMG_0107.JPG -> /traps/site_a/IMG_0107.JPG
//! ```
//!
//! A label folder that already exists is never written into; the export
//! stops with [`ExportError::TargetExists`] instead.

use crate::core::consolidate::{retained_indices, DuplicatePolicy};
use crate::core::table::{EventTable, ImageRecord};
use crate::error::ExportError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How images end up in the label folders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMode {
    /// Symbolic link to the original file
    #[default]
    Symlink,
    /// Full copy
    Copy,
}

/// What an export produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub directories: usize,
    pub files: usize,
}

/// Writes a labeled table to disk
pub trait Exporter: Send + Sync {
    /// Materialize every labeled row of `table` under `output_dir/<label>/`.
    ///
    /// `labels` fixes the folder order; an empty slice means "whatever
    /// labels the table carries". A row labeled outside a non-empty `labels`
    /// fails the export with [`ExportError::UnknownLabels`] before anything
    /// is written.
    fn export(
        &self,
        output_dir: &Path,
        table: &EventTable,
        labels: &[String],
    ) -> Result<ExportSummary, ExportError>;
}

/// Exports into plain directories
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryExporter {
    mode: LinkMode,
    policy: DuplicatePolicy,
}

impl DirectoryExporter {
    pub fn new(mode: LinkMode, policy: DuplicatePolicy) -> Self {
        Self { mode, policy }
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    fn materialize(&self, record: &ImageRecord, target_dir: &Path) -> Result<(), ExportError> {
        let source = fs::canonicalize(&record.path).map_err(|e| io_error(&record.path, e))?;
        let target = target_dir.join(&record.filename);

        match self.mode {
            LinkMode::Copy => fs::copy(&source, &target).map(|_| ()),
            LinkMode::Symlink => symlink(&source, &target),
        }
        .map_err(|e| io_error(&target, e))
    }
}

impl Exporter for DirectoryExporter {
    fn export(
        &self,
        output_dir: &Path,
        table: &EventTable,
        labels: &[String],
    ) -> Result<ExportSummary, ExportError> {
        let present = table.labels_present();
        let labels: Vec<String> = if labels.is_empty() {
            present.into_iter().map(str::to_string).collect()
        } else {
            let unknown: Vec<String> = present
                .into_iter()
                .filter(|label| !labels.iter().any(|l| l == *label))
                .map(str::to_string)
                .collect();
            if !unknown.is_empty() {
                return Err(ExportError::UnknownLabels { labels: unknown });
            }
            labels.to_vec()
        };

        info!(path = %output_dir.display(), mode = ?self.mode, "Writing sorted output");
        fs::create_dir_all(output_dir).map_err(|e| io_error(output_dir, e))?;

        let retained = retained_indices(table.records(), self.policy);
        let mut summary = ExportSummary {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        };

        for label in &labels {
            let rows: Vec<&ImageRecord> = retained
                .iter()
                .map(|&i| &table.records()[i])
                .filter(|r| r.label.as_deref() == Some(label.as_str()))
                .collect();
            if rows.is_empty() {
                continue;
            }

            let target_dir = output_dir.join(label);
            debug!(path = %target_dir.display(), images = rows.len(), "Creating class directory");
            fs::create_dir(&target_dir).map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => ExportError::TargetExists {
                    path: target_dir.clone(),
                },
                _ => io_error(&target_dir, e),
            })?;

            rows.par_iter()
                .try_for_each(|record| self.materialize(record, &target_dir))?;

            summary.directories += 1;
            summary.files += rows.len();
        }

        info!(
            path = %output_dir.display(),
            directories = summary.directories,
            files = summary.files,
            "Output written"
        );
        Ok(summary)
    }
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::consolidate::EventConsolidator;
    use crate::core::table::{DuplicateFlag, SortKey};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn labeled_table(dir: &Path, rows: &[(&str, u16, Option<&str>)]) -> EventTable {
        let records = rows
            .iter()
            .map(|(name, seq, label)| {
                let path = dir.join(name);
                fs::write(&path, name.as_bytes()).unwrap();
                ImageRecord {
                    path,
                    filename: name.to_string(),
                    timestamp: NaiveDate::from_ymd_opt(2019, 9, 9)
                        .unwrap()
                        .and_hms_opt(9, 0, u32::from(*seq))
                        .unwrap(),
                    serial_no: "S".to_string(),
                    event1: 0,
                    event2: 1,
                    sequence_idx: *seq,
                    sequence_max: 3,
                    ambient_temp: None,
                    hour: 9,
                    brightness: None,
                    sharpness: None,
                    saturation: None,
                    contrast: None,
                    trigger_mode: None,
                    user_label: None,
                    simple_event_key: String::new(),
                    sort_key: SortKey::default(),
                    event_key: String::new(),
                    duplicate: DuplicateFlag::Unique,
                    label: label.map(str::to_string),
                }
            })
            .collect();
        EventTable::new(EventConsolidator::default().consolidate(records))
    }

    fn labels() -> Vec<String> {
        vec!["Cheetah".to_string(), "Leopard".to_string(), "Unknown".to_string()]
    }

    #[test]
    fn copies_into_label_folders() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = labeled_table(
            src.path(),
            &[("a.jpg", 1, Some("Cheetah")), ("b.jpg", 2, Some("Leopard")), ("c.jpg", 3, None)],
        );

        let summary = DirectoryExporter::new(LinkMode::Copy, DuplicatePolicy::KeepAll)
            .export(&out.path().join("site_classified"), &table, &labels())
            .unwrap();

        assert_eq!(summary.directories, 2);
        assert_eq!(summary.files, 2);
        let cheetah = out.path().join("site_classified/Cheetah/a.jpg");
        assert_eq!(fs::read(cheetah).unwrap(), b"a.jpg");
        assert!(!out.path().join("site_classified/Unknown").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_point_at_originals() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = labeled_table(src.path(), &[("a.jpg", 1, Some("Cheetah"))]);

        DirectoryExporter::default()
            .export(out.path(), &table, &labels())
            .unwrap();

        let link = out.path().join("Cheetah/a.jpg");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_link(&link).unwrap(),
            fs::canonicalize(src.path().join("a.jpg")).unwrap()
        );
    }

    #[test]
    fn existing_label_folder_fails() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir(out.path().join("Cheetah")).unwrap();
        let table = labeled_table(src.path(), &[("a.jpg", 1, Some("Cheetah"))]);

        let err = DirectoryExporter::new(LinkMode::Copy, DuplicatePolicy::KeepAll)
            .export(out.path(), &table, &labels())
            .unwrap_err();
        assert!(matches!(err, ExportError::TargetExists { .. }));
    }

    #[test]
    fn labels_outside_the_vocabulary_fail_before_writing() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = labeled_table(
            src.path(),
            &[("a.jpg", 1, Some("Cheetah")), ("b.jpg", 2, Some("Serval"))],
        );

        let err = DirectoryExporter::new(LinkMode::Copy, DuplicatePolicy::KeepAll)
            .export(&out.path().join("sorted"), &table, &labels())
            .unwrap_err();
        match err {
            ExportError::UnknownLabels { labels } => assert_eq!(labels, vec!["Serval"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.path().join("sorted").exists());
    }

    #[test]
    fn keep_first_drops_repeated_frames() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = labeled_table(
            src.path(),
            &[("a.jpg", 1, Some("Cheetah")), ("a_copy.jpg", 1, Some("Cheetah"))],
        );

        let summary = DirectoryExporter::new(LinkMode::Copy, DuplicatePolicy::KeepFirst)
            .export(out.path(), &table, &[])
            .unwrap();
        assert_eq!(summary.files, 1);
        assert!(out.path().join("Cheetah/a.jpg").exists());
    }
}
