//! Integration tests for labeled collections and sorted output.

mod common;

use assert_fs::prelude::*;
use common::{write_event, write_trap_image};
use predicates::prelude::*;
use trap_sorter::core::consolidate::DuplicatePolicy;
use trap_sorter::core::export::{DirectoryExporter, Exporter, LinkMode};
use trap_sorter::core::scanner::{read_labeled_directories, DirectoryScanner};
use trap_sorter::core::table::DuplicateFlag;
use trap_sorter::error::{ExportError, ScanError};

fn classes(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn labeled_copies_across_classes_conflict() {
    let root = assert_fs::TempDir::new().unwrap();
    let cheetah = root.child("Cheetah_day");
    let leopard = root.child("Leopard");
    write_event(cheetah.path(), "ABC123", 7);
    write_event(leopard.path(), "ABC123", 9);
    // Same frame as IMG_0071.JPG, filed under the other class
    write_trap_image(leopard.path(), "copy.jpg", "ABC123", 7, 1, 2);
    root.child("Unrelated").create_dir_all().unwrap();

    let table = read_labeled_directories(
        &DirectoryScanner::default(),
        root.path(),
        &classes(&["Cheetah", "Leopard"]),
    )
    .unwrap();

    assert_eq!(table.len(), 7);
    assert_eq!(table.event_count(), 2);
    for record in table.iter() {
        let expected = if record.event2 == 7 {
            DuplicateFlag::Conflict
        } else {
            DuplicateFlag::Unique
        };
        assert_eq!(record.duplicate, expected, "{}", record.filename);
    }
    assert_eq!(table.summary().labeled, 7);
}

#[test]
fn labeled_reader_requires_every_class() {
    let root = assert_fs::TempDir::new().unwrap();
    write_event(root.child("Cheetah").path(), "ABC123", 7);

    let err = read_labeled_directories(
        &DirectoryScanner::default(),
        root.path(),
        &classes(&["Cheetah", "Leopard"]),
    )
    .unwrap_err();

    match err {
        ScanError::MissingClassDirectories { missing, .. } => {
            assert_eq!(missing, vec!["Leopard".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn export_writes_one_folder_per_label() {
    let root = assert_fs::TempDir::new().unwrap();
    write_event(root.child("traps/Cheetah").path(), "ABC123", 7);
    write_event(root.child("traps/Leopard").path(), "ABC123", 9);
    let table = read_labeled_directories(
        &DirectoryScanner::default(),
        root.child("traps").path(),
        &classes(&["Cheetah", "Leopard"]),
    )
    .unwrap();

    let out = root.child("sorted");
    let exporter = DirectoryExporter::new(LinkMode::Copy, DuplicatePolicy::KeepAll);
    let summary = exporter.export(out.path(), &table, &[]).unwrap();

    assert_eq!(summary.directories, 2);
    assert_eq!(summary.files, 6);
    out.child("Cheetah/IMG_0071.JPG")
        .assert(predicate::path::is_file());
    out.child("Leopard/IMG_0093.JPG")
        .assert(predicate::path::is_file());
    out.child("Leopard/IMG_0071.JPG")
        .assert(predicate::path::missing());

    // Never merge into an earlier run
    let err = exporter.export(out.path(), &table, &[]).unwrap_err();
    assert!(matches!(err, ExportError::TargetExists { .. }));
}

#[test]
fn export_keeps_first_copy_of_repeated_frames() {
    let root = assert_fs::TempDir::new().unwrap();
    let cheetah = root.child("Cheetah");
    write_event(cheetah.path(), "ABC123", 7);
    write_trap_image(cheetah.path(), "zz_copy.jpg", "ABC123", 7, 1, 2);
    let table = read_labeled_directories(
        &DirectoryScanner::default(),
        root.path(),
        &classes(&["Cheetah"]),
    )
    .unwrap();
    assert!(table.iter().all(|r| r.duplicate == DuplicateFlag::Redundant));

    let out = assert_fs::TempDir::new().unwrap();
    let summary = DirectoryExporter::new(LinkMode::Copy, DuplicatePolicy::KeepFirst)
        .export(out.path(), &table, &classes(&["Cheetah"]))
        .unwrap();

    assert_eq!(summary.files, 3);
    out.child("Cheetah/IMG_0071.JPG")
        .assert(predicate::path::is_file());
    out.child("Cheetah/zz_copy.jpg")
        .assert(predicate::path::missing());
}
