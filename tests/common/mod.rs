//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender};
use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trap_sorter::core::classifier::{Classifier, InferenceModel};
use trap_sorter::core::preprocess::ModelInput;
use trap_sorter::core::makernote::{EventNumber, MakerNoteBuilder, RawDateTime, Sequence};
use trap_sorter::core::metadata::{embed_makernote, MINIMAL_JPEG};
use trap_sorter::core::scanner::{DirectoryScan, DirectoryScanner};
use trap_sorter::core::table::EventTable;
use trap_sorter::error::{ClassifyError, ScanError};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Write a JPEG carrying a camera MakerNote for one frame of an event
pub fn write_trap_image(dir: &Path, name: &str, serial: &str, event2: u16, seq: u16, second: u16) {
    let blob = trap_makernote(serial, event2, seq, second);
    fs::write(dir.join(name), embed_makernote(&MINIMAL_JPEG, &blob)).unwrap();
}

fn trap_makernote(serial: &str, event2: u16, seq: u16, second: u16) -> Vec<u8> {
    MakerNoteBuilder::new()
        .sequence(Sequence {
            index: seq,
            max: 3,
        })
        .event_number(EventNumber {
            first: 1,
            second: event2,
        })
        .datetime(RawDateTime {
            second,
            minute: 10,
            hour: 22,
            month: 7,
            day: 14,
            year: 2019,
        })
        .ambient_temperature(18)
        .serial_number(serial)
        .build()
}

/// Three frames of one trigger event, two seconds apart
pub fn write_event(dir: &Path, serial: &str, event2: u16) {
    fs::create_dir_all(dir).unwrap();
    for seq in 1..=3 {
        write_trap_image(
            dir,
            &format!("IMG_{:04}.JPG", event2 * 10 + seq),
            serial,
            event2,
            seq,
            seq * 2,
        );
    }
}

/// Like [`write_event`], but each frame is a decodable flat grey picture
pub fn write_photo_event(dir: &Path, serial: &str, event2: u16, shades: [u8; 3]) {
    fs::create_dir_all(dir).unwrap();
    for (seq, shade) in (1..=3u16).zip(shades) {
        let mut jpeg = Vec::new();
        RgbImage::from_pixel(32, 24, Rgb([shade, shade, shade]))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let blob = trap_makernote(serial, event2, seq, seq * 2);
        let name = format!("IMG_{:04}.JPG", event2 * 10 + seq);
        fs::write(dir.join(name), embed_makernote(&jpeg, &blob)).unwrap();
    }
}

/// Scores bright pictures as Cheetah and dark ones as Leopard, counting
/// model calls
pub struct ShadeModel {
    labels: Vec<String>,
    pub calls: Arc<AtomicUsize>,
}

impl ShadeModel {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            labels: vec!["Cheetah".to_string(), "Leopard".to_string()],
            calls,
        }
    }
}

impl InferenceModel for ShadeModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&mut self, batch: &[ModelInput]) -> Result<Vec<Vec<f32>>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(batch
            .iter()
            .map(|input| {
                let mean = input.pixels.iter().sum::<f32>() / input.pixels.len() as f32;
                let bright = (mean + 1.0) / 2.0;
                vec![bright, 1.0 - bright]
            })
            .collect())
    }
}

/// Control handles for a gated scanner or classifier
pub struct Gate {
    pub started: Receiver<PathBuf>,
    pub release: Sender<()>,
}

impl Gate {
    pub fn wait_started(&self) -> PathBuf {
        self.started.recv_timeout(TIMEOUT).expect("worker never started")
    }

    pub fn release(&self, times: usize) {
        for _ in 0..times {
            self.release.send(()).unwrap();
        }
    }
}

/// Real directory scanner that blocks before reading each directory until
/// the test releases it
pub struct GatedScanner {
    inner: DirectoryScanner,
    started: Sender<PathBuf>,
    release: Receiver<()>,
}

impl GatedScanner {
    pub fn new() -> (Self, Gate) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let scanner = Self {
            inner: DirectoryScanner::default(),
            started: started_tx,
            release: release_rx,
        };
        (
            scanner,
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl DirectoryScan for GatedScanner {
    fn scan(
        &self,
        dir: &Path,
        progress: &mut dyn FnMut(u8) -> bool,
    ) -> Result<EventTable, ScanError> {
        let _ = self.started.send(dir.to_path_buf());
        let _ = self.release.recv();
        self.inner.scan(dir, progress)
    }
}

/// Labels every row with one fixed label, blocking before each table until
/// released
pub struct GatedClassifier {
    label: String,
    started: Sender<PathBuf>,
    release: Receiver<()>,
}

impl GatedClassifier {
    pub fn new(label: &str) -> (Self, Gate) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let classifier = Self {
            label: label.to_string(),
            started: started_tx,
            release: release_rx,
        };
        (
            classifier,
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl Classifier for GatedClassifier {
    fn classify(
        &mut self,
        mut table: EventTable,
        progress: &mut dyn FnMut(u8) -> bool,
    ) -> Result<EventTable, ClassifyError> {
        let dir = table
            .records()
            .first()
            .and_then(|r| r.path.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let _ = self.started.send(dir);
        let _ = self.release.recv();

        if !progress(0) {
            return Err(ClassifyError::Interrupted);
        }
        for index in 0..table.len() {
            table.annotate(index, Some(self.label.clone()));
        }
        progress(100);
        Ok(table)
    }
}
