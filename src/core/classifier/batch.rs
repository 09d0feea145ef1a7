//! Batched classification over an [`InferenceModel`].

use super::aggregate::{aggregate_event_labels, Prediction};
use super::traits::{Classifier, InferenceModel};
use crate::core::pipeline::ClassificationOptions;
use crate::core::preprocess::{prepare_image, record_meta, RgbResizer};
use crate::core::table::EventTable;
use crate::error::ClassifyError;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Default number of images per model call
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Prepares images in parallel batches and feeds them to a model
pub struct BatchClassifier<M> {
    model: M,
    batch_size: usize,
    aggregate_events: bool,
}

impl<M: InferenceModel> BatchClassifier<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            batch_size: DEFAULT_BATCH_SIZE,
            aggregate_events: false,
        }
    }

    /// Configure batching and aggregation from the pipeline's options.
    ///
    /// Fails with [`ClassifyError::VocabularyMismatch`] when the options name
    /// labels and the model's labels differ from them, in content or order.
    pub fn from_options(model: M, options: &ClassificationOptions) -> Result<Self, ClassifyError> {
        if !options.labels.is_empty() && options.labels.as_slice() != model.labels() {
            return Err(ClassifyError::VocabularyMismatch {
                expected: options.labels.clone(),
                found: model.labels().to_vec(),
            });
        }
        Ok(Self::new(model)
            .batch_size(options.batch_size)
            .aggregate_events(options.aggregate_events))
    }

    /// Images per model call (at least 1)
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Label whole trigger events by their most confident image
    pub fn aggregate_events(mut self, aggregate: bool) -> Self {
        self.aggregate_events = aggregate;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: InferenceModel> Classifier for BatchClassifier<M> {
    fn classify(
        &mut self,
        mut table: EventTable,
        progress: &mut dyn FnMut(u8) -> bool,
    ) -> Result<EventTable, ClassifyError> {
        let labels = self.model.labels().to_vec();
        let total = table.len();
        let mut predictions: Vec<Option<Prediction>> = vec![None; total];
        info!(images = total, batch_size = self.batch_size, "Classifying table");

        for start in (0..total).step_by(self.batch_size) {
            if !progress((start * 100 / total) as u8) {
                debug!(done = start, total, "Classification interrupted");
                return Err(ClassifyError::Interrupted);
            }

            let end = (start + self.batch_size).min(total);
            let records = table.records();
            let prepared: Vec<_> = (start..end)
                .into_par_iter()
                .map_init(RgbResizer::new, |resizer, index| {
                    let record = &records[index];
                    (index, prepare_image(&record.path, record_meta(record), resizer))
                })
                .collect();

            let mut indices = Vec::with_capacity(prepared.len());
            let mut inputs = Vec::with_capacity(prepared.len());
            for (index, result) in prepared {
                match result {
                    Ok(input) => {
                        indices.push(index);
                        inputs.push(input);
                    }
                    Err(err) => warn!(%err, "Image left unlabeled"),
                }
            }
            if inputs.is_empty() {
                continue;
            }

            let scores = self.model.predict(&inputs)?;
            if scores.len() != inputs.len() {
                return Err(ClassifyError::Model(format!(
                    "expected {} score rows, got {}",
                    inputs.len(),
                    scores.len()
                )));
            }

            for (index, row) in indices.into_iter().zip(scores) {
                if row.len() != labels.len() {
                    return Err(ClassifyError::LabelMismatch {
                        expected: labels.len(),
                        found: row.len(),
                    });
                }
                predictions[index] = Prediction::from_scores(&row);
            }
        }

        for (index, prediction) in predictions.iter().enumerate() {
            if let Some(prediction) = prediction {
                table.annotate(index, labels.get(prediction.label).cloned());
            }
        }
        if self.aggregate_events {
            aggregate_event_labels(&mut table, &predictions, &labels);
        }

        progress(100);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::preprocess::ModelInput;
    use crate::core::makernote::{EventNumber, MakerNoteBuilder, RawDateTime, Sequence};
    use crate::core::metadata::{embed_makernote, MINIMAL_JPEG};
    use crate::core::scanner::{DirectoryScan, DirectoryScanner};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;

    /// Scores "bright" images as Cheetah, dark ones as Leopard
    struct BrightnessModel {
        labels: Vec<String>,
        calls: usize,
    }

    impl BrightnessModel {
        fn new() -> Self {
            Self {
                labels: vec!["Cheetah".to_string(), "Leopard".to_string()],
                calls: 0,
            }
        }
    }

    impl InferenceModel for BrightnessModel {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn predict(&mut self, batch: &[ModelInput]) -> Result<Vec<Vec<f32>>, ClassifyError> {
            self.calls += 1;
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

    fn write_frame(dir: &Path, name: &str, shade: u8, seq: u16) {
        let mut jpeg = Vec::new();
        RgbImage::from_pixel(32, 24, Rgb([shade, shade, shade]))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let blob = MakerNoteBuilder::new()
            .sequence(Sequence { index: seq, max: 3 })
            .event_number(EventNumber {
                first: 0,
                second: 4,
            })
            .datetime(RawDateTime {
                second: seq,
                minute: 30,
                hour: 6,
                month: 5,
                day: 20,
                year: 2020,
            })
            .ambient_temperature(18)
            .serial_number("CAM9")
            .build();
        std::fs::write(dir.join(name), embed_makernote(&jpeg, &blob)).unwrap();
    }

    fn scanned(shades: &[u8]) -> (TempDir, EventTable) {
        let temp_dir = TempDir::new().unwrap();
        for (i, shade) in shades.iter().enumerate() {
            write_frame(temp_dir.path(), &format!("{}.jpg", i), *shade, i as u16 + 1);
        }
        let table = DirectoryScanner::default()
            .scan_to_end(temp_dir.path())
            .unwrap();
        (temp_dir, table)
    }

    #[test]
    fn every_row_gets_a_label() {
        let (_dir, table) = scanned(&[250, 10, 240]);
        let mut classifier = BatchClassifier::new(BrightnessModel::new()).batch_size(2);

        let labeled = classifier.classify(table, &mut |_| true).unwrap();
        let labels: Vec<_> = labeled.iter().map(|r| r.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["Cheetah", "Leopard", "Cheetah"]);
        assert_eq!(classifier.model().calls, 2);
    }

    #[test]
    fn aggregation_applies_event_winner() {
        let (_dir, table) = scanned(&[255, 30, 140]);
        let mut classifier = BatchClassifier::new(BrightnessModel::new()).aggregate_events(true);

        let labeled = classifier.classify(table, &mut |_| true).unwrap();
        assert!(labeled.iter().all(|r| r.label.as_deref() == Some("Cheetah")));
    }

    #[test]
    fn options_set_batching_and_aggregation() {
        let (_dir, table) = scanned(&[255, 30, 140]);
        let options = ClassificationOptions::new()
            .batch_size(2)
            .aggregate_events(true);
        let mut classifier = BatchClassifier::from_options(BrightnessModel::new(), &options).unwrap();

        let labeled = classifier.classify(table, &mut |_| true).unwrap();
        assert_eq!(classifier.model().calls, 2);
        assert!(labeled.iter().all(|r| r.label.as_deref() == Some("Cheetah")));
    }

    #[test]
    fn options_labels_must_match_the_model() {
        let matching = ClassificationOptions::new().labels(["Cheetah", "Leopard"]);
        assert!(BatchClassifier::from_options(BrightnessModel::new(), &matching).is_ok());

        let reordered = ClassificationOptions::new().labels(["Leopard", "Cheetah"]);
        let err = BatchClassifier::from_options(BrightnessModel::new(), &reordered)
            .err()
            .unwrap();
        match err {
            ClassifyError::VocabularyMismatch { expected, found } => {
                assert_eq!(expected, vec!["Leopard", "Cheetah"]);
                assert_eq!(found, vec!["Cheetah", "Leopard"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_image_stays_unlabeled() {
        let (dir, _) = scanned(&[250, 250]);
        let blob = MakerNoteBuilder::new()
            .sequence(Sequence { index: 3, max: 3 })
            .event_number(EventNumber {
                first: 0,
                second: 4,
            })
            .datetime(RawDateTime {
                second: 3,
                minute: 30,
                hour: 6,
                month: 5,
                day: 20,
                year: 2020,
            })
            .serial_number("CAM9")
            .build();
        // Valid metadata, no image data
        std::fs::write(
            dir.path().join("z.jpg"),
            embed_makernote(&MINIMAL_JPEG, &blob),
        )
        .unwrap();
        let table = DirectoryScanner::default().scan_to_end(dir.path()).unwrap();

        let labeled = BatchClassifier::new(BrightnessModel::new())
            .classify(table, &mut |_| true)
            .unwrap();
        assert_eq!(labeled.len(), 3);
        assert_eq!(labeled.iter().filter(|r| r.label.is_none()).count(), 1);
    }

    #[test]
    fn progress_false_interrupts() {
        let (_dir, table) = scanned(&[250, 10, 240]);
        let mut classifier = BatchClassifier::new(BrightnessModel::new()).batch_size(1);

        let mut calls = 0;
        let err = classifier
            .classify(table, &mut |_| {
                calls += 1;
                calls < 2
            })
            .unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(classifier.model().calls, 1);
    }

    #[test]
    fn wrong_score_width_is_rejected() {
        struct NarrowModel(Vec<String>);
        impl InferenceModel for NarrowModel {
            fn labels(&self) -> &[String] {
                &self.0
            }
            fn predict(&mut self, batch: &[ModelInput]) -> Result<Vec<Vec<f32>>, ClassifyError> {
                Ok(batch.iter().map(|_| vec![1.0]).collect())
            }
        }

        let (_dir, table) = scanned(&[250]);
        let err = BatchClassifier::new(NarrowModel(vec!["A".into(), "B".into()]))
            .classify(table, &mut |_| true)
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::LabelMismatch {
                expected: 2,
                found: 1
            }
        ));
    }
}
