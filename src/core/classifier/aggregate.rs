//! Event-level label aggregation.

use crate::core::table::EventTable;
use std::collections::HashMap;

/// Best class of one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Index into the label vocabulary
    pub label: usize,
    pub score: f32,
}

impl Prediction {
    /// Highest scoring class of a score row, `None` for an empty row
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        scores
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<Prediction>, (label, score)| match best {
                Some(b) if b.score >= score => Some(b),
                _ => Some(Prediction { label, score }),
            })
    }
}

/// Give every image of a trigger event the label of the single most
/// confident image in that event.
///
/// `predictions` is indexed like the table rows. Events in which no image
/// was scored keep their labels.
pub fn aggregate_event_labels(
    table: &mut EventTable,
    predictions: &[Option<Prediction>],
    labels: &[String],
) {
    let mut best: HashMap<String, Prediction> = HashMap::new();
    for (record, prediction) in table.iter().zip(predictions) {
        let Some(prediction) = prediction else {
            continue;
        };
        best.entry(record.simple_event_key.clone())
            .and_modify(|current| {
                if prediction.score > current.score {
                    *current = *prediction;
                }
            })
            .or_insert(*prediction);
    }

    for record in table.records_mut() {
        if let Some(prediction) = best.get(&record.simple_event_key) {
            record.label = labels.get(prediction.label).cloned();
        }
    }
}
