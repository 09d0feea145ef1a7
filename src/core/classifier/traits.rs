//! Classifier seams.

use crate::core::preprocess::ModelInput;
use crate::core::table::EventTable;
use crate::error::ClassifyError;

/// Labels every row of a scanned table.
///
/// Implementations call `progress` with a percentage and must stop with
/// [`ClassifyError::Interrupted`] as soon as it returns `false`.
pub trait Classifier: Send {
    fn classify(
        &mut self,
        table: EventTable,
        progress: &mut dyn FnMut(u8) -> bool,
    ) -> Result<EventTable, ClassifyError>;
}

/// A trained model that scores prepared images.
///
/// `predict` returns one score row per input, each row as long as
/// `labels()`.
pub trait InferenceModel: Send {
    /// The fixed label vocabulary, in score order
    fn labels(&self) -> &[String];

    fn predict(&mut self, batch: &[ModelInput]) -> Result<Vec<Vec<f32>>, ClassifyError>;
}
