//! # Classifier Module
//!
//! Assigns a species label to every image of a scanned table.
//!
//! ## Seams
//! - [`Classifier`] - what the pipeline calls. Any implementation works,
//!   tests use scripted ones.
//! - [`InferenceModel`] - a trained network behind [`BatchClassifier`].
//!   The crate ships no model; callers plug in their own runtime.
//!
//! ## Interruption
//! Progress is reported once per batch. A `false` answer stops the run with
//! [`ClassifyError::Interrupted`](crate::error::ClassifyError::Interrupted)
//! and the input table is discarded by the caller.

mod aggregate;
mod batch;
mod traits;

pub use aggregate::{aggregate_event_labels, Prediction};
pub use batch::{BatchClassifier, DEFAULT_BATCH_SIZE};
pub use traits::{Classifier, InferenceModel};
