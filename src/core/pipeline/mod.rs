//! # Pipeline Module
//!
//! Runs scanning and classification on one background worker thread.
//!
//! ## Passes
//! 1. **Scan** - every QUEUED leaf of the work tree, in tree order, becomes
//!    READ (with a table), FAILED, or QUEUED again if it was interrupted
//! 2. **Classify** - on request, every READ leaf is classified, exported and
//!    marked CLASSIFIED
//!
//! ## Control
//! The [`PipelineController`] adds and removes directories, pauses and
//! resumes, and requests classification. Pausing is cooperative: the worker
//! stops at the next progress check and the interrupted item returns to its
//! previous state. Interrupting a classify pass abandons the whole pass; it
//! is rerun from the start on the next wake-up.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let controller = Pipeline::builder()
//!     .events(sender)
//!     .classifier_factory(|options| {
//!         Ok(Box::new(BatchClassifier::from_options(load_model(options)?, options)?))
//!     })
//!     .options(ClassificationOptions::new().output_dir("/sorted").batch_size(16))
//!     .spawn()?;
//!
//! controller.add_dir(Path::new("/traps/2019"))?;
//! controller.classify();
//! ```

mod controller;
mod options;
mod pause;
mod worker;

pub use controller::PipelineController;
pub use options::{ClassificationOptions, DEFAULT_SUFFIX};
pub use pause::PauseGate;

use crate::core::classifier::Classifier;
use crate::core::export::{DirectoryExporter, Exporter};
use crate::core::scanner::{DirectoryScan, DirectoryScanner, ScanConfig};
use crate::error::{ClassifyError, TrapError};
use crate::events::{null_sender, EventSender};
use std::sync::Arc;
use std::thread;
use worker::{Shared, Worker};

/// Builds a classifier on the worker thread the first time one is needed
pub type ClassifierFactory =
    Box<dyn Fn(&ClassificationOptions) -> Result<Box<dyn Classifier>, ClassifyError> + Send>;

/// Builder for a running pipeline
pub struct PipelineBuilder {
    scan_config: ScanConfig,
    scanner: Option<Box<dyn DirectoryScan>>,
    classifier: Option<Box<dyn Classifier>>,
    factory: Option<ClassifierFactory>,
    exporter: Option<Box<dyn Exporter>>,
    options: ClassificationOptions,
    events: Option<EventSender>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            scan_config: ScanConfig::default(),
            scanner: None,
            classifier: None,
            factory: None,
            exporter: None,
            options: ClassificationOptions::default(),
            events: None,
        }
    }

    /// Configure the default [`DirectoryScanner`]
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Replace the directory scanner altogether
    pub fn scanner(mut self, scanner: impl DirectoryScan + 'static) -> Self {
        self.scanner = Some(Box::new(scanner));
        self
    }

    /// Use a ready-made classifier
    pub fn classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Build the classifier lazily from the options
    pub fn classifier_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ClassificationOptions) -> Result<Box<dyn Classifier>, ClassifyError>
            + Send
            + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Replace the default [`DirectoryExporter`]
    pub fn exporter(mut self, exporter: impl Exporter + 'static) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    pub fn options(mut self, options: ClassificationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Start the worker thread
    pub fn spawn(self) -> Result<PipelineController, TrapError> {
        let shared = Arc::new(Shared::new(self.events.unwrap_or_else(null_sender)));
        let (commands, receiver) = crossbeam_channel::unbounded();

        let exporter = self.exporter.unwrap_or_else(|| {
            Box::new(DirectoryExporter::new(
                self.options.link_mode,
                self.options.duplicate_policy,
            ))
        });
        let worker = Worker {
            shared: Arc::clone(&shared),
            commands: receiver,
            scanner: self
                .scanner
                .unwrap_or_else(|| Box::new(DirectoryScanner::new(self.scan_config))),
            classifier: self.classifier,
            factory: self.factory,
            exporter,
            options: self.options,
        };

        let handle = thread::Builder::new()
            .name("trap-sorter-worker".to_string())
            .spawn(move || worker.run())?;

        Ok(PipelineController::new(shared, commands, handle))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point for building a pipeline
pub struct Pipeline;

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }
}
