//! The single worker thread running scan and classify passes.

use super::options::ClassificationOptions;
use super::pause::PauseGate;
use super::ClassifierFactory;
use crate::core::classifier::Classifier;
use crate::core::export::Exporter;
use crate::core::scanner::DirectoryScan;
use crate::core::worktree::{ItemLock, ProcessState, WorkItem, WorkTree};
use crate::error::ClassifyError;
use crate::events::{Event, EventSender, ItemEvent, PassPhase, PipelineEvent, ProgressEvent};
use crossbeam_channel::Receiver;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Messages from the controller to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerCommand {
    /// Look for work
    Wake,
    Shutdown,
}

/// State shared by the controller and the worker
#[derive(Debug)]
pub(crate) struct Shared {
    pub tree: WorkTree,
    pub gate: PauseGate,
    pub events: EventSender,
    pub classify_requested: AtomicBool,
}

impl Shared {
    pub fn new(events: EventSender) -> Self {
        Self {
            tree: WorkTree::new(),
            gate: PauseGate::new(),
            events,
            classify_requested: AtomicBool::new(false),
        }
    }

    pub fn emit_state(&self, item: &WorkItem) {
        self.events.send(Event::Item(ItemEvent::StateChanged {
            id: item.id(),
            state: item.state(),
        }));
    }

    pub fn emit_error(&self, item: &WorkItem, message: String) {
        self.events.send(Event::Item(ItemEvent::Error {
            id: item.id(),
            path: item.path().to_path_buf(),
            message,
        }));
    }

    /// Progress check shared by both passes: keep going only while the gate
    /// is open and `item` is still the active, attached item.
    fn report(&self, phase: PassPhase, item: &WorkItem, percent: u8) -> bool {
        self.events.send(Event::Progress(ProgressEvent {
            phase,
            id: item.id(),
            percent,
        }));
        self.gate.is_open() && self.tree.active() == Some(item.id()) && !item.is_detached()
    }
}

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassEnd {
    Completed,
    Interrupted,
}

pub(crate) struct Worker {
    pub shared: Arc<Shared>,
    pub commands: Receiver<WorkerCommand>,
    pub scanner: Box<dyn DirectoryScan>,
    pub classifier: Option<Box<dyn Classifier>>,
    pub factory: Option<ClassifierFactory>,
    pub exporter: Box<dyn Exporter>,
    pub options: ClassificationOptions,
}

impl Worker {
    pub fn run(mut self) {
        info!("Worker started");

        while let Ok(command) = self.commands.recv() {
            // Coalesce queued wake-ups into one round
            let mut shutdown = command == WorkerCommand::Shutdown;
            while let Ok(next) = self.commands.try_recv() {
                shutdown |= next == WorkerCommand::Shutdown;
            }
            if shutdown || self.shared.gate.is_shutdown() {
                break;
            }

            self.run_scan_pass();
            if self.shared.classify_requested.load(Ordering::Acquire)
                && !self.shared.gate.is_shutdown()
            {
                self.run_classify_pass();
            }

            if self.shared.gate.is_shutdown() {
                break;
            }
            self.shared.events.send(Event::Pipeline(PipelineEvent::Idle));
        }

        info!("Worker stopped");
        self.shared.events.send(Event::Pipeline(PipelineEvent::Stopped));
    }

    /// Wait out a pause, then claim the next queued leaf
    fn next_unread(&self) -> Option<Arc<WorkItem>> {
        if !self.shared.gate.wait_while_paused() {
            return None;
        }
        self.shared.tree.claim_next_queued()
    }

    fn run_scan_pass(&self) {
        let phase = PassPhase::Scan;
        if !self.shared.tree.has_queued() {
            return;
        }
        self.shared.events.send(Event::Pipeline(PipelineEvent::PassStarted { phase }));

        while let Some(item) = self.next_unread() {
            let Some(lock) = item.try_lock() else {
                debug!(item = %item.id(), "Item busy, skipping");
                thread::yield_now();
                continue;
            };
            // Paused or removed between claim and lock: leave it queued
            if item.is_detached()
                || item.state() != ProcessState::Queued
                || !self.shared.gate.is_open()
                || self.shared.tree.active() != Some(item.id())
            {
                continue;
            }
            self.scan_item(&lock);
        }

        let end = if self.shared.gate.is_shutdown() {
            PassEnd::Interrupted
        } else {
            PassEnd::Completed
        };
        self.finish_pass(phase, end);
    }

    fn scan_item(&self, lock: &ItemLock<'_>) {
        let item = lock.item();
        let shared = &self.shared;

        lock.set_state(ProcessState::Scanning);
        shared.emit_state(item);

        let mut progress = |percent: u8| shared.report(PassPhase::Scan, item, percent);
        match self.scanner.scan(item.path(), &mut progress) {
            Ok(table) => {
                lock.set_error(None);
                lock.publish_table(table, ProcessState::Read);
            }
            Err(err) if err.is_interrupted() => {
                debug!(item = %item.id(), "Scan interrupted, item re-queued");
                lock.set_state(ProcessState::Queued);
            }
            Err(err) => {
                warn!(item = %item.id(), path = %item.path().display(), %err, "Scan failed");
                lock.set_error(Some(err.to_string()));
                lock.set_state(ProcessState::Failed);
                shared.emit_error(item, err.to_string());
            }
        }
        shared.emit_state(item);
    }

    /// Classify every READ leaf once.
    ///
    /// An interrupted item aborts the whole pass; the next wake-up starts
    /// over from the first READ leaf.
    fn run_classify_pass(&mut self) {
        let phase = PassPhase::Classify;
        let candidates = self.shared.tree.read_leaves();
        if candidates.is_empty() {
            self.shared.classify_requested.store(false, Ordering::Release);
            return;
        }
        self.shared.events.send(Event::Pipeline(PipelineEvent::PassStarted { phase }));

        let mut classifier = match self.classifier.take() {
            Some(classifier) => classifier,
            None => match self.load_classifier() {
                Ok(classifier) => classifier,
                Err(err) => {
                    error!(%err, "Classifier unavailable");
                    self.shared.classify_requested.store(false, Ordering::Release);
                    self.shared.events.send(Event::Pipeline(PipelineEvent::Error {
                        message: err.to_string(),
                    }));
                    self.finish_pass(phase, PassEnd::Interrupted);
                    return;
                }
            },
        };

        let end = self.classify_items(classifier.as_mut(), candidates);
        self.classifier = Some(classifier);

        self.shared.tree.set_active(None);
        if end == PassEnd::Completed {
            self.shared.classify_requested.store(false, Ordering::Release);
        }
        self.finish_pass(phase, end);
    }

    fn load_classifier(&self) -> Result<Box<dyn Classifier>, ClassifyError> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| ClassifyError::Model("no classifier configured".to_string()))?;
        info!(model = ?self.options.model_path, "Initializing classifier");
        factory(&self.options)
    }

    fn classify_items(
        &self,
        classifier: &mut dyn Classifier,
        candidates: Vec<Arc<WorkItem>>,
    ) -> PassEnd {
        for item in candidates {
            if !self.shared.gate.wait_while_paused() {
                return PassEnd::Interrupted;
            }

            // Resolved before locking: the tree lock is never taken while an
            // item lock is held.
            let parent = self.shared.tree.parent_of(&item);
            let output = self
                .options
                .output_path_for(item.path(), parent.as_deref().map(WorkItem::path));

            let Some(lock) = item.try_lock() else {
                debug!(item = %item.id(), "Item busy, skipping");
                continue;
            };
            if item.is_detached() || item.state() != ProcessState::Read {
                continue;
            }
            let Some(table) = item.table() else {
                continue;
            };

            self.shared.tree.set_active(Some(item.id()));
            if !self.classify_item(&lock, classifier, (*table).clone(), output) {
                return PassEnd::Interrupted;
            }
        }
        PassEnd::Completed
    }

    /// Returns `false` when the classifier was interrupted
    fn classify_item(
        &self,
        lock: &ItemLock<'_>,
        classifier: &mut dyn Classifier,
        table: crate::core::table::EventTable,
        output: PathBuf,
    ) -> bool {
        let item = lock.item();
        let shared = &self.shared;

        lock.set_state(ProcessState::Classifying);
        shared.emit_state(item);

        let mut progress = |percent: u8| shared.report(PassPhase::Classify, item, percent);
        let result = classifier.classify(table, &mut progress);

        let completed = match result {
            Ok(labeled) => {
                if let Err(err) = self.exporter.export(&output, &labeled, &self.options.labels) {
                    error!(item = %item.id(), path = %output.display(), %err, "Export failed");
                    shared.emit_error(item, err.to_string());
                }
                lock.publish_table(labeled, ProcessState::Classified);
                true
            }
            Err(ClassifyError::Interrupted) => {
                debug!(item = %item.id(), "Classification interrupted, abandoning pass");
                lock.set_state(ProcessState::Read);
                false
            }
            Err(err) => {
                warn!(item = %item.id(), %err, "Classification failed");
                lock.set_state(ProcessState::Read);
                shared.emit_error(item, err.to_string());
                true
            }
        };
        shared.emit_state(item);
        completed
    }

    fn finish_pass(&self, phase: PassPhase, end: PassEnd) {
        let event = match end {
            PassEnd::Completed => PipelineEvent::PassCompleted { phase },
            PassEnd::Interrupted => PipelineEvent::PassInterrupted { phase },
        };
        debug!(%phase, ?end, "Pass finished");
        self.shared.events.send(Event::Pipeline(event));
    }
}
