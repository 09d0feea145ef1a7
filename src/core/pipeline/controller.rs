//! Caller-side handle to the worker thread.

use super::worker::{Shared, WorkerCommand};
use crate::core::table::EventTable;
use crate::core::worktree::{ItemSnapshot, ProcessState, WorkItemId, WorkTree};
use crate::error::ScanError;
use crate::events::{Event, ItemEvent, PipelineEvent};
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

/// Owns the worker thread. Dropping the controller stops the worker.
///
/// All methods are cheap: they touch the work tree and signal the worker,
/// they never scan or classify on the calling thread.
pub struct PipelineController {
    shared: Arc<Shared>,
    commands: Sender<WorkerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineController {
    pub(crate) fn new(
        shared: Arc<Shared>,
        commands: Sender<WorkerCommand>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            shared,
            commands,
            handle: Some(handle),
        }
    }

    /// Add a directory (and its immediate subdirectories) and wake the
    /// worker. Returns `Ok(None)` if the path is empty or already present.
    pub fn add_dir(&self, path: &Path) -> Result<Option<WorkItemId>, ScanError> {
        let Some(root) = self.shared.tree.add_dir(path)? else {
            return Ok(None);
        };

        let added = self
            .shared
            .tree
            .get(root)
            .into_iter()
            .chain(self.shared.tree.children(root));
        for item in added {
            self.shared.events.send(Event::Item(ItemEvent::Added {
                id: item.id(),
                path: item.path().to_path_buf(),
                parent: item.parent(),
            }));
        }

        self.wake();
        Ok(Some(root))
    }

    /// Remove a directory, blocking while the worker finishes with it.
    /// Returns the number of removed tree nodes.
    pub fn remove_dir(&self, id: WorkItemId) -> usize {
        let removed = self.shared.tree.remove(id);
        for item in &removed {
            self.shared.events.send(Event::Item(ItemEvent::Removed {
                id: item.id(),
                path: item.path().to_path_buf(),
            }));
        }
        // A removal can cut a pass short; let the worker pick up the rest
        self.wake();
        removed.len()
    }

    /// Stop at the next progress check. The interrupted item keeps (or
    /// returns to) its pre-pass state.
    pub fn pause(&self) {
        if self.shared.gate.pause() {
            self.shared.tree.set_active(None);
            info!("Pipeline paused");
            self.shared.events.send(Event::Pipeline(PipelineEvent::Paused));
        }
    }

    pub fn resume(&self) {
        if self.shared.gate.resume() {
            info!("Pipeline resumed");
            self.shared.events.send(Event::Pipeline(PipelineEvent::Resumed));
            self.wake();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.gate.is_paused()
    }

    /// Classify every scanned directory once scanning has caught up
    pub fn classify(&self) {
        self.shared.classify_requested.store(true, Ordering::Release);
        self.wake();
    }

    pub fn snapshot(&self) -> Vec<ItemSnapshot> {
        self.shared.tree.snapshot()
    }

    pub fn tree(&self) -> &WorkTree {
        &self.shared.tree
    }

    pub fn state(&self, id: WorkItemId) -> Option<ProcessState> {
        self.shared.tree.get(id).map(|item| item.state())
    }

    pub fn table(&self, id: WorkItemId) -> Option<Arc<EventTable>> {
        self.shared.tree.get(id).and_then(|item| item.table())
    }

    pub fn status_text(&self, id: WorkItemId) -> Option<String> {
        self.shared.tree.get(id).map(|item| item.status_text())
    }

    pub fn is_fully_scanned(&self) -> bool {
        self.shared.tree.is_fully_scanned()
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn wake(&self) {
        let _ = self.commands.send(WorkerCommand::Wake);
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.shared.gate.shutdown();
        self.shared.tree.set_active(None);
        let _ = self.commands.send(WorkerCommand::Shutdown);
        if handle.join().is_err() {
            error!("Worker thread panicked");
        }
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.stop();
    }
}
