//! A single directory tracked by the work tree.

use super::ProcessState;
use crate::core::table::EventTable;
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Arena index of a work item. Never reused within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItemId(pub(crate) usize);

impl WorkItemId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One directory and its processing state.
///
/// Readers may look at the state and table at any time. Changing either
/// requires an [`ItemLock`].
#[derive(Debug)]
pub struct WorkItem {
    id: WorkItemId,
    path: PathBuf,
    parent: Option<WorkItemId>,
    state: AtomicU8,
    table: RwLock<Option<Arc<EventTable>>>,
    error: RwLock<Option<String>>,
    process_lock: Mutex<()>,
    detached: AtomicBool,
}

impl WorkItem {
    pub(crate) fn new(id: WorkItemId, path: PathBuf, parent: Option<WorkItemId>) -> Self {
        Self {
            id,
            path,
            parent,
            state: AtomicU8::new(ProcessState::Queued as u8),
            table: RwLock::new(None),
            error: RwLock::new(None),
            process_lock: Mutex::new(()),
            detached: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> WorkItemId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path component, used for output folder names
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn parent(&self) -> Option<WorkItemId> {
        self.parent
    }

    pub fn state(&self) -> ProcessState {
        ProcessState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The table produced by the last successful scan or classification.
    ///
    /// `None` until the item is READ; table and state are published together.
    pub fn table(&self) -> Option<Arc<EventTable>> {
        let table = self.table.read();
        if self.state().has_table() {
            table.clone()
        } else {
            None
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.read().clone()
    }

    /// Set once the item is scheduled for removal; the worker skips it
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Lock the item if nobody else holds it
    pub fn try_lock(&self) -> Option<ItemLock<'_>> {
        self.process_lock.try_lock().map(|guard| ItemLock {
            item: self,
            _guard: guard,
        })
    }

    /// Block until the item lock is available
    pub fn lock(&self) -> ItemLock<'_> {
        ItemLock {
            item: self,
            _guard: self.process_lock.lock(),
        }
    }

    /// One-line human readable status
    pub fn status_text(&self) -> String {
        match self.state() {
            ProcessState::Queued => "Waiting for directory scan..".to_string(),
            ProcessState::Scanning => "Waiting for scan to finish..".to_string(),
            ProcessState::Failed => self
                .last_error()
                .unwrap_or_else(|| "No camera trap images found".to_string()),
            ProcessState::Read | ProcessState::Classifying | ProcessState::Classified => {
                let (images, events) = self
                    .table()
                    .map(|t| (t.len(), t.event_count()))
                    .unwrap_or_default();
                let summary = format!("{} images found in {} events", images, events);
                match self.state() {
                    ProcessState::Classifying => format!("{} (classifying..)", summary),
                    ProcessState::Classified => format!("{} (classified)", summary),
                    _ => summary,
                }
            }
        }
    }
}

/// Exclusive access to one item's state and table
pub struct ItemLock<'a> {
    item: &'a WorkItem,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> ItemLock<'a> {
    pub fn item(&self) -> &'a WorkItem {
        self.item
    }

    /// Move along one edge of the state machine.
    ///
    /// Returns `false` and leaves the state untouched for an illegal edge.
    pub fn set_state(&self, next: ProcessState) -> bool {
        let current = self.item.state();
        if !current.can_transition_to(next) {
            warn!(item = %self.item.id, %current, %next, "Rejected state transition");
            return false;
        }
        self.item.state.store(next as u8, Ordering::Release);
        debug!(item = %self.item.id, %current, %next, "State changed");
        true
    }

    /// Store `table` and move to `next` as one step; readers see either
    /// the old pair or the new one.
    pub fn publish_table(&self, table: EventTable, next: ProcessState) -> bool {
        let mut slot = self.item.table.write();
        if !self.set_state(next) {
            return false;
        }
        *slot = Some(Arc::new(table));
        true
    }

    pub fn set_error(&self, message: Option<String>) {
        *self.item.error.write() = message;
    }
}
