//! # WorkTree Module
//!
//! The set of directories the pipeline works on.
//!
//! ## Shape
//! Two levels: a root directory added by the user, and its immediate
//! subdirectories. A root with subdirectories is only a container; its
//! children are the units of work. A root without subdirectories is itself
//! the unit of work (a "leaf").
//!
//! ## Locking
//! - Structural changes (add/remove) go through one re-entrant tree lock.
//!   Removing the last child of a root removes the root too, from inside the
//!   same lock.
//! - Each item has its own lock guarding its state and table. The worker
//!   never takes the tree lock while holding an item lock.
//! - `active` names the item the worker is currently on. Clearing it tells
//!   the worker to drop that item at the next progress check.

mod item;
mod state;

pub use item::{ItemLock, WorkItem, WorkItemId};
pub use state::ProcessState;

use crate::error::ScanError;
use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug)]
struct RootNode {
    id: WorkItemId,
    children: Vec<WorkItemId>,
}

#[derive(Debug, Default)]
struct TreeInner {
    items: Vec<Option<Arc<WorkItem>>>,
    roots: Vec<RootNode>,
}

impl TreeInner {
    fn get(&self, id: WorkItemId) -> Option<&Arc<WorkItem>> {
        self.items.get(id.0).and_then(Option::as_ref)
    }

    fn insert(&mut self, path: PathBuf, parent: Option<WorkItemId>) -> WorkItemId {
        let id = WorkItemId(self.items.len());
        self.items.push(Some(Arc::new(WorkItem::new(id, path, parent))));
        id
    }

    /// Units of work in tree order
    fn leaves(&self) -> impl Iterator<Item = &Arc<WorkItem>> + '_ {
        self.roots.iter().flat_map(move |root| {
            let ids: Vec<WorkItemId> = if root.children.is_empty() {
                vec![root.id]
            } else {
                root.children.clone()
            };
            ids.into_iter().filter_map(move |id| self.get(id))
        })
    }
}

/// Serializable view of one tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: WorkItemId,
    pub path: PathBuf,
    pub state: ProcessState,
    pub images: usize,
    pub events: usize,
    pub status: String,
    pub children: Vec<ItemSnapshot>,
}

impl ItemSnapshot {
    fn of(item: &WorkItem, children: Vec<ItemSnapshot>) -> Self {
        let (images, events) = item
            .table()
            .map(|t| (t.len(), t.event_count()))
            .unwrap_or_default();
        Self {
            id: item.id(),
            path: item.path().to_path_buf(),
            state: item.state(),
            images,
            events,
            status: item.status_text(),
            children,
        }
    }
}

/// Arena of work items with per-item locks
#[derive(Debug, Default)]
pub struct WorkTree {
    inner: ReentrantMutex<RefCell<TreeInner>>,
    active: Mutex<Option<WorkItemId>>,
}

impl WorkTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root directory and its immediate subdirectories.
    ///
    /// Returns `Ok(None)` for an empty path or a root that is already in the
    /// tree.
    pub fn add_dir(&self, path: &Path) -> Result<Option<WorkItemId>, ScanError> {
        if path.as_os_str().is_empty() {
            return Ok(None);
        }
        if !path.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: path.to_path_buf(),
            });
        }

        let subdirs = list_subdirectories(path)?;

        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();

        let duplicate = inner
            .roots
            .iter()
            .filter_map(|root| inner.get(root.id))
            .any(|item| item.path() == path);
        if duplicate {
            debug!(path = %path.display(), "Directory already in tree");
            return Ok(None);
        }

        let root_id = inner.insert(path.to_path_buf(), None);
        let children = subdirs
            .into_iter()
            .map(|child| inner.insert(child, Some(root_id)))
            .collect::<Vec<_>>();

        info!(
            path = %path.display(),
            subdirectories = children.len(),
            "Directory added"
        );
        inner.roots.push(RootNode {
            id: root_id,
            children,
        });
        Ok(Some(root_id))
    }

    /// Remove an item, waiting for the worker to let go of it first.
    ///
    /// Removing a root removes all its children. Removing the last child of
    /// a root removes the root as well. Returns every removed item.
    pub fn remove(&self, id: WorkItemId) -> Vec<Arc<WorkItem>> {
        let (item, children) = {
            let guard = self.inner.lock();
            let inner = guard.borrow();
            let Some(item) = inner.get(id).cloned() else {
                return Vec::new();
            };
            let children = inner
                .roots
                .iter()
                .find(|root| root.id == id)
                .map(|root| root.children.clone())
                .unwrap_or_default();
            (item, children)
        };

        if !children.is_empty() {
            let mut removed = Vec::new();
            for child in children {
                removed.extend(self.remove(child));
            }
            // The cascade normally took the root with the last child
            if self.get(id).is_some() {
                removed.extend(self.remove(id));
            }
            return removed;
        }

        item.detach();
        let lock = match item.try_lock() {
            Some(lock) => lock,
            None => {
                debug!(item = %id, "Item busy, waiting for worker to release it");
                self.clear_active_if(id);
                item.lock()
            }
        };

        let mut removed = Vec::new();
        let deferred = self.unlink(&item, &mut removed);
        drop(lock);

        // An emptied parent that was busy is removed here, outside the tree lock
        if let Some(parent) = deferred {
            debug!(item = %parent.id(), "Emptied parent busy, waiting to remove it");
            removed.extend(self.remove(parent.id()));
        }
        removed
    }

    /// Take `item` out of the arena and cascade to an emptied parent.
    ///
    /// Returns the emptied parent when its lock was held elsewhere; the
    /// caller must finish removing it once the tree lock is released.
    fn unlink(&self, item: &Arc<WorkItem>, removed: &mut Vec<Arc<WorkItem>>) -> Option<Arc<WorkItem>> {
        let guard = self.inner.lock();
        let emptied_parent = {
            let mut inner = guard.borrow_mut();
            let id = item.id();
            if inner.items.get_mut(id.0).and_then(Option::take).is_none() {
                return None;
            }
            removed.push(Arc::clone(item));
            info!(item = %id, path = %item.path().display(), "Item removed");

            match item.parent() {
                None => {
                    inner.roots.retain(|root| root.id != id);
                    None
                }
                Some(parent_id) => {
                    let mut emptied = false;
                    if let Some(root) = inner.roots.iter_mut().find(|root| root.id == parent_id) {
                        root.children.retain(|child| *child != id);
                        emptied = root.children.is_empty();
                    }
                    if emptied {
                        inner.get(parent_id).cloned()
                    } else {
                        None
                    }
                }
            }
        };

        let parent = emptied_parent?;
        // Containers are never worked on, so the lock is free unless
        // another caller holds the same root.
        parent.detach();
        if let Some(_parent_lock) = parent.try_lock() {
            return self.unlink(&parent, removed);
        }
        Some(parent)
    }

    pub fn get(&self, id: WorkItemId) -> Option<Arc<WorkItem>> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.get(id).cloned()
    }

    /// Children of a container root in insertion order
    pub fn children(&self, id: WorkItemId) -> Vec<Arc<WorkItem>> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner
            .roots
            .iter()
            .find(|root| root.id == id)
            .map(|root| root.children.iter().filter_map(|c| inner.get(*c)).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of items, containers included
    pub fn len(&self) -> usize {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.items.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Units of work in tree order
    pub fn leaves(&self) -> Vec<Arc<WorkItem>> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.leaves().cloned().collect()
    }

    /// Leaves currently holding a scanned, unclassified table
    pub fn read_leaves(&self) -> Vec<Arc<WorkItem>> {
        self.leaves()
            .into_iter()
            .filter(|item| item.state() == ProcessState::Read && !item.is_detached())
            .collect()
    }

    pub fn has_queued(&self) -> bool {
        self.leaves()
            .iter()
            .any(|item| item.state() == ProcessState::Queued && !item.is_detached())
    }

    /// Mark the first queued leaf as active and hand it out
    pub fn claim_next_queued(&self) -> Option<Arc<WorkItem>> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        let mut active = self.active.lock();
        *active = None;

        let next = inner
            .leaves()
            .find(|item| item.state() == ProcessState::Queued && !item.is_detached())
            .cloned();
        if let Some(item) = &next {
            *active = Some(item.id());
        }
        next
    }

    pub fn active(&self) -> Option<WorkItemId> {
        *self.active.lock()
    }

    pub fn set_active(&self, id: Option<WorkItemId>) {
        *self.active.lock() = id;
    }

    fn clear_active_if(&self, id: WorkItemId) {
        let mut active = self.active.lock();
        if *active == Some(id) {
            *active = None;
        }
    }

    /// Every leaf has been scanned and at least one produced a table
    pub fn is_fully_scanned(&self) -> bool {
        let leaves = self.leaves();
        leaves
            .iter()
            .all(|item| !matches!(item.state(), ProcessState::Queued | ProcessState::Scanning))
            && leaves.iter().any(|item| item.state().has_table())
    }

    /// Parent of `item`, when it is a child of a container root
    pub fn parent_of(&self, item: &WorkItem) -> Option<Arc<WorkItem>> {
        item.parent().and_then(|id| self.get(id))
    }

    /// Roots and their children with state and counts
    pub fn snapshot(&self) -> Vec<ItemSnapshot> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner
            .roots
            .iter()
            .filter_map(|root| {
                let item = inner.get(root.id)?;
                let children = root
                    .children
                    .iter()
                    .filter_map(|id| inner.get(*id))
                    .map(|child| ItemSnapshot::of(child, Vec::new()))
                    .collect();
                Some(ItemSnapshot::of(item, children))
            })
            .collect()
    }
}

/// Immediate, non-hidden subdirectories of `path`, sorted by name
fn list_subdirectories(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| ScanError::ReadDirectory {
            path: path.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;

        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.path().is_dir() && !hidden {
            dirs.push(entry.into_path());
        }
    }

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn tree_with(dirs: &[&str]) -> (TempDir, WorkTree) {
        let temp_dir = TempDir::new().unwrap();
        for dir in dirs {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        (temp_dir, WorkTree::new())
    }

    #[test]
    fn root_without_subdirectories_is_a_leaf() {
        let (temp_dir, tree) = tree_with(&[]);
        let id = tree.add_dir(temp_dir.path()).unwrap().unwrap();

        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].id(), id);
    }

    #[test]
    fn children_are_leaves_in_name_order() {
        let (temp_dir, tree) = tree_with(&["b_site", "a_site", ".hidden"]);
        let root = tree.add_dir(temp_dir.path()).unwrap().unwrap();

        let names: Vec<String> = tree.leaves().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["a_site", "b_site"]);
        assert!(tree.leaves().iter().all(|i| i.parent() == Some(root)));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn empty_and_duplicate_paths_are_ignored() {
        let (temp_dir, tree) = tree_with(&[]);
        assert!(tree.add_dir(Path::new("")).unwrap().is_none());
        assert!(tree.add_dir(temp_dir.path()).unwrap().is_some());
        assert!(tree.add_dir(temp_dir.path()).unwrap().is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tree = WorkTree::new();
        let err = tree.add_dir(Path::new("/nonexistent/traps")).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound { .. }));
    }

    #[test]
    fn removing_last_child_removes_root() {
        let (temp_dir, tree) = tree_with(&["a", "b"]);
        let root = tree.add_dir(temp_dir.path()).unwrap().unwrap();
        let leaves = tree.leaves();

        let removed = tree.remove(leaves[0].id());
        assert_eq!(removed.len(), 1);
        assert!(tree.get(root).is_some());

        let removed = tree.remove(leaves[1].id());
        assert_eq!(removed.len(), 2);
        assert!(tree.get(root).is_none());
        assert!(tree.is_empty());
        assert!(leaves.iter().all(|i| i.is_detached()));
    }

    #[test]
    fn removing_root_removes_children() {
        let (temp_dir, tree) = tree_with(&["a", "b", "c"]);
        let root = tree.add_dir(temp_dir.path()).unwrap().unwrap();

        let removed = tree.remove(root);
        assert_eq!(removed.len(), 4);
        assert!(tree.snapshot().is_empty());
    }

    #[test]
    fn busy_emptied_parent_is_removed_once_released() {
        let (temp_dir, tree) = tree_with(&["a"]);
        let root = tree.add_dir(temp_dir.path()).unwrap().unwrap();
        let child = tree.leaves()[0].id();
        let root_item = tree.get(root).unwrap();

        let removed = thread::scope(|s| {
            let held = root_item.lock();
            let remover = s.spawn(|| tree.remove(child));
            while tree.get(child).is_some() {
                thread::yield_now();
            }
            thread::sleep(Duration::from_millis(50));
            // Still present while held, never orphaned
            assert!(tree.get(root).is_some());
            drop(held);
            remover.join().unwrap()
        });

        assert_eq!(removed.len(), 2);
        assert!(root_item.is_detached());
        assert!(tree.get(root).is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn claim_skips_non_queued_and_sets_active() {
        let (temp_dir, tree) = tree_with(&["a", "b"]);
        tree.add_dir(temp_dir.path()).unwrap();
        let leaves = tree.leaves();

        {
            let lock = leaves[0].lock();
            lock.set_state(ProcessState::Scanning);
        }

        let next = tree.claim_next_queued().unwrap();
        assert_eq!(next.id(), leaves[1].id());
        assert_eq!(tree.active(), Some(leaves[1].id()));

        {
            let lock = leaves[1].lock();
            lock.set_state(ProcessState::Scanning);
        }
        assert!(tree.claim_next_queued().is_none());
        assert_eq!(tree.active(), None);
    }

    #[test]
    fn remove_waits_for_held_item() {
        let (temp_dir, tree) = tree_with(&[]);
        let tree = Arc::new(tree);
        let id = tree.add_dir(temp_dir.path()).unwrap().unwrap();
        let item = tree.claim_next_queued().unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let worker = {
            let barrier = Arc::clone(&barrier);
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let lock = item.lock();
                lock.set_state(ProcessState::Scanning);
                barrier.wait();
                // Worker notices the cleared cross-reference
                while tree.active() == Some(id) {
                    thread::sleep(Duration::from_millis(5));
                }
                lock.set_state(ProcessState::Queued);
            })
        };

        barrier.wait();
        let removed = tree.remove(id);
        worker.join().unwrap();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].state(), ProcessState::Queued);
        assert!(tree.get(id).is_none());
        assert!(tree.claim_next_queued().is_none());
    }

    #[test]
    fn fully_scanned_needs_one_table() {
        let (temp_dir, tree) = tree_with(&["a", "b"]);
        tree.add_dir(temp_dir.path()).unwrap();
        let leaves = tree.leaves();
        assert!(!tree.is_fully_scanned());

        for (i, item) in leaves.iter().enumerate() {
            let lock = item.lock();
            lock.set_state(ProcessState::Scanning);
            if i == 0 {
                lock.set_state(ProcessState::Failed);
            } else {
                lock.publish_table(crate::core::table::EventTable::default(), ProcessState::Read);
            }
        }
        assert!(tree.is_fully_scanned());
        assert_eq!(tree.read_leaves().len(), 1);
    }
}
