//! Event type definitions for pipeline notifications.

use crate::core::worktree::{ProcessState, WorkItemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// All events emitted by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Changes to single work items
    Item(ItemEvent),
    /// Progress of the item currently being processed
    Progress(ProgressEvent),
    /// Worker-level events
    Pipeline(PipelineEvent),
}

/// Events about one directory in the work tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemEvent {
    /// A directory (root or child) entered the tree
    Added {
        id: WorkItemId,
        path: PathBuf,
        parent: Option<WorkItemId>,
    },
    /// A directory left the tree
    Removed { id: WorkItemId, path: PathBuf },
    /// The item moved along the state machine
    StateChanged { id: WorkItemId, state: ProcessState },
    /// Processing the item failed; the item stays in the tree
    Error {
        id: WorkItemId,
        path: PathBuf,
        message: String,
    },
}

/// Progress information for the active item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: PassPhase,
    pub id: WorkItemId,
    /// 0..=100
    pub percent: u8,
}

/// Worker-level events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A pass started over the tree
    PassStarted { phase: PassPhase },
    /// A pass ran out of work
    PassCompleted { phase: PassPhase },
    /// A pass stopped early (pause, shutdown or classifier interruption)
    PassInterrupted { phase: PassPhase },
    Paused,
    Resumed,
    /// The worker has nothing left to do and waits for a wake-up
    Idle,
    /// A pass could not run at all (e.g. the classifier failed to load)
    Error { message: String },
    /// The worker thread exited
    Stopped,
}

/// The two passes the worker runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassPhase {
    Scan,
    Classify,
}

impl fmt::Display for PassPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassPhase::Scan => write!(f, "Scanning"),
            PassPhase::Classify => write!(f, "Classifying"),
        }
    }
}
