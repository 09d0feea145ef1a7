//! Processing state of a work item.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a directory is in the scan/classify lifecycle.
///
/// ```text
/// QUEUED -> SCANNING -> READ -> CLASSIFYING -> CLASSIFIED
///    ^          |  \              |
///    +----------+   -> FAILED     +-> READ (interrupted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProcessState {
    Queued = 0,
    Scanning = 1,
    Failed = 2,
    Read = 3,
    Classifying = 4,
    Classified = 5,
}

impl ProcessState {
    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Queued, Scanning)
                | (Scanning, Read)
                | (Scanning, Failed)
                | (Scanning, Queued)
                | (Read, Classifying)
                | (Classifying, Classified)
                | (Classifying, Read)
        )
    }

    /// States that only the worker holds while it owns the item lock
    pub fn is_busy(self) -> bool {
        matches!(self, ProcessState::Scanning | ProcessState::Classifying)
    }

    /// Whether the item owns an event table in this state
    pub fn has_table(self) -> bool {
        matches!(
            self,
            ProcessState::Read | ProcessState::Classifying | ProcessState::Classified
        )
    }

    pub(crate) fn from_u8(raw: u8) -> ProcessState {
        match raw {
            1 => ProcessState::Scanning,
            2 => ProcessState::Failed,
            3 => ProcessState::Read,
            4 => ProcessState::Classifying,
            5 => ProcessState::Classified,
            _ => ProcessState::Queued,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Queued => write!(f, "Queued"),
            ProcessState::Scanning => write!(f, "Scanning"),
            ProcessState::Failed => write!(f, "Failed"),
            ProcessState::Read => write!(f, "Read"),
            ProcessState::Classifying => write!(f, "Classifying"),
            ProcessState::Classified => write!(f, "Classified"),
        }
    }
}
