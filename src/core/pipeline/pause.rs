//! Global pause flag shared by the controller and the worker.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    paused: bool,
    shutdown: bool,
}

/// Mutex/condvar pair the worker blocks on while processing is paused
#[derive(Debug, Default)]
pub struct PauseGate {
    state: Mutex<GateState>,
    resumed: Condvar,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the gate was open before
    pub fn pause(&self) -> bool {
        let mut state = self.state.lock();
        let changed = !state.paused;
        state.paused = true;
        changed
    }

    /// Open the gate and wake every waiter. Returns `true` if it was paused.
    pub fn resume(&self) -> bool {
        let mut state = self.state.lock();
        let changed = state.paused;
        state.paused = false;
        self.resumed.notify_all();
        changed
    }

    /// Release all waiters for good
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        self.resumed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Whether work may continue right now
    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        !state.paused && !state.shutdown
    }

    /// Block while paused. Returns `false` once the gate is shut down.
    pub fn wait_while_paused(&self) -> bool {
        let mut state = self.state.lock();
        while state.paused && !state.shutdown {
            self.resumed.wait(&mut state);
        }
        !state.shutdown
    }
}
