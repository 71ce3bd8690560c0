//! Finite state machine for loading the workflow list

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Load state of the workflow collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Nothing requested yet
    Idle,

    /// A list call is in flight
    Loading,

    /// Last list call succeeded
    Loaded,

    /// Last list call failed
    Failed,
}

/// Load event
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// Start (or restart) a list call
    Fetch,

    /// The list call succeeded
    Succeed,

    /// The list call failed
    Fail(String),
}

/// Load FSM
#[derive(Debug, Clone)]
pub struct LoadFsm {
    state: LoadState,
}

impl LoadFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
        }
    }

    /// Get current state
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: LoadEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            // Refresh is allowed from anywhere, including while loading
            (_, LoadEvent::Fetch) => LoadState::Loading,

            (LoadState::Loading, LoadEvent::Succeed) => LoadState::Loaded,
            (LoadState::Loading, LoadEvent::Fail(err)) => {
                debug!("Workflow load failed: {}", err);
                LoadState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for LoadFsm {
    fn default() -> Self {
        Self::new()
    }
}
