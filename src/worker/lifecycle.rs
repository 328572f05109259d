//! Worker lifecycle
//!
//! `Installing -> Waiting -> Activating -> Activated`, with `Redundant`
//! for failed installs and replaced workers.

use std::fmt;

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Worker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    /// Installed, waiting for the current controller to let go
    Waiting,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

// == Lifecycle Event ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    InstallSucceeded,
    InstallFailed,
    /// Skip-waiting request, or nothing to wait for
    Activate,
    ActivationComplete,
    /// Old generations could not be cleaned up; activation may be retried
    ActivationFailed,
    /// A newer worker took control
    Replaced,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::InstallSucceeded => "install_succeeded",
            LifecycleEvent::InstallFailed => "install_failed",
            LifecycleEvent::Activate => "activate",
            LifecycleEvent::ActivationComplete => "activation_complete",
            LifecycleEvent::ActivationFailed => "activation_failed",
            LifecycleEvent::Replaced => "replaced",
        };
        f.write_str(name)
    }
}

/// Pure transition function.
pub fn transition(state: WorkerState, event: LifecycleEvent) -> Result<WorkerState> {
    use LifecycleEvent as E;
    use WorkerState as S;

    match (state, event) {
        (S::Installing, E::InstallSucceeded) => Ok(S::Waiting),
        (S::Installing, E::InstallFailed) => Ok(S::Redundant),
        (S::Waiting, E::Activate) => Ok(S::Activating),
        // Repeated skip-waiting requests are harmless
        (S::Activating | S::Activated, E::Activate) => Ok(state),
        (S::Activating, E::ActivationComplete) => Ok(S::Activated),
        (S::Activating, E::ActivationFailed) => Ok(S::Waiting),
        (S::Waiting | S::Activated, E::Replaced) => Ok(S::Redundant),
        _ => Err(CacheError::InvalidTransition {
            state: state.to_string(),
            event: event.to_string(),
        }),
    }
}
