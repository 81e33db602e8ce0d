//! Instrument resolution state machine.
//!
//! Lookup callbacks may fire several times before the gateway settles. A miss
//! that is not final is not an error: the search is still running.

use tracing::debug;

use crate::domain::Instrument;
use crate::gateway::LookupUpdate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Pending,
    Resolved(Instrument),
    FailedFinal(String),
}

/// What the caller should do after applying an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed; keep waiting.
    Wait,
    /// The instrument was found. Fires once.
    Resolved(Instrument),
    /// The gateway gave up. Fires once.
    Failed(String),
    /// The lookup had already settled; the update was ignored.
    Ignored,
}

#[derive(Debug)]
pub struct Lookup {
    state: LookupState,
}

impl Lookup {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: LookupState::Pending,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn apply(&mut self, update: LookupUpdate) -> Transition {
        if !matches!(self.state, LookupState::Pending) {
            debug!(?update, "Lookup already settled, ignoring update");
            return Transition::Ignored;
        }

        match update {
            LookupUpdate {
                instrument: Some(instrument),
                error: None,
                ..
            } => {
                self.state = LookupState::Resolved(instrument.clone());
                Transition::Resolved(instrument)
            }
            LookupUpdate {
                is_final: true,
                error,
                ..
            } => {
                let reason = error.unwrap_or_else(|| "instrument not found".to_string());
                self.state = LookupState::FailedFinal(reason.clone());
                Transition::Failed(reason)
            }
            LookupUpdate { error, .. } => {
                debug!(reason = ?error, "Instrument not found yet, still searching");
                Transition::Wait
            }
        }
    }
}

impl Default for Lookup {
    fn default() -> Self {
        Self::new()
    }
}
