use serde::Serialize;

use crate::media::RecordingArtifact;

/// Lifecycle of a single interview attempt.
///
/// `Inactive` and `Finished` are terminal with respect to one attempt;
/// `Finished` triggers the one-shot analyze→dispatch pipeline and is never
/// re-entered within the same session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    Inactive,
    DeviceSelection,
    PermissionGranted,
    Connecting,
    Active,
    Finished,
}

/// Discrete causes of a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Device lists were enumerated and cached
    DevicesLoaded,

    /// Capture access was granted
    PermissionGranted,

    /// Capture access was denied; self-loop so the user may retry
    PermissionDenied,

    /// The user started the interview (recorder + agent started)
    InterviewStarted,

    /// The agent reported the call as live
    CallStarted,

    /// The recording upload resolved successfully
    UploadResolved,
}

/// Asynchronous side effects that suspend the machine.
///
/// Only one may be in flight at a time; triggers arriving while one is
/// pending are rejected rather than racing two transitions. Teardown is
/// the transitional phase between `Active` and `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncOp {
    DeviceQuery,
    PermissionRequest,
    Teardown,
}

impl AsyncOp {
    fn allowed_from(self, state: CallState) -> bool {
        matches!(
            (state, self),
            (CallState::Inactive, AsyncOp::DeviceQuery)
                | (CallState::DeviceSelection, AsyncOp::PermissionRequest)
                | (CallState::Active, AsyncOp::Teardown)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("trigger {trigger:?} is not valid in state {state:?}")]
    InvalidTrigger { state: CallState, trigger: Trigger },

    #[error("operation {op:?} may not begin in state {state:?}")]
    InvalidOperation { state: CallState, op: AsyncOp },

    #[error("another transition is in flight: {0:?}")]
    Busy(AsyncOp),

    #[error("device selection is frozen in state {state:?}")]
    SelectionFrozen { state: CallState },

    #[error("call end and upload completion have not both resolved")]
    JoinPending,
}

/// Explicit finite state machine for the session.
///
/// All state changes go through the transition table; invalid triggers for
/// the current state are rejected instead of silently mutating shared
/// state.
#[derive(Debug)]
pub struct StateMachine {
    state: CallState,
    in_flight: Option<AsyncOp>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: CallState::Inactive,
            in_flight: None,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn in_flight(&self) -> Option<AsyncOp> {
        self.in_flight
    }

    /// Reserve the machine for an async side effect. Fails if another is
    /// pending or the operation is not valid in the current state.
    pub fn begin(&mut self, op: AsyncOp) -> Result<(), StateError> {
        if let Some(pending) = self.in_flight {
            return Err(StateError::Busy(pending));
        }

        if !op.allowed_from(self.state) {
            return Err(StateError::InvalidOperation {
                state: self.state,
                op,
            });
        }

        self.in_flight = Some(op);
        Ok(())
    }

    /// Complete a pending side effect, applying its outcome trigger.
    pub fn resolve(&mut self, op: AsyncOp, trigger: Trigger) -> Result<CallState, StateError> {
        if self.in_flight != Some(op) {
            return Err(StateError::InvalidOperation {
                state: self.state,
                op,
            });
        }

        self.in_flight = None;
        self.transition(trigger)
    }

    /// Drop a pending side effect without a state change (its async work
    /// failed; the error is surfaced elsewhere).
    pub fn abort(&mut self, op: AsyncOp) {
        if self.in_flight == Some(op) {
            self.in_flight = None;
        }
    }

    /// Apply a synchronous trigger. Rejected while a side effect is in
    /// flight.
    pub fn apply(&mut self, trigger: Trigger) -> Result<CallState, StateError> {
        if let Some(pending) = self.in_flight {
            return Err(StateError::Busy(pending));
        }

        self.transition(trigger)
    }

    fn transition(&mut self, trigger: Trigger) -> Result<CallState, StateError> {
        let next = next_state(self.state, trigger).ok_or(StateError::InvalidTrigger {
            state: self.state,
            trigger,
        })?;

        self.state = next;
        Ok(next)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn next_state(state: CallState, trigger: Trigger) -> Option<CallState> {
    match (state, trigger) {
        (CallState::Inactive, Trigger::DevicesLoaded) => Some(CallState::DeviceSelection),
        (CallState::DeviceSelection, Trigger::PermissionGranted) => {
            Some(CallState::PermissionGranted)
        }
        (CallState::DeviceSelection, Trigger::PermissionDenied) => Some(CallState::DeviceSelection),
        (CallState::PermissionGranted, Trigger::InterviewStarted) => Some(CallState::Connecting),
        (CallState::Connecting, Trigger::CallStarted) => Some(CallState::Active),
        (CallState::Active, Trigger::UploadResolved) => Some(CallState::Finished),
        _ => None,
    }
}

/// Join point for the two independently-resolving completion signals.
///
/// Feedback is gated on the conjunction of the call having ended and the
/// recording upload having resolved successfully; neither signal alone may
/// drive the session into `Finished`.
#[derive(Debug, Default)]
pub struct FinishGate {
    call_ended: bool,
    artifact: Option<RecordingArtifact>,
}

impl FinishGate {
    pub fn record_call_end(&mut self) {
        self.call_ended = true;
    }

    /// Record the upload outcome. Unavailable artifacts never close the
    /// gate.
    pub fn record_artifact(&mut self, artifact: RecordingArtifact) {
        if artifact.available {
            self.artifact = Some(artifact);
        }
    }

    pub fn call_ended(&self) -> bool {
        self.call_ended
    }

    /// The joined result, present only once both signals have arrived.
    pub fn ready(&self) -> Option<&RecordingArtifact> {
        if self.call_ended {
            self.artifact.as_ref()
        } else {
            None
        }
    }
}
