//! Interview session orchestration
//!
//! This module owns the call lifecycle for one interview attempt:
//! - The explicit state machine and its in-flight-operation guard
//! - The join gate between call end and upload completion
//! - The orchestrator driving devices, media, and the agent gateway
//! - Post-call feedback assembly and dispatch

mod feedback;
mod session;
mod state;
mod stats;

pub use feedback::{FeedbackDispatcher, FeedbackPayload};
pub use session::{InterviewSession, Navigation, SessionParams};
pub use state::{AsyncOp, CallState, FinishGate, StateError, StateMachine, Trigger};
pub use stats::SessionStats;
