use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::feedback::{FeedbackDispatcher, FeedbackPayload};
use super::state::{AsyncOp, CallState, FinishGate, StateMachine, StateError, Trigger};
use super::stats::SessionStats;
use crate::agent::{GatewayEvent, VoiceAgentGateway};
use crate::analysis::{analyze, attempted_count, AnalysisPolicy, AttemptedQuestion};
use crate::backend::InterviewReader;
use crate::error::SessionError;
use crate::media::{
    DeviceList, DeviceRegistry, DeviceSelection, MediaError, MediaSession, RecordingArtifact,
};
use crate::transcript::{Role, TranscriptEntry};

/// Where the caller should take the user once the session concludes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Feedback was persisted; show it
    Feedback {
        interview_id: String,
        feedback_id: String,
    },

    /// Dispatch failed; fall back to home rather than leaving the session
    /// stuck in a finished state with no way forward
    Home,
}

/// Identity and content of one interview attempt
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub interview_id: String,
    pub user_id: String,

    /// Present when a retake updates existing feedback
    pub feedback_id: Option<String>,

    /// Fixed, ordered question list
    pub questions: Vec<String>,

    pub policy: AnalysisPolicy,
}

impl SessionParams {
    /// Seed params from the read collaborators: interview for the question
    /// list, current user for identity.
    pub async fn for_interview(
        reader: &dyn InterviewReader,
        interview_id: &str,
        feedback_id: Option<String>,
        policy: AnalysisPolicy,
    ) -> Result<Self, SessionError> {
        let interview = reader
            .interview_by_id(interview_id)
            .await?
            .ok_or_else(|| SessionError::Setup(format!("interview {} not found", interview_id)))?;

        let user = reader
            .current_user()
            .await?
            .ok_or_else(|| SessionError::Setup("no signed-in user".to_string()))?;

        Ok(Self {
            interview_id: interview.id,
            user_id: user.id,
            feedback_id,
            questions: interview.questions,
            policy,
        })
    }
}

/// The interview-session orchestrator.
///
/// Owns the call state for one attempt and drives the device enumerator,
/// media session, and voice agent gateway in response to user actions and
/// gateway events. Created when the interview screen mounts; `shutdown`
/// releases capture on navigation away.
///
/// All mutation happens through `&mut self`, so transcript appends, state
/// transitions, and the post-call analysis run to completion without
/// observable interleaving; the only suspension points are the permission
/// request, the stop→upload round trip, and the dispatch call.
pub struct InterviewSession {
    id: String,
    params: SessionParams,

    state: StateMachine,

    devices: Option<DeviceList>,
    selection: DeviceSelection,

    /// Append-only during the attempt; the analyzer depends on arrival
    /// order being conversation order
    transcript: Vec<TranscriptEntry>,

    /// Ephemeral "last heard" display text (interim fragments land here
    /// and only here)
    last_heard: Option<String>,
    speaking: bool,

    /// Set exactly once, after the terminal state, from the full final
    /// transcript
    attempted: Option<Vec<AttemptedQuestion>>,

    artifact: Option<RecordingArtifact>,
    gate: FinishGate,

    registry: std::sync::Arc<dyn DeviceRegistry>,
    media: MediaSession,
    gateway: VoiceAgentGateway,
    events: Option<mpsc::Receiver<GatewayEvent>>,
    dispatcher: FeedbackDispatcher,

    /// User-facing error surface (permission denials, upload failures)
    error_message: Option<String>,

    started_at: chrono::DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(
        params: SessionParams,
        registry: std::sync::Arc<dyn DeviceRegistry>,
        media: MediaSession,
        gateway: VoiceAgentGateway,
        dispatcher: FeedbackDispatcher,
    ) -> Self {
        let id = format!("session-{}", uuid::Uuid::new_v4());

        info!("Creating interview session: {}", id);

        Self {
            id,
            params,
            state: StateMachine::new(),
            devices: None,
            selection: DeviceSelection::default(),
            transcript: Vec::new(),
            last_heard: None,
            speaking: false,
            attempted: None,
            artifact: None,
            gate: FinishGate::default(),
            registry,
            media,
            gateway,
            events: None,
            dispatcher,
            error_message: None,
            started_at: Utc::now(),
        }
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// `Inactive → DeviceSelection`: query the platform device registry and
    /// cache the lists, defaulting to the first entry of each.
    pub async fn select_devices(&mut self) -> Result<(), SessionError> {
        self.state.begin(AsyncOp::DeviceQuery)?;

        match self.registry.enumerate().await {
            Ok(list) => {
                self.selection = list.default_selection();
                self.devices = Some(list);
                self.state.resolve(AsyncOp::DeviceQuery, Trigger::DevicesLoaded)?;
                Ok(())
            }
            Err(e) => {
                self.state.abort(AsyncOp::DeviceQuery);
                self.error_message = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Change the device selection. Allowed only while in device
    /// selection; the selection freezes once capture is acquired.
    pub fn set_selection(&mut self, selection: DeviceSelection) -> Result<(), SessionError> {
        if self.state.state() != CallState::DeviceSelection {
            return Err(StateError::SelectionFrozen {
                state: self.state.state(),
            }
            .into());
        }

        self.selection = selection;
        Ok(())
    }

    /// `DeviceSelection → PermissionGranted`: request capture access for
    /// the confirmed devices. A denial is a self-loop — the state stays in
    /// device selection with a user-facing message, and the user may
    /// retry.
    pub async fn confirm_devices(&mut self) -> Result<(), SessionError> {
        self.state.begin(AsyncOp::PermissionRequest)?;

        match self.media.request_access(&self.selection).await {
            Ok(()) => {
                self.state
                    .resolve(AsyncOp::PermissionRequest, Trigger::PermissionGranted)?;
                self.error_message = None;
                Ok(())
            }
            Err(e) => {
                self.state
                    .resolve(AsyncOp::PermissionRequest, Trigger::PermissionDenied)?;
                self.error_message = Some(match &e {
                    MediaError::Permission(msg) => msg.clone(),
                    _ => "Camera & microphone access is required to start the interview."
                        .to_string(),
                });
                warn!("Capture access denied: {}", e);
                Err(e.into())
            }
        }
    }

    /// `PermissionGranted → Connecting`: start the recorder and ask the
    /// agent to begin the call. The transition to `Active` happens when
    /// the gateway reports `call-start`.
    pub async fn start_interview(&mut self) -> Result<(), SessionError> {
        self.state.apply(Trigger::InterviewStarted)?;

        // Subscribe before the start command so call-start cannot be missed
        if self.events.is_none() {
            self.events = Some(self.gateway.subscribe().await?);
        }

        self.media.start()?;
        self.gateway.start(&self.params.questions).await?;

        info!("Interview started: {}", self.id);

        Ok(())
    }

    /// `Active → (teardown) → Finished`: the user ends the interview.
    ///
    /// The gateway stop is issued first but does not block the critical
    /// path; the session waits on the recorder's upload specifically. Only
    /// a successful upload lets the attempt finish and feedback dispatch
    /// run.
    pub async fn end_interview(&mut self) -> Result<Navigation, SessionError> {
        self.finish_call(true).await
    }

    /// Release capture and detach from the agent without finishing the
    /// attempt. Called on navigation away; safe on every exit path.
    pub async fn shutdown(&mut self) {
        info!("Shutting down interview session: {}", self.id);
        self.gateway.unsubscribe();
        self.events = None;
        self.media.release().await;
    }

    // ------------------------------------------------------------------
    // Gateway events
    // ------------------------------------------------------------------

    /// Feed one gateway event into the machine. Returns a navigation
    /// target when the event concluded the session.
    pub async fn handle_event(
        &mut self,
        event: GatewayEvent,
    ) -> Result<Option<Navigation>, SessionError> {
        match event {
            GatewayEvent::CallStarted => {
                self.state.apply(Trigger::CallStarted)?;
                info!("Call is live");
                Ok(None)
            }

            GatewayEvent::FinalTranscript(entry) => {
                if matches!(
                    self.state.state(),
                    CallState::Connecting | CallState::Active
                ) {
                    self.last_heard = Some(entry.content.clone());
                    self.transcript.push(entry);
                }
                Ok(None)
            }

            GatewayEvent::InterimTranscript(text) => {
                self.last_heard = Some(text);
                Ok(None)
            }

            GatewayEvent::SpeechStarted => {
                self.speaking = true;
                Ok(None)
            }

            GatewayEvent::SpeechEnded => {
                self.speaking = false;
                Ok(None)
            }

            GatewayEvent::Fault(message) => {
                // Non-fatal: the agent is assumed to recover or emit its
                // own call-end
                warn!("Gateway fault: {}", message);
                Ok(None)
            }

            GatewayEvent::CallEnded => {
                self.gate.record_call_end();

                if self.state.state() == CallState::Active && self.state.in_flight().is_none() {
                    self.finish_call(false).await.map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Drive the session from the gateway event stream until it concludes.
    pub async fn pump_events(&mut self) -> Result<Navigation, SessionError> {
        let mut events = self
            .events
            .take()
            .ok_or_else(|| SessionError::Setup("event stream not subscribed".to_string()))?;

        loop {
            let Some(event) = events.recv().await else {
                self.events = Some(events);
                return Err(SessionError::Setup(
                    "gateway event stream closed before the call ended".to_string(),
                ));
            };

            match self.handle_event(event).await {
                Ok(Some(navigation)) => {
                    self.events = Some(events);
                    return Ok(navigation);
                }
                Ok(None) => {}
                // Stray triggers are rejected by the machine, not fatal to
                // the pump
                Err(SessionError::State(e)) => warn!("Rejected trigger: {}", e),
                Err(e) => {
                    self.events = Some(events);
                    return Err(e);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Teardown & finalization
    // ------------------------------------------------------------------

    async fn finish_call(&mut self, user_initiated: bool) -> Result<Navigation, SessionError> {
        self.state.begin(AsyncOp::Teardown)?;

        if user_initiated {
            // Fire-and-forget: the agent's teardown never blocks the
            // upload path
            if let Err(e) = self.gateway.stop().await {
                warn!("Agent stop failed (non-fatal): {}", e);
            }
            self.gate.record_call_end();
        }

        match self.media.stop().await {
            Ok(artifact) if artifact.available => {
                self.gate.record_artifact(artifact.clone());
                self.artifact = Some(artifact);
            }
            Ok(artifact) => {
                // Resolved but unavailable: nothing was recorded
                self.artifact = Some(artifact);
                self.state.abort(AsyncOp::Teardown);
                self.error_message =
                    Some("The recording is unavailable; feedback was not generated.".to_string());
                return Err(MediaError::Upload("recording artifact unavailable".to_string()).into());
            }
            Err(e) => {
                self.artifact = Some(RecordingArtifact::unavailable());
                self.state.abort(AsyncOp::Teardown);
                self.error_message =
                    Some("The recording could not be saved; feedback was not generated.".to_string());
                error!("Recording upload failed: {}", e);
                return Err(e.into());
            }
        }

        // The join: FINISHED requires the call-end signal AND a resolved
        // upload. Neither alone is sufficient.
        let Some(artifact) = self.gate.ready().cloned() else {
            self.state.abort(AsyncOp::Teardown);
            return Err(StateError::JoinPending.into());
        };

        self.state.resolve(AsyncOp::Teardown, Trigger::UploadResolved)?;
        self.gateway.unsubscribe();

        self.finalize(&artifact).await
    }

    /// One-shot post-call pipeline: analyze the full final transcript,
    /// then hand everything to the feedback collaborator.
    async fn finalize(&mut self, artifact: &RecordingArtifact) -> Result<Navigation, SessionError> {
        let results = analyze(&self.transcript, &self.params.questions, &self.params.policy);
        let count = attempted_count(&results);
        self.attempted = Some(results);

        info!(
            "Attempted questions: {}/{}",
            count,
            self.params.questions.len()
        );

        let recording_url = artifact.reference.clone().ok_or_else(|| {
            MediaError::Upload("recording artifact carries no reference".to_string())
        })?;

        let payload = FeedbackPayload {
            interview_id: self.params.interview_id.clone(),
            user_id: self.params.user_id.clone(),
            transcript: self.transcript.clone(),
            feedback_id: self.params.feedback_id.clone(),
            recording_url,
            attempted_count: count,
        };

        match self.dispatcher.dispatch(&payload).await {
            Ok(feedback_id) => Ok(Navigation::Feedback {
                interview_id: self.params.interview_id.clone(),
                feedback_id,
            }),
            Err(e) => {
                error!("Error saving feedback: {}", e);
                Ok(Navigation::Home)
            }
        }
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> CallState {
        self.state.state()
    }

    pub fn devices(&self) -> Option<&DeviceList> {
        self.devices.as_ref()
    }

    pub fn selection(&self) -> &DeviceSelection {
        &self.selection
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Latest display text: the most recent final entry or interim
    /// fragment
    pub fn last_heard(&self) -> Option<&str> {
        self.last_heard.as_deref()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn attempted_count(&self) -> Option<usize> {
        self.attempted.as_ref().map(|r| attempted_count(r))
    }

    pub fn recording(&self) -> Option<&RecordingArtifact> {
        self.artifact.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            state: self.state.state(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            transcript_entries: self.transcript.len(),
            attempted_count: self.attempted_count(),
            recording_available: self
                .artifact
                .as_ref()
                .map(|a| a.available)
                .unwrap_or(false),
        }
    }

    /// Number of user utterances so far (display helper)
    pub fn user_turns(&self) -> usize {
        self.transcript
            .iter()
            .filter(|e| e.role == Role::User)
            .count()
    }
}
