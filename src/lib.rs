pub mod agent;
pub mod analysis;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod session;
pub mod transcript;

pub use agent::{
    AgentError, AgentEvent, GatewayEvent, NatsAgentClient, VoiceAgentClient, VoiceAgentGateway,
};
pub use analysis::{analyze, attempted_count, similarity, AnalysisPolicy, AttemptedQuestion};
pub use backend::{FeedbackAck, FeedbackSink, Interview, InterviewReader, User};
pub use config::Config;
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use media::{
    CaptureBackend, CaptureFrame, CpalDeviceRegistry, DeviceList, DeviceRegistry, DeviceSelection,
    HttpUploader, MediaError, MediaSession, MicrophoneBackend, RecordingArtifact,
    RecordingFormat, RecordingUploader, UploadResponse,
};
pub use session::{
    CallState, FeedbackDispatcher, FeedbackPayload, InterviewSession, Navigation, SessionParams,
    SessionStats, StateError, StateMachine,
};
pub use transcript::{Role, TranscriptEntry};
