//! Recording store HTTP service
//!
//! One file is persisted per capture event, uniquely named and served from
//! a public path:
//! - POST /api/save-recording - Store an uploaded recording (multipart)
//! - GET /recordings/... - Serve stored recordings
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
