use super::state::AppState;
use crate::media::UploadResponse;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::path::Path;
use tracing::{error, info};

/// POST /api/save-recording
/// Store an uploaded recording under a unique per-capture file name and
/// return its public path
pub async fn save_recording(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    // Pull the single "file" field out of the form
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }

                let file_name = field.file_name().unwrap_or("recording.bin").to_string();

                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((file_name, bytes.to_vec()));
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read upload body: {}", e);
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(UploadResponse {
                                success: false,
                                file_path: None,
                                error: Some(format!("Failed to read upload body: {}", e)),
                            }),
                        )
                            .into_response();
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Malformed multipart request: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(UploadResponse {
                        success: false,
                        file_path: None,
                        error: Some(format!("Malformed multipart request: {}", e)),
                    }),
                )
                    .into_response();
            }
        }
    }

    let Some((original_name, data)) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(UploadResponse {
                success: false,
                file_path: None,
                error: Some("No file uploaded".to_string()),
            }),
        )
            .into_response();
    };

    // Ensure the recordings folder exists
    if let Err(e) = tokio::fs::create_dir_all(&state.recordings_dir).await {
        error!("Failed to create recordings directory: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UploadResponse {
                success: false,
                file_path: None,
                error: Some(format!("Failed to create recordings directory: {}", e)),
            }),
        )
            .into_response();
    }

    // Unique per capture event; keep the uploaded extension
    let extension = Path::new(&original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let file_name = format!(
        "recording_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        extension
    );
    let full_path = state.recordings_dir.join(&file_name);

    if let Err(e) = tokio::fs::write(&full_path, &data).await {
        error!("Failed to save recording: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UploadResponse {
                success: false,
                file_path: None,
                error: Some(format!("Failed to save recording: {}", e)),
            }),
        )
            .into_response();
    }

    // Return the public path, not the filesystem one
    let public_path = format!("/recordings/{}", file_name);

    info!("Saved recording: {} ({} bytes)", public_path, data.len());

    (
        StatusCode::OK,
        Json(UploadResponse {
            success: true,
            file_path: Some(public_path),
            error: None,
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
