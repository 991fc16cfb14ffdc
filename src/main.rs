use anyhow::{Context, Result};
use clap::Parser;
use mockview::{create_router, AppState, Config};
use tracing::info;

/// Recording store for the mock-interview client
#[derive(Debug, Parser)]
#[command(name = "mockview", version)]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/mockview")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("mockview v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!("Recordings directory: {}", cfg.media.recordings_path);
    info!("Upload endpoint: {}", cfg.media.upload_url);
    info!("Voice agent channel: {}", cfg.agent.nats_url);

    tokio::fs::create_dir_all(&cfg.media.recordings_path)
        .await
        .context("Failed to create recordings directory")?;

    let state = AppState::new(&cfg.media.recordings_path);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("Recording store listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
