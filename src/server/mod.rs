//! Web server for the extraction API.
//!
//! A thin axum transport over the orchestrator: upload handling, request
//! validation, and response shaping live here; everything else delegates to
//! `services::processor`.

mod handlers;
mod routes;

pub use routes::create_router;

use std::sync::Arc;

use crate::config::Settings;
use crate::services::PdfProcessor;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<PdfProcessor>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let processor = PdfProcessor::from_settings(settings.clone());
        Self {
            processor: Arc::new(processor),
            settings: Arc::new(settings),
        }
    }
}

/// Run the HTTP server until the process is stopped.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let addr = format!("{}:{}", settings.host, settings.port);
    let state = AppState::new(settings);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("extraction API listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
