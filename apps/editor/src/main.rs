mod config;
mod editor;
mod errors;
mod models;
mod notifications;
mod profile_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::profile::ProfileSnapshot;
use crate::profile_client::{HttpProfileStore, InMemoryProfileStore, ProfileStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Canvas editor v{}", env!("CARGO_PKG_VERSION"));

    let profiles: Arc<dyn ProfileStore> = match &config.profile_service_url {
        Some(url) => {
            info!("Profile service: {url}");
            Arc::new(HttpProfileStore::new(
                url,
                config.profile_service_token.clone(),
            )?)
        }
        None => {
            warn!("PROFILE_SERVICE_URL not set, using an in-memory profile store");
            Arc::new(InMemoryProfileStore::new(ProfileSnapshot::default()))
        }
    };
    info!(
        "Autosave quiet window: {}ms",
        config.autosave_quiet.as_millis()
    );

    let state = AppState::new(config.clone(), profiles);

    let app = build_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    flush_sessions(&state).await;
    info!("Server shut down");

    Ok(())
}

/// Closes every open session so pending autosaves reach the profile service.
async fn flush_sessions(state: &AppState) {
    let sessions: Vec<_> = state.sessions.write().await.drain().collect();
    for (id, session) in sessions {
        if let Some(outcome) = session.close().await {
            info!("Flushed session {id} on shutdown: {outcome:?}");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
