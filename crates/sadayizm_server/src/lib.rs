//! HTTP surface for the sadayizm troll list.
//!
//! # Responsibility
//! - Translate request method, query and body into troll service calls.
//! - Serve the ranked ELO board and the store self-test.
//!
//! # Invariants
//! - One store is opened per process and shared through [`AppState`].
//! - CORS permits any origin; there is no authentication.
//! - Handlers never panic; storage failures become 500 responses.

use axum::{routing::get, Router};
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod config;
pub mod elo_client;
pub mod error;
pub mod state;

use config::ServerConfig;
use error::StartupError;
pub use state::AppState;
use std::sync::Arc;

/// Builds the application router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/trolls",
            get(api::list_trolls)
                .post(api::create_troll)
                .put(api::update_troll)
                .delete(api::delete_troll)
                .options(api::options_ok),
        )
        .route("/api/elo", get(api::elo_board))
        .route("/api/diagnostics", get(api::diagnostics))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Opens the store, binds the listener and serves until a shutdown signal.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    info!(
        "event=server_start module=server status=ok address={} storage={}",
        address, config.storage
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("event=signal_install module=server status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
        info!("event=shutdown module=server status=start signal=ctrl_c");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown module=server status=start signal=terminate");
            }
            Err(err) => {
                warn!("event=signal_install module=server status=error signal=terminate error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
