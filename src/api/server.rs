use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{health, index, proxy_manifest, proxy_media},
    state::AppState,
};
use crate::config::Config;
use crate::dispatch::{MEDIA_ROUTE, PROXY_ROUTE};
use crate::fetch::HttpOriginFetcher;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes, with request logging.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(PROXY_ROUTE, get(proxy_manifest))
        .route(MEDIA_ROUTE, get(proxy_media))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Build the production state (reqwest fetcher) from configuration.
pub fn build_state(config: Config) -> Result<AppState, AnyError> {
    let fetcher = HttpOriginFetcher::new(config.upstream.fetcher_config())
        .map_err(|e| format!("Failed to build origin fetcher: {}", e))?;

    Ok(AppState::new(config, Arc::new(fetcher)))
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address: SocketAddr = config.server.bind_addr;
    let state = build_state(config)?;
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "M3U8 proxy listening");

    serve(listener, app).await
}

/// Serve `app` on an already bound listener until shutdown is signalled.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AnyError> {
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
