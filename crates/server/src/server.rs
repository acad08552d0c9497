//! HTTP server implementation using Axum.

use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use ward_core::{AppConfig, AppResult};
use ward_knowledge::ChatService;

use crate::routes;

/// Shared state for the gateway server.
#[derive(Debug, Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/api/get-chunks", get(routes::get_chunks))
        .route("/api/get-alias", get(routes::get_alias))
        .route("/api/create-alias", post(routes::create_alias))
        .route("/api/delete-alias/{id}", delete(routes::delete_alias))
        .route("/api/update-chunk/{id}", put(routes::update_chunk))
        .route("/api/update-alias/{id}", put(routes::update_alias))
        .route("/api/chat-stream", post(routes::chat_stream))
        .route("/api/chat", post(routes::chat))
        .route("/api/health", get(routes::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(config: &AppConfig) -> AppResult<()> {
    let chat = ChatService::from_config(config)?;
    let app = build_router(AppState::new(chat));

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
