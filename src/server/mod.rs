//! HTTP API
//!
//! JSON over axum. Every route except `/health` and `/auth/signup` expects
//! `Authorization: Bearer <token>`.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;

use crate::config::Config;
use crate::error::Result;
use crate::service::ChatService;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};

/// Shared handler state
pub type AppState = Arc<ChatService>;

/// Build the API router over a service
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(handlers::signup))
        .route("/users/me", get(handlers::current_user))
        .route("/users/search", get(handlers::search_users))
        .route("/users/:id", get(handlers::get_user))
        .route("/chats", post(handlers::create_chat))
        .route("/chats/my", get(handlers::my_chats))
        .route("/chats/:id", get(handlers::get_chat))
        .route(
            "/chats/:id/participants",
            get(handlers::list_participants).post(handlers::add_participant),
        )
        .route(
            "/chats/:id/participants/:user_id",
            delete(handlers::remove_participant),
        )
        .route("/chats/:id/exit", delete(handlers::exit_chat))
        .route("/chats/:id/delete", delete(handlers::delete_chat))
        .route(
            "/chats/:id/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route("/chats/:id/summary", get(handlers::get_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open storage, bind `server.bind` and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let service = Arc::new(ChatService::from_config(config)?);
    let app = router(Arc::clone(&service));

    let listener = TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "chatsum API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
