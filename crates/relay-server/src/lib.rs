pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use relay_core::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Commands
        .route("/api/command", post(routes::command::run_command))
        // Chat history
        .route(
            "/api/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        // Connections
        .route(
            "/api/api-connections",
            get(routes::connections::list_connections),
        )
        .route(
            "/api/api-connections/{id}",
            get(routes::connections::get_connection).put(routes::connections::put_connection),
        )
        // Catalog
        .route("/api/tools", get(routes::tools::list_tools))
        // Inbound integrations
        .route(
            "/api/webhooks/{service}",
            post(routes::webhooks::receive_webhook),
        )
        // Notifications
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/{app_id}/read",
            post(routes::notifications::mark_read),
        )
        // Realtime
        .route("/api/events", get(routes::events::sse_events))
        .route("/ws", get(routes::ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the relay server on `host:port` from the config.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Start the relay server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(config: &Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let app_state = AppState::new(config)?;
    serve_state(app_state, listener).await
}

/// Serve a prepared state, e.g. one whose dispatcher carries test adapters.
pub async fn serve_state(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let configured = app_state
        .dispatcher
        .adapters()
        .filter(|a| a.is_configured())
        .count();
    tracing::info!(configured, "relay server listening on http://localhost:{actual_port}");

    axum::serve(listener, build_router(app_state)).await?;
    Ok(())
}
