// Server module - HTTP server setup and routing
pub mod auth;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ApiConfig;
use crate::errors::ConfigError;
use self::handlers::{auth as auth_handlers, comments, graph, health, notifications, posts, users};
use self::state::AppState;

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState, config: &ApiConfig) -> Result<Router, ConfigError> {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::me).patch(users::update_me))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/followers", get(users::followers))
        .route("/users/:id/following", get(users::following))
        .route("/follow/:user_id", post(graph::follow))
        .route("/unfollow/:user_id", post(graph::unfollow))
        .route("/feed", get(graph::feed))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::like))
        .route("/posts/:id/unlike", post(posts::unlike))
        .route("/posts/:id/toggle-like", post(posts::toggle_like))
        .route("/posts/:id/likes", get(posts::list_likes))
        .route(
            "/posts/:id/comments",
            get(posts::list_comments).post(posts::add_comment),
        )
        .route(
            "/comments/:id",
            axum::routing::patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/counts", get(notifications::counts))
        .route("/notifications/mark-read", post(notifications::mark_read))
        .route(
            "/notifications/mark-all-read",
            post(notifications::mark_all_read),
        )
        .route(
            "/notifications/:id/toggle-read",
            post(notifications::toggle_read),
        )
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer()?)
        .with_state(state);

    Ok(router)
}

/// Run the server on the specified address until Ctrl+C or SIGTERM
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Server listening on {}", addr);
    info!("- Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
