use crate::context::AppContext;
use crate::routes;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(routes::ui::index))
        .route("/ui/script.js", get(routes::ui::script))
        .route("/ui/style.css", get(routes::ui::style))
        .route("/chat", post(routes::chat::chat_handler))
        .route("/health", get(routes::health::health_handler))
        .with_state(context)
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr = format!("{}:{}", host, port);
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(
    listener: TcpListener,
    context: Arc<AppContext>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, "Concierge ready to accept connections"),
        Err(e) => tracing::warn!(error = %e, "Could not read listener address"),
    }

    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}
