//! Process liveness endpoint.
//!
//! A minimal always-200 HTTP responder for platform uptime checks; not part of
//! the domain logic.

use crate::errors::Result;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use tracing::info;

/// Builds the liveness router: every path answers `200 OK`.
#[must_use]
pub fn router() -> Router {
    Router::new().route("/health", get(health)).fallback(health)
}

/// Binds `0.0.0.0:<port>` and serves the liveness router until the process
/// exits.
pub async fn serve(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "health endpoint listening");
    axum::serve(listener, router()).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_any_path_returns_ok() {
        for path in ["/", "/health", "/anything/else"] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = router().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "path {path}");
        }
    }
}
