//! HTTP server for the key-value service
//!
//! Axum-based server combining the health probe and the /kv routes,
//! with CORS, a request-id echo, and a body-size ceiling.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use uuid::Uuid;

use crate::kvstore::KvStore;
use crate::observability::Logger;

use super::config::HttpServerConfig;
use super::kv_routes::{kv_routes, KvState};
use super::response::HealthResponse;

/// Header used to correlate a request across log lines and callers.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP server owning the router and listener configuration.
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Creates a server over the given store.
    pub fn new(store: Arc<KvStore>, config: HttpServerConfig) -> Self {
        let router = Self::build_router(store, &config);
        Self { config, router }
    }

    fn build_router(store: Arc<KvStore>, config: &HttpServerConfig) -> Router {
        let state = Arc::new(KvState {
            store,
            auth_token: config.auth_token.clone(),
            max_value_bytes: config.max_value_bytes,
        });

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(health_handler))
            .merge(kv_routes(state))
            .layer(middleware::from_fn(propagate_request_id))
            .layer(DefaultBodyLimit::max(config.max_value_bytes.saturating_add(1024)))
            .layer(cors)
    }

    /// Returns the configured socket address.
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Returns the router (for tests).
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds the listener and serves until the process exits.
    pub async fn start(self) -> Result<(), io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid bind address {}: {err}", self.config.socket_addr()),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        Logger::info(
            "HTTP_SERVER_LISTENING",
            &[("addr", &addr.to_string())],
        );
        axum::serve(listener, self.router).await
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Echoes the caller's `x-request-id`, minting one when absent, so every
/// response can be correlated with upstream logs.
async fn propagate_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txnlog::SpyTxnLogger;
    use tempfile::TempDir;

    fn test_server(config: HttpServerConfig) -> (TempDir, HttpServer) {
        let dir = TempDir::new().unwrap();
        let store = KvStore::open(
            dir.path().join("test.sqlite"),
            Arc::new(SpyTxnLogger::new()),
        )
        .unwrap();
        let server = HttpServer::new(Arc::new(store), config);
        (dir, server)
    }

    #[test]
    fn test_server_uses_configured_addr() {
        let (_dir, server) = test_server(HttpServerConfig {
            port: 8123,
            ..HttpServerConfig::default()
        });
        assert_eq!(server.socket_addr(), "127.0.0.1:8123");
    }

    #[test]
    fn test_router_builds_with_cors_origins() {
        let (_dir, server) = test_server(HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..HttpServerConfig::default()
        });
        let _router = server.router();
    }
}
