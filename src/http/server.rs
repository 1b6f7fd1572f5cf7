//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the `/config` API
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::handlers::*;
use crate::observability::metrics;
use crate::settings::ServiceSettings;
use crate::store::ConfigStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
}

/// HTTP front end of the configuration store.
pub struct HttpServer {
    router: Router,
    settings: ServiceSettings,
    store: Arc<ConfigStore>,
}

impl HttpServer {
    /// Create a server with a store rooted at `settings.storage.root`.
    pub fn new(settings: ServiceSettings) -> Self {
        let store = Arc::new(ConfigStore::new(&settings.storage.root));
        Self::with_store(settings, store)
    }

    /// Create a server around an existing store.
    pub fn with_store(settings: ServiceSettings, store: Arc<ConfigStore>) -> Self {
        let state = AppState { store: store.clone() };
        let router = Self::build_router(&settings, state);
        Self {
            router,
            settings,
            store,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(settings: &ServiceSettings, state: AppState) -> Router {
        let config_routes = Router::new()
            .route("/cache/clear", get(clear_cache))
            .route("/{domain}/categories", get(list_categories))
            .route("/{domain}/categories/{locale}", get(list_localized_categories))
            .route(
                "/{domain}/{category}",
                get(get_document)
                    .post(register_defaults)
                    .delete(delete_document),
            )
            .route(
                "/{domain}/{category}/{segment}",
                get(get_localized_document)
                    .post(register_localized_defaults)
                    .put(set_value)
                    .delete(delete_segment),
            )
            .route(
                "/{domain}/{category}/{locale}/{key}",
                put(set_localized_value).delete(delete_localized_value),
            );

        Router::new()
            .nest("/config", config_routes)
            .route("/status", get(get_status))
            .with_state(state)
            .layer(DefaultBodyLimit::max(settings.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(track_metrics))
                    .layer(TimeoutLayer::new(Duration::from_secs(settings.timeouts.request_secs))),
            )
    }

    /// Router with state and middleware applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.store.root().display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn server() -> (TempDir, HttpServer) {
        let dir = TempDir::new().unwrap();
        let mut settings = ServiceSettings::default();
        settings.storage.root = dir.path().to_string_lossy().into_owned();
        settings.listener.max_body_bytes = 64;
        (dir, HttpServer::new(settings))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_read() {
        let (_dir, server) = server();
        let response = server
            .router()
            .oneshot(request(Method::POST, "/config/CUSTOM/jobs", r#"{"retries":"3"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let values: std::collections::BTreeMap<String, String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(values.get("retries").map(String::as_str), Some("3"));
        assert_eq!(server.store().cached_documents(), 1);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let (_dir, server) = server();
        let big = format!(r#"{{"k":"{}"}}"#, "x".repeat(256));
        let response = server
            .router()
            .oneshot(request(Method::POST, "/config/CUSTOM/jobs", &big))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_put_requires_locale_for_translations() {
        let (_dir, server) = server();
        let response = server
            .router()
            .oneshot(request(Method::PUT, "/config/TRANSLATION/homepage/title", r#"{"value":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
