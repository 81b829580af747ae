//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with page, API and admin routes
//! - Wire up middleware (request ID, tracing, timeout, CORS)
//! - Record per-route request metrics
//! - Serve on a listener until shutdown

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::cache::{connect_store, CacheStore, TableCache};
use crate::config::DashboardConfig;
use crate::drivers::{CountryDriver, CountyDriver, DriverContext, StateDriver};
use crate::error::DashboardResult;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::{api, page};
use crate::lifecycle::on_trigger;
use crate::observability::metrics;
use crate::upstream::UpstreamClient;

/// State shared by every handler.
pub struct InnerState {
    pub config: DashboardConfig,
    pub cache: TableCache,
    pub country: CountryDriver,
    pub states: StateDriver,
    pub county: CountyDriver,
    pub started_at: Instant,
    pub request_count: AtomicUsize,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<InnerState>,
}

impl AppState {
    pub fn new(config: DashboardConfig, store: Arc<dyn CacheStore>) -> DashboardResult<Self> {
        let cache = TableCache::new(store, Duration::from_secs(config.cache.ttl_secs));
        let upstream = UpstreamClient::new(Duration::from_secs(config.timeouts.upstream_secs))?;

        let ctx = DriverContext {
            cache: cache.clone(),
            upstream,
            sources: Arc::new(config.sources.clone()),
            charts: Arc::new(config.charts.clone()),
        };

        Ok(Self {
            inner: Arc::new(InnerState {
                country: CountryDriver::new(ctx.clone()),
                states: StateDriver::new(ctx.clone()),
                county: CountyDriver::new(ctx),
                cache,
                config,
                started_at: Instant::now(),
                request_count: AtomicUsize::new(0),
            }),
        })
    }
}

/// HTTP server for the dashboard.
pub struct DashboardServer {
    router: Router,
    state: AppState,
}

impl DashboardServer {
    /// Create a server over an already opened cache store.
    pub fn new(config: DashboardConfig, store: Arc<dyn CacheStore>) -> DashboardResult<Self> {
        let state = AppState::new(config, store)?;
        let router = Self::build_router(&state.inner.config, state.clone());
        Ok(Self { router, state })
    }

    /// Open the configured cache store and create the server.
    pub async fn connect(config: DashboardConfig) -> DashboardResult<Self> {
        let store = connect_store(&config.cache).await?;
        Self::new(config, store)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DashboardConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(page::index))
            .route("/health", get(health))
            .merge(api::routes());

        if config.admin.enabled {
            router = router.merge(admin::routes(state.clone()));
        }

        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(
                CorsLayer::new()
                    .allow_methods([Method::GET])
                    .allow_origin(Any),
            );

        router
            .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
            .with_state(state)
            .layer(layers)
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            cache_backend = self.state.inner.cache.backend(),
            admin_enabled = self.state.inner.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(on_trigger(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Count requests and record latency per matched route.
async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    state.inner.request_count.fetch_add(1, Ordering::Relaxed);
    let response = next.run(request).await;

    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
