//! Relay service - composes the ingest route, the observer channel, and the
//! admin routes behind one listener.

use crate::domain::config::{RelayConfig, HEALTH_PATH, METRICS_PATH};
use crate::domain::error::ServiceError;
use crate::endpoint::{ingest_router, IngestState};
use crate::middleware::{create_cors_layer, RelayMetrics, TracingLayer};
use crate::relay::EventRelay;
use crate::ws::{observer_upgrade, ObserverState};
use axum::{extract::DefaultBodyLimit, response::IntoResponse, routing::get, Json, Router};
use gw_hub::{Hub, InMemoryHub};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Webhook relay service
pub struct RelayService {
    config: RelayConfig,
    hub: Arc<InMemoryHub>,
    metrics: Arc<RelayMetrics>,
    shutdown_tx: watch::Sender<bool>,
}

impl RelayService {
    /// Create a new relay service
    pub fn new(config: RelayConfig) -> Result<Self, ServiceError> {
        config.validate()?;

        let hub = Arc::new(InMemoryHub::with_capacity(config.hub.channel_capacity));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            hub,
            metrics: Arc::new(RelayMetrics::new()),
            shutdown_tx,
        })
    }

    /// Bind the configured address and serve until [`RelayService::shutdown`].
    pub async fn start(&self) -> Result<(), ServiceError> {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(ServiceError::Bind)?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until [`RelayService::shutdown`].
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServiceError> {
        let addr = listener.local_addr().map_err(ServiceError::Bind)?;
        info!(
            %addr,
            ingest_path = %self.config.routes.ingest_path,
            hub_path = %self.config.routes.hub_path,
            "Webhook relay listening"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stopping| *stopping).await;
                info!("Received shutdown signal");
            })
            .await
            .map_err(ServiceError::Serve)?;

        info!("Webhook relay stopped");
        Ok(())
    }

    /// Trigger graceful shutdown. Open observer sessions are closed too.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Observer hub
    pub fn hub(&self) -> Arc<InMemoryHub> {
        Arc::clone(&self.hub)
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Configured bind address
    pub fn http_addr(&self) -> SocketAddr {
        self.config.http_addr()
    }

    /// Build the full router with all layers.
    pub fn router(&self) -> Router {
        let relay = EventRelay::new(self.hub.clone());
        let ingest = ingest_router(
            &self.config.routes.ingest_path,
            IngestState::new(relay, Arc::clone(&self.metrics)),
            self.config.limits.max_body_size,
        );

        // CORS never wraps the ingest route (see middleware::cors)
        self.build_observer_router()
            .merge(self.build_admin_router())
            .layer(create_cors_layer(&self.config.cors))
            .merge(ingest)
            .layer(DefaultBodyLimit::disable())
            .layer(TracingLayer::new())
    }

    fn build_observer_router(&self) -> Router {
        let state = ObserverState {
            hub: Arc::clone(&self.hub),
            metrics: Arc::clone(&self.metrics),
            ping_interval: self.config.hub.ping_interval,
            shutdown: self.shutdown_tx.subscribe(),
        };

        Router::new()
            .route(&self.config.routes.hub_path, get(observer_upgrade))
            .with_state(state)
    }

    fn build_admin_router(&self) -> Router {
        let metrics = Arc::clone(&self.metrics);
        let hub = Arc::clone(&self.hub);

        Router::new().route(HEALTH_PATH, get(health_check)).route(
            METRICS_PATH,
            get(move || {
                let metrics = Arc::clone(&metrics);
                let hub = Arc::clone(&hub);
                async move { Json(metrics_snapshot(&metrics, &hub)) }
            }),
        )
    }
}

/// Relay counters plus the hub's own view of its observers.
fn metrics_snapshot(metrics: &RelayMetrics, hub: &InMemoryHub) -> serde_json::Value {
    let mut snapshot = metrics.to_json();
    snapshot["hub"] = serde_json::json!({
        "subscribed": hub.observer_count(),
        "messages_broadcast": hub.messages_broadcast(),
        "capacity": hub.capacity(),
    });
    snapshot
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "gridwatch",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
