//! # HTTP Server
//!
//! Wires the profile store, lifecycle and static assets into one axum router
//! and runs it until the flash marker drains it.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware, Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use super::config::{ConfigError, GatewayConfig};
use super::routes::{access_log, gateway_routes, reject_when_draining, GatewayState};
use crate::lifecycle::{serve_with_drain, DrainOutcome, Lifecycle, LifecycleController};
use crate::observability::Logger;
use crate::schema::{profile_schema, SchemaError, SchemaGate, SchemaLoader};
use crate::store::{DocumentStore, StoreError};

/// Gateway could not be started
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Profile gateway HTTP server
pub struct GatewayServer {
    config: GatewayConfig,
    store: Arc<DocumentStore>,
    lifecycle: Lifecycle,
}

impl GatewayServer {
    /// Create a server over an already opened store
    pub fn new(config: GatewayConfig, store: Arc<DocumentStore>) -> Self {
        Self {
            config,
            store,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Loads the schema and opens the store described by `config`.
    pub fn open(config: GatewayConfig) -> Result<Self, StartupError> {
        config.validate()?;
        let gate = schema_gate(&config)?;
        let store = DocumentStore::open(&config.profile_dir, gate, config.read_policy)?;
        store.sweep_temp_files()?;
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Handle on this server's lifecycle; clones share state
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Build the full router: profile routes, static fallback and layers
    pub fn router(&self) -> Router {
        let state = Arc::new(GatewayState::new(
            Arc::clone(&self.store),
            &self.config.refresh_marker,
        ));

        let cors = if self.config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(gateway_routes(state))
            .fallback_service(ServeDir::new(&self.config.www_dir))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(middleware::from_fn_with_state(
                self.lifecycle.clone(),
                reject_when_draining,
            ))
            .layer(middleware::from_fn(access_log))
            .layer(SetResponseHeaderLayer::overriding(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .layer(cors)
    }

    /// Serve until the flash marker appears and the drain finishes.
    pub async fn run(self) -> Result<DrainOutcome, StartupError> {
        let addr = self.config.validate()?;
        let listener = TcpListener::bind(addr).await.map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        self.run_on(listener).await
    }

    /// Like [`run`](Self::run) on an already bound listener.
    pub async fn run_on(self, listener: TcpListener) -> Result<DrainOutcome, StartupError> {
        let router = self.router();

        let controller = LifecycleController::new(
            self.lifecycle.clone(),
            &self.config.flash_marker,
            self.config.poll_interval(),
        );
        let watcher = tokio::spawn(controller.run());

        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.config.socket_addr());
        let profile_dir = self.store.dir().display().to_string();
        let www_dir = self.config.www_dir.display().to_string();
        let marker = self.config.flash_marker.display().to_string();
        Logger::info(
            "GATEWAY_STARTED",
            &[
                ("addr", addr.as_str()),
                ("profile_dir", profile_dir.as_str()),
                ("www_dir", www_dir.as_str()),
                ("flash_marker", marker.as_str()),
            ],
        );

        let outcome = serve_with_drain(
            listener,
            router,
            self.lifecycle.clone(),
            self.config.drain_timeout(),
        )
        .await
        .map_err(StartupError::Serve);

        watcher.abort();
        outcome
    }
}

/// Gate for the configured schema file, or the built-in profile schema.
pub fn schema_gate(config: &GatewayConfig) -> Result<SchemaGate, SchemaError> {
    let schema = match &config.schema_path {
        Some(path) => SchemaLoader::load_file(path)?,
        None => profile_schema(),
    };
    let gate = SchemaGate::from_schema(schema)?;
    let label = gate.label();
    Logger::info("SCHEMA_LOADED", &[("schema", label.as_str())]);
    Ok(gate)
}
