//! HTTP server for the account directory.
//!
//! Wires the account store and image uploader into an axum router, serves
//! static assets for unmatched paths, and shuts down gracefully on Ctrl+C or
//! SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use roster_core::{
    AccountStore, DisabledUploader, Error, ImageUploader, InMemoryStore, Result,
    DEFAULT_PROFILE_PIC,
};

use crate::handlers;
use crate::views::Views;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable CORS.
    pub cors: bool,
    /// Directory served for paths no route matches.
    pub public_dir: PathBuf,
    /// Picture given to accounts created without an upload.
    pub placeholder_url: String,
    /// Largest request body accepted, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerConfig {
    /// Creates a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    cors: Option<bool>,
    public_dir: Option<PathBuf>,
    placeholder_url: Option<String>,
    max_upload_bytes: Option<usize>,
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets whether CORS is enabled.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    /// Sets the static asset directory.
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }

    /// Sets the placeholder profile picture.
    pub fn placeholder_url(mut self, url: impl Into<String>) -> Self {
        self.placeholder_url = Some(url.into());
        self
    }

    /// Sets the request body limit.
    pub fn max_upload_bytes(mut self, max: usize) -> Self {
        self.max_upload_bytes = Some(max);
        self
    }

    /// Builds the server config.
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            addr: self
                .addr
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000))),
            cors: self.cors.unwrap_or(true),
            public_dir: self.public_dir.unwrap_or_else(|| PathBuf::from("public")),
            placeholder_url: self
                .placeholder_url
                .unwrap_or_else(|| DEFAULT_PROFILE_PIC.to_string()),
            max_upload_bytes: self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Account storage.
    pub store: Arc<dyn AccountStore>,
    /// Profile picture storage.
    pub uploader: Arc<dyn ImageUploader>,
    /// Page templates.
    pub views: Arc<Views>,
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    store: Arc<dyn AccountStore>,
    uploader: Arc<dyn ImageUploader>,
    views: Arc<Views>,
}

impl Server {
    /// Creates a server with a seeded in-memory store and uploads disabled.
    pub fn new(config: ServerConfig) -> Self {
        let store = InMemoryStore::seeded().with_placeholder(config.placeholder_url.clone());
        Self {
            config,
            store: Arc::new(store),
            uploader: Arc::new(DisabledUploader),
            views: Arc::new(Views::new()),
        }
    }

    /// Replaces the account store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the image uploader.
    #[must_use]
    pub fn with_uploader(mut self, uploader: Arc<dyn ImageUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            store: Arc::clone(&self.store),
            uploader: Arc::clone(&self.uploader),
            views: Arc::clone(&self.views),
        });

        let mut router = Router::new()
            .route("/", get(handlers::root))
            .route("/accounts", get(handlers::index).post(handlers::create))
            .route("/accounts/new", get(handlers::new_account))
            .route(
                "/accounts/{id}",
                get(handlers::show)
                    .patch(handlers::update)
                    .delete(handlers::destroy)
                    .post(handlers::override_method),
            )
            .route("/accounts/{id}/edit", get(handlers::edit))
            .fallback_service(ServeDir::new(&self.config.public_dir))
            .with_state(state);

        // Add middleware
        router = router
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        if self.config.cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Runs the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot start.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        tracing::info!(
            addr = %self.config.addr,
            public_dir = %self.config.public_dir.display(),
            "Starting Roster server"
        );

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        eprintln!("\n\x1b[32m✓\x1b[0m Server running on http://{}", self.config.addr);
        eprintln!("  Press Ctrl+C to stop\n");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
