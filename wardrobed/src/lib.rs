//! # wardrobed: Media Backend for the Wardrobe Styling App
//!
//! `wardrobed` is the media-processing backend behind a wardrobe styling
//! application. It accepts garment and person photos from the mobile and web
//! clients, runs them through hosted inference models (garment classification,
//! background removal, virtual try-on), and persists the results as wardrobe
//! items and styled looks.
//!
//! ## Overview
//!
//! The service is an orchestration layer rather than a model host: every
//! inference call goes to a remotely hosted model behind the inference
//! gateway, and every image lands in an object store that serves it back to
//! the clients over public URLs. What lives here is the composition logic
//! between the three backends, which is where the failure handling actually
//! matters. A classifier outage must not block uploads, a metadata insert
//! failure must not leak an orphaned blob, and a model that answers with a
//! private file path must not turn into a broken image in someone's wardrobe.
//!
//! ### Request Flow
//!
//! A typical upload (`POST /api/v1/items`) reads the multipart form, writes
//! the image to the blob store, asks the classification endpoint for a
//! category (falling back to a default when the gateway is unreachable or
//! answers with something unusable), and records the item in the metadata
//! store. If that final insert fails, the blob written earlier in the request
//! is deleted again before the error is reported.
//!
//! Try-on and background-removal requests follow the same shape without the
//! persistence step: form in, gateway invocation with a time budget, and the
//! normalized model output back out. Saving a styled look
//! (`POST /api/v1/looks`) is the one authenticated surface; it re-fetches a
//! generated image from the inference host into our own storage so the image
//! outlives that host.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds the HTTP handlers and their
//! request/response models. The **gateway client** ([`gateway`]) speaks the
//! hosted-model protocol: a session handshake, named inputs with inline blob
//! payloads, and an invocation raced against a configured budget. Its
//! [`gateway::normalize`] module turns the heterogeneous output shapes the
//! models produce (URLs, data URIs, raw base64, result objects) into typed
//! values. The **storage layer** ([`storage`]) and **metadata store**
//! ([`db`]) each hide their backends behind a trait with an in-memory
//! implementation for tests and an HTTP/PostgreSQL implementation for
//! production. The **auth layer** ([`auth`]) verifies bearer tokens for the
//! routes that are scoped to a signed-in user.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use wardrobed::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = wardrobed::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize structured logging
//!     wardrobed::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! With the PostgreSQL metadata backend, migrations run automatically on
//! startup. They can also be run against a pool directly:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! wardrobed::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod storage;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{self, HeaderValue};
use axum::{
    Router,
    routing::{delete, get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

pub use config::Config;
use config::CorsOrigin;
use db::WardrobeStore;
use gateway::GatewayClient;
use storage::BlobStore;

pub use types::{ItemId, LookId};

/// Application state shared across all request handlers.
///
/// Everything in here is cheap to clone: the backends sit behind [`Arc`]s and
/// the HTTP clients share their connection pools internally.
///
/// - `config`: Application configuration loaded from environment/files
/// - `blobs`: Blob store holding uploaded and generated images
/// - `store`: Metadata store holding wardrobe items and styled looks
/// - `gateway`: Client for the hosted inference endpoints
/// - `http`: Plain HTTP client for fetching images the models publish by URL
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub blobs: Arc<dyn BlobStore>,
    pub store: Arc<dyn WardrobeStore>,
    pub gateway: GatewayClient,
    pub http: reqwest::Client,
}

/// Get the wardrobed database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration.
///
/// A wildcard origin uses the permissive `Any` origin; tower-http rejects a
/// literal `*` inside an origin list. Config validation already forbids
/// combining the wildcard with credentials.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let has_wildcard = config.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));

    let mut cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials);

    cors = if has_wildcard {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().parse::<HeaderValue>()?);
            }
        }
        cors.allow_origin(origins)
    };

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Routes:
/// - `GET /healthz`: liveness probe
/// - `POST /api/v1/items`: upload and classify a garment photo
/// - `GET /api/v1/items`: list one owner's wardrobe items
/// - `DELETE /api/v1/items/{id}`: remove an item and its blob
/// - `POST /api/v1/background-removal`: strip a photo's background
/// - `POST /api/v1/tryon`: run virtual try-on
/// - `GET /api/v1/looks`, `POST /api/v1/looks`: the authenticated look
///   collection
///
/// The multipart routes share one body limit from `limits.max_upload_bytes`;
/// CORS and request tracing wrap the whole router.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;
    let max_upload_bytes = state.config.limits.max_upload_bytes;

    let api_routes = Router::new()
        .route("/items", get(api::handlers::items::list_items))
        .route("/items", post(api::handlers::items::upload_item))
        .route("/items/{id}", delete(api::handlers::items::delete_item))
        .route("/background-removal", post(api::handlers::background::remove_background))
        .route("/tryon", post(api::handlers::tryon::run_try_on))
        .route("/looks", get(api::handlers::looks::list_looks))
        .route("/looks", post(api::handlers::looks::save_look))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let router = Router::new()
        .route("/healthz", get(api::handlers::health::healthz))
        .nest("/api/v1", api_routes)
        .with_state(state);

    Ok(router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

/// Main application struct that owns the router and server lifecycle.
///
/// 1. **Create**: [`Application::new`] builds the backends from configuration
///    (running migrations when the metadata store is PostgreSQL)
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all backends initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting wardrobed with configuration: {:#?}", config);

        let store = db::create_wardrobe_store(&config.database).await?;
        let blobs = storage::create_blob_store(&config.storage)?;
        let gateway = GatewayClient::new(&config.gateway)?;
        let http = reqwest::Client::builder().build()?;

        let state = AppState::builder()
            .config(config.clone())
            .blobs(blobs)
            .store(store)
            .gateway(gateway)
            .http(http)
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "wardrobed listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Server stopped");
        Ok(())
    }
}
