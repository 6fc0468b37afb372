//! # tablebook: restaurant table reservations
//!
//! `tablebook` is the backend for a restaurant booking site. Diners browse restaurants, book a
//! slot (optionally at a specific table, optionally with dishes pre-ordered from the menu) and
//! edit their bookings. Restaurant owners review the bookings at their restaurants and confirm
//! or cancel them.
//!
//! ## Architecture
//!
//! The service is an [Axum](https://github.com/tokio-rs/axum) application over PostgreSQL.
//! Requests flow through three layers:
//!
//! - **HTTP** ([`api`]): route handlers, request/response models and OpenAPI annotations
//! - **Auth** ([`auth`]): identifies the caller from a session cookie or a trusted proxy header,
//!   and decides what the caller may do with a reservation
//! - **Data** ([`db`]): repositories over a borrowed connection, so a handler can run several
//!   of them inside one transaction
//!
//! ### Reservation lifecycle
//!
//! A reservation starts `PENDING`. The diner may edit it any number of times, which sets it to
//! `EDITED`; the owner of the restaurant may set it to `CONFIRMED`, `CANCELLED` or `EDITED`.
//! Cancelled reservations cannot be edited by the diner.
//!
//! ### Table conflicts
//!
//! When a booking names a table, the table row is locked and the request is rejected with `409`
//! if an active (`PENDING` or `CONFIRMED`) booking on that table collides with it. How collisions
//! are detected is set by `reservations.conflict_check`:
//!
//! - `approximate` (default): an existing booking starting within one duration of the requested
//!   start, either side
//! - `interval`: true `[start, start + duration)` overlap using each booking's own duration
//!
//! Edits are not re-checked for conflicts.
//!
//! ## Configuration
//!
//! See [`config`] for the YAML file layout and `TABLEBOOK_` environment overrides.
//!
//! ## Running
//!
//! ```bash
//! export DATABASE_URL=postgres://localhost/tablebook
//! export TABLEBOOK_SECRET_KEY=change-me
//! tablebook -f config.yaml
//! ```
//!
//! Migrations run on startup. The OpenAPI document is served at `/api-docs/openapi.json` and
//! browsable at `/docs`.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;
use axum::http::HeaderValue;
use axum::{
    Json, Router, http,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{MenuItemId, ReservationId, RestaurantId, TableId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the tablebook database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect using the configured pool settings and bring the schema up to date
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    let mut wildcard = false;
    for origin in &config.auth.security.cors.allowed_origins {
        match origin {
            CorsOrigin::Wildcard => wildcard = true,
            CorsOrigin::Url(url) => origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?),
        }
    }

    let allow_origin = if wildcard { AllowOrigin::any() } else { AllowOrigin::list(origins) };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: the `/api/v1` routes, health check, API docs, CORS and
/// request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Public catalog
        .route("/restaurants", get(api::handlers::restaurants::list_restaurants))
        .route("/restaurants/{slug}", get(api::handlers::restaurants::get_restaurant))
        // Diner bookings
        .route("/reservations", post(api::handlers::reservations::create_reservation))
        .route(
            "/reservations/{id}",
            get(api::handlers::reservations::get_reservation).patch(api::handlers::reservations::update_reservation),
        )
        .route("/me/reservations", get(api::handlers::reservations::list_my_reservations))
        // Owner review
        .route(
            "/reservations/{id}/status",
            post(api::handlers::reservations::change_reservation_status),
        )
        .route(
            "/owner/restaurants/{slug}/reservations",
            get(api::handlers::reservations::list_restaurant_reservations),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .nest("/api/v1", api_routes)
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns the router and database pool.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown future resolves, in-flight requests drain and the pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting tablebook with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::from_parts(config, pool)
    }

    /// Build the application over an existing pool, running migrations first
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;
        Self::from_parts(config, pool)
    }

    fn from_parts(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "tablebook listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
