//! # backoffice-api: Axum API Services for the Bank Back-Office
//!
//! Staff open customer accounts whose numbers are derived from a
//! per-(branch, account type) counter, manage users and maintain the
//! reference data those accounts point at.
//!
//! ## API Surface
//!
//! | Prefix                     | Module                     | Domain            |
//! |----------------------------|----------------------------|-------------------|
//! | `/v1/accounts/*`           | [`routes::accounts`]       | Account opening   |
//! | `/v1/me/accounts`          | [`routes::accounts`]       | Own accounts      |
//! | `/v1/users/*`              | [`routes::users`]          | Users             |
//! | `/v1/branches/*`           | [`routes::branches`]       | Reference data    |
//! | `/v1/account-types/*`      | [`routes::account_types`]  | Reference data    |
//! | `/v1/currencies/*`         | [`routes::currencies`]     | Reference data    |
//! | `/v1/transaction-fees/*`   | [`routes::fees`]           | Reference data    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros and served at `/openapi.json`.

pub mod auth;
pub mod authz;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::middleware::from_fn;
use axum::Router;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let limiter = RateLimiter::new(state.config.rate_limit.clone());

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::accounts::router())
        .merge(routes::users::router())
        .merge(routes::branches::router())
        .merge(routes::account_types::router())
        .merge(routes::currencies::router())
        .merge(routes::fees::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(limiter))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .fallback(not_found)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".into())
}
