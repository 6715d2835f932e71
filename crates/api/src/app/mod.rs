//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (store, engine, registry, audit)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get, routing::patch};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(jwt_secret: String) -> Router {
    let jwt = Arc::new(epitrack_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services());

    // Protected routes: require auth + tenant context.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        // Kiosk confirmation flow: no bearer token, the process id is the
        // credential.
        .route(
            "/v1/process/:id/confirm-delivery",
            patch(routes::process::confirm_delivery),
        )
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
