use axum::{Router, routing::get};

pub mod collaborators;
pub mod common;
pub mod companies;
pub mod items;
pub mod process;
pub mod reports;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/v1/whoami", get(system::whoami))
        .nest("/v1/process", process::router())
        .nest("/v1/epis", items::router())
        .nest("/v1/colaboradores", collaborators::router())
        .nest("/v1/empresas", companies::router())
        .route("/v1/dashboard", get(reports::dashboard))
        .route("/v1/reports/financial", get(reports::financial))
}
