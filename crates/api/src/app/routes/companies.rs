//! Company (tenant) registry routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    routing::{get, post},
};

use epitrack_auth::Permission;
use epitrack_core::{Pagination, TenantId};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_company).get(list_companies))
        .route("/:id", get(get_company).delete(deactivate_company))
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateCompanyRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&tenant, &principal, &Permission::new("empresas.manage"))
    {
        return errors::authz_error_to_response(e);
    }
    match services.registry.create_company(&body.nome) {
        Ok(c) => dto::created("Empresa cadastrada com sucesso", dto::company_to_json(&c)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(params): Query<dto::PagedQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&tenant, &principal, &Permission::new("empresas.manage"))
    {
        return errors::authz_error_to_response(e);
    }
    let pagination = match Pagination::new(params.page, params.limit) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.registry.list_companies(pagination) {
        Ok(page) => dto::paginated(
            "Empresas encontradas",
            page.records.iter().map(dto::company_to_json).collect(),
            page.meta,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TenantId = match parse_id(&id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // A caller may always read its own company; anything else is admin-only.
    if id != tenant.tenant_id() && !principal.is_admin() {
        return errors::json_error(
            axum::http::StatusCode::FORBIDDEN,
            "forbidden",
            "cannot access another company",
        );
    }
    match services.registry.get_company(id) {
        Ok(c) => dto::ok("Empresa encontrada", dto::company_to_json(&c)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn deactivate_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&tenant, &principal, &Permission::new("empresas.manage"))
    {
        return errors::authz_error_to_response(e);
    }
    let id: TenantId = match parse_id(&id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.registry.deactivate_company(id) {
        Ok(c) => dto::ok("Empresa desativada", dto::company_to_json(&c)),
        Err(e) => errors::store_error_to_response(e),
    }
}
