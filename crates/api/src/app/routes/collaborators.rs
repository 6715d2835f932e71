//! Collaborator registry routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    routing::{get, post},
};

use epitrack_core::{CollaboratorId, Pagination};
use epitrack_infra::CollaboratorPatch;
use epitrack_registry::NewCollaborator;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_collaborator).get(list_collaborators))
        .route(
            "/:id",
            get(get_collaborator)
                .put(update_collaborator)
                .delete(delete_collaborator),
        )
}

pub async fn create_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Json(body): Json<dto::CreateCollaboratorRequest>,
) -> axum::response::Response {
    let new = NewCollaborator {
        name: body.nome,
        national_id: body.cpf,
    };
    match services.registry.create_collaborator(tenant.tenant_id(), new) {
        Ok(c) => dto::created(
            "Colaborador cadastrado com sucesso",
            dto::collaborator_to_json(&c),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CollaboratorId = match parse_id(&id, "collaborator") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.registry.get_collaborator(tenant.tenant_id(), id) {
        Ok(c) => dto::ok("Colaborador encontrado", dto::collaborator_to_json(&c)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_collaborators(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Query(params): Query<dto::PagedQuery>,
) -> axum::response::Response {
    let pagination = match Pagination::new(params.page, params.limit) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.registry.list_collaborators(
        tenant.tenant_id(),
        pagination,
        params.search.as_deref(),
    ) {
        Ok(page) => dto::paginated(
            "Colaboradores encontrados",
            page.records.iter().map(dto::collaborator_to_json).collect(),
            page.meta,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCollaboratorRequest>,
) -> axum::response::Response {
    let id: CollaboratorId = match parse_id(&id, "collaborator") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let patch = CollaboratorPatch {
        name: body.nome,
        national_id: body.cpf,
        active: body.ativo,
    };
    match services
        .registry
        .update_collaborator(tenant.tenant_id(), id, patch)
    {
        Ok(c) => dto::ok(
            "Colaborador atualizado com sucesso",
            dto::collaborator_to_json(&c),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CollaboratorId = match parse_id(&id, "collaborator") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .registry
        .delete_collaborator(tenant.tenant_id(), id)
    {
        Ok(()) => dto::ok_empty("Colaborador removido com sucesso"),
        Err(e) => errors::store_error_to_response(e),
    }
}
