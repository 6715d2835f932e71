//! Issuance process routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    routing::{get, patch, post},
};
use epitrack_auth::Permission;
use epitrack_core::{CollaboratorId, ProcessId, TenantId};
use epitrack_infra::{AdminProcessQuery, CreateProcess, ProcessPatch};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/create", post(create_process))
        .route("/list", get(list_all))
        .route("/empresa/:id_empresa", get(list_for_company))
        .route("/colaborador/:id_colaborador", get(list_for_collaborator))
        .route(
            "/:id",
            get(get_process).put(update_process).delete(delete_process),
        )
        .route("/:id/register-return", patch(register_return))
}

pub async fn create_process(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Json(body): Json<dto::CreateProcessRequest>,
) -> axum::response::Response {
    let collaborator_id: CollaboratorId = match parse_id(&body.id_colaborador, "collaborator") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let items = match dto::parse_reservations(body.epis) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let input = CreateProcess {
        collaborator_id,
        scheduled_date: body.data_agendada,
        items,
        notes: body.observacoes,
    };
    match services.engine.create_process(tenant.tenant_id(), input) {
        Ok(view) => dto::created("Processo criado com sucesso", dto::process_view_to_json(&view)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_process(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProcessId = match parse_id(&id, "process") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.get_process(tenant.tenant_id(), id) {
        Ok(view) => dto::ok("Processo encontrado", dto::process_view_to_json(&view)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_process(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProcessRequest>,
) -> axum::response::Response {
    let id: ProcessId = match parse_id(&id, "process") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let collaborator_id = match body.id_colaborador.as_deref() {
        Some(raw) => match parse_id::<CollaboratorId>(raw, "collaborator") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
        None => None,
    };
    let items = match body.epis {
        Some(epis) => match dto::parse_reservations(epis) {
            Ok(v) => Some(v),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    let patch = ProcessPatch {
        collaborator_id,
        scheduled_date: body.data_agendada,
        items,
        notes: body.observacoes,
        delivery_confirmed: body.status_entrega,
        delivered_at: body.data_entrega,
        returned_at: body.data_devolucao,
        document_url: body.pdf_url,
    };
    match services.engine.update_process(tenant.tenant_id(), id, patch) {
        Ok(view) => dto::ok(
            "Processo atualizado com sucesso",
            dto::process_view_to_json(&view),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_process(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProcessId = match parse_id(&id, "process") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.delete_process(tenant.tenant_id(), id) {
        Ok(()) => dto::ok_empty("Processo removido e estoque restaurado"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Kiosk confirmation: public route, authenticated by possession of the
/// process id.
pub async fn confirm_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<dto::ConfirmDeliveryRequest>>,
) -> axum::response::Response {
    let id: ProcessId = match parse_id(&id, "process") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = body.map(|Json(b)| b).unwrap_or_default();

    match services
        .engine
        .confirm_delivery(id, body.data_entrega, body.pdf_url)
    {
        Ok(view) => dto::ok(
            "Entrega confirmada com sucesso",
            dto::process_view_to_json(&view),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn register_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::RegisterReturnRequest>>,
) -> axum::response::Response {
    let id: ProcessId = match parse_id(&id, "process") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let Some(returned_at) = body.data_devolucao else {
        return errors::domain_error_to_response(epitrack_core::DomainError::validation(
            "dataDevolucao is required",
        ));
    };

    match services
        .engine
        .register_return(tenant.tenant_id(), id, returned_at, body.observacoes)
    {
        Ok(view) => dto::ok(
            "Devolução registrada com sucesso",
            dto::process_view_to_json(&view),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_for_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id_empresa): Path<String>,
    Query(params): Query<dto::ProcessListQuery>,
) -> axum::response::Response {
    let target: TenantId = match parse_id(&id_empresa, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Non-admin callers are confined to their own tenant.
    if target != tenant.tenant_id() && !principal.is_admin() {
        return errors::json_error(
            axum::http::StatusCode::FORBIDDEN,
            "forbidden",
            "cannot access another company's processes",
        );
    }
    let query = match params.to_query() {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.engine.list_for_tenant(target, query) {
        Ok(page) => dto::paginated(
            "Processos encontrados",
            page.records.iter().map(dto::process_view_to_json).collect(),
            page.meta,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_for_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id_colaborador): Path<String>,
    Query(params): Query<dto::ProcessListQuery>,
) -> axum::response::Response {
    let collaborator_id: CollaboratorId = match parse_id(&id_colaborador, "collaborator") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = match params.to_query() {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .engine
        .list_for_collaborator(tenant.tenant_id(), collaborator_id, query)
    {
        Ok(page) => dto::paginated(
            "Processos encontrados",
            page.records.iter().map(dto::process_view_to_json).collect(),
            page.meta,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Unrestricted listing across tenants with free-text search. Admin only.
pub async fn list_all(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(params): Query<dto::ProcessListQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&tenant, &principal, &Permission::new("process.list_all"))
    {
        return errors::authz_error_to_response(e);
    }
    let query = match params.to_query() {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let admin_query = AdminProcessQuery {
        query,
        search: params.search.clone(),
    };
    match services.engine.list_all(admin_query) {
        Ok(page) => dto::paginated(
            "Processos encontrados",
            page.records.iter().map(dto::process_view_to_json).collect(),
            page.meta,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
