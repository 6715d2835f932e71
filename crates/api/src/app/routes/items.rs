//! EPI (item) registry routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    routing::{get, post},
};

use epitrack_core::{ItemId, Pagination};
use epitrack_infra::ItemPatch;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    match services
        .registry
        .create_item(tenant.tenant_id(), body.into_new_item())
    {
        Ok(item) => dto::created("EPI cadastrado com sucesso", dto::item_to_json(&item)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.registry.get_item(tenant.tenant_id(), id) {
        Ok(item) => dto::ok("EPI encontrado", dto::item_to_json(&item)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Query(params): Query<dto::PagedQuery>,
) -> axum::response::Response {
    // Restock alert view: everything at or below the configured minimum.
    if params.abaixo_minimo == Some(true) {
        return match services.registry.list_items_below_minimum(tenant.tenant_id()) {
            Ok(items) => dto::ok(
                "EPIs abaixo do estoque mínimo",
                serde_json::Value::Array(items.iter().map(dto::item_to_json).collect()),
            ),
            Err(e) => errors::store_error_to_response(e),
        };
    }

    let pagination = match Pagination::new(params.page, params.limit) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services
        .registry
        .list_items(tenant.tenant_id(), pagination, params.search.as_deref())
    {
        Ok(page) => dto::paginated(
            "EPIs encontrados",
            page.records.iter().map(dto::item_to_json).collect(),
            page.meta,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let patch = ItemPatch {
        certificate: body.ca,
        name: body.nome_equipamento,
        on_hand: body.quantidade,
        minimum: body.quantidade_minima,
        description: body.descricao,
        purchase_date: body.data_compra,
        life_date: body.data_vida_util,
        expiry_date: body.data_validade,
        unit_price: body.preco_unitario,
    };
    match services.registry.update_item(tenant.tenant_id(), id, patch) {
        Ok(item) => dto::ok("EPI atualizado com sucesso", dto::item_to_json(&item)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.registry.delete_item(tenant.tenant_id(), id) {
        Ok(()) => dto::ok_empty("EPI removido com sucesso"),
        Err(e) => errors::store_error_to_response(e),
    }
}
