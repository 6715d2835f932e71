use axum::{Json, extract::Extension, response::IntoResponse};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "message": "ok" }))
}

pub async fn whoami(
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "message": "ok",
        "data": {
            "tenantId": tenant.tenant_id().to_string(),
            "principalId": principal.principal_id().to_string(),
            "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        },
    }))
}
