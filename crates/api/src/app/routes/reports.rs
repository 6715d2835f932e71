//! Dashboard and financial reporting routes.

use std::sync::Arc;

use axum::extract::{Extension, Query};

use epitrack_infra::reports;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
) -> axum::response::Response {
    match reports::dashboard(&services.store, tenant.tenant_id()) {
        Ok(summary) => dto::ok(
            "Resumo do painel",
            serde_json::json!({
                "processos": {
                    "total": summary.processes_total,
                    "pendentes": summary.processes_pending,
                    "entregues": summary.processes_delivered,
                    "devolvidos": summary.processes_returned,
                },
                "epis": {
                    "total": summary.items_total,
                    "abaixoMinimo": summary.items_below_minimum,
                },
                "colaboradoresAtivos": summary.collaborators_active,
            }),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn financial(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Query(params): Query<dto::FinancialQuery>,
) -> axum::response::Response {
    match reports::financial(
        &services.store,
        tenant.tenant_id(),
        params.data_inicio,
        params.data_fim,
    ) {
        Ok(summary) => dto::ok(
            "Resumo financeiro",
            serde_json::json!({
                "valorEmitido": summary.issued_cents,
                "valorDevolvido": summary.returned_cents,
                "valorEmAberto": summary.outstanding_cents,
                "processosContabilizados": summary.processes_counted,
            }),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
