//! Request/response DTOs and JSON mapping helpers.
//!
//! Wire field names are kept from the original API (Portuguese, camelCase):
//! `idColaborador`, `dataAgendada`, `epis: [{idEpi, quantidade}]`, and so on.
//! Every response uses the `{success, message, data?, pagination?}` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use epitrack_core::{DomainError, ItemId, PageMeta, Pagination};
use epitrack_infra::{ProcessQuery, ProcessView};
use epitrack_inventory::{Item, NewItem};
use epitrack_process::{ProcessStatus, Reservation, StatusFilter};
use epitrack_registry::{Collaborator, Company};

// ---------------------------------------------------------------- envelope

pub fn ok(message: &str, data: Value) -> Response {
    (
        StatusCode::OK,
        axum::Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

pub fn ok_empty(message: &str) -> Response {
    (
        StatusCode::OK,
        axum::Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

pub fn created(message: &str, data: Value) -> Response {
    (
        StatusCode::CREATED,
        axum::Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

pub fn paginated(message: &str, records: Vec<Value>, meta: PageMeta) -> Response {
    (
        StatusCode::OK,
        axum::Json(json!({
            "success": true,
            "message": message,
            "data": records,
            "pagination": {
                "total": meta.total,
                "page": meta.page,
                "limit": meta.limit,
                "totalPages": meta.total_pages,
            },
        })),
    )
        .into_response()
}

// ---------------------------------------------------------------- requests

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpiQuantityRequest {
    pub id_epi: String,
    pub quantidade: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessRequest {
    pub id_colaborador: String,
    pub data_agendada: DateTime<Utc>,
    pub epis: Vec<EpiQuantityRequest>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProcessRequest {
    pub id_colaborador: Option<String>,
    pub data_agendada: Option<DateTime<Utc>>,
    pub epis: Option<Vec<EpiQuantityRequest>>,
    pub observacoes: Option<String>,
    pub status_entrega: Option<bool>,
    pub data_entrega: Option<DateTime<Utc>>,
    pub data_devolucao: Option<DateTime<Utc>>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeliveryRequest {
    pub data_entrega: Option<DateTime<Utc>>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReturnRequest {
    pub data_devolucao: Option<DateTime<Utc>>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub ca: String,
    pub nome_equipamento: String,
    pub quantidade: u32,
    pub quantidade_minima: u32,
    pub descricao: Option<String>,
    pub data_compra: Option<NaiveDate>,
    pub data_vida_util: Option<NaiveDate>,
    pub data_validade: Option<NaiveDate>,
    /// Unit price in integer cents.
    pub preco_unitario: i64,
}

impl CreateItemRequest {
    pub fn into_new_item(self) -> NewItem {
        NewItem {
            certificate: self.ca,
            name: self.nome_equipamento,
            on_hand: self.quantidade,
            minimum: self.quantidade_minima,
            description: self.descricao,
            purchase_date: self.data_compra,
            life_date: self.data_vida_util,
            expiry_date: self.data_validade,
            unit_price: self.preco_unitario,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub ca: Option<String>,
    pub nome_equipamento: Option<String>,
    pub quantidade: Option<u32>,
    pub quantidade_minima: Option<u32>,
    pub descricao: Option<String>,
    pub data_compra: Option<NaiveDate>,
    pub data_vida_util: Option<NaiveDate>,
    pub data_validade: Option<NaiveDate>,
    pub preco_unitario: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollaboratorRequest {
    pub nome: String,
    pub cpf: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollaboratorRequest {
    pub nome: Option<String>,
    pub cpf: Option<String>,
    pub ativo: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    pub nome: String,
}

// ------------------------------------------------------------ query params

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProcessListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub data_inicio: Option<DateTime<Utc>>,
    pub data_fim: Option<DateTime<Utc>>,
}

impl ProcessListQuery {
    pub fn to_query(&self) -> Result<ProcessQuery, DomainError> {
        let pagination = Pagination::new(self.page, self.limit)?;
        let status = match self.status.as_deref() {
            Some(s) => s.parse()?,
            None => StatusFilter::All,
        };
        Ok(ProcessQuery {
            pagination,
            status,
            scheduled_from: self.data_inicio,
            scheduled_to: self.data_fim,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PagedQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub abaixo_minimo: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FinancialQuery {
    pub data_inicio: Option<DateTime<Utc>>,
    pub data_fim: Option<DateTime<Utc>>,
}

// ------------------------------------------------------------- responses

fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Pending => "pendente",
        ProcessStatus::Delivered => "entregue",
        ProcessStatus::Returned => "devolvido",
    }
}

pub fn process_view_to_json(v: &ProcessView) -> Value {
    json!({
        "id": v.process.id.to_string(),
        "idEmpresa": v.process.tenant_id.to_string(),
        "nomeEmpresa": v.company_name,
        "idColaborador": v.process.collaborator_id.to_string(),
        "nomeColaborador": v.collaborator_name,
        "cpfColaborador": v.collaborator_national_id,
        "dataAgendada": v.process.scheduled_date,
        "statusEntrega": status_label(v.process.status()),
        "dataEntrega": v.process.delivered_at,
        "dataDevolucao": v.process.returned_at,
        "observacoes": v.process.notes,
        "pdfUrl": v.process.document_url,
        "criadoEm": v.process.created_at,
        "epis": v.items.iter().map(|i| json!({
            "idEpi": i.item_id.to_string(),
            "nomeEquipamento": i.name,
            "ca": i.certificate,
            "quantidade": i.quantity,
            "precoUnitario": i.unit_price,
        })).collect::<Vec<_>>(),
    })
}

pub fn item_to_json(item: &Item) -> Value {
    json!({
        "id": item.id.to_string(),
        "idEmpresa": item.tenant_id.to_string(),
        "ca": item.certificate,
        "nomeEquipamento": item.name,
        "quantidade": item.on_hand,
        "quantidadeMinima": item.minimum,
        "abaixoMinimo": item.is_below_minimum(),
        "descricao": item.description,
        "dataCompra": item.purchase_date,
        "dataVidaUtil": item.life_date,
        "dataValidade": item.expiry_date,
        "precoUnitario": item.unit_price,
        "criadoEm": item.created_at,
    })
}

pub fn collaborator_to_json(c: &Collaborator) -> Value {
    json!({
        "id": c.id.to_string(),
        "idEmpresa": c.tenant_id.to_string(),
        "nome": c.name,
        "cpf": c.national_id,
        "ativo": c.active,
        "criadoEm": c.created_at,
    })
}

pub fn company_to_json(c: &Company) -> Value {
    json!({
        "id": c.id.to_string(),
        "nome": c.name,
        "apiKey": c.api_key,
        "ativo": c.active,
        "criadoEm": c.created_at,
    })
}

/// Map wire `epis` entries into domain reservations.
pub fn parse_reservations(epis: Vec<EpiQuantityRequest>) -> Result<Vec<Reservation>, DomainError> {
    epis.into_iter()
        .map(|e| {
            Ok(Reservation {
                item_id: e.id_epi.parse::<ItemId>()?,
                quantity: e.quantidade,
            })
        })
        .collect()
}
