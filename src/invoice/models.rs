use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an invoice's PDF generation.
///
/// Starts at `Processing` and transitions exactly once, to `Completed` or
/// `Failed`. Terminal thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Processing,
    Completed,
    Failed,
}

/// One row of an invoice. No identity beyond its position in the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    #[schema(example = "Widget")]
    pub description: String,
    #[schema(example = 10.0)]
    pub price: f64,
    #[schema(example = 3)]
    pub qty: u32,
    #[schema(example = 30.0)]
    pub total: f64,
}

/// Persisted invoice record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Acme")]
    pub client_name: String,
    #[schema(example = "2025-11-05")]
    pub invoice_date: NaiveDate,
    #[schema(value_type = Vec<LineItem>)]
    pub line_items: Json<Vec<LineItem>>,
    pub grand_total: f64,
    pub status: InvoiceStatus,
    /// Storage key of the rendered PDF; set only once generation completes
    pub pdf_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(
        owner_id: Uuid,
        client_name: String,
        invoice_date: NaiveDate,
        line_items: Vec<LineItem>,
        grand_total: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            client_name,
            invoice_date,
            line_items: Json(line_items),
            grand_total,
            status: InvoiceStatus::Processing,
            pdf_key: None,
            created_at: Utc::now(),
        }
    }
}

/// Terminal result of the generation pipeline.
///
/// Only terminal states can be expressed, and a PDF key exists exactly when
/// generation completed.
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceOutcome {
    Completed { pdf_key: String },
    Failed,
}

impl InvoiceOutcome {
    pub fn status(&self) -> InvoiceStatus {
        match self {
            InvoiceOutcome::Completed { .. } => InvoiceStatus::Completed,
            InvoiceOutcome::Failed => InvoiceStatus::Failed,
        }
    }

    pub fn pdf_key(&self) -> Option<&str> {
        match self {
            InvoiceOutcome::Completed { pdf_key } => Some(pdf_key),
            InvoiceOutcome::Failed => None,
        }
    }
}

/// Line item as submitted by the client. Invalid entries are discarded
/// during sanitization and the total is recomputed server-side.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub description: String,
    pub price: f64,
    pub qty: i64,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Invoice submission payload
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[schema(example = "Acme")]
    pub client_name: String,
    #[schema(example = "2025-11-05")]
    pub invoice_date: NaiveDate,
    pub line_items: Vec<LineItemInput>,
    /// Accepted for wire compatibility; the server recomputes the total
    #[serde(default)]
    pub grand_total: Option<f64>,
}

/// Body of the 202 response to a submission
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateInvoiceResponse {
    pub message: String,
    pub invoice: Invoice,
}

/// Signed download link response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_url: String,
}
