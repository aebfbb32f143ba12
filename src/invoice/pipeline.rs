//! The invoice generation pipeline.
//!
//! `build_invoice` validates and prices a submission; `spawn_generation`
//! schedules the detached render → upload → finalize continuation. The
//! submitting request returns as soon as the record is persisted; everything
//! after that is observable only through the invoice's status field and the
//! operator logs. A failed render or upload is final for that invoice.

use log::{error, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::db::AppState;
use crate::invoice::models::{
    CreateInvoiceRequest, Invoice, InvoiceOutcome, LineItem, LineItemInput,
};
use crate::pdf::{self, RenderError};
use crate::storage::{ObjectStorage, StorageError};

/// Signed download links expire after five minutes.
pub const DOWNLOAD_URL_EXPIRY_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("clientName must not be empty")]
    EmptyClientName,
    #[error("at least one valid line item is required")]
    NoValidLineItems,
}

/// Failure inside the detached continuation. Never surfaced to the
/// submitting caller; it only drives the invoice to `failed`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("PDF rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("PDF upload failed: {0}")]
    Storage(#[from] StorageError),
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Discard entries with an empty description, non-positive price, or
/// non-positive quantity; recompute each surviving item's total.
pub fn sanitize_line_items(items: &[LineItemInput]) -> Vec<LineItem> {
    items
        .iter()
        .filter(|item| !item.description.trim().is_empty() && item.price > 0.0 && item.qty > 0)
        .map(|item| LineItem {
            description: item.description.clone(),
            price: item.price,
            qty: item.qty as u32,
            total: round2(item.price * item.qty as f64),
        })
        .collect()
}

pub fn compute_grand_total(items: &[LineItem]) -> f64 {
    round2(items.iter().map(|item| item.total).sum())
}

/// Validate a submission and assemble the initial `processing` record.
///
/// The grand total is always recomputed from the sanitized line items; a
/// differing client-sent value is logged and discarded.
pub fn build_invoice(
    owner_id: Uuid,
    request: CreateInvoiceRequest,
) -> Result<Invoice, ValidationError> {
    if request.client_name.trim().is_empty() {
        return Err(ValidationError::EmptyClientName);
    }

    let line_items = sanitize_line_items(&request.line_items);
    if line_items.is_empty() {
        return Err(ValidationError::NoValidLineItems);
    }

    let grand_total = compute_grand_total(&line_items);
    if let Some(sent) = request.grand_total {
        if (sent - grand_total).abs() > 0.005 {
            warn!(
                "Client-sent grand total {:.2} disagrees with computed {:.2}; using computed value",
                sent, grand_total
            );
        }
    }

    Ok(Invoice::new(
        owner_id,
        request.client_name,
        request.invoice_date,
        line_items,
        grand_total,
    ))
}

/// Storage key of an invoice's rendered PDF
pub fn pdf_object_key(invoice_id: &Uuid) -> String {
    format!("invoices/{}.pdf", invoice_id)
}

/// Render the invoice to PDF bytes and upload them, returning the storage
/// key. No transient files; the document only ever exists in memory until
/// the gateway has it.
pub async fn render_and_upload(
    storage: &(dyn ObjectStorage + Send + Sync),
    invoice: &Invoice,
) -> Result<String, PipelineError> {
    let pdf_bytes = pdf::render_invoice(invoice)?;
    let key = pdf_object_key(&invoice.id);
    storage
        .upload_file(&key, &pdf_bytes, "application/pdf")
        .await?;
    Ok(key)
}

/// Schedule the detached continuation for a freshly accepted invoice.
///
/// The submitting request's outcome does not depend on it. Exactly one
/// continuation exists per invoice, it is not cancellable, and it is never
/// retried.
pub fn spawn_generation(state: AppState, invoice: Invoice) {
    tokio::spawn(async move {
        run_generation(state, invoice).await;
    });
}

async fn run_generation(state: AppState, invoice: Invoice) {
    let invoice_id = invoice.id;

    let outcome = match render_and_upload(state.storage.as_ref(), &invoice).await {
        Ok(pdf_key) => {
            info!(
                "PDF generated and uploaded for invoice {}: {}",
                invoice_id, pdf_key
            );
            InvoiceOutcome::Completed { pdf_key }
        }
        Err(e) => {
            error!(
                "Error generating or uploading PDF for invoice {}: {}",
                invoice_id, e
            );
            InvoiceOutcome::Failed
        }
    };

    match state.finalize_invoice(&invoice_id, &outcome).await {
        Ok(true) => info!("Invoice {} finalized as {:?}", invoice_id, outcome.status()),
        Ok(false) => warn!(
            "Invoice {} was not in processing state; finalize skipped",
            invoice_id
        ),
        Err(e) => {
            // The record keeps whatever status was last durably written.
            error!(
                "Failed to persist final status for invoice {}: {:?}",
                invoice_id, e
            );
        }
    }
}
