use actix_web::{
    web::{self, Json, Path},
    HttpRequest, HttpResponse, Responder,
};
use log::{error, info, warn};
use uuid::Uuid;

use crate::auth::middleware::authenticate_request;
use crate::db::AppState;
use crate::invoice::models::{
    CreateInvoiceRequest, CreateInvoiceResponse, DownloadResponse, Invoice, InvoiceStatus,
};
use crate::invoice::pipeline::{self, DOWNLOAD_URL_EXPIRY_SECS};
use crate::ErrorResponse;

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    post,
    path = "/invoices",
    request_body = CreateInvoiceRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 202, description = "Invoice accepted, PDF generation started", body = CreateInvoiceResponse),
        (status = 400, description = "Invalid submission", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn create_invoice(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: Json<CreateInvoiceRequest>,
) -> impl Responder {
    let owner_id = match authenticate_request(&req, &state).await {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    let invoice = match pipeline::build_invoice(owner_id, body.into_inner()) {
        Ok(invoice) => invoice,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()));
        }
    };

    // Rejected submissions must not consume quota
    if !state.rate_limiter.check_and_record(owner_id) {
        warn!("Rate limit exceeded for user {}", owner_id);
        return HttpResponse::TooManyRequests().json(ErrorResponse::too_many_requests(
            "Too many PDF generation requests. Please try again in a minute.",
        ));
    }

    if let Err(e) = state.insert_invoice(&invoice).await {
        error!("Error during initial invoice save: {:?}", e);
        return HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
            "Server error during initial invoice save",
        ));
    }

    info!(
        "Invoice {} accepted for user {}, scheduling PDF generation",
        invoice.id, owner_id
    );
    pipeline::spawn_generation(state.get_ref().clone(), invoice.clone());

    HttpResponse::Accepted().json(CreateInvoiceResponse {
        message: "Invoice processing initiated. Status will update shortly.".to_string(),
        invoice,
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    get,
    path = "/invoices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's invoices, newest first", body = [Invoice]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn list_invoices(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let owner_id = match authenticate_request(&req, &state).await {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    match state.get_invoices_by_owner(&owner_id).await {
        Ok(invoices) => HttpResponse::Ok().json(invoices),
        Err(e) => {
            error!("Error fetching invoices: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Server error fetching invoices"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    get,
    path = "/invoices/{id}/download",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID of the invoice to download")
    ),
    responses(
        (status = 200, description = "Time-limited download link", body = DownloadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not own this invoice", body = ErrorResponse),
        (status = 404, description = "Invoice missing or PDF not ready", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn download_invoice(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<Uuid>,
) -> impl Responder {
    let owner_id = match authenticate_request(&req, &state).await {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    let invoice_id = id.into_inner();
    let invoice = match state.get_invoice_by_id(&invoice_id).await {
        Ok(Some(invoice)) => invoice,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("Invoice not found"));
        }
        Err(e) => {
            error!("Error fetching invoice {}: {:?}", invoice_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
                "Server error generating PDF download link",
            ));
        }
    };

    if invoice.owner_id != owner_id {
        return HttpResponse::Forbidden().json(ErrorResponse::forbidden(
            "Not authorized to download this invoice",
        ));
    }

    // Deliberately the same shape as an unknown id: callers cannot tell a
    // pending invoice from a missing one.
    let pdf_key = match (invoice.status, invoice.pdf_key.as_deref()) {
        (InvoiceStatus::Completed, Some(key)) => key.to_string(),
        _ => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(
                "PDF not available or still processing.",
            ));
        }
    };

    match state
        .storage
        .create_signed_url(&pdf_key, DOWNLOAD_URL_EXPIRY_SECS)
        .await
    {
        Ok(url) => HttpResponse::Ok().json(DownloadResponse { download_url: url }),
        Err(e) => {
            error!(
                "Error getting pre-signed URL for invoice {}: {}",
                invoice_id, e
            );
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
                "Server error generating PDF download link",
            ))
        }
    }
}
