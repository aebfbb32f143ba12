//! Unit tests for the invoice pipeline

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::invoice::models::{
        CreateInvoiceRequest, Invoice, InvoiceStatus, LineItem, LineItemInput,
    };
    use crate::invoice::pipeline::{
        build_invoice, compute_grand_total, pdf_object_key, render_and_upload, round2,
        sanitize_line_items, PipelineError, ValidationError,
    };
    use crate::storage::{MemoryStorage, ObjectStorage, StorageError};

    fn item(description: &str, price: f64, qty: i64) -> LineItemInput {
        LineItemInput {
            description: description.to_string(),
            price,
            qty,
            total: None,
        }
    }

    fn request(client_name: &str, items: Vec<LineItemInput>) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            client_name: client_name.to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 11, 5).expect("valid date"),
            line_items: items,
            grand_total: None,
        }
    }

    #[test]
    fn sanitize_drops_invalid_entries() {
        let items = vec![
            item("Widget", 10.0, 3),
            item("", 5.0, 1),
            item("   ", 5.0, 1),
            item("Zero qty", 5.0, 0),
            item("Negative qty", 5.0, -2),
            item("Free item", 0.0, 1),
            item("Negative price", -5.0, 1),
        ];

        let sanitized = sanitize_line_items(&items);

        assert_eq!(sanitized.len(), 1);
        assert_eq!(sanitized[0].description, "Widget");
    }

    #[test]
    fn sanitize_recomputes_item_totals() {
        let items = vec![item("Widget", 19.99, 3)];

        let sanitized = sanitize_line_items(&items);

        assert_eq!(sanitized[0].total, 59.97);
    }

    #[test]
    fn item_totals_are_rounded_to_two_decimals() {
        let items = vec![item("Odd pricing", 0.333, 3)];

        let sanitized = sanitize_line_items(&items);

        assert_eq!(sanitized[0].total, 1.0);
    }

    #[test]
    fn grand_total_is_sum_of_item_totals() {
        let items = vec![
            LineItem {
                description: "A".to_string(),
                price: 10.0,
                qty: 3,
                total: 30.0,
            },
            LineItem {
                description: "B".to_string(),
                price: 2.5,
                qty: 2,
                total: 5.0,
            },
        ];

        assert_eq!(compute_grand_total(&items), 35.0);
    }

    #[test]
    fn round2_behaves_at_boundaries() {
        assert_eq!(round2(30.004), 30.0);
        assert_eq!(round2(30.006), 30.01);
        assert_eq!(round2(0.1 + 0.2), 0.3);
    }

    #[test]
    fn build_invoice_assigns_identity_and_processing_status() {
        let owner = Uuid::new_v4();
        let invoice =
            build_invoice(owner, request("Acme", vec![item("Widget", 10.0, 3)])).expect("valid");

        assert_eq!(invoice.owner_id, owner);
        assert_eq!(invoice.client_name, "Acme");
        assert_eq!(invoice.status, InvoiceStatus::Processing);
        assert_eq!(invoice.grand_total, 30.0);
        assert!(invoice.pdf_key.is_none());
        assert!(!invoice.id.is_nil());
    }

    #[test]
    fn build_invoice_rejects_empty_client_name() {
        let result = build_invoice(Uuid::new_v4(), request("  ", vec![item("Widget", 10.0, 3)]));
        assert!(matches!(result, Err(ValidationError::EmptyClientName)));
    }

    #[test]
    fn build_invoice_rejects_when_no_items_survive() {
        let result = build_invoice(
            Uuid::new_v4(),
            request("Acme", vec![item("", 10.0, 3), item("Zero", 10.0, 0)]),
        );
        assert!(matches!(result, Err(ValidationError::NoValidLineItems)));
    }

    #[test]
    fn client_sent_grand_total_is_ignored() {
        let mut req = request("Acme", vec![item("Widget", 10.0, 3)]);
        req.grand_total = Some(9999.0);

        let invoice = build_invoice(Uuid::new_v4(), req).expect("valid");

        assert_eq!(invoice.grand_total, 30.0);
    }

    #[test]
    fn create_request_accepts_frontend_payload() {
        let json = r#"{
            "clientName": "Acme",
            "invoiceDate": "2025-11-05",
            "lineItems": [
                {"description": "Widget", "price": 10.0, "qty": 3, "total": 30.0}
            ],
            "grandTotal": 30.0
        }"#;

        let req: CreateInvoiceRequest = serde_json::from_str(json).expect("Failed to deserialize");

        assert_eq!(req.client_name, "Acme");
        assert_eq!(req.line_items.len(), 1);
        assert_eq!(req.grand_total, Some(30.0));
    }

    #[test]
    fn invoice_serializes_with_camel_case_and_lowercase_status() {
        let invoice = build_invoice(
            Uuid::new_v4(),
            request("Acme", vec![item("Widget", 10.0, 3)]),
        )
        .expect("valid");

        let json = serde_json::to_string(&invoice).expect("Failed to serialize");

        assert!(json.contains("\"clientName\":\"Acme\""));
        assert!(json.contains("\"status\":\"processing\""));
        assert!(json.contains("\"grandTotal\":30.0"));
        assert!(json.contains("\"pdfKey\":null"));
    }

    #[test]
    fn pdf_object_key_is_namespaced_by_invoice_id() {
        let id = Uuid::new_v4();
        assert_eq!(pdf_object_key(&id), format!("invoices/{}.pdf", id));
    }

    fn completed_invoice() -> Invoice {
        build_invoice(
            Uuid::new_v4(),
            request("Acme", vec![item("Widget", 10.0, 3)]),
        )
        .expect("valid")
    }

    #[tokio::test]
    async fn render_and_upload_stores_the_pdf_under_its_key() {
        let storage = Arc::new(MemoryStorage::new());
        let invoice = completed_invoice();

        let key = render_and_upload(storage.as_ref(), &invoice)
            .await
            .expect("pipeline failed");

        assert_eq!(key, format!("invoices/{}.pdf", invoice.id));
        assert!(storage.contains(&key));
        let stored = storage.object(&key).expect("object missing");
        assert!(stored.starts_with(b"%PDF"));
    }

    struct FailingStorage;

    #[async_trait::async_trait]
    impl ObjectStorage for FailingStorage {
        async fn upload_file(
            &self,
            _key: &str,
            _bytes: &[u8],
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Err(StorageError::UnexpectedStatus {
                status: 503,
                body: "bucket unavailable".to_string(),
            })
        }

        async fn create_signed_url(
            &self,
            _key: &str,
            _expires_in_secs: u64,
        ) -> Result<String, StorageError> {
            Err(StorageError::UnexpectedStatus {
                status: 503,
                body: "bucket unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn upload_failure_surfaces_as_pipeline_error() {
        let storage = FailingStorage;
        let invoice = completed_invoice();

        let result = render_and_upload(&storage, &invoice).await;

        assert!(matches!(result, Err(PipelineError::Storage(_))));
    }
}
