use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod db;
pub mod invoice;
pub mod pdf;
pub mod storage;

pub use crate::db::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new("Forbidden", message)
    }

    pub fn too_many_requests(message: &str) -> Self {
        Self::new("TooManyRequests", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::auth::handlers::register,
            crate::auth::handlers::login,
            crate::invoice::handlers::create_invoice,
            crate::invoice::handlers::list_invoices,
            crate::invoice::handlers::download_invoice,
        ),
        components(
            schemas(
                auth::model::RegisterRequest,
                auth::model::RegisterResponse,
                auth::model::LoginRequest,
                auth::model::TokenResponse,
                auth::model::UserInfo,
                invoice::models::Invoice,
                invoice::models::LineItem,
                invoice::models::LineItemInput,
                invoice::models::InvoiceStatus,
                invoice::models::CreateInvoiceRequest,
                invoice::models::CreateInvoiceResponse,
                invoice::models::DownloadResponse,
                ErrorResponse,
            )
        ),
        tags(
            (name = "Authentication", description = "Account registration and login."),
            (name = "Invoice Service", description = "Invoice submission, listing and PDF download endpoints.")
        )
    )]
    struct ApiDoc;

    dotenvy::dotenv().ok(); // Load .env file
    let supabase_config = match storage::SupabaseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Storage configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let app_state = match AppState::new_with_config(supabase_config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to connect to database. Please check your DATABASE_URL in .env and ensure the database is running. Error: {}", e);
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("invoicegen_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    log::info!("Starting server at http://0.0.0.0:8080");

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(
                web::scope("/api")
                    .configure(auth::handlers::config)
                    .service(
                        web::resource("/invoices")
                            .route(web::get().to(invoice::handlers::list_invoices))
                            .route(web::post().to(invoice::handlers::create_invoice)),
                    )
                    .service(
                        web::resource("/invoices/{id}/download")
                            .route(web::get().to(invoice::handlers::download_invoice)),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
