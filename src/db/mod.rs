//! Database module - AppState and query methods
//!
//! Query methods live in per-domain submodules:
//! - `user` - account creation and lookup
//! - `invoice` - invoice records and the status transition

mod invoice;
mod user;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::invoice::ratelimit::SlidingWindowLimiter;
use crate::storage::{ObjectStorage, SupabaseConfig, SupabaseStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub storage: Arc<dyn ObjectStorage + Send + Sync>,
    pub http_client: reqwest::Client,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
}

impl AppState {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let supabase_config = SupabaseConfig::from_env()?;
        Self::new_with_config(supabase_config).await
    }

    pub async fn new_with_config(
        supabase_config: SupabaseConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(50)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .connect(&database_url)
            .await?;

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("invoicegen-server/0.3")
            .build()
            .expect("Failed to create reqwest client");

        let storage = Arc::new(SupabaseStorage::new(supabase_config, http_client.clone()));

        Ok(Self::assemble(pool, storage, http_client))
    }

    /// Build state around an existing pool and storage backend. Tests use
    /// this to swap in `MemoryStorage`.
    pub fn new_with_pool_and_storage(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
    ) -> Self {
        Self::assemble(pool, storage, reqwest::Client::new())
    }

    fn assemble(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        http_client: reqwest::Client,
    ) -> Self {
        AppState {
            pool,
            storage,
            http_client,
            rate_limiter: Arc::new(SlidingWindowLimiter::default()),
        }
    }
}
