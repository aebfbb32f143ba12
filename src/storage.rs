//! Object storage gateway.
//!
//! Uploads rendered PDFs and mints time-limited signed download URLs through
//! the Supabase Storage HTTP API. Handlers and the pipeline only see the
//! `ObjectStorage` trait; tests swap in `MemoryStorage`.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid object key '{0}'")]
    InvalidKey(String),
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage service returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("storage sign response did not contain a signed URL")]
    MalformedSignResponse,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub bucket_name: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, StorageError> {
        Ok(Self {
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            bucket_name: require_env("BUCKET_NAME")?,
        })
    }
}

fn require_env(name: &'static str) -> Result<String, StorageError> {
    env::var(name).map_err(|_| StorageError::MissingEnv(name))
}

#[async_trait]
pub trait ObjectStorage {
    /// Store `bytes` under `key`. No retry; any transport or service
    /// failure surfaces as a `StorageError`.
    async fn upload_file(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Mint a time-limited URL for `key`. The key namespace is validated;
    /// existence of the underlying object is not.
    async fn create_signed_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError>;
}

/// Keys are bucket-relative paths: non-empty, no leading or trailing slash,
/// no empty or traversal segments.
pub fn validate_object_key(key: &str) -> Result<(), StorageError> {
    let malformed = key.is_empty()
        || key.starts_with('/')
        || key.ends_with('/')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if malformed {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Gateway to a Supabase Storage bucket
pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.supabase_url, self.config.bucket_name, key
        )
    }

    fn sign_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.config.supabase_url, self.config.bucket_name, key
        )
    }
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: Option<String>,
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload_file(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.config.supabase_anon_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UnexpectedStatus { status, body });
        }

        log::debug!("Uploaded {} bytes to {}", bytes.len(), key);
        Ok(())
    }

    async fn create_signed_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        validate_object_key(key)?;

        let response = self
            .client
            .post(self.sign_url(key))
            .bearer_auth(&self.config.supabase_anon_key)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UnexpectedStatus { status, body });
        }

        let sign: SignResponse = response.json().await?;
        let path = sign.signed_url.ok_or(StorageError::MalformedSignResponse)?;
        Ok(format!("{}/storage/v1{}", self.config.supabase_url, path))
    }
}

/// In-memory implementation backing tests and local development
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload_file(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn create_signed_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        validate_object_key(key)?;
        Ok(format!("memory://{}?expires={}", key, expires_in_secs))
    }
}
