use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("{0}")]
    Io(String),
}

/// A single object write. Uploads request server-side encryption unless the
/// caller opts out.
#[derive(Debug, Clone, Copy)]
pub struct PutObjectRequest<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub body: &'a [u8],
    pub content_type: &'a str,
    pub cache_control: Option<&'a str>,
    /// Hex SHA-256 of `body`, stored as `sha256` object metadata.
    pub sha256: Option<&'a str>,
    pub server_side_encryption: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: u64,
}

/// Blob storage port used by every pipeline stage.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn put_object(&self, request: PutObjectRequest<'_>) -> Result<(), StoreError>;

    /// Every object whose key starts with `prefix`, across all result pages.
    async fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<ObjectSummary>, StoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}
