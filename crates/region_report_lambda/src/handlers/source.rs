use serde_json::Value;
use tracing::{error, info, warn};

use crate::adapters::object_store::{ObjectStore, StoreError};
use crate::config::ReportConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source document not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("source document s3://{bucket}/{key} is not valid JSON: {reason}")]
    MalformedContent {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("failed to read source document s3://{bucket}/{key}: {reason}")]
    TransientIo {
        bucket: String,
        key: String,
        reason: String,
    },
}

/// Both input documents, read concurrently. The service-names document is
/// optional downstream, so its failure is returned rather than raised.
pub struct SourceDocuments {
    pub primary: Value,
    pub service_names: Result<Value, SourceError>,
}

pub async fn read_sources(
    store: &impl ObjectStore,
    config: &ReportConfig,
) -> Result<SourceDocuments, SourceError> {
    let (primary, service_names) = tokio::join!(
        read_primary_document(store, &config.source_bucket, &config.source_key),
        read_service_names(store, &config.source_bucket, &config.service_names_key),
    );
    Ok(SourceDocuments {
        primary: primary?,
        service_names,
    })
}

pub async fn read_primary_document(
    store: &impl ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Value, SourceError> {
    match read_json(store, bucket, key).await {
        Ok(document) => {
            info!(
                component = "source_reader",
                event = "primary_document_read",
                bucket,
                key,
            );
            Ok(document)
        }
        Err(source_error) => {
            error!(
                component = "source_reader",
                event = "primary_document_failed",
                bucket,
                key,
                error = %source_error,
            );
            Err(source_error)
        }
    }
}

pub async fn read_service_names(
    store: &impl ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Value, SourceError> {
    match read_json(store, bucket, key).await {
        Ok(document) => {
            info!(
                component = "source_reader",
                event = "service_names_read",
                bucket,
                key,
            );
            Ok(document)
        }
        Err(source_error) => {
            warn!(
                component = "source_reader",
                event = "service_names_unavailable",
                bucket,
                key,
                error = %source_error,
            );
            Err(source_error)
        }
    }
}

async fn read_json(
    store: &impl ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Value, SourceError> {
    let bytes = store.get_object(bucket, key).await.map_err(|error| match error {
        StoreError::NotFound { bucket, key } => SourceError::NotFound { bucket, key },
        StoreError::Io(reason) => SourceError::TransientIo {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        },
    })?;

    serde_json::from_slice(&bytes).map_err(|error| SourceError::MalformedContent {
        bucket: bucket.to_string(),
        key: key.to_string(),
        reason: error.to_string(),
    })
}

#[cfg(all(test, feature = "test-helpers"))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::memory::InMemoryObjectStore;

    #[tokio::test]
    async fn parses_stored_json() {
        let store = InMemoryObjectStore::new();
        store.seed("data", "doc.json", json!({"regions": []}).to_string());

        let document = read_primary_document(&store, "data", "doc.json")
            .await
            .expect("document should parse");
        assert_eq!(document, json!({"regions": []}));
    }

    #[tokio::test]
    async fn classifies_missing_and_malformed_documents() {
        let store = InMemoryObjectStore::new();
        store.seed("data", "broken.json", "{not json");

        assert_eq!(
            read_primary_document(&store, "data", "absent.json").await,
            Err(SourceError::NotFound {
                bucket: "data".to_string(),
                key: "absent.json".to_string(),
            })
        );
        assert!(matches!(
            read_service_names(&store, "data", "broken.json").await,
            Err(SourceError::MalformedContent { .. })
        ));
    }
}
