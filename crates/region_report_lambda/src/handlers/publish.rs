use std::fmt::Display;
use std::future::Future;

use region_report_core::retry::RetryPolicy;
use region_report_core::workbook::XLSX_CONTENT_TYPE;
use tracing::{error, info, warn};

use crate::adapters::object_store::{ObjectStore, PutObjectRequest, StoreError};
use crate::config::DistributionTarget;

/// Cache lifetime of the public mirror copy.
pub const DISTRIBUTION_CACHE_CONTROL: &str = "public, max-age=300";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("upload of {key} failed after {attempts} attempt(s): {reason}")]
pub struct UploadError {
    pub key: String,
    pub attempts: u32,
    pub reason: String,
}

/// The last error of an operation that failed on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriesExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// An encoded report ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedKeys {
    pub latest_key: String,
    pub archive_key: String,
}

/// Runs `operation` until it succeeds or the policy's attempts are spent,
/// sleeping the policy's backoff between attempts. `operation` receives the
/// 1-based attempt number.
pub async fn run_with_retries<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, RetriesExhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(last_error) => match policy.backoff_after(attempt) {
                Some(delay) => {
                    warn!(
                        component = "publisher",
                        event = "attempt_failed",
                        operation = label,
                        attempt,
                        backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %last_error,
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    return Err(RetriesExhausted {
                        attempts: attempt,
                        last_error,
                    })
                }
            },
        }
    }
}

/// Writes the artifact to the latest and archive keys concurrently. Both must
/// succeed; a successful write is not rolled back when the other fails.
pub async fn publish_report(
    store: &impl ObjectStore,
    bucket: &str,
    keys: &PublishedKeys,
    artifact: &Artifact,
    policy: &RetryPolicy,
) -> Result<(), UploadError> {
    let (latest, archive) = tokio::join!(
        upload_with_retries(store, bucket, &keys.latest_key, artifact, policy),
        upload_with_retries(store, bucket, &keys.archive_key, artifact, policy),
    );
    latest?;
    archive
}

async fn upload_with_retries(
    store: &impl ObjectStore,
    bucket: &str,
    key: &str,
    artifact: &Artifact,
    policy: &RetryPolicy,
) -> Result<(), UploadError> {
    let request = PutObjectRequest {
        bucket,
        key,
        body: &artifact.bytes,
        content_type: XLSX_CONTENT_TYPE,
        cache_control: None,
        sha256: Some(&artifact.sha256),
        server_side_encryption: true,
    };

    match run_with_retries(policy, key, |_| store.put_object(request)).await {
        Ok(()) => {
            info!(
                component = "publisher",
                event = "upload_completed",
                bucket,
                key,
                bytes = artifact.bytes.len(),
            );
            Ok(())
        }
        Err(exhausted) => {
            error!(
                component = "publisher",
                event = "upload_failed",
                bucket,
                key,
                attempts = exhausted.attempts,
                error = %exhausted.last_error,
            );
            Err(UploadError {
                key: key.to_string(),
                attempts: exhausted.attempts,
                reason: exhausted.last_error.to_string(),
            })
        }
    }
}

/// Copies the artifact to the public distribution location with a short
/// cache lifetime. Single attempt; the caller downgrades failure to a warning.
pub async fn mirror_to_distribution(
    store: &impl ObjectStore,
    target: &DistributionTarget,
    artifact: &Artifact,
) -> Result<(), StoreError> {
    let result = store
        .put_object(PutObjectRequest {
            bucket: &target.bucket,
            key: &target.key,
            body: &artifact.bytes,
            content_type: XLSX_CONTENT_TYPE,
            cache_control: Some(DISTRIBUTION_CACHE_CONTROL),
            sha256: Some(&artifact.sha256),
            server_side_encryption: true,
        })
        .await;

    match &result {
        Ok(()) => info!(
            component = "publisher",
            event = "distribution_mirrored",
            bucket = %target.bucket,
            key = %target.key,
        ),
        Err(mirror_error) => warn!(
            component = "publisher",
            event = "distribution_failed",
            bucket = %target.bucket,
            key = %target.key,
            error = %mirror_error,
        ),
    }
    result
}
