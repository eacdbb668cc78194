//! In-memory doubles for the storage and message-bus ports.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use region_report_core::notification::Notification;

use super::message_bus::{DispatchError, MessageBus};
use super::object_store::{ObjectStore, ObjectSummary, PutObjectRequest, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub sha256: Option<String>,
    pub server_side_encryption: bool,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Object store keyed by `(bucket, key)` with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    put_failures: Mutex<HashMap<String, u32>>,
    put_attempts: Mutex<HashMap<String, u32>>,
    delete_failures: Mutex<BTreeSet<String>>,
    fail_listing: AtomicBool,
    frozen_clock: Mutex<Option<DateTime<Utc>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.seed_with_timestamp(bucket, key, body, None);
    }

    pub fn seed_with_timestamp(
        &self,
        bucket: &str,
        key: &str,
        body: impl Into<Vec<u8>>,
        last_modified: Option<DateTime<Utc>>,
    ) {
        lock(&self.objects).insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: None,
                cache_control: None,
                sha256: None,
                server_side_encryption: false,
                last_modified,
            },
        );
    }

    /// The next `count` puts to `key` fail before writes succeed again.
    pub fn fail_puts(&self, key: &str, count: u32) {
        lock(&self.put_failures).insert(key.to_string(), count);
    }

    pub fn fail_deletes(&self, key: &str) {
        lock(&self.delete_failures).insert(key.to_string());
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Stamps later writes with `now` instead of the wall clock.
    pub fn freeze_clock(&self, now: DateTime<Utc>) {
        *lock(&self.frozen_clock) = Some(now);
    }

    pub fn put_attempts(&self, key: &str) -> u32 {
        lock(&self.put_attempts).get(key).copied().unwrap_or(0)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.objects)
            .keys()
            .filter(|(object_bucket, _)| object_bucket == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.object(bucket, key)
            .map(|object| object.body)
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object(&self, request: PutObjectRequest<'_>) -> Result<(), StoreError> {
        *lock(&self.put_attempts)
            .entry(request.key.to_string())
            .or_insert(0) += 1;

        if let Some(remaining) = lock(&self.put_failures).get_mut(request.key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Io(format!(
                    "injected put failure for {}",
                    request.key
                )));
            }
        }

        let frozen_clock = *lock(&self.frozen_clock);
        lock(&self.objects).insert(
            (request.bucket.to_string(), request.key.to_string()),
            StoredObject {
                body: request.body.to_vec(),
                content_type: Some(request.content_type.to_string()),
                cache_control: request.cache_control.map(str::to_string),
                sha256: request.sha256.map(str::to_string),
                server_side_encryption: request.server_side_encryption,
                last_modified: Some(frozen_clock.unwrap_or_else(Utc::now)),
            },
        );
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectSummary>, StoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(format!(
                "injected list failure for {bucket}/{prefix}"
            )));
        }

        Ok(lock(&self.objects)
            .iter()
            .filter(|((object_bucket, key), _)| object_bucket == bucket && key.starts_with(prefix))
            .map(|((_, key), object)| ObjectSummary {
                key: key.clone(),
                last_modified: object.last_modified,
                size: object.body.len() as u64,
            })
            .collect())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        if lock(&self.delete_failures).contains(key) {
            return Err(StoreError::Io(format!("injected delete failure for {key}")));
        }
        lock(&self.objects)
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

/// Captures published notifications; optionally fails every publish.
#[derive(Debug, Default)]
pub struct RecordingMessageBus {
    sent: Mutex<Vec<(String, Notification)>>,
    fail: AtomicBool,
}

impl RecordingMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let bus = Self::default();
        bus.fail.store(true, Ordering::SeqCst);
        bus
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        lock(&self.sent).clone()
    }
}

impl MessageBus for RecordingMessageBus {
    async fn publish(
        &self,
        target: &str,
        notification: &Notification,
    ) -> Result<(), DispatchError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Delivery {
                target: target.to_string(),
                reason: "injected publish failure".to_string(),
            });
        }
        lock(&self.sent).push((target.to_string(), notification.clone()));
        Ok(())
    }
}
