use chrono::{DateTime, Utc};
use region_report_core::retention::{
    partition_by_age, retention_cutoff, ArchivedObject, RetentionCounts,
};
use region_report_core::storage_keys::{directory_prefix, is_archive_candidate};
use tracing::{info, warn};

use crate::adapters::object_store::{ObjectStore, StoreError};

#[derive(Debug, Clone)]
pub struct SweepRequest<'a> {
    pub bucket: &'a str,
    pub archive_prefix: &'a str,
    pub latest_key: &'a str,
    pub retention_days: u32,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub counts: RetentionCounts,
    /// Keys whose deletion failed.
    pub failed_keys: Vec<String>,
}

/// Deletes archived artifacts older than the retention window. A failed
/// listing fails the sweep; a failed deletion is counted and skipped.
pub async fn sweep_archive(
    store: &impl ObjectStore,
    request: &SweepRequest<'_>,
) -> Result<SweepOutcome, StoreError> {
    let prefix = directory_prefix(request.archive_prefix);
    let listed = store.list_objects(request.bucket, &prefix).await?;

    let candidates = listed
        .into_iter()
        .filter(|object| is_archive_candidate(&object.key, &prefix, request.latest_key))
        .map(|object| ArchivedObject {
            key: object.key,
            last_modified: object.last_modified,
        })
        .collect();
    let partition = partition_by_age(candidates, request.now, request.retention_days);

    let mut outcome = SweepOutcome {
        counts: RetentionCounts {
            retained: partition.retained.len(),
            ..RetentionCounts::default()
        },
        failed_keys: Vec::new(),
    };

    for expired in partition.expired {
        match store.delete_object(request.bucket, &expired.key).await {
            Ok(()) => outcome.counts.deleted += 1,
            Err(delete_error) => {
                warn!(
                    component = "retention",
                    event = "delete_failed",
                    bucket = request.bucket,
                    key = %expired.key,
                    error = %delete_error,
                );
                outcome.counts.failed += 1;
                outcome.failed_keys.push(expired.key);
            }
        }
    }

    let cutoff = retention_cutoff(request.now, request.retention_days)
        .map_or_else(|| "unbounded".to_string(), |cutoff| cutoff.to_rfc3339());
    info!(
        component = "retention",
        event = "sweep_completed",
        bucket = request.bucket,
        prefix = %prefix,
        cutoff = %cutoff,
        retained = outcome.counts.retained,
        deleted = outcome.counts.deleted,
        failed = outcome.counts.failed,
    );
    Ok(outcome)
}

#[cfg(all(test, feature = "test-helpers"))]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::adapters::memory::InMemoryObjectStore;

    const BUCKET: &str = "reports";
    const LATEST: &str = "reports/aws-regions-services-latest.xlsx";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn seeded_store() -> InMemoryObjectStore {
        let store = InMemoryObjectStore::new();
        for age in [1, 5, 8, 10] {
            store.seed_with_timestamp(
                BUCKET,
                &format!("reports/archive/r-{age}.xlsx"),
                b"PK".to_vec(),
                Some(now() - Duration::days(age)),
            );
        }
        store.seed_with_timestamp(BUCKET, LATEST, b"PK".to_vec(), Some(now() - Duration::days(30)));
        store.seed_with_timestamp(
            BUCKET,
            "reports/archive/",
            Vec::new(),
            Some(now() - Duration::days(30)),
        );
        store
    }

    fn request() -> SweepRequest<'static> {
        SweepRequest {
            bucket: BUCKET,
            archive_prefix: "reports/archive/",
            latest_key: LATEST,
            retention_days: 7,
            now: now(),
        }
    }

    #[tokio::test]
    async fn deletes_only_expired_archives() {
        let store = seeded_store();
        let outcome = sweep_archive(&store, &request()).await.expect("sweep");

        assert_eq!(
            outcome.counts,
            RetentionCounts {
                retained: 2,
                deleted: 2,
                failed: 0
            }
        );
        let keys = store.keys(BUCKET);
        assert!(keys.contains(&"reports/archive/r-1.xlsx".to_string()));
        assert!(keys.contains(&"reports/archive/r-5.xlsx".to_string()));
        assert!(!keys.contains(&"reports/archive/r-8.xlsx".to_string()));
        assert!(keys.contains(&LATEST.to_string()));
        assert!(keys.contains(&"reports/archive/".to_string()));
    }

    #[tokio::test]
    async fn skips_failed_deletions() {
        let store = seeded_store();
        store.fail_deletes("reports/archive/r-8.xlsx");

        let outcome = sweep_archive(&store, &request()).await.expect("sweep");
        assert_eq!(outcome.counts.deleted, 1);
        assert_eq!(outcome.counts.failed, 1);
        assert_eq!(outcome.failed_keys, vec!["reports/archive/r-8.xlsx".to_string()]);
    }

    #[tokio::test]
    async fn listing_failure_fails_sweep() {
        let store = seeded_store();
        store.fail_listing();
        assert!(sweep_archive(&store, &request()).await.is_err());
    }

    #[tokio::test]
    async fn out_of_range_window_keeps_every_archive() {
        let store = seeded_store();
        let request = SweepRequest {
            retention_days: 4_000_000_000,
            ..request()
        };

        let outcome = sweep_archive(&store, &request).await.expect("sweep");
        assert_eq!(outcome.counts.retained, 4);
        assert_eq!(outcome.counts.deleted, 0);
    }
}
