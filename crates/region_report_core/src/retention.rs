use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// An archived object as reported by a storage listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedObject {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPartition {
    pub retained: Vec<ArchivedObject>,
    pub expired: Vec<ArchivedObject>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetentionCounts {
    pub retained: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// `now - retention_days`, or `None` when that instant is out of range.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(retention_days)).and_then(|window| now.checked_sub_signed(window))
}

/// Splits objects into those modified within the window and those older
/// than `now - retention_days`. Objects without a modification time are
/// retained, as is everything when the cutoff is out of range.
pub fn partition_by_age(
    objects: Vec<ArchivedObject>,
    now: DateTime<Utc>,
    retention_days: u32,
) -> RetentionPartition {
    let Some(cutoff) = retention_cutoff(now, retention_days) else {
        return RetentionPartition {
            retained: objects,
            expired: Vec::new(),
        };
    };
    let (expired, retained) = objects.into_iter().partition(|object| {
        object
            .last_modified
            .is_some_and(|modified| modified < cutoff)
    });
    RetentionPartition { retained, expired }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn object(key: &str, age_days: i64, now: DateTime<Utc>) -> ArchivedObject {
        ArchivedObject {
            key: key.to_string(),
            last_modified: Some(now - Duration::days(age_days)),
        }
    }

    #[test]
    fn partitions_against_seven_day_window() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let objects = vec![
            object("a", 1, now),
            object("b", 5, now),
            object("c", 8, now),
            object("d", 10, now),
        ];

        let partition = partition_by_age(objects, now, DEFAULT_RETENTION_DAYS);
        let retained: Vec<&str> = partition.retained.iter().map(|o| o.key.as_str()).collect();
        let expired: Vec<&str> = partition.expired.iter().map(|o| o.key.as_str()).collect();

        assert_eq!(retained, vec!["a", "b"]);
        assert_eq!(expired, vec!["c", "d"]);
    }

    #[test]
    fn objects_without_timestamp_are_retained() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let partition = partition_by_age(
            vec![ArchivedObject {
                key: "unknown".to_string(),
                last_modified: None,
            }],
            now,
            0,
        );
        assert_eq!(partition.retained.len(), 1);
        assert!(partition.expired.is_empty());
    }

    #[test]
    fn object_exactly_at_cutoff_is_retained() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let partition = partition_by_age(vec![object("edge", 7, now)], now, 7);
        assert_eq!(partition.retained.len(), 1);
    }

    #[test]
    fn window_beyond_calendar_range_retains_everything() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        assert_eq!(retention_cutoff(now, u32::MAX), None);

        let partition = partition_by_age(vec![object("old", 3_650, now)], now, 4_000_000_000);
        assert_eq!(partition.retained.len(), 1);
        assert!(partition.expired.is_empty());
    }
}
