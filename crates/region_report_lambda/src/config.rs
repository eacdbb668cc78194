use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use region_report_core::report::dates::DEFAULT_TIMEZONE;
use region_report_core::retention::{retention_cutoff, DEFAULT_RETENTION_DAYS};
use region_report_core::storage_keys::{
    archive_basename, archive_object_key, latest_object_key, s3_uri, split_filename,
};
use region_report_core::workbook::XLSX_EXTENSION;

pub const DEFAULT_SOURCE_KEY: &str = "aws-data/complete-data.json";
pub const DEFAULT_SERVICE_NAMES_KEY: &str = "aws-data/services.json";
pub const DEFAULT_REPORT_PREFIX: &str = "reports/";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "reports/archive/";
pub const DEFAULT_LATEST_FILENAME: &str = "aws-regions-services-latest.xlsx";
pub const DEFAULT_SCHEMA_MAJOR: &str = "1";

pub const NOTIFICATION_TARGET_VARS: &[&str] = &["NOTIFICATION_TARGET", "SNS_TOPIC_ARN"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Optional public copy of the latest artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionTarget {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub source_bucket: String,
    pub source_key: String,
    pub service_names_key: String,
    pub report_bucket: String,
    pub report_prefix: String,
    pub archive_prefix: String,
    pub latest_filename: String,
    pub archive_basename: String,
    pub retention_days: u32,
    pub notification_target: Option<String>,
    pub distribution: Option<DistributionTarget>,
    pub timezone: Tz,
    pub expected_schema_major: String,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let source_bucket = get("SOURCE_BUCKET").ok_or(ConfigError::Missing("SOURCE_BUCKET"))?;
        let report_bucket = get("REPORT_BUCKET").unwrap_or_else(|| source_bucket.clone());
        let latest_filename = get_or("LATEST_FILENAME", DEFAULT_LATEST_FILENAME);
        let archive_basename =
            get("ARCHIVE_BASENAME").unwrap_or_else(|| archive_basename(&latest_filename));

        let retention_days = match get("RETENTION_DAYS") {
            Some(raw) => raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
                key: "RETENTION_DAYS",
                reason: format!("'{raw}' is not a non-negative integer ({error})"),
            })?,
            None => DEFAULT_RETENTION_DAYS,
        };
        if retention_cutoff(Utc::now(), retention_days).is_none() {
            return Err(ConfigError::Invalid {
                key: "RETENTION_DAYS",
                reason: format!("{retention_days} days reaches past the supported calendar"),
            });
        }

        let timezone = match get("REPORT_TIMEZONE") {
            Some(raw) => raw.parse::<Tz>().map_err(|error| ConfigError::Invalid {
                key: "REPORT_TIMEZONE",
                reason: format!("'{raw}' is not an IANA timezone ({error})"),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let expected_schema_major = get_or("EXPECTED_SCHEMA_MAJOR", DEFAULT_SCHEMA_MAJOR);
        if !expected_schema_major.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                key: "EXPECTED_SCHEMA_MAJOR",
                reason: format!("'{expected_schema_major}' is not a major version number"),
            });
        }

        let distribution = get("DISTRIBUTION_BUCKET").map(|bucket| DistributionTarget {
            bucket,
            key: get("DISTRIBUTION_KEY").unwrap_or_else(|| latest_filename.clone()),
        });

        Ok(Self {
            source_key: get_or("SOURCE_KEY", DEFAULT_SOURCE_KEY),
            service_names_key: get_or("SERVICE_NAMES_KEY", DEFAULT_SERVICE_NAMES_KEY),
            report_prefix: get_or("REPORT_PREFIX", DEFAULT_REPORT_PREFIX),
            archive_prefix: get_or("ARCHIVE_PREFIX", DEFAULT_ARCHIVE_PREFIX),
            notification_target: notification_target_from_lookup(&get),
            source_bucket,
            report_bucket,
            latest_filename,
            archive_basename,
            retention_days,
            distribution,
            timezone,
            expected_schema_major,
        })
    }

    pub fn latest_key(&self) -> String {
        latest_object_key(&self.report_prefix, &self.latest_filename)
    }

    pub fn archive_key(&self, generated_at: DateTime<Utc>) -> String {
        let extension = match split_filename(&self.latest_filename) {
            (_, "") => XLSX_EXTENSION,
            (_, extension) => extension,
        };
        archive_object_key(
            &self.archive_prefix,
            &self.archive_basename,
            extension,
            generated_at,
        )
    }

    pub fn source_location(&self) -> String {
        s3_uri(&self.source_bucket, &self.source_key)
    }
}

/// Notification target from the process environment, read on its own so a
/// failed configuration load can still report the failure.
pub fn notification_target_from_env() -> Option<String> {
    notification_target_from_lookup(&|key: &str| {
        std::env::var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

fn notification_target_from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    NOTIFICATION_TARGET_VARS.iter().find_map(|key| get(key))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn applies_defaults_around_required_bucket() {
        let config = ReportConfig::from_lookup(lookup(&[("SOURCE_BUCKET", "data-bucket")]))
            .expect("config should load");

        assert_eq!(config.report_bucket, "data-bucket");
        assert_eq!(config.source_key, DEFAULT_SOURCE_KEY);
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.archive_basename, "aws-regions-services");
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert_eq!(config.notification_target, None);
        assert_eq!(config.distribution, None);
        assert_eq!(
            config.latest_key(),
            "reports/aws-regions-services-latest.xlsx"
        );
        assert_eq!(
            config.archive_key(Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap()),
            "reports/archive/aws-regions-services-2026-10-17-083000.xlsx"
        );
    }

    #[test]
    fn missing_source_bucket_is_fatal() {
        let error = ReportConfig::from_lookup(lookup(&[("SOURCE_BUCKET", "  ")]))
            .expect_err("blank bucket should fail");
        assert_eq!(error, ConfigError::Missing("SOURCE_BUCKET"));
    }

    #[test]
    fn rejects_invalid_numbers_and_zones() {
        let error = ReportConfig::from_lookup(lookup(&[
            ("SOURCE_BUCKET", "b"),
            ("RETENTION_DAYS", "-1"),
        ]))
        .expect_err("negative retention should fail");
        assert!(matches!(error, ConfigError::Invalid { key: "RETENTION_DAYS", .. }));

        let error = ReportConfig::from_lookup(lookup(&[
            ("SOURCE_BUCKET", "b"),
            ("RETENTION_DAYS", "4000000000"),
        ]))
        .expect_err("window past the calendar range should fail");
        assert!(matches!(error, ConfigError::Invalid { key: "RETENTION_DAYS", .. }));

        let error = ReportConfig::from_lookup(lookup(&[
            ("SOURCE_BUCKET", "b"),
            ("REPORT_TIMEZONE", "Mars/Olympus"),
        ]))
        .expect_err("unknown timezone should fail");
        assert!(matches!(error, ConfigError::Invalid { key: "REPORT_TIMEZONE", .. }));
    }

    #[test]
    fn reads_optional_targets_and_aliases() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("SOURCE_BUCKET", "b"),
            ("SNS_TOPIC_ARN", "arn:aws:sns:us-east-1:123456789012:reports"),
            ("DISTRIBUTION_BUCKET", "public-bucket"),
            ("REPORT_TIMEZONE", "Europe/Dublin"),
        ]))
        .expect("config should load");

        assert_eq!(
            config.notification_target.as_deref(),
            Some("arn:aws:sns:us-east-1:123456789012:reports")
        );
        assert_eq!(
            config.distribution,
            Some(DistributionTarget {
                bucket: "public-bucket".to_string(),
                key: DEFAULT_LATEST_FILENAME.to_string(),
            })
        );
        assert_eq!(config.timezone, chrono_tz::Europe::Dublin);
    }
}
