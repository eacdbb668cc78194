use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::contract::{FailureBody, SuccessBody};
use crate::storage_keys::s3_uri;

pub const SUBJECT_PREFIX: &str = "AWS Regions Report";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Failure,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
}

/// Picks the success or warning message for a completed run.
pub fn completion_message(result: &SuccessBody, report_bucket: &str) -> Notification {
    if result.has_warnings() {
        warning_message(result, report_bucket)
    } else {
        success_message(result, report_bucket)
    }
}

pub fn success_message(result: &SuccessBody, report_bucket: &str) -> Notification {
    Notification {
        kind: NotificationKind::Success,
        subject: format!(
            "{SUBJECT_PREFIX}: generated ({} regions, {} services)",
            result.regions, result.services
        ),
        body: completion_body(
            "The AWS regions and services report was generated.",
            result,
            report_bucket,
        ),
    }
}

pub fn warning_message(result: &SuccessBody, report_bucket: &str) -> Notification {
    let mut body = completion_body(
        "The AWS regions and services report was generated with warnings.",
        result,
        report_bucket,
    );
    body.push_str("\nWarnings:\n");
    for warning in &result.warnings {
        let _ = writeln!(body, "- [{}] {}", warning.stage, warning.message);
    }

    Notification {
        kind: NotificationKind::Warning,
        subject: format!(
            "{SUBJECT_PREFIX}: generated with {} warning(s)",
            result.warnings.len()
        ),
        body,
    }
}

pub fn failure_message(result: &FailureBody) -> Notification {
    let mut body = String::from("The AWS regions and services report could not be generated.\n\n");
    let _ = writeln!(body, "Stage: {}", result.stage);
    let _ = writeln!(body, "Error: {}", result.error);
    let _ = writeln!(body, "Duration: {} ms", result.timings_ms.total);

    Notification {
        kind: NotificationKind::Failure,
        subject: format!("{SUBJECT_PREFIX}: failed at {} stage", result.stage),
        body,
    }
}

fn completion_body(headline: &str, result: &SuccessBody, report_bucket: &str) -> String {
    let mut body = format!("{headline}\n\n");
    let _ = writeln!(body, "Trigger: {}", result.trigger.as_str());
    let _ = writeln!(body, "Regions: {}", result.regions);
    let _ = writeln!(body, "Services: {}", result.services);
    match result.mapping_entries {
        Some(entries) => {
            let _ = writeln!(body, "Coverage mapping entries: {entries}");
        }
        None => body.push_str("Coverage mapping entries: not available\n"),
    }
    let _ = writeln!(
        body,
        "Latest: {} ({} bytes)",
        s3_uri(report_bucket, &result.latest_key),
        result.artifact_bytes
    );
    let _ = writeln!(body, "Archive: {}", s3_uri(report_bucket, &result.archive_key));
    if let Some(distribution_key) = &result.distribution_key {
        let _ = writeln!(body, "Distribution: {distribution_key}");
    }
    let _ = writeln!(body, "SHA-256: {}", result.artifact_sha256);
    let _ = writeln!(
        body,
        "Retention: {} retained, {} deleted, {} failed",
        result.retention.retained, result.retention.deleted, result.retention.failed
    );
    let _ = writeln!(body, "Duration: {} ms", result.timings_ms.total);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{RunStage, RunWarning, TimingsMs, TotalTiming, Trigger};
    use crate::retention::RetentionCounts;

    fn result(warnings: Vec<RunWarning>) -> SuccessBody {
        SuccessBody {
            message: "ok".to_string(),
            trigger: Trigger::Scheduled,
            regions: 2,
            services: 3,
            mapping_entries: Some(4),
            coverage_available: true,
            artifact_bytes: 2048,
            artifact_sha256: "f00d".to_string(),
            latest_key: "reports/latest.xlsx".to_string(),
            archive_key: "reports/archive/r-2026-10-17-000000.xlsx".to_string(),
            distribution_key: None,
            retention: RetentionCounts {
                retained: 2,
                deleted: 2,
                failed: 0,
            },
            timings_ms: TimingsMs {
                total: 321,
                ..TimingsMs::default()
            },
            warnings,
        }
    }

    #[test]
    fn success_message_summarizes_counts_and_locations() {
        let message = completion_message(&result(Vec::new()), "reports-bucket");

        assert_eq!(message.kind, NotificationKind::Success);
        assert_eq!(message.subject, "AWS Regions Report: generated (2 regions, 3 services)");
        assert!(message.body.contains("Regions: 2"));
        assert!(message.body.contains("s3://reports-bucket/reports/latest.xlsx (2048 bytes)"));
        assert!(message.body.contains("Retention: 2 retained, 2 deleted, 0 failed"));
    }

    #[test]
    fn warnings_switch_to_warning_message() {
        let message = completion_message(
            &result(vec![RunWarning::new(RunStage::Distribution, "mirror denied")]),
            "reports-bucket",
        );

        assert_eq!(message.kind, NotificationKind::Warning);
        assert!(message.subject.contains("1 warning(s)"));
        assert!(message.body.contains("- [distribution] mirror denied"));
    }

    #[test]
    fn failure_message_names_stage_and_error() {
        let message = failure_message(&FailureBody {
            message: "failed".to_string(),
            error: "source document not found: s3://b/k".to_string(),
            stage: RunStage::Read,
            timings_ms: TotalTiming { total: 5 },
        });

        assert_eq!(message.kind, NotificationKind::Failure);
        assert_eq!(message.subject, "AWS Regions Report: failed at read stage");
        assert!(message.body.contains("Error: source document not found: s3://b/k"));
    }
}
