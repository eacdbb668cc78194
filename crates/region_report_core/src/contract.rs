//! Run-result contract shared by the Lambda entry point and the local runner.
//!
//! Bodies serialize camelCase; the status envelope carries `statusCode` and a
//! JSON object `body`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::retention::RetentionCounts;

pub const SUCCESS_MESSAGE: &str = "Report generated successfully";
pub const WARNING_MESSAGE: &str = "Report generated with warnings";
pub const FAILURE_MESSAGE: &str = "Report generation failed";

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILED: u16 = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Config,
    Read,
    Normalize,
    Render,
    Upload,
    Distribution,
    Retention,
    Notify,
}

impl RunStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Read => "read",
            Self::Normalize => "normalize",
            Self::Render => "render",
            Self::Upload => "upload",
            Self::Distribution => "distribution",
            Self::Retention => "retention",
            Self::Notify => "notify",
        }
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal issue recorded on an otherwise successful run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunWarning {
    pub stage: RunStage,
    pub message: String,
}

impl RunWarning {
    pub fn new(stage: RunStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimingsMs {
    pub read: u64,
    pub normalize: u64,
    pub render: u64,
    pub upload: u64,
    pub distribution: u64,
    pub retention: u64,
    pub notify: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TotalTiming {
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Scheduled,
    S3,
    Sqs,
    Manual,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::S3 => "s3",
            Self::Sqs => "sqs",
            Self::Manual => "manual",
        }
    }
}

/// Classifies the invoking event. Unrecognized or empty payloads count as
/// manual invocations.
pub fn classify_trigger(event: &Value) -> Trigger {
    let Some(object) = event.as_object() else {
        return Trigger::Manual;
    };

    let source = object.get("source").and_then(Value::as_str);
    let detail_type = object.get("detail-type").and_then(Value::as_str);
    if matches!(source, Some("aws.events" | "aws.scheduler"))
        || detail_type.is_some_and(|detail| detail.contains("Scheduled"))
    {
        return Trigger::Scheduled;
    }

    let first_record = object
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first());
    if let Some(record) = first_record {
        let event_source = record
            .get("eventSource")
            .or_else(|| record.get("EventSource"))
            .and_then(Value::as_str);
        match event_source {
            Some("aws:s3") => return Trigger::S3,
            Some("aws:sqs") => return Trigger::Sqs,
            _ if record.get("s3").is_some() => return Trigger::S3,
            _ => {}
        }
    }

    Trigger::Manual
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub message: String,
    pub trigger: Trigger,
    pub regions: usize,
    pub services: usize,
    pub mapping_entries: Option<usize>,
    pub coverage_available: bool,
    pub artifact_bytes: usize,
    pub artifact_sha256: String,
    pub latest_key: String,
    pub archive_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_key: Option<String>,
    pub retention: RetentionCounts,
    pub timings_ms: TimingsMs,
    pub warnings: Vec<RunWarning>,
}

impl SuccessBody {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub message: String,
    pub error: String,
    pub stage: RunStage,
    pub timings_ms: TotalTiming,
}

/// Invocation result envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPayload {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Value,
}

impl StatusPayload {
    pub fn success(body: &SuccessBody) -> Self {
        Self {
            status_code: STATUS_OK,
            body: body_value(body),
        }
    }

    pub fn failure(body: &FailureBody) -> Self {
        Self {
            status_code: STATUS_FAILED,
            body: body_value(body),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

fn body_value(body: &impl Serialize) -> Value {
    serde_json::to_value(body).unwrap_or_else(|error| {
        json!({
            "message": FAILURE_MESSAGE,
            "error": format!("failed to serialize run result: {error}"),
        })
    })
}
