use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use region_report_core::contract::{
    classify_trigger, FailureBody, RunStage, RunWarning, StatusPayload, SuccessBody, TimingsMs,
    TotalTiming, Trigger, FAILURE_MESSAGE, SUCCESS_MESSAGE, WARNING_MESSAGE,
};
use region_report_core::normalize::{check_schema_version, normalize_documents, NormalizeError};
use region_report_core::notification::{completion_message, failure_message};
use region_report_core::report::{render_report, RenderContext};
use region_report_core::retention::RetentionCounts;
use region_report_core::retry::RetryPolicy;
use region_report_core::workbook::{artifact_sha256, encode_workbook, WorkbookError};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::adapters::message_bus::MessageBus;
use crate::adapters::object_store::ObjectStore;
use crate::config::{ConfigError, ReportConfig};
use crate::handlers::notify::dispatch_notification;
use crate::handlers::publish::{
    mirror_to_distribution, publish_report, Artifact, PublishedKeys, UploadError,
};
use crate::handlers::retention::{sweep_archive, SweepRequest};
use crate::handlers::source::{read_sources, SourceError};

/// Run-scoped inputs that are not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub now: DateTime<Utc>,
    pub retry: RetryPolicy,
}

impl RunOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

/// Failures that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to normalize source document: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("failed to render report: {0}")]
    Render(#[from] WorkbookError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl PipelineError {
    pub fn stage(&self) -> RunStage {
        match self {
            Self::Config(_) => RunStage::Config,
            Self::Source(_) => RunStage::Read,
            Self::Normalize(_) => RunStage::Normalize,
            Self::Render(_) => RunStage::Render,
            Self::Upload(_) => RunStage::Upload,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(SuccessBody),
    Failed(FailureBody),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_response(self) -> StatusPayload {
        match self {
            Self::Completed(body) => StatusPayload::success(&body),
            Self::Failed(body) => StatusPayload::failure(&body),
        }
    }
}

/// Single entry point for a report run: read, normalize, render, publish,
/// mirror and sweep, then notify. Never returns an error; fatal failures come
/// back as `RunOutcome::Failed`.
pub async fn handle_report_event(
    event: &Value,
    config: &ReportConfig,
    store: &impl ObjectStore,
    bus: &impl MessageBus,
    options: &RunOptions,
) -> RunOutcome {
    let started = Instant::now();
    let trigger = classify_trigger(event);
    info!(
        component = "pipeline",
        event = "run_started",
        trigger = trigger.as_str(),
        source = %config.source_location(),
        report_bucket = %config.report_bucket,
    );

    let mut timings = TimingsMs::default();
    match generate_and_publish(config, store, options, trigger, &mut timings).await {
        Ok(mut body) => {
            body.timings_ms.total = elapsed_ms(started);
            let notification = completion_message(&body, &config.report_bucket);

            let notify_started = Instant::now();
            dispatch_notification(bus, config.notification_target.as_deref(), &notification).await;
            body.timings_ms.notify = elapsed_ms(notify_started);
            body.timings_ms.total = elapsed_ms(started);

            info!(
                component = "pipeline",
                event = "run_completed",
                trigger = trigger.as_str(),
                regions = body.regions,
                services = body.services,
                artifact_bytes = body.artifact_bytes,
                warnings = body.warnings.len(),
                total_ms = body.timings_ms.total,
            );
            RunOutcome::Completed(body)
        }
        Err(pipeline_error) => {
            fail_run(
                pipeline_error,
                started,
                config.notification_target.as_deref(),
                bus,
            )
            .await
        }
    }
}

/// Reports a configuration that could not be loaded. The notification target
/// is passed separately since the configuration itself is unavailable.
pub async fn handle_config_failure(
    config_error: ConfigError,
    notification_target: Option<&str>,
    bus: &impl MessageBus,
) -> RunOutcome {
    fail_run(
        PipelineError::Config(config_error),
        Instant::now(),
        notification_target,
        bus,
    )
    .await
}

async fn fail_run(
    pipeline_error: PipelineError,
    started: Instant,
    notification_target: Option<&str>,
    bus: &impl MessageBus,
) -> RunOutcome {
    let stage = pipeline_error.stage();
    error!(
        component = "pipeline",
        event = "run_failed",
        stage = stage.as_str(),
        error = %pipeline_error,
    );

    let mut body = FailureBody {
        message: FAILURE_MESSAGE.to_string(),
        error: pipeline_error.to_string(),
        stage,
        timings_ms: TotalTiming {
            total: elapsed_ms(started),
        },
    };
    dispatch_notification(bus, notification_target, &failure_message(&body)).await;
    body.timings_ms.total = elapsed_ms(started);
    RunOutcome::Failed(body)
}

async fn generate_and_publish(
    config: &ReportConfig,
    store: &impl ObjectStore,
    options: &RunOptions,
    trigger: Trigger,
    timings: &mut TimingsMs,
) -> Result<SuccessBody, PipelineError> {
    let mut warnings = Vec::new();

    let stage_started = Instant::now();
    let sources = read_sources(store, config).await?;
    timings.read = elapsed_ms(stage_started);
    let service_names = match sources.service_names {
        Ok(document) => Some(document),
        Err(source_error) => {
            warnings.push(RunWarning::new(
                RunStage::Read,
                format!("service names unavailable, using service codes: {source_error}"),
            ));
            None
        }
    };

    let stage_started = Instant::now();
    let model = normalize_documents(&sources.primary, service_names.as_ref())?;
    if let Some(message) = check_schema_version(&model.metadata, &config.expected_schema_major) {
        warn!(
            component = "pipeline",
            event = "schema_version_mismatch",
            detail = %message,
        );
        warnings.push(RunWarning::new(RunStage::Normalize, message));
    }
    timings.normalize = elapsed_ms(stage_started);
    info!(
        component = "pipeline",
        event = "documents_normalized",
        regions = model.regions.len(),
        services = model.services.len(),
        coverage_available = model.coverage.is_some(),
    );

    let stage_started = Instant::now();
    let report = render_report(
        &model,
        &RenderContext {
            generated_at: options.now,
            timezone: config.timezone,
            source_location: config.source_location(),
        },
    );
    let bytes = encode_workbook(&report)?;
    let artifact = Artifact {
        sha256: artifact_sha256(&bytes),
        bytes,
    };
    timings.render = elapsed_ms(stage_started);

    let keys = PublishedKeys {
        latest_key: config.latest_key(),
        archive_key: config.archive_key(options.now),
    };
    let stage_started = Instant::now();
    publish_report(store, &config.report_bucket, &keys, &artifact, &options.retry).await?;
    timings.upload = elapsed_ms(stage_started);

    let sweep_request = SweepRequest {
        bucket: &config.report_bucket,
        archive_prefix: &config.archive_prefix,
        latest_key: &keys.latest_key,
        retention_days: config.retention_days,
        now: options.now,
    };
    let ((mirror, distribution_ms), (sweep, retention_ms)) = tokio::join!(
        timed(async {
            match &config.distribution {
                Some(target) => Some(mirror_to_distribution(store, target, &artifact).await),
                None => None,
            }
        }),
        timed(sweep_archive(store, &sweep_request)),
    );
    timings.distribution = distribution_ms;
    timings.retention = retention_ms;

    let distribution_key = match (mirror, &config.distribution) {
        (Some(Ok(())), Some(target)) => Some(target.key.clone()),
        (Some(Err(mirror_error)), _) => {
            warnings.push(RunWarning::new(
                RunStage::Distribution,
                format!("distribution mirror failed: {mirror_error}"),
            ));
            None
        }
        _ => None,
    };

    let retention = match sweep {
        Ok(outcome) => {
            if !outcome.failed_keys.is_empty() {
                warnings.push(RunWarning::new(
                    RunStage::Retention,
                    format!(
                        "{} expired archive object(s) could not be deleted: {}",
                        outcome.failed_keys.len(),
                        outcome.failed_keys.join(", ")
                    ),
                ));
            }
            outcome.counts
        }
        Err(sweep_error) => {
            warn!(
                component = "retention",
                event = "sweep_failed",
                bucket = %config.report_bucket,
                error = %sweep_error,
            );
            warnings.push(RunWarning::new(
                RunStage::Retention,
                format!("retention sweep failed: {sweep_error}"),
            ));
            RetentionCounts::default()
        }
    };

    let message = if warnings.is_empty() {
        SUCCESS_MESSAGE
    } else {
        WARNING_MESSAGE
    };

    Ok(SuccessBody {
        message: message.to_string(),
        trigger,
        regions: model.regions.len(),
        services: model.services.len(),
        mapping_entries: model.mapping_entry_count(),
        coverage_available: model.coverage.is_some(),
        artifact_bytes: artifact.bytes.len(),
        artifact_sha256: artifact.sha256,
        latest_key: keys.latest_key,
        archive_key: keys.archive_key,
        distribution_key,
        retention,
        timings_ms: *timings,
        warnings,
    })
}

async fn timed<F: Future>(future: F) -> (F::Output, u64) {
    let started = Instant::now();
    let output = future.await;
    (output, elapsed_ms(started))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
