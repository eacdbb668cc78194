use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};
use region_report_core::retry::RetryPolicy;
use region_report_lambda::adapters::local_fs::LocalObjectStore;
use region_report_lambda::adapters::message_bus::LogMessageBus;
use region_report_lambda::config::ReportConfig;
use region_report_lambda::handlers::pipeline::{handle_report_event, RunOptions};
use serde_json::json;

fn scratch_root() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "region_report_local_runner_{}_{nanos}",
        std::process::id()
    ))
}

#[tokio::test]
async fn runs_pipeline_against_directory_tree() {
    let root = scratch_root();
    let source_dir = root.join("data-bucket").join("aws-data");
    std::fs::create_dir_all(&source_dir).expect("create source dir");
    std::fs::write(
        source_dir.join("complete-data.json"),
        json!({
            "metadata": {"schemaVersion": "1.0"},
            "regions": {"regions": [{"code": "us-east-1", "name": "US East"}]},
            "services": {"services": [{"code": "s3", "name": "Amazon S3"}]},
            "servicesByRegion": {"us-east-1": {"services": ["s3"]}}
        })
        .to_string(),
    )
    .expect("write primary document");

    let config = ReportConfig::from_lookup(|key: &str| match key {
        "SOURCE_BUCKET" => Some("data-bucket".to_string()),
        // Files carry the wall-clock mtime; keep them regardless of the fixed run time.
        "RETENTION_DAYS" => Some("36500".to_string()),
        "NOTIFICATION_TARGET" => Some("arn:aws:sns:us-east-1:123456789012:reports".to_string()),
        _ => None,
    })
    .expect("config should load");
    let options = RunOptions::at(Utc.with_ymd_and_hms(2026, 10, 17, 9, 15, 0).unwrap())
        .with_retry(RetryPolicy::immediate(1));

    let store = LocalObjectStore::new(&root);
    let outcome = handle_report_event(&json!({}), &config, &store, &LogMessageBus, &options).await;
    let response = outcome.into_response();

    assert_eq!(response.status_code, 200);
    // Names document is absent, so the run carries one warning.
    assert_eq!(response.body["warnings"].as_array().map(Vec::len), Some(1));

    let latest = std::fs::read(
        root.join("data-bucket")
            .join("reports")
            .join("aws-regions-services-latest.xlsx"),
    )
    .expect("latest artifact on disk");
    assert!(latest.starts_with(b"PK"));
    assert!(root
        .join("data-bucket/reports/archive/aws-regions-services-2026-10-17-091500.xlsx")
        .exists());

    let _ = std::fs::remove_dir_all(root);
}
