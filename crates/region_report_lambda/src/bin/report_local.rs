use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use region_report_lambda::adapters::local_fs::LocalObjectStore;
use region_report_lambda::adapters::message_bus::LogMessageBus;
use region_report_lambda::config::{ReportConfig, NOTIFICATION_TARGET_VARS};
use region_report_lambda::handlers::pipeline::{
    handle_config_failure, handle_report_event, RunOptions,
};
use region_report_lambda::telemetry::init_tracing;
use serde_json::Value;

/// Runs the report pipeline against a directory tree acting as object
/// storage: `<root>/<bucket>/<key>`. Notifications are logged, not sent.
#[derive(Parser)]
#[command(name = "report_local")]
struct Args {
    /// Directory whose subdirectories are treated as buckets
    #[arg(long, env = "REPORT_LOCAL_ROOT")]
    root: PathBuf,
    /// JSON file with the invocation event; defaults to a manual run
    #[arg(long)]
    event: Option<PathBuf>,
    /// Configuration override, e.g. `--set RETENTION_DAYS=3`; wins over the
    /// process environment
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    overrides: Vec<(String, String)>,
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn read_event(path: Option<&PathBuf>) -> Result<Value, String> {
    let Some(path) = path else {
        return Ok(Value::Object(Default::default()));
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|error| format!("failed to read event file {}: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("event file {} is not valid JSON: {error}", path.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let event = match read_event(args.event.as_ref()) {
        Ok(event) => event,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let overrides: HashMap<String, String> = args.overrides.into_iter().collect();
    let lookup = |key: &str| {
        overrides
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    };

    let store = LocalObjectStore::new(args.root);
    let bus = LogMessageBus;
    let outcome = match ReportConfig::from_lookup(lookup) {
        Ok(config) => {
            handle_report_event(&event, &config, &store, &bus, &RunOptions::default()).await
        }
        Err(config_error) => {
            let target = NOTIFICATION_TARGET_VARS.iter().find_map(|key| lookup(key));
            handle_config_failure(config_error, target.as_deref(), &bus).await
        }
    };

    let success = outcome.is_success();
    match serde_json::to_string_pretty(&outcome.into_response()) {
        Ok(rendered) => println!("{rendered}"),
        Err(error) => eprintln!("failed to render run result: {error}"),
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
