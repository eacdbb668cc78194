use lambda_runtime::{service_fn, Error, LambdaEvent};
use region_report_core::contract::StatusPayload;
use region_report_lambda::adapters::message_bus::AwsMessageBus;
use region_report_lambda::adapters::s3::S3ObjectStore;
use region_report_lambda::config::{notification_target_from_env, ReportConfig};
use region_report_lambda::handlers::pipeline::{
    handle_config_failure, handle_report_event, RunOptions,
};
use region_report_lambda::telemetry::init_tracing;
use serde_json::Value;

struct RuntimeDependencies {
    store: S3ObjectStore,
    bus: AwsMessageBus,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<StatusPayload, Error> {
    let outcome = match ReportConfig::from_env() {
        Ok(config) => {
            handle_report_event(
                &event.payload,
                &config,
                &deps.store,
                &deps.bus,
                &RunOptions::default(),
            )
            .await
        }
        Err(config_error) => {
            handle_config_failure(
                config_error,
                notification_target_from_env().as_deref(),
                &deps.bus,
            )
            .await
        }
    };
    Ok(outcome.into_response())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        store: S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config)),
        bus: AwsMessageBus::new(
            aws_sdk_sns::Client::new(&aws_config),
            aws_sdk_sqs::Client::new(&aws_config),
        ),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
