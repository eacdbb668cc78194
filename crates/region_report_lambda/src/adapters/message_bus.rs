use aws_sdk_sns::error::DisplayErrorContext;
use region_report_core::notification::Notification;
use serde_json::json;
use tracing::info;

/// SNS rejects subjects longer than this.
pub const SNS_SUBJECT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("unsupported notification target '{0}'")]
    UnsupportedTarget(String),
    #[error("failed to deliver notification to {target}: {reason}")]
    Delivery { target: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget<'a> {
    SnsTopic(&'a str),
    SqsQueue(&'a str),
}

impl<'a> NotificationTarget<'a> {
    pub fn parse(target: &'a str) -> Result<Self, DispatchError> {
        let target = target.trim();
        if is_sns_topic_arn(target) {
            Ok(Self::SnsTopic(target))
        } else if target.starts_with("https://sqs.") {
            Ok(Self::SqsQueue(target))
        } else {
            Err(DispatchError::UnsupportedTarget(target.to_string()))
        }
    }
}

/// `arn:<partition>:sns:...` in any AWS partition (`aws`, `aws-cn`, `aws-us-gov`, ...).
fn is_sns_topic_arn(target: &str) -> bool {
    let mut parts = target.splitn(4, ':');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some("arn"), Some(partition), Some("sns")) if partition.starts_with("aws")
    )
}

/// Truncates on a character boundary.
pub fn truncate_subject(subject: &str, limit: usize) -> &str {
    match subject.char_indices().nth(limit) {
        Some((index, _)) => &subject[..index],
        None => subject,
    }
}

/// Fire-and-forget message delivery port.
#[allow(async_fn_in_trait)]
pub trait MessageBus {
    async fn publish(&self, target: &str, notification: &Notification)
        -> Result<(), DispatchError>;
}

/// Routes to SNS or SQS by the shape of the target identifier.
#[derive(Clone)]
pub struct AwsMessageBus {
    sns_client: aws_sdk_sns::Client,
    sqs_client: aws_sdk_sqs::Client,
}

impl AwsMessageBus {
    pub fn new(sns_client: aws_sdk_sns::Client, sqs_client: aws_sdk_sqs::Client) -> Self {
        Self {
            sns_client,
            sqs_client,
        }
    }
}

impl MessageBus for AwsMessageBus {
    async fn publish(
        &self,
        target: &str,
        notification: &Notification,
    ) -> Result<(), DispatchError> {
        let delivery_error = |reason: String| DispatchError::Delivery {
            target: target.to_string(),
            reason,
        };

        match NotificationTarget::parse(target)? {
            NotificationTarget::SnsTopic(topic_arn) => self
                .sns_client
                .publish()
                .topic_arn(topic_arn)
                .subject(truncate_subject(&notification.subject, SNS_SUBJECT_LIMIT))
                .message(&notification.body)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| delivery_error(DisplayErrorContext(&error).to_string())),
            NotificationTarget::SqsQueue(queue_url) => {
                let payload = json!({
                    "kind": notification.kind,
                    "subject": notification.subject,
                    "body": notification.body,
                });
                self.sqs_client
                    .send_message()
                    .queue_url(queue_url)
                    .message_body(payload.to_string())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        delivery_error(
                            aws_sdk_sqs::error::DisplayErrorContext(&error).to_string(),
                        )
                    })
            }
        }
    }
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessageBus;

impl MessageBus for LogMessageBus {
    async fn publish(
        &self,
        target: &str,
        notification: &Notification,
    ) -> Result<(), DispatchError> {
        info!(
            component = "notifier",
            event = "notification_logged",
            notification_target = target,
            kind = notification.kind.as_str(),
            subject = %notification.subject,
            body = %notification.body,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_targets_by_prefix() {
        assert_eq!(
            NotificationTarget::parse("arn:aws:sns:us-east-1:123456789012:reports"),
            Ok(NotificationTarget::SnsTopic(
                "arn:aws:sns:us-east-1:123456789012:reports"
            ))
        );
        assert_eq!(
            NotificationTarget::parse(" https://sqs.us-east-1.amazonaws.com/123456789012/q "),
            Ok(NotificationTarget::SqsQueue(
                "https://sqs.us-east-1.amazonaws.com/123456789012/q"
            ))
        );
        for arn in [
            "arn:aws-cn:sns:cn-north-1:123456789012:reports",
            "arn:aws-us-gov:sns:us-gov-west-1:123456789012:reports",
        ] {
            assert_eq!(NotificationTarget::parse(arn), Ok(NotificationTarget::SnsTopic(arn)));
        }
        assert!(NotificationTarget::parse("arn:aws:sqs:us-east-1:123456789012:q").is_err());
        assert_eq!(
            NotificationTarget::parse("mailto:ops@example.com"),
            Err(DispatchError::UnsupportedTarget(
                "mailto:ops@example.com".to_string()
            ))
        );
    }

    #[test]
    fn truncates_subject_on_char_boundary() {
        let subject = "✓".repeat(120);
        let truncated = truncate_subject(&subject, SNS_SUBJECT_LIMIT);
        assert_eq!(truncated.chars().count(), 100);
        assert_eq!(truncate_subject("short", SNS_SUBJECT_LIMIT), "short");
    }
}
