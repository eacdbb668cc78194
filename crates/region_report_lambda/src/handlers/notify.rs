use region_report_core::notification::Notification;
use tracing::{info, warn};

use crate::adapters::message_bus::MessageBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    NoTarget,
    Failed(String),
}

/// Sends a run notification. Never fails: delivery problems are logged and
/// reported back only as an outcome value.
pub async fn dispatch_notification(
    bus: &impl MessageBus,
    target: Option<&str>,
    notification: &Notification,
) -> DispatchOutcome {
    let Some(target) = target.filter(|target| !target.trim().is_empty()) else {
        info!(
            component = "notifier",
            event = "notification_skipped",
            kind = notification.kind.as_str(),
            reason = "no notification target configured",
        );
        return DispatchOutcome::NoTarget;
    };

    match bus.publish(target, notification).await {
        Ok(()) => {
            info!(
                component = "notifier",
                event = "notification_sent",
                notification_target = target,
                kind = notification.kind.as_str(),
            );
            DispatchOutcome::Sent
        }
        Err(dispatch_error) => {
            warn!(
                component = "notifier",
                event = "notification_failed",
                notification_target = target,
                kind = notification.kind.as_str(),
                error = %dispatch_error,
            );
            DispatchOutcome::Failed(dispatch_error.to_string())
        }
    }
}

#[cfg(all(test, feature = "test-helpers"))]
mod tests {
    use region_report_core::notification::NotificationKind;

    use super::*;
    use crate::adapters::memory::RecordingMessageBus;

    fn notification() -> Notification {
        Notification {
            kind: NotificationKind::Success,
            subject: "subject".to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn skips_without_target() {
        let bus = RecordingMessageBus::new();
        assert_eq!(
            dispatch_notification(&bus, None, &notification()).await,
            DispatchOutcome::NoTarget
        );
        assert!(bus.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_an_outcome() {
        let bus = RecordingMessageBus::failing();
        let outcome = dispatch_notification(&bus, Some("arn:aws:sns:x"), &notification()).await;
        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
    }
}
