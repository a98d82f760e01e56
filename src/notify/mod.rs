//! Turning verdicts into chat notifications and delivering them.

mod composer;
mod teams;

pub use composer::{
    Audience, Notification, SUMMARY_DELETED, SUMMARY_FAILED, SUMMARY_PASSED, SUMMARY_WARNINGS,
    compose, palette,
};
pub use teams::{TeamsNotifier, availability_label, message_card};

use crate::error::NotifyError;
use std::future::Future;
use std::pin::Pin;

/// Delivers a notification to a single webhook.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn send<'a>(
        &'a self,
        notification: &'a Notification,
        report_url: Option<&'a str>,
        webhook: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;
}

/// Send to every webhook in turn. Failures are logged and skipped; the
/// number of successful deliveries is returned.
pub async fn broadcast(
    notifier: &dyn Notifier,
    notification: &Notification,
    report_url: Option<&str>,
    webhooks: &[String],
) -> usize {
    if webhooks.is_empty() {
        tracing::info!(
            audience = %notification.audience,
            "no webhooks configured for audience; notification dropped"
        );
        return 0;
    }

    let mut delivered = 0;
    for webhook in webhooks {
        match notifier.send(notification, report_url, webhook).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::error!(notifier = notifier.name(), "notification failed: {e}"),
        }
    }
    delivered
}
