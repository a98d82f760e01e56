use super::{Notification, Notifier};
use crate::config::NotifyConfig;
use crate::error::NotifyError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;
use std::time::Duration;

static LEADING_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^| )0").expect("static regex is valid"));

/// Posts Office 365 connector MessageCards to Microsoft Teams webhooks.
pub struct TeamsNotifier {
    client: reqwest::Client,
    link_lifetime: chrono::Duration,
}

impl TeamsNotifier {
    /// `link_days` is how long report links stay valid, shown on the card.
    pub fn new(config: &NotifyConfig, link_days: u32) -> Result<Self, NotifyError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy_error = |e: reqwest::Error| NotifyError::Proxy {
                proxy: proxy.to_string(),
                message: e.to_string(),
            };
            builder = builder.proxy(reqwest::Proxy::https(proxy).map_err(proxy_error)?);
        }
        let client = builder.build().map_err(|e| NotifyError::Proxy {
            proxy: config.proxy.clone().unwrap_or_default(),
            message: e.to_string(),
        })?;
        Ok(Self {
            client,
            link_lifetime: chrono::Duration::days(i64::from(link_days)),
        })
    }
}

/// `03/05 09AM` rendered as `3/05 9am`.
pub fn availability_label(until: DateTime<Utc>) -> String {
    let stamp = until.format("%m/%d %I%p").to_string().to_lowercase();
    LEADING_ZERO.replace_all(&stamp, "$1").into_owned()
}

/// Build the MessageCard payload; the report action is omitted without a link.
pub fn message_card(
    notification: &Notification,
    report_url: Option<&str>,
    link_expires: DateTime<Utc>,
) -> Value {
    let mut card = json!({
        "@type": "MessageCard",
        "@context": "http://schema.org/extensions",
        "summary": notification.summary,
        "title": notification.title,
        "text": notification.body,
        "themeColor": notification.color,
    });
    if let Some(url) = report_url {
        card["potentialAction"] = json!([{
            "@type": "OpenUri",
            "name": format!(
                "Show Compliance Report (available until {})",
                availability_label(link_expires)
            ),
            "targets": [{ "os": "default", "uri": url }],
        }]);
    }
    card
}

impl Notifier for TeamsNotifier {
    fn name(&self) -> &str {
        "teams"
    }

    fn send<'a>(
        &'a self,
        notification: &'a Notification,
        report_url: Option<&'a str>,
        webhook: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>> {
        Box::pin(async move {
            let card = message_card(notification, report_url, Utc::now() + self.link_lifetime);
            let webhook_error = |message: String| NotifyError::Webhook {
                url: webhook.to_string(),
                message,
            };

            let response = self
                .client
                .post(webhook)
                .json(&card)
                .send()
                .await
                .map_err(|e| webhook_error(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
                return Err(webhook_error(format!("{status}: {body}")));
            }
            tracing::debug!(webhook, %status, "teams notification delivered");
            Ok(())
        })
    }
}
