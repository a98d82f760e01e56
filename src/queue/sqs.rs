use super::{Queue, QueueMessage};
use crate::config::{AwsConfig, QueueConfig};
use crate::error::QueueError;
use crate::process::{self, CommandSpec};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Headroom on top of the long-poll wait before the CLI call is abandoned.
const RECEIVE_GRACE: Duration = Duration::from_secs(30);
const DELETE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReceiveResponse {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMessage {
    #[serde(default)]
    message_id: String,
    receipt_handle: String,
    #[serde(default)]
    body: String,
}

/// Parse `sqs receive-message` output. The CLI prints nothing when the
/// long poll returns empty.
pub fn parse_receive(raw: &str) -> Result<Vec<QueueMessage>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let response: ReceiveResponse =
        serde_json::from_str(raw).context("receive-message output is not valid JSON")?;
    Ok(response
        .messages
        .into_iter()
        .map(|m| QueueMessage {
            id: m.message_id,
            body: m.body,
            receipt_handle: m.receipt_handle,
        })
        .collect())
}

/// SQS queue driven through the aws CLI.
pub struct SqsQueue {
    aws: AwsConfig,
    config: QueueConfig,
}

impl SqsQueue {
    pub fn new(config: &QueueConfig, aws: &AwsConfig) -> Result<Self, QueueError> {
        if config.url.as_deref().is_none_or(|url| url.trim().is_empty()) {
            return Err(QueueError::NotConfigured);
        }
        Ok(Self {
            aws: aws.clone(),
            config: config.clone(),
        })
    }

    fn url(&self) -> &str {
        self.config.url.as_deref().unwrap_or_default()
    }

    fn sqs_command(&self, action: &str) -> CommandSpec {
        CommandSpec::new(&self.aws.cli)
            .envs(self.aws.credential_env())
            .args(["--region", self.config.region.as_str(), "--output", "json"])
            .args(["sqs", action, "--queue-url", self.url()])
    }

    pub(crate) fn receive_spec(&self) -> CommandSpec {
        self.sqs_command("receive-message")
            .arg("--wait-time-seconds")
            .arg(self.config.wait_time_secs.to_string())
            .arg("--max-number-of-messages")
            .arg(self.config.max_messages.to_string())
            .arg("--visibility-timeout")
            .arg(self.config.visibility_timeout_secs.to_string())
            .args(["--message-attribute-names", "All"])
    }

    pub(crate) fn delete_spec(&self, receipt_handle: &str) -> CommandSpec {
        self.sqs_command("delete-message")
            .args(["--receipt-handle", receipt_handle])
    }
}

impl Queue for SqsQueue {
    fn name(&self) -> &str {
        "sqs"
    }

    fn poll<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<QueueMessage>, QueueError>> + Send + 'a>> {
        Box::pin(async move {
            let timeout = Duration::from_secs(self.config.wait_time_secs) + RECEIVE_GRACE;
            let output = process::run(&self.receive_spec(), timeout)
                .await
                .map_err(|e| QueueError::Receive(e.to_string()))?;
            if !output.success() {
                return Err(QueueError::Receive(output.combined().trim().to_string()));
            }
            parse_receive(&output.stdout).map_err(|e| QueueError::Receive(format!("{e:#}")))
        })
    }

    fn acknowledge<'a>(
        &'a self,
        message: &'a QueueMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        Box::pin(async move {
            let output = process::run(&self.delete_spec(&message.receipt_handle), DELETE_TIMEOUT)
                .await
                .map_err(|e| QueueError::Acknowledge(e.to_string()))?;
            if !output.success() {
                return Err(QueueError::Acknowledge(
                    output.combined().trim().to_string(),
                ));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> SqsQueue {
        let config = QueueConfig {
            url: Some("https://sqs.us-west-2.amazonaws.com/123/ecr-events".into()),
            ..QueueConfig::default()
        };
        SqsQueue::new(&config, &AwsConfig::default()).unwrap()
    }

    #[test]
    fn empty_output_means_no_messages() {
        assert!(parse_receive("").unwrap().is_empty());
        assert!(parse_receive("{}").unwrap().is_empty());
    }

    #[test]
    fn parses_messages() {
        let raw = r#"{"Messages":[{"MessageId":"m-1","ReceiptHandle":"rh-1","Body":"{\"detail\":{}}","MD5OfBody":"x"}]}"#;
        let messages = parse_receive(raw).unwrap();
        assert_eq!(
            messages,
            vec![QueueMessage {
                id: "m-1".into(),
                body: "{\"detail\":{}}".into(),
                receipt_handle: "rh-1".into(),
            }]
        );
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(parse_receive("<html>").is_err());
    }

    #[test]
    fn queue_requires_url() {
        assert!(matches!(
            SqsQueue::new(&QueueConfig::default(), &AwsConfig::default()),
            Err(QueueError::NotConfigured)
        ));
    }

    #[test]
    fn receive_uses_long_poll_settings() {
        let line = queue().receive_spec().display();
        assert!(line.contains("sqs receive-message --queue-url https://sqs.us-west-2.amazonaws.com/123/ecr-events"));
        assert!(line.contains("--wait-time-seconds 20"));
        assert!(line.contains("--max-number-of-messages 10"));
        assert!(line.contains("--visibility-timeout 4000"));
    }

    #[test]
    fn delete_passes_receipt_handle() {
        let line = queue().delete_spec("rh-1").display();
        assert!(line.ends_with("sqs delete-message --queue-url https://sqs.us-west-2.amazonaws.com/123/ecr-events --receipt-handle rh-1"));
    }
}
