//! Inbound registry events and their classification.
//!
//! Events arrive as CloudTrail records forwarded by CloudWatch. Parsing is
//! lenient: a missing or mistyped field reads as empty, never as an error,
//! so a malformed message is still routed and acknowledged.

mod router;

pub use router::{ECR_EVENT_SOURCE, Route, Router, SkipReason};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestParameters {
    pub repository_name: String,
    pub image_tag: String,
    pub registry_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub user_name: Option<String>,
    pub arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryEvent {
    pub event_source: String,
    pub event_name: String,
    pub error_code: String,
    pub error_message: String,
    pub request_parameters: RequestParameters,
    pub aws_region: Option<String>,
    pub event_time: Option<String>,
    pub user_identity: UserIdentity,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn non_empty_field(value: &Value, key: &str) -> Option<String> {
    str_field(value, key).filter(|s| !s.is_empty())
}

impl RegistryEvent {
    /// Build an event from a CloudTrail `detail` object.
    pub fn from_detail(detail: &Value) -> Self {
        let params = detail.get("requestParameters").unwrap_or(&Value::Null);
        let identity = detail.get("userIdentity").unwrap_or(&Value::Null);

        Self {
            event_source: str_field(detail, "eventSource").unwrap_or_default(),
            event_name: str_field(detail, "eventName").unwrap_or_default(),
            error_code: str_field(detail, "errorCode").unwrap_or_default(),
            error_message: str_field(detail, "errorMessage").unwrap_or_default(),
            request_parameters: RequestParameters {
                repository_name: str_field(params, "repositoryName").unwrap_or_default(),
                image_tag: str_field(params, "imageTag").unwrap_or_default(),
                registry_id: str_field(params, "registryId").unwrap_or_default(),
            },
            aws_region: non_empty_field(detail, "awsRegion"),
            event_time: non_empty_field(detail, "eventTime"),
            user_identity: UserIdentity {
                user_name: non_empty_field(identity, "userName"),
                arn: non_empty_field(identity, "arn"),
            },
        }
    }

    /// Build an event from a JSON document that is either a CloudWatch
    /// envelope (with a `detail` object) or a bare `detail`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("event body is not valid JSON")?;
        let detail = match value.get("detail") {
            Some(detail) if detail.is_object() => detail,
            _ => &value,
        };
        Ok(Self::from_detail(detail))
    }
}
