use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// SQS queue receiving the CloudWatch-forwarded registry events.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_queue_region")]
    pub region: String,
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,
    /// Pause between receive calls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_queue_region() -> String {
    "us-west-2".into()
}

fn default_wait_time_secs() -> u64 {
    20
}

fn default_max_messages() -> u32 {
    10
}

fn default_visibility_timeout_secs() -> u64 {
    4000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: None,
            region: default_queue_region(),
            wait_time_secs: default_wait_time_secs(),
            max_messages: default_max_messages(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry host template; `{registry_id}` and `{registry_region}` are substituted.
    #[serde(default = "default_address_format")]
    pub address_format: String,
    /// Region assumed when an event carries no `awsRegion`.
    #[serde(default = "default_fallback_region")]
    pub fallback_region: String,
}

fn default_address_format() -> String {
    "{registry_id}.dkr.ecr.{registry_region}.amazonaws.com".into()
}

fn default_fallback_region() -> String {
    "us-east-1".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address_format: default_address_format(),
            fallback_region: default_fallback_region(),
        }
    }
}

impl RegistryConfig {
    pub fn registry_address(&self, registry_id: &str, registry_region: &str) -> String {
        self.address_format
            .replace("{registry_id}", registry_id)
            .replace("{registry_region}", registry_region)
    }
}

/// Credentials and binary for the `aws` CLI. Unset keys defer to the
/// CLI's own credential chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_aws_cli")]
    pub cli: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_aws_cli() -> String {
    "aws".into()
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            cli: default_aws_cli(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl AwsConfig {
    /// Environment handed to every `aws` invocation.
    pub fn credential_env(&self) -> Vec<(&'static str, String)> {
        let mut env = Vec::new();
        if let Some(key) = &self.access_key_id {
            env.push(("AWS_ACCESS_KEY_ID", key.clone()));
        }
        if let Some(secret) = &self.secret_access_key {
            env.push(("AWS_SECRET_ACCESS_KEY", secret.clone()));
        }
        if let Some(token) = &self.session_token {
            env.push(("AWS_SESSION_TOKEN", token.clone()));
        }
        env
    }
}
