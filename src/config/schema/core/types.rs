use super::super::{
    AwsConfig, ChecksConfig, NotifyConfig, ProbeConfig, QueueConfig, RegistryConfig, ReportConfig,
};
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home or `--config`, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment version reported in the startup banner.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub checks: ChecksConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_version_tag() -> String {
    "unknown".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Compute and report verdicts without deleting anything.
    #[serde(default = "default_true")]
    pub dry_run: bool,
    /// Acknowledge pushes of `latest` or untagged images without evaluating them.
    #[serde(default = "default_true")]
    pub skip_untagged: bool,
    #[serde(default = "default_owner_label")]
    pub owner_label: String,
}

fn default_true() -> bool {
    true
}

fn default_owner_label() -> String {
    "owner_team".into()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            skip_untagged: true,
            owner_label: default_owner_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Consecutive failures before the daemon gives up; 0 restarts forever.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
}

fn default_initial_backoff_secs() -> u64 {
    2
}

fn default_max_backoff_secs() -> u64 {
    60
}

fn default_max_restarts() -> u32 {
    10
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            max_restarts: default_max_restarts(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".imagecheck").join("config.toml"),
            log_level: default_log_level(),
            version_tag: default_version_tag(),
            policy: PolicyConfig::default(),
            queue: QueueConfig::default(),
            registry: RegistryConfig::default(),
            aws: AwsConfig::default(),
            probe: ProbeConfig::default(),
            checks: ChecksConfig::default(),
            report: ReportConfig::default(),
            notify: NotifyConfig::default(),
            reliability: ReliabilityConfig::default(),
        }
    }
}

impl Config {
    /// Reject configurations the daemon could not act on.
    ///
    /// Check thresholds are validated by building the battery once, so a bad
    /// minimum version fails at startup instead of on the first push.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "log_level '{}' is not a tracing level",
                self.log_level
            )));
        }

        if !(1..=10).contains(&self.queue.max_messages) {
            return Err(ConfigError::Validation(format!(
                "queue.max_messages must be between 1 and 10, got {}",
                self.queue.max_messages
            )));
        }

        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "probe.timeout_secs must be greater than zero".into(),
            ));
        }

        if self.policy.owner_label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "policy.owner_label must not be empty".into(),
            ));
        }

        self.report.validate()?;

        crate::checks::Battery::from_config(&self.policy, &self.checks)
            .map_err(|e| ConfigError::Validation(format!("checks: {e:#}")))?;

        Ok(())
    }
}
