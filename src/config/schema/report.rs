use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportBackend {
    #[default]
    S3,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub backend: ReportBackend,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_report_region")]
    pub region: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Target directory for the `local` backend.
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
    /// Logo shown in the report header; any URL, including `data:` URIs.
    #[serde(default = "default_logo_url")]
    pub logo_url: String,
    /// Lifetime of presigned report links.
    #[serde(default = "default_expires_days")]
    pub expires_days: u32,
}

fn default_bucket() -> String {
    "s3-bucket.example.com".into()
}

fn default_report_region() -> String {
    "us-west-2".into()
}

fn default_prefix() -> String {
    "report/".into()
}

pub(crate) fn default_logo_url() -> String {
    crate::report::DEFAULT_LOGO.into()
}

fn default_expires_days() -> u32 {
    7
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            backend: ReportBackend::default(),
            bucket: default_bucket(),
            region: default_report_region(),
            prefix: default_prefix(),
            local_dir: None,
            logo_url: default_logo_url(),
            expires_days: default_expires_days(),
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == ReportBackend::Local && self.local_dir.is_none() {
            return Err(ConfigError::Validation(
                "report.backend='local' requires report.local_dir".into(),
            ));
        }
        if self.expires_days == 0 || self.expires_days > 7 {
            return Err(ConfigError::Validation(format!(
                "report.expires_days must be between 1 and 7 (presign limit), got {}",
                self.expires_days
            )));
        }
        Ok(())
    }
}
