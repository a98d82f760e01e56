use super::{ReportSink, report_key};
use crate::config::{AwsConfig, ReportConfig};
use crate::error::ReportError;
use crate::process::{self, CommandSpec};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const AWS_TIMEOUT: Duration = Duration::from_secs(120);

/// Uploads reports to S3 and hands out presigned links.
pub struct S3ReportSink {
    aws: AwsConfig,
    bucket: String,
    region: String,
    prefix: String,
    expires_secs: u64,
}

impl S3ReportSink {
    pub fn new(report: &ReportConfig, aws: &AwsConfig) -> Self {
        Self {
            aws: aws.clone(),
            bucket: report.bucket.clone(),
            region: report.region.clone(),
            prefix: report.prefix.clone(),
            expires_secs: u64::from(report.expires_days) * 86_400,
        }
    }

    fn object_uri(&self, key: &str) -> String {
        format!("s3://{}/{key}", self.bucket)
    }

    /// `aws s3 cp` reading the report from stdin.
    pub(crate) fn upload_spec(&self, key: &str, html: &str) -> CommandSpec {
        CommandSpec::new(&self.aws.cli)
            .args(["s3", "cp", "-"])
            .arg(self.object_uri(key))
            .args([
                "--acl",
                "bucket-owner-full-control",
                "--cache-control",
                "private, no-cache, no-store",
                "--content-type",
                "text/html",
                "--sse",
                "AES256",
                "--storage-class",
                "STANDARD",
                "--region",
            ])
            .arg(&self.region)
            .envs(self.aws.credential_env())
            .stdin(html)
    }

    pub(crate) fn presign_spec(&self, key: &str) -> CommandSpec {
        CommandSpec::new(&self.aws.cli)
            .args(["s3", "presign"])
            .arg(self.object_uri(key))
            .arg("--expires-in")
            .arg(self.expires_secs.to_string())
            .arg("--region")
            .arg(&self.region)
            .envs(self.aws.credential_env())
    }
}

impl ReportSink for S3ReportSink {
    fn name(&self) -> &str {
        "s3"
    }

    fn publish<'a>(
        &'a self,
        html: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ReportError>> + Send + 'a>> {
        Box::pin(async move {
            let key = report_key(&self.prefix, Utc::now());

            let upload = process::run(&self.upload_spec(&key, html), AWS_TIMEOUT)
                .await
                .map_err(|e| ReportError::Upload(e.to_string()))?;
            if !upload.success() {
                return Err(ReportError::Upload(upload.combined().trim().to_string()));
            }

            let presign = process::run(&self.presign_spec(&key), AWS_TIMEOUT)
                .await
                .map_err(|e| ReportError::Presign(e.to_string()))?;
            let url = presign.stdout.trim();
            if !presign.success() || url.is_empty() {
                return Err(ReportError::Presign(presign.combined().trim().to_string()));
            }

            tracing::info!(bucket = %self.bucket, key = %key, "report published");
            Ok(url.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> S3ReportSink {
        let report = ReportConfig {
            bucket: "reports.example.com".into(),
            ..ReportConfig::default()
        };
        let aws = AwsConfig {
            access_key_id: Some("AKIA".into()),
            ..AwsConfig::default()
        };
        S3ReportSink::new(&report, &aws)
    }

    #[test]
    fn upload_sets_object_headers_and_reads_stdin() {
        let spec = sink().upload_spec("report/ABCD20180601100509.html", "<html></html>");
        let line = spec.display();
        assert!(line.starts_with(
            "aws s3 cp - s3://reports.example.com/report/ABCD20180601100509.html"
        ));
        assert!(line.contains("--acl bucket-owner-full-control"));
        assert!(line.contains("--cache-control private, no-cache, no-store"));
        assert!(line.contains("--content-type text/html"));
        assert!(line.contains("--sse AES256"));
        assert!(line.contains("--storage-class STANDARD"));
        assert_eq!(spec.stdin.as_deref(), Some("<html></html>".as_bytes()));
        assert_eq!(spec.env, vec![("AWS_ACCESS_KEY_ID", "AKIA".to_string())]);
    }

    #[test]
    fn presign_lasts_seven_days() {
        let line = sink().presign_spec("report/X.html").display();
        assert_eq!(
            line,
            "aws s3 presign s3://reports.example.com/report/X.html --expires-in 604800 --region us-west-2"
        );
    }

    #[tokio::test]
    async fn missing_cli_is_upload_error() {
        let report = ReportConfig::default();
        let aws = AwsConfig {
            cli: "imagecheck-no-such-aws-cli".into(),
            ..AwsConfig::default()
        };
        let err = S3ReportSink::new(&report, &aws)
            .publish("<html></html>")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Upload(_)));
    }
}
