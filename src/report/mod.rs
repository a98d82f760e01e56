//! HTML compliance reports and where they are published.

mod local;
mod render;
mod s3;

pub use local::LocalReportSink;
pub use render::{ReportInput, ReportRenderer};
pub use s3::S3ReportSink;

use crate::config::{AwsConfig, ReportBackend, ReportConfig};
use crate::error::ReportError;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Logo shown when `report.logo_url` is not configured.
pub const DEFAULT_LOGO: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAACAAAAAgCAQAAADZc7J/AAACgklEQVRIx42VT0hUURTGv7SBnMkIcSKpnCEoW8wuhEgIXQTlGLjTlbQxRgj6J4xLhUgHFy3ClUSJr5ULCQqajc5GYtzUasaNGL2wxaBggyYOzq/F/HvP9940567eeef77jnn3vsd6YSFhBTsiY4lppPzGcNcMF9m+pOBhKIKqr5dULNQa3g0vpj+ns9xyDEABbZZ4GZeacUV9oQ/V0QKDMeWstsUcdomDxDKKqaACxwNKBCaMjYKeJpJD0IFGeo8AX+mAXXcmEvtUt++0IoQSqnLVntEgdBcKu8COeLI8vWX/hIBSlmyaJYCU4bb7qsMMsiqxTNbIUBGtRdoeMyt9hzdCNFNrupb5nSFoKBY+dxbw0tZt4q3uIwQV9iq+j7jq+WQVVgSGo1vu7bsiHFaaGHc0of3nKoRoLgkBRfTRY+u77PCCvsWz2MrHKUVVE/0W54G7QfX7QR5RTWWyDUILzJhhyOU0HTysEGCd5xzEiQ1nzluALzDNOedcJSR8csbtofJJl95zW2a3ODI9CA4Zo0n3OIql9wStxK4lbDLBG31YNYSnE3c42Fj4FITncf4yn7b6q8Zx0XaINQ4PK+o4yq/sQT46aMPvzdBWsETj6nISPW3j1kOOGDW+gLtK+54zkc1zSGMCcBPwu7wbFmj0VCsIigFBqsB7awDsE67G7wiKCVJmzR2yjm8sAT1sswyve771yQtqIj8nRVR/cQZS5jPq/6UTdqfakAdXXOpHeAP9/5/fHZZrwwWf+eksVGAtbIWeiy3wVLKIiIFhmJL2d985JoX3Gu0lXrRJHQ2/Cj+If02f582mu23rv5wtY/3u9GRxJ3kxYzPlKmMkprxGu//AKfspPPYrnsnAAAAAElFTkSuQmCC";

/// Publishes a rendered report and returns a link to it.
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    fn publish<'a>(
        &'a self,
        html: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ReportError>> + Send + 'a>>;
}

/// Build the sink selected by `report.backend`.
pub fn sink_from_config(report: &ReportConfig, aws: &AwsConfig) -> Result<Arc<dyn ReportSink>> {
    let sink: Arc<dyn ReportSink> = match report.backend {
        ReportBackend::S3 => Arc::new(S3ReportSink::new(report, aws)),
        ReportBackend::Local => {
            let dir = report
                .local_dir
                .as_deref()
                .ok_or_else(|| anyhow!("report.backend='local' requires report.local_dir"))?;
            Arc::new(LocalReportSink::new(dir))
        }
    };
    Ok(sink)
}

/// Object name `<prefix><4 random A-Z><UTC %Y%m%d%H%M%S>.html`, unguessable
/// enough for a presigned link and sortable by time.
pub fn report_key(prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let rid: String = (0..4)
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect();
    format!("{prefix}{rid}{}.html", now.format("%Y%m%d%H%M%S"))
}
