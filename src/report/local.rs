use super::{ReportSink, report_key};
use crate::error::ReportError;
use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Writes reports into a directory and links to them with `file://` URLs.
/// Meant for running the checker on a workstation.
pub struct LocalReportSink {
    dir: PathBuf,
}

impl LocalReportSink {
    pub fn new(dir: &Path) -> Self {
        let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
        Self {
            dir: PathBuf::from(expanded),
        }
    }
}

impl ReportSink for LocalReportSink {
    fn name(&self) -> &str {
        "local"
    }

    fn publish<'a>(
        &'a self,
        html: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ReportError>> + Send + 'a>> {
        Box::pin(async move {
            let upload_error = |e: std::io::Error| ReportError::Upload(e.to_string());
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(upload_error)?;
            let dir = tokio::fs::canonicalize(&self.dir)
                .await
                .map_err(upload_error)?;

            let path = dir.join(report_key("", Utc::now()));
            tokio::fs::write(&path, html).await.map_err(upload_error)?;

            let url = url::Url::from_file_path(&path).map_err(|()| {
                ReportError::Presign(format!("cannot express {} as a URL", path.display()))
            })?;
            tracing::info!(path = %path.display(), "report written");
            Ok(url.to_string())
        })
    }
}
