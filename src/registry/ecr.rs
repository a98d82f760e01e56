use super::{Credentials, DockerImages, Registry};
use crate::config::{AwsConfig, ProbeConfig};
use crate::error::RegistryError;
use crate::image::{ImageMetadata, ImageReference};
use crate::process::{self, CommandSpec};
use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const AWS_TIMEOUT: Duration = Duration::from_secs(120);

/// Amazon ECR through the aws and docker CLIs.
pub struct EcrRegistry {
    aws: AwsConfig,
    images: DockerImages,
}

/// Decode `ecr get-authorization-token` output; the token is base64 `user:password`.
pub fn parse_authorization_token(raw: &str) -> Result<Credentials> {
    let response: Value = serde_json::from_str(raw).context("token response is not JSON")?;
    let data = response
        .get("authorizationData")
        .and_then(|d| d.get(0))
        .ok_or_else(|| anyhow!("token response has no authorizationData"))?;
    let token = data
        .get("authorizationToken")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("authorizationData has no authorizationToken"))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token.trim())
        .context("authorization token is not base64")?;
    let decoded = String::from_utf8(decoded).context("authorization token is not UTF-8")?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| anyhow!("authorization token is not user:password"))?;

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
        endpoint: data
            .get("proxyEndpoint")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Check `ecr batch-delete-image` output, returning how many ids were deleted.
pub fn parse_batch_delete(raw: &str) -> Result<usize> {
    let response: Value = serde_json::from_str(raw).context("delete response is not JSON")?;
    if let Some(failure) = response
        .get("failures")
        .and_then(Value::as_array)
        .and_then(|failures| failures.first())
    {
        let field = |key: &str| failure.get(key).and_then(Value::as_str).unwrap_or("unknown");
        bail!("{}: {}", field("failureCode"), field("failureReason"));
    }
    Ok(response
        .get("imageIds")
        .and_then(Value::as_array)
        .map_or(0, Vec::len))
}

impl EcrRegistry {
    pub fn new(aws: &AwsConfig, probe: &ProbeConfig) -> Self {
        Self {
            aws: aws.clone(),
            images: DockerImages::new(&probe.docker),
        }
    }

    fn aws_command(&self, region: &str) -> CommandSpec {
        CommandSpec::new(&self.aws.cli)
            .envs(self.aws.credential_env())
            .args(["--region", region, "--output", "json"])
    }

    pub(crate) fn token_spec(&self, registry_id: &str, region: &str) -> CommandSpec {
        self.aws_command(region)
            .args(["ecr", "get-authorization-token", "--registry-ids", registry_id])
    }

    pub(crate) fn delete_spec(&self, reference: &ImageReference, image_id: &str) -> CommandSpec {
        self.aws_command(&reference.region).args([
            "ecr",
            "batch-delete-image",
            "--registry-id",
            reference.registry_id.as_str(),
            "--repository-name",
            reference.repository.as_str(),
            "--image-ids",
            image_id,
        ])
    }

    async fn batch_delete(
        &self,
        reference: &ImageReference,
        image_id: String,
    ) -> Result<(), RegistryError> {
        let delete_error = |message: String| RegistryError::Delete {
            image: format!("{reference} ({image_id})"),
            message,
        };
        let output = process::run(&self.delete_spec(reference, &image_id), AWS_TIMEOUT)
            .await
            .map_err(|e| delete_error(e.to_string()))?;
        if !output.success() {
            return Err(delete_error(output.combined().trim().to_string()));
        }
        let deleted = parse_batch_delete(&output.stdout).map_err(|e| delete_error(e.to_string()))?;
        tracing::debug!(image = %reference, %image_id, deleted, "ecr batch-delete-image");
        Ok(())
    }
}

impl Registry for EcrRegistry {
    fn name(&self) -> &str {
        "ecr"
    }

    fn authenticate<'a>(
        &'a self,
        registry_id: &'a str,
        region: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Credentials, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            let auth_error = |message: String| RegistryError::Auth {
                registry_id: registry_id.to_string(),
                message,
            };
            let output = process::run(&self.token_spec(registry_id, region), AWS_TIMEOUT)
                .await
                .map_err(|e| auth_error(e.to_string()))?;
            if !output.success() {
                return Err(auth_error(output.combined().trim().to_string()));
            }
            let credentials =
                parse_authorization_token(&output.stdout).map_err(|e| auth_error(format!("{e:#}")))?;

            let (user, pass) = credentials.truncated();
            tracing::debug!(
                registry_id,
                "ECR credentials: \"{user}\" / \"{pass}\" (truncated to 12)"
            );
            Ok(credentials)
        })
    }

    fn pull<'a>(
        &'a self,
        reference: &'a ImageReference,
        credentials: &'a Credentials,
    ) -> Pin<Box<dyn Future<Output = Result<ImageMetadata, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            let mut login = credentials.clone();
            if login.endpoint.is_empty() {
                login.endpoint = format!("https://{}", reference.registry_address);
            }
            self.images.login(&login).await?;

            let image = reference.pull_ref();
            self.images.pull(&image).await?;
            tracing::info!(%image, "image pulled");
            match self.images.inspect(&image, Some(&reference.repository)).await {
                Ok(metadata) => Ok(metadata),
                Err(e) => {
                    // The caller never learns the image id, so clean up by reference.
                    if let Err(cleanup) = self.images.remove(&image).await {
                        tracing::warn!(%image, "removing uninspectable image failed: {cleanup}");
                    }
                    Err(e)
                }
            }
        })
    }

    fn delete_tag<'a>(
        &'a self,
        reference: &'a ImageReference,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.batch_delete(reference, format!("imageTag={}", reference.tag))
                .await
        })
    }

    fn delete_digest<'a>(
        &'a self,
        reference: &'a ImageReference,
        digest: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            self.batch_delete(reference, format!("imageDigest={digest}"))
                .await
        })
    }

    fn remove_local<'a>(
        &'a self,
        image_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>> {
        Box::pin(async move { self.images.remove(image_id).await })
    }
}
