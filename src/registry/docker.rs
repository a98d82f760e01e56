use super::Credentials;
use crate::error::RegistryError;
use crate::image::{ImageMetadata, LayerRecord};
use crate::process::{self, CommandOutput, CommandSpec};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const PULL_TIMEOUT: Duration = Duration::from_secs(900);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Local image operations through the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerImages {
    docker: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    id: String,
    #[serde(default)]
    repo_digests: Option<Vec<String>>,
    #[serde(default)]
    config: Option<InspectConfig>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

/// Parse `docker image inspect` output. When `repository` is given, the
/// digest is taken from the matching `RepoDigests` entry.
pub fn parse_inspect(raw: &str, repository: Option<&str>) -> Result<ImageMetadata> {
    let entries: Vec<InspectEntry> =
        serde_json::from_str(raw).context("docker inspect output is not a JSON array")?;
    let Some(entry) = entries.into_iter().next() else {
        bail!("docker inspect returned no images");
    };

    let digests = entry.repo_digests.unwrap_or_default();
    let digest = repository
        .and_then(|repo| {
            digests
                .iter()
                .find(|d| d.split_once('@').is_some_and(|(name, _)| name.ends_with(repo)))
        })
        .or_else(|| digests.first())
        .and_then(|d| d.split_once('@'))
        .map(|(_, digest)| digest.to_string());

    Ok(ImageMetadata {
        image_id: entry.id,
        digest,
        labels: entry.config.and_then(|c| c.labels).unwrap_or_default(),
        layer_history: Vec::new(),
    })
}

fn size_bytes(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Parse `docker history --format '{{json .}}'`, one JSON object per line.
/// Lines that are not JSON are skipped.
pub fn parse_history(raw: &str) -> Vec<LayerRecord> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .map(|entry| {
            let text = |key: &str| {
                entry
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            LayerRecord {
                command: text("CreatedBy"),
                created_at: text("CreatedAt"),
                size_bytes: size_bytes(entry.get("Size")),
            }
        })
        .collect()
}

impl DockerImages {
    pub fn new(docker: &str) -> Self {
        Self {
            docker: docker.to_string(),
        }
    }

    async fn docker(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
        let spec = CommandSpec::new(&self.docker).args(args.iter().copied());
        let output = process::run(&spec, timeout)
            .await
            .with_context(|| format!("running {}", spec.display()))?;
        if !output.success() {
            bail!("{} failed: {}", spec.display(), output.combined().trim());
        }
        Ok(output)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<(), RegistryError> {
        let spec = CommandSpec::new(&self.docker)
            .args(["login", "--username"])
            .arg(&credentials.username)
            .arg("--password-stdin")
            .arg(&credentials.endpoint)
            .stdin(credentials.password.as_str());
        let auth_error = |message: String| RegistryError::Auth {
            registry_id: credentials.endpoint.clone(),
            message,
        };
        let output = process::run(&spec, COMMAND_TIMEOUT)
            .await
            .map_err(|e| auth_error(e.to_string()))?;
        if !output.success() {
            return Err(auth_error(output.combined().trim().to_string()));
        }
        Ok(())
    }

    pub async fn pull(&self, image: &str) -> Result<(), RegistryError> {
        self.docker(&["pull", image], PULL_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::Pull {
                image: image.to_string(),
                message: format!("{e:#}"),
            })
    }

    /// Describe an image that is already present locally.
    pub async fn inspect(
        &self,
        image: &str,
        repository: Option<&str>,
    ) -> Result<ImageMetadata, RegistryError> {
        let inspect_error = |e: anyhow::Error| RegistryError::Inspect {
            image: image.to_string(),
            message: format!("{e:#}"),
        };

        let inspected = self
            .docker(&["image", "inspect", image], COMMAND_TIMEOUT)
            .await
            .map_err(inspect_error)?;
        let mut metadata = parse_inspect(&inspected.stdout, repository).map_err(inspect_error)?;

        let history = self
            .docker(
                &[
                    "history",
                    "--no-trunc",
                    "--human=false",
                    "--format",
                    "{{json .}}",
                    image,
                ],
                COMMAND_TIMEOUT,
            )
            .await
            .map_err(inspect_error)?;
        metadata.layer_history = parse_history(&history.stdout);
        Ok(metadata)
    }

    pub async fn remove(&self, image_id: &str) -> Result<(), RegistryError> {
        self.docker(&["rmi", "-f", image_id], COMMAND_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::Delete {
                image: image_id.to_string(),
                message: format!("{e:#}"),
            })
    }
}
