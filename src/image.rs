use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized coordinates of a pushed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub registry_id: String,
    pub region: String,
    pub repository: String,
    pub tag: String,
    /// Registry host, e.g. `123456789012.dkr.ecr.us-east-1.amazonaws.com`.
    pub registry_address: String,
}

impl ImageReference {
    /// Full pull reference `address/repository:tag`.
    pub fn pull_ref(&self) -> String {
        format!("{}/{}:{}", self.registry_address, self.repository, self.tag)
    }

    /// Tags that count as "untagged" for the skip policy.
    pub fn is_untagged(&self) -> bool {
        self.tag.is_empty() || self.tag == "latest"
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Who pushed the image and when, as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushContext {
    pub pushed_by: String,
    pub pushed_at: String,
}

/// One entry of `docker history`, oldest layer last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub command: String,
    pub created_at: String,
    pub size_bytes: u64,
}

/// Read-only facts about a pulled image, supplied by the registry adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub image_id: String,
    /// Repository digest (`sha256:...`) when the registry reported one.
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub layer_history: Vec<LayerRecord>,
}

impl ImageMetadata {
    /// Label value with surrounding whitespace removed; blank values read as absent.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}
