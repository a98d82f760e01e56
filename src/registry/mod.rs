//! Container registry access: authentication, pulls, metadata and deletion.

mod docker;
mod ecr;

pub use docker::{DockerImages, parse_history, parse_inspect};
pub use ecr::{EcrRegistry, parse_authorization_token, parse_batch_delete};

use crate::error::RegistryError;
use crate::image::{ImageMetadata, ImageReference};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Short-lived registry login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// `https://<registry address>` as returned by the registry.
    pub endpoint: String,
}

impl Credentials {
    /// Both secrets cut to 12 characters, for debug logs.
    pub fn truncated(&self) -> (String, String) {
        (
            self.username.chars().take(12).collect(),
            self.password.chars().take(12).collect(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

pub trait Registry: Send + Sync {
    fn name(&self) -> &str;

    fn authenticate<'a>(
        &'a self,
        registry_id: &'a str,
        region: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Credentials, RegistryError>> + Send + 'a>>;

    /// Pull the image locally and describe it.
    fn pull<'a>(
        &'a self,
        reference: &'a ImageReference,
        credentials: &'a Credentials,
    ) -> Pin<Box<dyn Future<Output = Result<ImageMetadata, RegistryError>> + Send + 'a>>;

    fn delete_tag<'a>(
        &'a self,
        reference: &'a ImageReference,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>>;

    fn delete_digest<'a>(
        &'a self,
        reference: &'a ImageReference,
        digest: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>>;

    /// Drop the local copy pulled for evaluation.
    fn remove_local<'a>(
        &'a self,
        image_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>>;
}
