//! Read-only inspection commands executed inside an ephemeral container of
//! the image under evaluation.

mod docker;

pub use docker::DockerProbeRunner;

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// A single command to run inside the image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub entrypoint: String,
    pub args: Vec<String>,
    /// Network is disabled unless a probe explicitly needs it.
    pub network: bool,
}

impl ProbeRequest {
    pub fn new<I, S>(entrypoint: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entrypoint: entrypoint.into(),
            args: args.into_iter().map(Into::into).collect(),
            network: false,
        }
    }

    /// Shell one-liner; the image must ship `/bin/sh`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh", ["-c".to_string(), script.into()])
    }

    pub fn with_network(mut self) -> Self {
        self.network = true;
        self
    }

    pub fn display(&self) -> String {
        std::iter::once(self.entrypoint.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything the probe printed, stdout then stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    pub output: String,
}

impl ProbeOutput {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

pub type ProbeResult = Result<ProbeOutput, ProbeError>;

/// Executes probes against a local image.
///
/// Implementations must isolate the container (network per request, IPC,
/// bounded CPU), remove it afterwards, and bound its runtime. A failed,
/// refused or timed-out probe is reported as `Err`, never as a panic.
pub trait ProbeRunner: Send + Sync {
    fn name(&self) -> &str;

    fn run<'a>(
        &'a self,
        image_id: &'a str,
        request: &'a ProbeRequest,
    ) -> Pin<Box<dyn Future<Output = ProbeResult> + Send + 'a>>;
}
