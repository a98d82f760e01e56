use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `imagecheck`.
///
/// Each collaborator boundary defines its own variant. Library callers can
/// match on these to decide recovery strategy; adapters and the daemon loop
/// use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ImageCheckError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Probe runner ────────────────────────────────────────────────────
    #[error("probe: {0}")]
    Probe(#[from] ProbeError),

    // ── Registry / runtime ──────────────────────────────────────────────
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    // ── Queue ───────────────────────────────────────────────────────────
    #[error("queue: {0}")]
    Queue(#[from] QueueError),

    // ── Report sink ─────────────────────────────────────────────────────
    #[error("report: {0}")]
    Report(#[from] ReportError),

    // ── Notifier ────────────────────────────────────────────────────────
    #[error("notify: {0}")]
    Notify(#[from] NotifyError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Probe errors ───────────────────────────────────────────────────────────

/// Why a probe produced no usable output.
///
/// Every variant means "capability absent" to the check battery; the
/// distinction only shows up in diagnostics and logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("entrypoint {entrypoint} is not available in the image")]
    MissingEntrypoint { entrypoint: String },

    #[error("probe exited with status {code}")]
    NonZeroExit { code: i32, output: String },

    #[error("probe timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("failed to start container: {0}")]
    Spawn(String),
}

// ─── Registry errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("authentication failed for registry {registry_id}: {message}")]
    Auth {
        registry_id: String,
        message: String,
    },

    #[error("pull of {image} failed: {message}")]
    Pull { image: String, message: String },

    #[error("inspect of {image} failed: {message}")]
    Inspect { image: String, message: String },

    #[error("delete of {image} failed: {message}")]
    Delete { image: String, message: String },
}

// ─── Queue errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue url is not configured")]
    NotConfigured,

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("acknowledge failed: {0}")]
    Acknowledge(String),
}

// ─── Report errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("presign failed: {0}")]
    Presign(String),
}

// ─── Notify errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook {url} rejected notification: {message}")]
    Webhook { url: String, message: String },

    #[error("invalid proxy {proxy}: {message}")]
    Proxy { proxy: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ImageCheckError>;
