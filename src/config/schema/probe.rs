use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_docker")]
    pub docker: String,
    /// Hard limit per probe container; a probe that outlives it counts as absent.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cpu_shares")]
    pub cpu_shares: u32,
    #[serde(default = "default_memory")]
    pub memory: String,
}

fn default_docker() -> String {
    "docker".into()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_cpu_shares() -> u32 {
    256
}

fn default_memory() -> String {
    "512m".into()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            docker: default_docker(),
            timeout_secs: default_timeout_secs(),
            cpu_shares: default_cpu_shares(),
            memory: default_memory(),
        }
    }
}
