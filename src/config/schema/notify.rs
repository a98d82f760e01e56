use serde::{Deserialize, Serialize};

/// Webhook audiences. Each verdict is routed to exactly one list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub delete_webhooks: Vec<String>,
    #[serde(default)]
    pub warning_webhooks: Vec<String>,
    #[serde(default)]
    pub ok_webhooks: Vec<String>,
    /// HTTPS proxy used for webhook delivery.
    #[serde(default)]
    pub proxy: Option<String>,
}
