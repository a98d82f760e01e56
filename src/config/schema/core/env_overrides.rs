use super::Config;

/// Read `IMAGECHECK_<name>`, falling back to the bare `<name>` used by
/// existing deployments. Empty values count as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("IMAGECHECK_{name}"))
        .or_else(|_| std::env::var(name))
        .ok()
        .filter(|value| !value.is_empty())
}

/// Deployment flags are only enabled by the literal string `true`.
fn env_flag(name: &str) -> Option<bool> {
    env_var(name).map(|value| value == "true")
}

fn env_webhooks(name: &str) -> Option<Vec<String>> {
    let raw = env_var(name)?;
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(urls) => Some(urls),
        Err(e) => {
            tracing::error!("Error parsing {name} as a JSON list of webhook URLs: {e}");
            None
        }
    }
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(dry_run) = env_flag("DRY_RUN") {
            self.policy.dry_run = dry_run;
        }

        if let Some(skip_untagged) = env_flag("SKIP_UNTAGGED") {
            self.policy.skip_untagged = skip_untagged;
        }

        if let Some(level) = env_var("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }

        if let Some(version) = env_var("APP_CONFIG_VERSION") {
            self.version_tag = version;
        }

        if let Some(url) = env_var("SQS_QUEUE_URL") {
            self.queue.url = Some(url);
        }

        if let Some(region) = env_var("ECR_REGION") {
            self.queue.region = region;
        }

        if let Some(format) = env_var("ECR_REGISTRY_URL_FORMAT") {
            self.registry.address_format = format;
        }

        if let Some(key) = env_var("ECR_ACCESS_KEY") {
            self.aws.access_key_id = Some(key);
        }

        if let Some(secret) = env_var("ECR_SECRET_KEY") {
            self.aws.secret_access_key = Some(secret);
        }

        if let Some(token) = env_var("ECR_SESSION_TOKEN") {
            self.aws.session_token = Some(token);
        }

        if let Some(bucket) = env_var("REPORT_BUCKET") {
            self.report.bucket = bucket;
        }

        if let Some(logo) = env_var("LOGO_URL") {
            self.report.logo_url = logo;
        }

        if let Some(proxy) = env_var("MS_TEAMS_PROXY") {
            self.notify.proxy = Some(proxy);
        }

        if let Some(urls) = env_webhooks("TEAMS_DELETE_URLS") {
            self.notify.delete_webhooks = urls;
        }

        if let Some(urls) = env_webhooks("TEAMS_WARNING_URLS") {
            self.notify.warning_webhooks = urls;
        }

        if let Some(urls) = env_webhooks("TEAMS_OK_URLS") {
            self.notify.ok_webhooks = urls;
        }
    }
}
