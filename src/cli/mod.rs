pub mod commands;

use anyhow::{Context, Result};
use chrono::Utc;
use commands::Commands;
use imagecheck::checks::Battery;
use imagecheck::config::Config;
use imagecheck::engine::Engine;
use imagecheck::event::{RegistryEvent, Router};
use imagecheck::image::ImageReference;
use imagecheck::probe::DockerProbeRunner;
use imagecheck::registry::DockerImages;
use std::path::Path;
use std::sync::Arc;

pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Daemon => imagecheck::daemon::run(Arc::new(config)).await,
        Commands::Check { image, dry_run } => check(&config, &image, dry_run).await,
        Commands::Route { event } => route(&config, &event),
    }
}

async fn check(config: &Config, image: &str, dry_run: bool) -> Result<()> {
    let images = DockerImages::new(&config.probe.docker);
    let metadata = images.inspect(image, None).await?;

    let (repository, tag) = image
        .rsplit_once(':')
        .filter(|(_, tag)| !tag.contains('/'))
        .unwrap_or((image, ""));
    let reference = ImageReference {
        registry_id: String::new(),
        region: String::new(),
        repository: repository.to_string(),
        tag: tag.to_string(),
        registry_address: String::new(),
    };

    let battery = Battery::from_config(&config.policy, &config.checks)?;
    let engine = Engine::new(battery, Arc::new(DockerProbeRunner::new(&config.probe)));
    let verdict = engine.evaluate(&reference, &metadata, dry_run).await;

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

fn route(config: &Config, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading event file {}", path.display()))?;
    let event = RegistryEvent::from_json(&raw)?;
    let router = Router::new(&config.registry, &config.policy);
    let route = router.route(&event, Utc::now());
    println!("{}", serde_json::to_string_pretty(&route)?);
    Ok(())
}
