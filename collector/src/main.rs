use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use rankings_collector::{
    api::{prometheus::PrometheusClient, GithubClient, GithubSource},
    Collector,
};
use serde::Deserialize;
use shared::Settings;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

const USAGE: &str = "Usage: collector <collect-all | collect <region> | check-quota>";

#[derive(Deserialize)]
struct Env {
    github_token: String,
    rankings_config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    metrics_file: Option<PathBuf>,
}

enum Command {
    CollectAll,
    Collect(String),
    CheckQuota,
}

impl Command {
    fn from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        match args.next().as_deref() {
            Some("collect-all") => Ok(Command::CollectAll),
            Some("collect") => args
                .next()
                .map(Command::Collect)
                .ok_or_else(|| anyhow::anyhow!("A region is required. {USAGE}")),
            Some("check-quota") => Ok(Command::CheckQuota),
            _ => anyhow::bail!(USAGE),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let command = Command::from_args(std::env::args().skip(1))?;
    let env = envy::from_env::<Env>()
        .context("GitHub token required. Set the GITHUB_TOKEN environment variable")?;
    let config_path = env
        .rankings_config
        .clone()
        .unwrap_or_else(|| PathBuf::from("Rankings.toml"));
    let settings = Settings::load_from_file(&config_path)?;
    let data_dir = env
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("data/raw"));

    let prometheus: Arc<PrometheusClient> = Default::default();
    let github = GithubClient::new(env.github_token.clone(), prometheus.clone())?;
    let mut collector = Collector::new(github, &settings.collection);

    let result = match command {
        Command::CheckQuota => collector.check_rate_limit().await.map(|remaining| {
            info!("GitHub API rate limit remaining: {remaining}");
        }),
        Command::CollectAll => {
            info!(
                "Starting data collection for {} regions...",
                settings.regions.len()
            );
            collect(&mut collector, &prometheus, settings.regions.iter(), &data_dir).await;
            Ok(())
        }
        Command::Collect(query) => match settings.find_region(&query) {
            Some(region) => {
                collect(&mut collector, &prometheus, [region], &data_dir).await;
                Ok(())
            }
            None => Err(anyhow::anyhow!("Region '{query}' not found")),
        },
    };

    if let Some(metrics_file) = &env.metrics_file {
        if let Err(e) = write_metrics(&prometheus, metrics_file) {
            error!("Failed to write metrics: {e:#}");
        }
    }

    result
}

async fn collect<'a, S: GithubSource>(
    collector: &mut Collector<S>,
    prometheus: &PrometheusClient,
    regions: impl IntoIterator<Item = &'a shared::Region>,
    data_dir: &std::path::Path,
) -> usize {
    let mut total = 0;
    for region in regions {
        match collector.collect_and_save(region, data_dir).await {
            Ok(users) => {
                info!(
                    "Data collection completed for {}: {} users",
                    region.name,
                    users.len()
                );
                prometheus.record_collected(&region.code, users.len());
                total += users.len();
            }
            Err(e) => {
                error!("Error collecting data for {}: {e:#}", region.name);
            }
        }
    }

    if total == 0 {
        warn!("No users were collected, there is no data to rank");
    } else {
        info!("Total users collected: {total}");
    }
    total
}

fn write_metrics(prometheus: &PrometheusClient, path: &std::path::Path) -> anyhow::Result<()> {
    let body = prometheus.encode()?;
    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
