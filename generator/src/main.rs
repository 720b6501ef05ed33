use std::path::PathBuf;

use rankings_generator::{generate_rankings, Target};
use serde::Deserialize;
use shared::{region_summary, Settings};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

const USAGE: &str = "Usage: generator <generate-all | generate <category> | progress>";

#[derive(Deserialize)]
struct Env {
    rankings_config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

enum Command {
    Generate(Target),
    Progress,
}

impl Command {
    fn from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        match args.next().as_deref() {
            Some("generate-all") => Ok(Command::Generate(Target::All)),
            Some("generate") => args
                .next()
                .map(|id| Command::Generate(Target::Category(id)))
                .ok_or_else(|| anyhow::anyhow!("A category is required. {USAGE}")),
            Some("progress") => Ok(Command::Progress),
            _ => anyhow::bail!(USAGE),
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let command = Command::from_args(std::env::args().skip(1))?;
    let env = envy::from_env::<Env>()?;
    let data_dir = env.data_dir.unwrap_or_else(|| PathBuf::from("data/raw"));

    match command {
        Command::Progress => progress(&data_dir),
        Command::Generate(target) => {
            let config_path = env
                .rankings_config
                .unwrap_or_else(|| PathBuf::from("Rankings.toml"));
            let settings = Settings::load_from_file(&config_path)?;
            let output_dir = env.output_dir.unwrap_or_else(|| PathBuf::from("rankings"));
            generate_rankings(&settings, &data_dir, &output_dir, &target)
        }
    }
}

fn progress(data_dir: &std::path::Path) -> anyhow::Result<()> {
    if !data_dir.exists() {
        warn!("No data collected yet");
        return Ok(());
    }

    let summary = region_summary(data_dir)?;
    if summary.is_empty() {
        info!("Collection in progress...");
        return Ok(());
    }

    info!("Data collected for {} regions", summary.len());
    let mut total = 0;
    for (code, count) in summary {
        match count {
            Some(count) => {
                info!("Region {code}: {count} developers");
                total += count;
            }
            None => warn!("Region {code}: unreadable file"),
        }
    }
    info!("Total developers: {total}");
    if total > 0 {
        info!("Ready to generate rankings: generator generate-all");
    }
    Ok(())
}
