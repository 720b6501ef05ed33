use std::path::Path;

use shared::{load_all_regions, RankingProcessor, RankingSet, Settings};
use tracing::info;

mod markdown;

pub use markdown::*;

/// Which documents a generation run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Category(String),
}

/// Loads every collected region file and ranks the users in it.
///
/// Fails when there is nothing to rank, before any document is written.
pub fn load_rankings(settings: &Settings, data_dir: &Path) -> anyhow::Result<RankingSet> {
    let users = load_all_regions(data_dir)?;
    info!("Loaded {} users from collected data", users.len());
    if users.is_empty() {
        anyhow::bail!("No data available in {}", data_dir.display());
    }

    Ok(RankingProcessor::from_settings(settings).process_rankings(users))
}

pub fn generate_rankings(
    settings: &Settings,
    data_dir: &Path,
    output_dir: &Path,
    target: &Target,
) -> anyhow::Result<()> {
    if let Target::Category(id) = target {
        if settings.category(id).is_none() {
            anyhow::bail!("Category '{id}' not found");
        }
    }

    let rankings = load_rankings(settings, data_dir)?;
    let generator = MarkdownGenerator::new(settings, output_dir);
    match target {
        Target::All => generator.generate_all_rankings(&rankings)?,
        Target::Category(id) => generator.generate_category_ranking(&rankings, id)?,
    }
    info!("Rankings generated in {}", output_dir.display());
    Ok(())
}
