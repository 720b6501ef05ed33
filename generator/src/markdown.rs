use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use shared::{Category, RankingSet, Region, ScoredUser, Settings};
use tracing::{error, info};

const NAME_WIDTH: usize = 20;
const LOCATION_WIDTH: usize = 15;
const NATIONAL_PREVIEW: usize = 10;

/// Shortens `text` to at most `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

pub fn user_table(users: &[ScoredUser], limit: usize) -> String {
    if users.is_empty() {
        return "No users found matching criteria.\n".to_string();
    }

    let mut table = String::from(
        "| Rank | User | Name | Location | Followers | Repos | Stars | Score |\n\
         |------|------|------|----------|-----------|-------|-------|-------|\n",
    );

    for scored in users.iter().take(limit) {
        let user = &scored.user;
        let name = truncate(user.display_name(), NAME_WIDTH);
        let location = truncate(user.location.as_deref().unwrap_or("-"), LOCATION_WIDTH);
        table.push_str(&format!(
            "| {} | [@{}]({}) | {} | {} | {} | {} | {} | {} |\n",
            scored.rank,
            user.username,
            user.profile_url(),
            cell(&name),
            cell(&location),
            user.followers,
            user.public_repos,
            user.total_stars,
            scored.score,
        ));
    }

    table
}

/// Renders ranking documents under a single output directory.
pub struct MarkdownGenerator<'a> {
    settings: &'a Settings,
    output_dir: PathBuf,
    generated_at: DateTime<Utc>,
}

impl<'a> MarkdownGenerator<'a> {
    pub fn new(settings: &'a Settings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
            generated_at: Utc::now(),
        }
    }

    fn header(&self, title: &str, description: &str) -> String {
        format!(
            "# {title}\n\n{description}\n\n**Last Updated:** {}\n\n---\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        )
    }

    fn navigation(&self) -> String {
        "## Navigation\n\n\
         - [National Rankings](../national/README.md)\n\
         - [By Region](../by-region/README.md)\n\
         - [By Category](../by-category/README.md)\n\
         - [Home](../README.md)\n\n\
         ---\n\n"
            .to_string()
    }

    fn write(&self, relative: impl AsRef<Path>, content: &str) -> anyhow::Result<()> {
        let path = self.output_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn limit(&self) -> usize {
        self.settings.presentation.national_limit
    }

    pub fn region_summary(&self, rankings: &RankingSet) -> String {
        let mut summary = String::from(
            "## Summary by Region\n\n\
             | Code | Region | Users | Top User | Followers |\n\
             |------|--------|-------|----------|-----------|\n",
        );

        let Some(category) = self.settings.categories.first() else {
            return summary;
        };

        for region in &self.settings.regions {
            let users = rankings.region(&category.id, &region.code);
            match users.first() {
                Some(top) => summary.push_str(&format!(
                    "| {} | [{}](region_{}.md) | {} | [@{}]({}) | {} |\n",
                    region.code,
                    region.name,
                    region.code,
                    users.len(),
                    top.user.username,
                    top.user.profile_url(),
                    top.user.followers,
                )),
                None => summary.push_str(&format!(
                    "| {} | [{}](region_{}.md) | 0 | - | - |\n",
                    region.code, region.name, region.code
                )),
            }
        }

        summary
    }

    pub fn generate_category_ranking(
        &self,
        rankings: &RankingSet,
        category_id: &str,
    ) -> anyhow::Result<()> {
        let Some(category) = self.settings.category(category_id) else {
            error!("Category {category_id} not found");
            return Ok(());
        };

        let mut content = self.header(
            &format!("{} - {}", self.settings.presentation.title, category.name),
            &category.description,
        );
        content.push_str(&self.navigation());
        content.push_str(&format!(
            "\n## Top {} Users - {}\n\n",
            self.limit(),
            category.name
        ));
        content.push_str(&user_table(rankings.national(&category.id), self.limit()));

        self.write(format!("by-category/{}.md", category.id), &content)?;
        info!("Generated ranking for category: {}", category.id);
        Ok(())
    }

    pub fn generate_region_ranking(
        &self,
        rankings: &RankingSet,
        region_code: &str,
    ) -> anyhow::Result<()> {
        let Some(region) = self.settings.region(region_code) else {
            error!("Region {region_code} not found");
            return Ok(());
        };

        let mut content = self.header(
            &format!("GitHub Rankings - {}", region.title()),
            &format!("Top GitHub users from {}", region.name),
        );
        content.push_str(&self.navigation());

        for category in &self.settings.categories {
            content.push_str(&format!("\n## {}\n\n", category.name));
            content.push_str(&user_table(
                rankings.region(&category.id, &region.code),
                self.limit(),
            ));
        }

        self.write(format!("by-region/region_{}.md", region.code), &content)?;
        info!("Generated ranking for region: {}", region.name);
        Ok(())
    }

    fn main_index(&self, rankings: &RankingSet) -> String {
        let presentation = &self.settings.presentation;
        let mut content = self.header(
            &presentation.title,
            &format!(
                "Comprehensive rankings of GitHub users across {} regions of {}",
                self.settings.regions.len(),
                presentation.country
            ),
        );
        content.push_str(&format!(
            "## Quick Links\n\n\
             - [National Rankings](national/README.md) - Top users across {}\n\
             - [By Region](by-region/README.md) - Rankings for each region\n\
             - [By Category](by-category/README.md) - Rankings by contribution type\n\n\
             ## Statistics\n\n",
            presentation.country
        ));
        content.push_str(&format!("- Total Users Ranked: {}\n", rankings.total_users));
        content.push_str(&format!(
            "- Regions Covered: {}\n",
            self.settings.regions.len()
        ));
        content.push_str(&format!(
            "- Categories: {}\n",
            self.settings.categories.len()
        ));
        content
    }

    fn national_index(&self, rankings: &RankingSet) -> String {
        let presentation = &self.settings.presentation;
        let mut content = self.header(
            &format!("{} - National", presentation.title),
            &format!("Top users across {} in every category", presentation.country),
        );
        content.push_str(&self.navigation());

        for category in &self.settings.categories {
            content.push_str(&format!("\n## {}\n\n", category.name));
            content.push_str(&user_table(
                rankings.national(&category.id),
                NATIONAL_PREVIEW,
            ));
            content.push_str(&format!(
                "\n[Full ranking](../by-category/{}.md)\n",
                category.id
            ));
        }
        content
    }

    fn category_index(&self) -> String {
        let mut content = self.header(
            &format!("{} - By Category", self.settings.presentation.title),
            "Rankings by contribution type",
        );
        content.push_str(&self.navigation());
        content.push_str("## Categories\n\n");
        for Category {
            id,
            name,
            description,
        } in &self.settings.categories
        {
            content.push_str(&format!("- [{name}]({id}.md) - {description}\n"));
        }
        content
    }

    fn region_index(&self, rankings: &RankingSet) -> String {
        let mut content = self.header(
            &format!("{} - By Region", self.settings.presentation.title),
            "Rankings for each region",
        );
        content.push_str(&self.navigation());
        content.push_str(&self.region_summary(rankings));
        content
    }

    pub fn generate_index_files(&self, rankings: &RankingSet) -> anyhow::Result<()> {
        self.write("README.md", &self.main_index(rankings))?;
        self.write("national/README.md", &self.national_index(rankings))?;
        self.write("by-category/README.md", &self.category_index())?;
        self.write("by-region/README.md", &self.region_index(rankings))?;
        info!("Generated index files");
        Ok(())
    }

    pub fn generate_all_rankings(&self, rankings: &RankingSet) -> anyhow::Result<()> {
        info!("Generating all ranking files...");
        for category in &self.settings.categories {
            self.generate_category_ranking(rankings, &category.id)?;
        }
        for Region { code, .. } in &self.settings.regions {
            self.generate_region_ranking(rankings, code)?;
        }
        self.generate_index_files(rankings)?;
        info!("All ranking files generated successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use shared::{EnrichedUser, RankingProcessor};

    use super::*;

    fn settings() -> Settings {
        Settings::from_toml(include_str!("../../Rankings.toml")).unwrap()
    }

    fn scored(username: &str, rank: usize, score: u64) -> ScoredUser {
        ScoredUser {
            user: EnrichedUser {
                followers: 12,
                public_repos: 3,
                total_stars: 40,
                ..EnrichedUser::new(username)
            },
            score,
            rank,
        }
    }

    fn rankings(settings: &Settings) -> RankingSet {
        let users = vec![
            EnrichedUser {
                name: Some("Amine Benali".to_string()),
                location: Some("Algiers, Algeria".to_string()),
                followers: 120,
                public_repos: 30,
                total_stars: 400,
                region_code: Some("16".to_string()),
                ..EnrichedUser::new("amine")
            },
            EnrichedUser {
                followers: 60,
                public_repos: 12,
                total_stars: 90,
                region_code: Some("31".to_string()),
                ..EnrichedUser::new("lina")
            },
        ];
        RankingProcessor::from_settings(settings).process_rankings(users)
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Oran", 15), "Oran");
        assert_eq!(truncate("exactly twenty chars", 20), "exactly twenty chars");
        assert_eq!(
            truncate("Abdelkader Boumediene-Messaoud", 20),
            "Abdelkader Boumed..."
        );
        assert_eq!(truncate("Constantine, Algeria", 15), "Constantine,...");
        assert_eq!(truncate("تيزي وزو، الجزائر الكبرى", 15).chars().count(), 15);
    }

    #[test]
    fn empty_table_has_placeholder() {
        assert_eq!(user_table(&[], 100), "No users found matching criteria.\n");
    }

    #[test]
    fn table_rows_use_fallbacks_and_limit() {
        let users: Vec<_> = (1..=5).map(|i| scored(&format!("dev{i}"), i, 10)).collect();

        let table = user_table(&users, 3);

        assert_eq!(table.lines().count(), 2 + 3);
        assert!(table.contains("| 1 | [@dev1](https://github.com/dev1) | dev1 | - | 12 | 3 | 40 | 10 |"));
        assert!(!table.contains("dev4"));
    }

    #[test]
    fn table_escapes_pipes() {
        let mut user = scored("pipe", 1, 1);
        user.user.name = Some("a|b".to_string());

        let table = user_table(&[user], 100);

        assert!(table.contains("| a\\|b |"));
    }

    #[test]
    fn generates_every_document() {
        let settings = settings();
        let dir = tempfile::tempdir().unwrap();
        let generator = MarkdownGenerator::new(&settings, dir.path());

        generator.generate_all_rankings(&rankings(&settings)).unwrap();

        let followers = fs::read_to_string(dir.path().join("by-category/followers.md")).unwrap();
        assert!(followers.starts_with("# Algeria GitHub Rankings - Followers"));
        assert!(followers.contains("## Navigation"));
        assert!(followers.contains("| 1 | [@amine](https://github.com/amine) | Amine Benali | Algiers, Alg... | 120 |"));
        assert!(followers.contains("| 2 | [@lina]"));

        let algiers = fs::read_to_string(dir.path().join("by-region/region_16.md")).unwrap();
        assert!(algiers.contains("GitHub Rankings - Algiers (الجزائر)"));
        assert!(algiers.contains("[@amine]"));
        assert!(!algiers.contains("[@lina]"));

        let blida = fs::read_to_string(dir.path().join("by-region/region_09.md")).unwrap();
        assert!(blida.contains("No users found matching criteria."));

        let index = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(index.contains("- Total Users Ranked: 2"));
        assert!(index.contains(&format!(
            "- Regions Covered: {}",
            settings.regions.len()
        )));
        assert!(index.contains("- Categories: 5"));

        let summary = fs::read_to_string(dir.path().join("by-region/README.md")).unwrap();
        assert!(summary.contains("| 31 | [Oran](region_31.md) | 1 | [@lina](https://github.com/lina) | 60 |"));
        assert!(summary.contains("| 09 | [Blida](region_09.md) | 0 | - | - |"));

        assert!(dir.path().join("national/README.md").exists());
        let categories = fs::read_to_string(dir.path().join("by-category/README.md")).unwrap();
        assert!(categories.contains("- [Stars](stars.md)"));
    }

    #[test]
    fn unknown_category_is_skipped() {
        let settings = settings();
        let dir = tempfile::tempdir().unwrap();
        let generator = MarkdownGenerator::new(&settings, dir.path());

        generator
            .generate_category_ranking(&rankings(&settings), "commits")
            .unwrap();

        assert!(!dir.path().join("by-category/commits.md").exists());
    }
}
