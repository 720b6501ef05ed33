use std::{collections::HashSet, path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{CategoryId, RegionCode};

/// A region (wilaya) that users are collected and ranked under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub code: RegionCode,
    pub name: String,
    #[serde(default)]
    pub local_name: Option<String>,
    pub search_terms: Vec<String>,
}

impl Region {
    pub fn title(&self) -> String {
        match &self.local_name {
            Some(local) => format!("{} ({})", self.name, local),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// Minimum values a user has to reach to be ranked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub followers: u64,
    pub repositories: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            followers: 5,
            repositories: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    /// Lower bound on followers passed to the search query.
    pub min_followers: u64,
    pub per_page: u8,
    /// Requests are held back while the cached quota is below this value.
    pub quota_threshold: u32,
    pub cooldown_secs: u64,
    /// `None` keeps waiting until the quota recovers.
    pub max_quota_retries: Option<u32>,
    pub search_page_delay_secs: u64,
    pub repo_page_delay_secs: u64,
    pub user_delay_secs: u64,
    pub collect_activity: bool,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            min_followers: 5,
            per_page: 100,
            quota_threshold: 10,
            cooldown_secs: 60,
            max_quota_retries: None,
            search_page_delay_secs: 2,
            repo_page_delay_secs: 1,
            user_delay_secs: 1,
            collect_activity: false,
        }
    }
}

impl CollectionSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn search_page_delay(&self) -> Duration {
        Duration::from_secs(self.search_page_delay_secs)
    }

    pub fn repo_page_delay(&self) -> Duration {
        Duration::from_secs(self.repo_page_delay_secs)
    }

    pub fn user_delay(&self) -> Duration {
        Duration::from_secs(self.user_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationSettings {
    pub title: String,
    pub country: String,
    pub national_limit: usize,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            title: "Algeria GitHub Rankings".to_string(),
            country: "Algeria".to_string(),
            national_limit: 100,
        }
    }
}

/// Static configuration of a rankings run, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub presentation: PresentationSettings,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl Settings {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.regions.is_empty() {
            anyhow::bail!("No regions configured");
        }
        if self.categories.is_empty() {
            anyhow::bail!("No ranking categories configured");
        }
        if self.collection.per_page == 0 {
            anyhow::bail!("collection.per_page must be positive");
        }

        let mut codes = HashSet::new();
        for region in &self.regions {
            if !codes.insert(region.code.as_str()) {
                anyhow::bail!("Duplicate region code: {}", region.code);
            }
            if region.search_terms.is_empty() {
                anyhow::bail!("Region {} has no search terms", region.code);
            }
        }

        let mut ids = HashSet::new();
        for category in &self.categories {
            if !ids.insert(category.id.as_str()) {
                anyhow::bail!("Duplicate category id: {}", category.id);
            }
        }
        Ok(())
    }

    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.code == code)
    }

    /// Looks a region up by its code or its English name, ignoring case.
    pub fn find_region(&self, query: &str) -> Option<&Region> {
        let query = query.trim();
        self.regions.iter().find(|region| {
            region.code == query || region.name.eq_ignore_ascii_case(query)
        })
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }
}
