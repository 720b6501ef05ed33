use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GithubHandle, RegionCode, UNKNOWN_REGION};

/// A GitHub user as persisted in a region file.
///
/// Numeric fields default to zero and the region to the unknown sentinel so
/// that hand-edited or older files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedUser {
    pub username: GithubHandle,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub total_stars: u64,
    #[serde(default)]
    pub total_forks: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "wilaya_code")]
    pub region_code: Option<RegionCode>,
    #[serde(default, alias = "wilaya_name")]
    pub region_name: Option<String>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_contributions: Option<u32>,
}

impl EnrichedUser {
    pub fn new(username: impl Into<GithubHandle>) -> Self {
        Self {
            username: username.into(),
            name: None,
            avatar_url: None,
            bio: None,
            company: None,
            location: None,
            email: None,
            blog: None,
            twitter_username: None,
            followers: 0,
            following: 0,
            public_repos: 0,
            public_gists: 0,
            total_stars: 0,
            total_forks: 0,
            created_at: None,
            updated_at: None,
            region_code: None,
            region_name: None,
            collected_at: None,
            recent_contributions: None,
        }
    }

    pub fn region_code(&self) -> &str {
        self.region_code.as_deref().unwrap_or(UNKNOWN_REGION)
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn profile_url(&self) -> String {
        format!("https://github.com/{}", self.username)
    }
}
