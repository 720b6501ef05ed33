use std::{collections::BTreeMap, str::FromStr};

use itertools::Itertools;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use tracing::{info, warn};

use crate::{Category, CategoryId, EnrichedUser, RegionCode, Settings, Thresholds};

/// Scoring formulas keyed by category id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ScoreFormula {
    PublicContributions,
    TotalContributions,
    Followers,
    Stars,
    Repositories,
}

impl ScoreFormula {
    pub fn score(&self, user: &EnrichedUser) -> u64 {
        match self {
            ScoreFormula::PublicContributions => user
                .public_repos
                .saturating_mul(10)
                .saturating_add(user.public_gists.saturating_mul(5)),
            ScoreFormula::TotalContributions => user
                .public_repos
                .saturating_mul(12)
                .saturating_add(user.total_stars),
            ScoreFormula::Followers => user.followers,
            ScoreFormula::Stars => user.total_stars,
            ScoreFormula::Repositories => user.public_repos,
        }
    }
}

/// Scores `user` for `category_id`. Unknown categories score 0.
pub fn score(user: &EnrichedUser, category_id: &str) -> u64 {
    ScoreFormula::from_str(category_id)
        .map(|formula| formula.score(user))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredUser {
    pub user: EnrichedUser,
    pub score: u64,
    pub rank: usize,
}

/// Ranks users by descending score. Equal scores keep their input order.
pub fn rank_by_category<'a>(
    users: impl IntoIterator<Item = &'a EnrichedUser>,
    category_id: &str,
) -> Vec<ScoredUser> {
    users
        .into_iter()
        .map(|user| ScoredUser {
            score: score(user, category_id),
            rank: 0,
            user: user.clone(),
        })
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .enumerate()
        .map(|(index, mut scored)| {
            scored.rank = index + 1;
            scored
        })
        .collect()
}

/// Splits users by region code and ranks every region on its own.
pub fn rank_by_region(
    users: &[EnrichedUser],
    category_id: &str,
) -> BTreeMap<RegionCode, Vec<ScoredUser>> {
    users
        .iter()
        .into_group_map_by(|user| user.region_code().to_string())
        .into_iter()
        .map(|(code, region_users)| (code, rank_by_category(region_users, category_id)))
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RankingSet {
    pub total_users: usize,
    pub national: BTreeMap<CategoryId, Vec<ScoredUser>>,
    pub by_region: BTreeMap<CategoryId, BTreeMap<RegionCode, Vec<ScoredUser>>>,
}

impl RankingSet {
    pub fn national(&self, category_id: &str) -> &[ScoredUser] {
        self.national
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn region(&self, category_id: &str, region_code: &str) -> &[ScoredUser] {
        self.by_region
            .get(category_id)
            .and_then(|regions| regions.get(region_code))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

pub struct RankingProcessor {
    categories: Vec<Category>,
    thresholds: Thresholds,
    national_limit: usize,
}

impl RankingProcessor {
    pub fn new(categories: Vec<Category>, thresholds: Thresholds, national_limit: usize) -> Self {
        Self {
            categories,
            thresholds,
            national_limit,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.categories.clone(),
            settings.thresholds,
            settings.presentation.national_limit,
        )
    }

    pub fn passes_thresholds(&self, user: &EnrichedUser) -> bool {
        user.followers >= self.thresholds.followers
            && user.public_repos >= self.thresholds.repositories
    }

    pub fn filter_users(&self, users: Vec<EnrichedUser>) -> Vec<EnrichedUser> {
        let total = users.len();
        let filtered: Vec<_> = users
            .into_iter()
            .filter(|user| self.passes_thresholds(user))
            .collect();
        info!("Filtered {} users from {} total", filtered.len(), total);
        filtered
    }

    pub fn process_rankings(&self, users: Vec<EnrichedUser>) -> RankingSet {
        info!("Processing rankings for {} users", users.len());
        let users = self.filter_users(users);

        let mut rankings = RankingSet {
            total_users: users.len(),
            ..Default::default()
        };

        for category in &self.categories {
            info!("Processing category: {}", category.id);
            if ScoreFormula::from_str(&category.id).is_err() {
                warn!(
                    "Category {} has no scoring formula, every user scores 0",
                    category.id
                );
            }

            let mut national = rank_by_category(&users, &category.id);
            national.truncate(self.national_limit);
            rankings.national.insert(category.id.clone(), national);
            rankings
                .by_region
                .insert(category.id.clone(), rank_by_region(&users, &category.id));
        }

        info!("Rankings processing completed");
        rankings
    }
}
