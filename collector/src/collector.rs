use std::{collections::HashSet, path::Path, time::Duration};

use shared::{region_file_path, save_users, CollectionSettings, EnrichedUser, Region};
use tracing::{debug, error, info, instrument};

use crate::{
    api::{enrich_user, GithubSource, RepoSummary, SearchUser, UserDetails},
    quota::{QuotaPolicy, QuotaTracker},
};

/// Fixed pauses between requests, kept under GitHub's burst limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub search_page: Duration,
    pub repo_page: Duration,
    pub user: Duration,
}

impl Pacing {
    pub fn from_settings(settings: &CollectionSettings) -> Self {
        Self {
            search_page: settings.search_page_delay(),
            repo_page: settings.repo_page_delay(),
            user: settings.user_delay(),
        }
    }
}

pub fn search_query(term: &str, min_followers: u64) -> String {
    let term = term.trim();
    if term.contains(char::is_whitespace) {
        format!("location:\"{term}\" followers:>={min_followers}")
    } else {
        format!("location:{term} followers:>={min_followers}")
    }
}

pub struct Collector<S> {
    source: S,
    quota: QuotaTracker,
    pacing: Pacing,
    min_followers: u64,
    per_page: u8,
    collect_activity: bool,
}

impl<S: GithubSource> Collector<S> {
    pub fn new(source: S, settings: &CollectionSettings) -> Self {
        Self {
            source,
            quota: QuotaTracker::new(QuotaPolicy::from_settings(settings)),
            pacing: Pacing::from_settings(settings),
            min_followers: settings.min_followers,
            per_page: settings.per_page,
            collect_activity: settings.collect_activity,
        }
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub async fn check_rate_limit(&mut self) -> anyhow::Result<u32> {
        self.quota.refresh(&self.source).await
    }

    /// Pages through the user search for `term`, most followed first.
    ///
    /// Paging ends on an empty or short page. A failed page is logged and the
    /// users gathered so far are returned.
    #[instrument(skip(self))]
    pub async fn search_users_by_location(
        &mut self,
        term: &str,
        min_followers: u64,
    ) -> Vec<SearchUser> {
        let query = search_query(term, min_followers);
        let mut users = Vec::new();
        let mut page = 1;

        loop {
            if let Err(e) = self.quota.acquire(&self.source).await {
                error!("Error fetching users for {term}: {e}");
                break;
            }

            let items = match self.source.search_users(&query, page, self.per_page).await {
                Ok(items) => items,
                Err(e) => {
                    error!("Error fetching users for {term}: {e}");
                    break;
                }
            };
            if items.is_empty() {
                break;
            }

            let short_page = items.len() < self.per_page as usize;
            users.extend(items);
            info!("Collected {} users for location: {}", users.len(), term);

            if short_page {
                break;
            }
            page += 1;
            tokio::time::sleep(self.pacing.search_page).await;
        }

        users
    }

    #[instrument(skip(self))]
    pub async fn get_user_details(&mut self, login: &str) -> Option<UserDetails> {
        if let Err(e) = self.quota.acquire(&self.source).await {
            error!("Error fetching details for {login}: {e}");
            return None;
        }

        match self.source.user_details(login).await {
            Ok(details) => Some(details),
            Err(e) => {
                error!("Error fetching details for {login}: {e}");
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_user_repos(&mut self, login: &str) -> Vec<RepoSummary> {
        let mut repos = Vec::new();
        let mut page = 1;

        loop {
            if let Err(e) = self.quota.acquire(&self.source).await {
                error!("Error fetching repos for {login}: {e}");
                break;
            }

            let items = match self.source.user_repos(login, page, self.per_page).await {
                Ok(items) => items,
                Err(e) => {
                    error!("Error fetching repos for {login}: {e}");
                    break;
                }
            };
            if items.is_empty() {
                break;
            }

            let short_page = items.len() < self.per_page as usize;
            repos.extend(items);

            if short_page {
                break;
            }
            page += 1;
            tokio::time::sleep(self.pacing.repo_page).await;
        }

        repos
    }

    /// Contribution events among the latest page of the public event stream.
    #[instrument(skip(self))]
    pub async fn get_user_contributions(&mut self, login: &str) -> u32 {
        if let Err(e) = self.quota.acquire(&self.source).await {
            error!("Error fetching contributions for {login}: {e}");
            return 0;
        }

        match self.source.public_events(login, self.per_page).await {
            Ok(events) => events.iter().filter(|e| e.is_contribution()).count() as u32,
            Err(e) => {
                error!("Error fetching contributions for {login}: {e}");
                0
            }
        }
    }

    #[instrument(skip(self, region), fields(region = %region.code))]
    pub async fn collect_region_data(&mut self, region: &Region) -> Vec<EnrichedUser> {
        info!("Collecting data for {} ({})", region.name, region.code);

        let mut all_users = Vec::new();
        let mut seen = HashSet::new();

        for term in &region.search_terms {
            let found = self
                .search_users_by_location(term, self.min_followers)
                .await;

            for user in found {
                if !seen.insert(user.login.clone()) {
                    debug!("Skipping {}: already collected", user.login);
                    continue;
                }

                let Some(details) = self.get_user_details(&user.login).await else {
                    continue;
                };
                let repos = self.get_user_repos(&user.login).await;

                let mut enriched =
                    enrich_user(&user.login, details, &repos, region, chrono::Utc::now());
                if self.collect_activity {
                    enriched.recent_contributions =
                        Some(self.get_user_contributions(&user.login).await);
                }
                all_users.push(enriched);
                info!("Collected data for {}", user.login);

                tokio::time::sleep(self.pacing.user).await;
            }
        }

        info!(
            "Total users collected for {}: {}",
            region.name,
            all_users.len()
        );
        all_users
    }

    /// Collects one region and writes it to its file under `data_dir`.
    pub async fn collect_and_save(
        &mut self,
        region: &Region,
        data_dir: &Path,
    ) -> anyhow::Result<Vec<EnrichedUser>> {
        let users = self.collect_region_data(region).await;
        save_users(&users, &region_file_path(data_dir, &region.code))?;
        Ok(users)
    }
}
