use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

mod types;
pub use types::*;

pub mod prometheus;

use prometheus::{Endpoint, PrometheusClient};

/// Remote calls the collector depends on.
#[async_trait]
pub trait GithubSource: Send + Sync {
    /// Remaining core quota.
    async fn rate_limit(&self) -> anyhow::Result<u32>;

    async fn search_users(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> anyhow::Result<Vec<SearchUser>>;

    async fn user_details(&self, login: &str) -> anyhow::Result<UserDetails>;

    async fn user_repos(
        &self,
        login: &str,
        page: u32,
        per_page: u8,
    ) -> anyhow::Result<Vec<RepoSummary>>;

    async fn public_events(&self, login: &str, per_page: u8) -> anyhow::Result<Vec<PublicEvent>>;
}

#[derive(Clone)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    prometheus: Arc<PrometheusClient>,
}

impl GithubClient {
    pub fn new(github_token: String, prometheus: Arc<PrometheusClient>) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()?;

        Ok(Self {
            octocrab,
            prometheus,
        })
    }

    async fn get<R, P>(
        &self,
        endpoint: Endpoint,
        route: &str,
        params: Option<&P>,
    ) -> anyhow::Result<R>
    where
        R: serde::de::DeserializeOwned + Send,
        P: serde::Serialize + Sync + ?Sized,
    {
        let result = self.octocrab.get::<R, _, _>(route, params).await;
        self.prometheus.record_request(endpoint, result.is_ok());
        Ok(result?)
    }
}

#[async_trait]
impl GithubSource for GithubClient {
    #[instrument(skip(self))]
    async fn rate_limit(&self) -> anyhow::Result<u32> {
        let result = self.octocrab.ratelimit().get().await;
        self.prometheus
            .record_request(Endpoint::RateLimit, result.is_ok());
        let remaining = result?.resources.core.remaining as u32;
        self.prometheus.set_quota_remaining(remaining);
        Ok(remaining)
    }

    #[instrument(skip(self))]
    async fn search_users(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> anyhow::Result<Vec<SearchUser>> {
        let params = SearchParams {
            q: query,
            per_page,
            page,
            sort: "followers",
            order: "desc",
        };
        let response: SearchResponse = self
            .get(Endpoint::SearchUsers, "/search/users", Some(&params))
            .await?;
        Ok(response.items)
    }

    #[instrument(skip(self))]
    async fn user_details(&self, login: &str) -> anyhow::Result<UserDetails> {
        self.get(Endpoint::UserDetails, &format!("/users/{login}"), None::<&()>)
            .await
    }

    #[instrument(skip(self))]
    async fn user_repos(
        &self,
        login: &str,
        page: u32,
        per_page: u8,
    ) -> anyhow::Result<Vec<RepoSummary>> {
        let params = RepoParams {
            per_page,
            page,
            sort: "updated",
        };
        self.get(
            Endpoint::UserRepos,
            &format!("/users/{login}/repos"),
            Some(&params),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn public_events(&self, login: &str, per_page: u8) -> anyhow::Result<Vec<PublicEvent>> {
        self.get(
            Endpoint::UserEvents,
            &format!("/users/{login}/events/public"),
            Some(&EventParams { per_page }),
        )
        .await
    }
}
