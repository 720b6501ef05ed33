use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{EnrichedUser, GithubHandle, Region};

/// Event types of the public event stream that count as a contribution.
pub const CONTRIBUTION_EVENTS: [&str; 5] = [
    "PushEvent",
    "PullRequestEvent",
    "IssuesEvent",
    "IssueCommentEvent",
    "PullRequestReviewEvent",
];

#[derive(Debug, Clone, Serialize)]
pub struct SearchParams<'a> {
    pub q: &'a str,
    pub per_page: u8,
    pub page: u32,
    pub sort: &'static str,
    pub order: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoParams {
    pub per_page: u8,
    pub page: u32,
    pub sort: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventParams {
    pub per_page: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchUser>,
}

/// A single hit of the user search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchUser {
    pub login: GithubHandle,
}

impl SearchUser {
    pub fn new(login: impl Into<GithubHandle>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

/// Profile returned by `/users/{login}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserDetails {
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
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepoSummary {
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicEvent {
    #[serde(rename = "type")]
    pub event_type: String,
}

impl PublicEvent {
    pub fn is_contribution(&self) -> bool {
        CONTRIBUTION_EVENTS.contains(&self.event_type.as_str())
    }
}

/// Builds the persisted record from the pieces fetched for one user.
pub fn enrich_user(
    login: &str,
    details: UserDetails,
    repos: &[RepoSummary],
    region: &Region,
    collected_at: DateTime<Utc>,
) -> EnrichedUser {
    EnrichedUser {
        username: login.to_string(),
        name: details.name,
        avatar_url: details.avatar_url,
        bio: details.bio,
        company: details.company,
        location: details.location,
        email: details.email,
        blog: details.blog,
        twitter_username: details.twitter_username,
        followers: details.followers,
        following: details.following,
        public_repos: details.public_repos,
        public_gists: details.public_gists,
        total_stars: repos
            .iter()
            .fold(0, |total: u64, repo| total.saturating_add(repo.stargazers_count)),
        total_forks: repos
            .iter()
            .fold(0, |total: u64, repo| total.saturating_add(repo.forks_count)),
        created_at: details.created_at,
        updated_at: details.updated_at,
        region_code: Some(region.code.clone()),
        region_name: Some(region.name.clone()),
        collected_at: Some(collected_at),
        recent_contributions: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_details_tolerate_nulls() {
        let details: UserDetails = serde_json::from_str(
            r#"{
                "login": "amine",
                "name": null,
                "bio": "Rustacean",
                "followers": 12,
                "public_repos": 4,
                "created_at": "2015-03-01T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(details.name, None);
        assert_eq!(details.bio.as_deref(), Some("Rustacean"));
        assert_eq!(details.followers, 12);
        assert_eq!(details.public_gists, 0);
        assert!(details.created_at.is_some());
    }

    #[test]
    fn enrich_sums_repository_stats() {
        let region = Region {
            code: "16".to_string(),
            name: "Algiers".to_string(),
            local_name: None,
            search_terms: vec!["Algiers".to_string()],
        };
        let repos = vec![
            RepoSummary {
                stargazers_count: 10,
                forks_count: 2,
                ..Default::default()
            },
            RepoSummary {
                stargazers_count: 5,
                forks_count: 1,
                ..Default::default()
            },
        ];
        let details = UserDetails {
            followers: 30,
            public_repos: 2,
            ..Default::default()
        };

        let user = enrich_user("amine", details, &repos, &region, Utc::now());

        assert_eq!(user.total_stars, 15);
        assert_eq!(user.total_forks, 3);
        assert_eq!(user.followers, 30);
        assert_eq!(user.region_code(), "16");
        assert_eq!(user.region_name.as_deref(), Some("Algiers"));
        assert!(user.collected_at.is_some());
    }

    #[test]
    fn repository_sums_saturate() {
        let region = Region {
            code: "31".to_string(),
            name: "Oran".to_string(),
            local_name: None,
            search_terms: vec!["Oran".to_string()],
        };
        let huge = RepoSummary {
            stargazers_count: u64::MAX,
            forks_count: u64::MAX - 1,
        };

        let user = enrich_user(
            "lina",
            UserDetails::default(),
            &[huge.clone(), huge],
            &region,
            Utc::now(),
        );

        assert_eq!(user.total_stars, u64::MAX);
        assert_eq!(user.total_forks, u64::MAX);
    }

    #[test]
    fn contribution_events() {
        let events: Vec<PublicEvent> = serde_json::from_str(
            r#"[{"type": "PushEvent"}, {"type": "WatchEvent"}, {"type": "IssueCommentEvent"}]"#,
        )
        .unwrap();

        assert_eq!(events.iter().filter(|e| e.is_contribution()).count(), 2);
    }
}
