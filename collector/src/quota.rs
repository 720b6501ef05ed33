use std::time::Duration;

use shared::CollectionSettings;
use tracing::{error, info, warn};

use crate::api::GithubSource;

/// GitHub's core quota for an authenticated token.
pub const DEFAULT_QUOTA: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub threshold: u32,
    pub cooldown: Duration,
    /// `None` waits until the quota recovers.
    pub max_retries: Option<u32>,
}

impl QuotaPolicy {
    pub fn from_settings(settings: &CollectionSettings) -> Self {
        Self {
            threshold: settings.quota_threshold,
            cooldown: settings.cooldown(),
            max_retries: settings.max_quota_retries,
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::from_settings(&CollectionSettings::default())
    }
}

/// Locally cached view of the remaining quota.
///
/// The counter is refreshed from the rate limit endpoint and decremented for
/// every request issued in between, so the safety margin holds without
/// querying the endpoint before each call.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    remaining: u32,
    policy: QuotaPolicy,
}

impl QuotaTracker {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            remaining: DEFAULT_QUOTA,
            policy,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn update(&mut self, remaining: u32) {
        self.remaining = remaining;
    }

    pub async fn refresh<S: GithubSource + ?Sized>(&mut self, source: &S) -> anyhow::Result<u32> {
        let remaining = source.rate_limit().await?;
        self.update(remaining);
        info!("Rate limit remaining: {}", remaining);
        Ok(remaining)
    }

    /// Reserves one request, sleeping through cooldowns while the quota is low.
    pub async fn acquire<S: GithubSource + ?Sized>(&mut self, source: &S) -> anyhow::Result<()> {
        let mut retries = 0;
        while self.remaining < self.policy.threshold {
            if let Some(max_retries) = self.policy.max_retries {
                if retries >= max_retries {
                    anyhow::bail!(
                        "Rate limit still low ({}) after {} cooldowns",
                        self.remaining,
                        retries
                    );
                }
            }
            retries += 1;

            warn!(
                "Rate limit low ({}), waiting {} seconds...",
                self.remaining,
                self.policy.cooldown.as_secs()
            );
            tokio::time::sleep(self.policy.cooldown).await;
            if let Err(e) = self.refresh(source).await {
                error!("Failed to refresh rate limit: {e}");
            }
        }

        self.remaining = self.remaining.saturating_sub(1);
        Ok(())
    }
}
