use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Endpoint {
    RateLimit,
    SearchUsers,
    UserDetails,
    UserRepos,
    UserEvents,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestRecord {
    pub endpoint: Endpoint,
    pub success: u32,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RegionRecord {
    pub region: String,
}

pub struct PrometheusClient {
    registry: Registry,
    github_api_request: Family<RequestRecord, Counter>,
    // Refreshed only when the rate limit endpoint is queried
    github_api_quota_remaining: Gauge,
    collected_users: Family<RegionRecord, Counter>,
}

impl Default for PrometheusClient {
    fn default() -> Self {
        let mut registry = Registry::default();
        let github_api_request = Family::default();
        let github_api_quota_remaining = Gauge::default();
        let collected_users = Family::default();

        registry.register(
            "github_api_requests",
            "GitHub API requests issued by the collector",
            github_api_request.clone(),
        );
        registry.register(
            "github_api_quota_remaining",
            "Remaining GitHub core quota at the last rate limit check",
            github_api_quota_remaining.clone(),
        );
        registry.register(
            "collected_users",
            "Users collected per region",
            collected_users.clone(),
        );

        Self {
            registry,
            github_api_request,
            github_api_quota_remaining,
            collected_users,
        }
    }
}

impl PrometheusClient {
    pub fn record_request(&self, endpoint: Endpoint, success: bool) {
        self.github_api_request
            .get_or_create(&RequestRecord {
                endpoint,
                success: success as u32,
            })
            .inc();
    }

    pub fn set_quota_remaining(&self, value: u32) {
        self.github_api_quota_remaining.set(value as i64);
    }

    pub fn record_collected(&self, region: &str, users: usize) {
        self.collected_users
            .get_or_create(&RegionRecord {
                region: region.to_string(),
            })
            .inc_by(users as u64);
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::{Endpoint, PrometheusClient};

    #[test]
    fn encodes_recorded_metrics() {
        let prometheus = PrometheusClient::default();
        prometheus.record_request(Endpoint::SearchUsers, true);
        prometheus.record_request(Endpoint::SearchUsers, true);
        prometheus.record_request(Endpoint::UserDetails, false);
        prometheus.set_quota_remaining(4321);
        prometheus.record_collected("16", 7);

        let body = prometheus.encode().unwrap();

        assert!(body.contains("github_api_requests_total"));
        assert!(body.contains("endpoint=\"SearchUsers\""));
        assert!(body.contains("endpoint=\"UserDetails\""));
        assert!(body.contains("github_api_quota_remaining 4321"));
        assert!(body.contains("region=\"16\""));
    }
}
