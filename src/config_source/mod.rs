use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::evaluation::Ruleset;

// The configuration sidecar answers within a couple of seconds or not at
// all; the request dispatcher imposes its own overall deadline on top
const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ConfigFetchError {
    #[error("configuration source unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("configuration source answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("configuration source returned malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Supplier of the current ruleset snapshot. Implementations own
/// freshness and atomic publication; callers fetch per evaluation and
/// never mutate what they get back.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self) -> Result<Ruleset, ConfigFetchError>;
}

/// Fetches the hosted ruleset from the local configuration sidecar.
pub struct HttpConfigSource {
    client: reqwest::Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(base_url: &str, app: &str, environment: &str, profile: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("failed to build config source HTTP client");

        let url = format!(
            "{}/applications/{}/environments/{}/configurations/{}",
            base_url.trim_end_matches('/'),
            app,
            environment,
            profile
        );

        Self { client, url }
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self) -> Result<Ruleset, ConfigFetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(ConfigFetchError::Unreachable)?;

        if !response.status().is_success() {
            return Err(ConfigFetchError::Status(response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(ConfigFetchError::Unreachable)?;

        serde_json::from_str(&body).map_err(ConfigFetchError::Malformed)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_url_is_assembled_from_the_profile_coordinates() {
        let source = HttpConfigSource::new(
            "http://localhost:2772/",
            "product-features",
            "dev-env",
            "features",
        );

        assert_eq!(
            source.url,
            "http://localhost:2772/applications/product-features/environments/dev-env/configurations/features"
        );
    }

    #[tokio::test]
    async fn static_source_round_trips_its_snapshot() {
        let ruleset: Ruleset = serde_json::from_str(
            r#"{"beta": {"default": true, "rules": {}}}"#,
        )
        .unwrap();

        let source = testing::StaticConfigSource(ruleset);
        let fetched = source.fetch().await.unwrap();
        assert!(fetched.contains_key("beta"));
    }
}
