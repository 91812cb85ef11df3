use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config_source::{ConfigFetchError, ConfigSource};
use crate::evaluation::{self, EvaluationContext, RulesetError};

#[derive(Debug, Error)]
pub enum FeatureError {
    // Transient: the source was unreachable or served unparseable JSON;
    // retrying is the caller's call, never done here
    #[error("failed to fetch ruleset: {0}")]
    Fetch(#[from] ConfigFetchError),
    // Fatal for this snapshot: the content itself is malformed
    #[error("malformed ruleset: {0}")]
    Ruleset(#[from] RulesetError),
}

/// Evaluates the current ruleset snapshot for one tenant.
#[derive(Clone)]
pub struct FeatureService {
    source: Arc<dyn ConfigSource>,
}

impl FeatureService {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Fetch a fresh snapshot and return the names of the features the
    /// tenant's tier enables. No caching; freshness is the source's
    /// contract.
    pub async fn get_enabled_features(
        &self,
        tenant_id: Uuid,
        tier: &str,
    ) -> Result<BTreeSet<String>, FeatureError> {
        let context = EvaluationContext::from([("tier".to_string(), json!(tier))]);

        let flags = self.source.fetch().await?;
        let enabled = evaluation::evaluate(&flags, &context)?;

        tracing::debug!(%tenant_id, ?enabled, "evaluated ruleset snapshot");

        Ok(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_source::testing::{StaticConfigSource, UnreachableConfigSource};
    use crate::evaluation::Ruleset;

    #[tokio::test]
    async fn evaluates_the_fetched_snapshot() {
        let ruleset: Ruleset = serde_json::from_value(json!({
            "email": {
                "default": false,
                "rules": {
                    "premium tier": {
                        "when_match": true,
                        "conditions": [{"action": "EQUALS", "key": "tier", "value": "premium"}]
                    }
                }
            }
        }))
        .unwrap();

        let service = FeatureService::new(Arc::new(StaticConfigSource(ruleset)));

        let enabled = service
            .get_enabled_features(Uuid::new_v4(), "premium")
            .await
            .unwrap();
        assert_eq!(enabled, BTreeSet::from(["email".to_string()]));

        let none = service
            .get_enabled_features(Uuid::new_v4(), "basic")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn unreachable_source_surfaces_as_a_fetch_error() {
        let service = FeatureService::new(Arc::new(UnreachableConfigSource));

        let err = service
            .get_enabled_features(Uuid::new_v4(), "basic")
            .await
            .unwrap_err();
        assert!(matches!(err, FeatureError::Fetch(_)));
    }

    #[tokio::test]
    async fn malformed_ruleset_surfaces_as_a_ruleset_error() {
        let ruleset: Ruleset = serde_json::from_value(json!({
            "broken": {
                "default": false,
                "rules": {
                    "r": {
                        "when_match": true,
                        "conditions": [{"action": "MODULO_RANGE", "key": "tier", "value": "x"}]
                    }
                }
            }
        }))
        .unwrap();

        let service = FeatureService::new(Arc::new(StaticConfigSource(ruleset)));

        let err = service
            .get_enabled_features(Uuid::new_v4(), "basic")
            .await
            .unwrap_err();
        assert!(matches!(err, FeatureError::Ruleset(_)));
    }
}
