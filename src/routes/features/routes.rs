use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::FeaturesResponse;
use crate::features::FeatureError;
use crate::routes::middleware_auth::AuthorizedTenant;
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Evaluate the current ruleset for the calling tenant.
pub async fn get(
    State(state): State<AppState>,
    AuthorizedTenant(identity): AuthorizedTenant,
) -> Result<impl IntoResponse, (StatusCode, Json<MessageResponse>)> {
    tracing::info!(tenant_id = %identity.tenant_id, tier = %identity.tenant_tier, "evaluating features");

    let features = state
        .features
        .get_enabled_features(identity.tenant_id, &identity.tenant_tier)
        .await
        .map_err(|err| {
            // Uniform response, distinguishable logs: a down sidecar and a
            // bad ruleset are different pages
            match &err {
                FeatureError::Fetch(e) => {
                    tracing::error!(tenant_id = %identity.tenant_id, error = %e, "ruleset fetch failed")
                }
                FeatureError::Ruleset(e) => {
                    tracing::error!(tenant_id = %identity.tenant_id, error = %e, "ruleset content rejected")
                }
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    message: "feature evaluation failed".to_string(),
                }),
            )
        })?;

    tracing::info!(tenant_id = %identity.tenant_id, ?features, "enabled features resolved");

    Ok(Json(FeaturesResponse {
        fullname: identity.fullname,
        tenant: identity.tenant_name,
        tier: identity.tenant_tier,
        features: features.into_iter().collect(),
    }))
}
