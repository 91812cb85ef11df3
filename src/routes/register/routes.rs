use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::RegisterRequest;
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::tenants::service::NewTenant;

/// Sign up a new tenant: identity record plus metadata record.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<MessageResponse>)> {
    let tenant = NewTenant {
        given_name: payload.given_name,
        family_name: payload.family_name,
        email: payload.email,
        tenant_name: payload.tenant_name,
        tenant_tier: payload.tenant_tier,
    };

    match state.registration.register(&tenant).await {
        Ok(tenant_id) => {
            tracing::info!(%tenant_id, tenant_name = %tenant.tenant_name, "tenant registered");
            Ok(Json(MessageResponse {
                message: format!(
                    "Tenant registered successfully. Please check your email at {} for the temporary password.",
                    tenant.email
                ),
            }))
        }
        Err(err) => {
            tracing::error!(email = %tenant.email, error = %err, "registration failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    message: format!("An error occurred: {err}"),
                }),
            ))
        }
    }
}
