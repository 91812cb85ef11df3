use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::env;

use crate::routes::middleware_auth::Claims;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match state
        .identity
        .verify_credentials(&payload.email, &payload.password)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "credential check failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "identity error").into_response();
        }
    };

    let tenant = match state.tenants.get(user.tenant_id).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => {
            // Identity exists but its tenant record never landed; the
            // registration saga leaves these behind for reconciliation
            tracing::error!(tenant_id = %user.tenant_id, "identity has no tenant metadata");
            return (StatusCode::INTERNAL_SERVER_ERROR, "tenant metadata missing").into_response();
        }
        Err(e) => {
            tracing::error!(tenant_id = %user.tenant_id, error = %e, "tenant lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "tenant store error").into_response();
        }
    };

    tracing::info!(user_id = %user.user_id, tenant_id = %user.tenant_id, "credentials verified");

    let secret = env::var("JWT_SECRET").expect("JWT_SECRET not found");
    let now = Utc::now();
    let exp = now + Duration::hours(24);
    let claims = Claims {
        sub: tenant.tenant_id.to_string(),
        fullname: tenant.fullname,
        tenant_name: tenant.tenant_name,
        tenant_tier: Some(tenant.tenant_tier),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    );

    match token {
        Ok(t) => (StatusCode::OK, Json(LoginResponse { token: t })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "jwt encode error");
            (StatusCode::INTERNAL_SERVER_ERROR, "token error").into_response()
        }
    }
}
