use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub fullname: String,
    pub tenant_name: String,
    #[serde(default)]
    pub tenant_tier: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Caller identity as established by the token authorizer.
#[derive(Debug, Clone)]
pub struct TenantIdentity {
    pub tenant_id: Uuid,
    pub fullname: String,
    pub tenant_name: String,
    pub tenant_tier: String,
}

pub struct AuthorizedTenant(pub TenantIdentity);

impl<S> FromRequestParts<S> for AuthorizedTenant
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantIdentity>()
            .cloned()
            .map(AuthorizedTenant)
            .ok_or((StatusCode::UNAUTHORIZED, "missing tenant identity"))
    }
}

pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, impl IntoResponse> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        _ => {
            return Err((StatusCode::UNAUTHORIZED, "missing token"));
        }
    };

    let secret = env::var("JWT_SECRET").expect("JWT_SECRET is not found");

    let token_data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "token rejected");
            return Err((StatusCode::UNAUTHORIZED, "invalid token"));
        }
    };

    let claims = token_data.claims;

    match Uuid::parse_str(&claims.sub) {
        Ok(tenant_id) => {
            let identity = TenantIdentity {
                tenant_id,
                fullname: claims.fullname,
                tenant_name: claims.tenant_name,
                // Tenants enrolled before tiering carry no tier claim
                tenant_tier: claims.tenant_tier.unwrap_or_else(|| "basic".to_string()),
            };
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(_) => Err((StatusCode::UNAUTHORIZED, "invalid subject")),
    }
}
