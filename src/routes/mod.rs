use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

mod auth;
mod features;
mod health;
mod middleware_auth;
mod register;

pub use health::health;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    // Browser clients call both endpoints cross-origin; each one allows
    // exactly the method and header it needs
    let features_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::AUTHORIZATION]);

    let register_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let features_router = Router::new()
        .route("/", get(features::routes::get))
        .layer(middleware::from_fn(middleware_auth::require_auth))
        .layer(features_cors);

    let register_router = Router::new()
        .route("/", post(register::routes::create))
        .layer(register_cors);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .nest("/features", features_router)
        .nest("/register", register_router)
}

async fn root() -> &'static str {
    "Welcome to the tenant control plane API"
}
