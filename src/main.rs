mod config;
mod config_source;
mod evaluation;
mod features;
mod identity;
mod routes;
mod state;
mod tenants;

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config_source::HttpConfigSource;
use crate::features::FeatureService;
use crate::identity::PostgresIdentityProvider;
use crate::tenants::service::TenantRegistrationService;
use crate::tenants::store::PostgresTenantStore;

#[tokio::main]
async fn main() {
    let config = config::Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Storage calls must fail fast; the dispatcher enforces its own
    // overall request deadline on top
    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("Error connecting DB");

    let source = Arc::new(HttpConfigSource::new(
        &config.config_base_url,
        &config.config_app,
        &config.config_env,
        &config.config_profile,
    ));
    let identity = Arc::new(PostgresIdentityProvider::new(db.clone()));
    let tenants = Arc::new(PostgresTenantStore::new(db));

    let state = state::AppState {
        features: FeatureService::new(source),
        registration: TenantRegistrationService::new(identity.clone(), tenants.clone()),
        identity,
        tenants,
    };

    let app = routes::routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .expect("failed to bind listener");

    tracing::info!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app).await.expect("server error");
}
