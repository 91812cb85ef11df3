use std::sync::Arc;

use crate::features::FeatureService;
use crate::identity::IdentityProvider;
use crate::tenants::service::TenantRegistrationService;
use crate::tenants::store::TenantStore;

#[derive(Clone)]
pub struct AppState {
    pub features: FeatureService,
    pub registration: TenantRegistrationService,
    pub identity: Arc<dyn IdentityProvider>,
    pub tenants: Arc<dyn TenantStore>,
}
