pub mod routes;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub tenant_name: String,
    pub tenant_tier: String,
}
