pub mod routes;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub fullname: String,
    pub tenant: String,
    pub tier: String,
    pub features: Vec<String>,
}
