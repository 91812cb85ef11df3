use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthData {
    status: &'static str,
}

pub async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}
