// src/handlers/mod.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

pub mod lab;
pub mod quiz;
pub mod results;

/// Liveness probe.
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Backend läuft" }))
}
