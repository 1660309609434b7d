//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    pub status: &'static str,
    pub version: &'static str,
    /// Backend project the server is wired to.
    pub project_id: &'a str,
    pub auth_domain: &'a str,
    pub timestamp: String,
}

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let backend = &state.config.backend;

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        project_id: &backend.project_id,
        auth_domain: &backend.auth_domain,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
