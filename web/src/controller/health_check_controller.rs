use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET the API banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Name and version of the API server"),
    )
)]
pub async fn banner() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "RayEx API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET the health of the API router
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
