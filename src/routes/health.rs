use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses(
        (status = 200, description = "Every dependency is up; metrics may still warn", body = HealthResponse),
        (status = 503, description = "At least one dependency failed", body = HealthResponse)
    )
)]
/// Run every probe and metric once and return the aggregated report.
pub async fn healthcheck(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let report = health_service::health_status(&state).await;
    let status =
        StatusCode::from_u16(report.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(HealthResponse::from(&report)))
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthcheck", get(healthcheck))
}
