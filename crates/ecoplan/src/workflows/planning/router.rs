use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::planner::{PlanningError, PlanningLoop, PlanningRequest};
use crate::error::AppError;

/// Router exposing a planning run over HTTP.
pub fn planning_router(planner: Arc<PlanningLoop>) -> Router {
    Router::new()
        .route("/api/v1/plans", post(plan_handler))
        .with_state(planner)
}

pub(crate) async fn plan_handler(
    State(planner): State<Arc<PlanningLoop>>,
    Json(request): Json<PlanningRequest>,
) -> Response {
    // the proposer call blocks; keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || planner.run(&request))
        .await
        .map_err(|err| PlanningError::WorkerFailed(err.to_string()))
        .and_then(|result| result);

    match outcome {
        Ok(run) => (StatusCode::OK, Json(run)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
