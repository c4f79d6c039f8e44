use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use ecoplan::workflows::planning::{planning_router, PlanningLoop, RunId};

pub(crate) fn with_planning_routes(planner: Arc<PlanningLoop>) -> axum::Router {
    planning_router(planner)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/plans/:run_id/attempts",
            axum::routing::get(attempts_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Audit trail recorded for one run; empty for unknown ids.
pub(crate) async fn attempts_endpoint(
    Extension(state): Extension<AppState>,
    Path(run_id): Path<String>,
) -> Response {
    let run_id = RunId(run_id);
    match state.attempts.events_for(&run_id) {
        Ok(events) => (
            StatusCode::OK,
            Json(json!({ "run_id": run_id.0, "attempts": events })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_planning_loop, InMemoryAttemptSink};
    use axum::body::Body;
    use axum::http::Request;
    use ecoplan::config::PlannerConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<InMemoryAttemptSink>) {
        let sink = Arc::new(InMemoryAttemptSink::default());
        let planner = build_planning_loop(&PlannerConfig::default(), None, Some(sink.clone()))
            .expect("planner builds");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            attempts: sink.clone(),
        };
        let router = with_planning_routes(Arc::new(planner)).layer(Extension(state));
        (router, sink)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let (router, _) = app(true);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn plan_then_fetch_its_attempts() {
        let (router, _) = app(true);
        let payload = json!({
            "household": {
                "monthly_kwh": 320,
                "tariff_per_kwh": 62,
                "lighting": { "bulbs": 10 }
            },
            "criteria": { "max_budget": 4000 }
        });

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/plans")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let run = body_json(response).await;
        let run_id = run["run_id"].as_str().expect("run id").to_string();
        let attempts = run["attempts"].as_array().map(Vec::len).expect("attempts");

        let response = router
            .oneshot(
                Request::get(format!("/api/v1/plans/{run_id}/attempts"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let audit = body_json(response).await;
        assert_eq!(audit["run_id"], run_id);
        assert_eq!(audit["attempts"].as_array().map(Vec::len), Some(attempts));
    }

    #[tokio::test]
    async fn healthcheck_is_static() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
