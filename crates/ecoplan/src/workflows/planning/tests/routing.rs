use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::planning::domain::Criteria;
use crate::workflows::planning::proposer::ScriptedProposer;
use crate::workflows::planning::router::{plan_handler, planning_router};

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn plan_handler_returns_run_trace() {
    let planner = Arc::new(planning_loop(
        ScriptedProposer::repeating(paid_bundle()),
        2,
    ));
    let criteria = Criteria {
        max_budget: Some(10_000.0),
        ..Criteria::default()
    };

    let response = plan_handler(State(planner), axum::Json(request(None, criteria))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["attempts"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["attempts"][0]["accepted"], false);
    assert_eq!(
        body["attempts"][1]["input"]["policy"]["target_budget"],
        json!(10_000.0)
    );
}

#[tokio::test]
async fn plans_route_accepts_loose_household_payloads() {
    let router = planning_router(Arc::new(planning_loop(
        ScriptedProposer::repeating(vec![free_setpoint()]),
        2,
    )));
    let payload = json!({
        "household": {
            "monthly_kWh": "320",
            "tariff_per_kwh": "62",
            "ac_units": [{ "watt": "1.5k", "hours_per_day": 6 }],
            "policy": { "target_budget": 0 }
        },
        "criteria": { "require_data_complete": true }
    });

    let response = router
        .oneshot(
            Request::post("/api/v1/plans")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(
        body["final_plan"]["actions"][0]["kwh_saved_per_month"],
        json!(32.0)
    );
    assert_eq!(body["attempts"][0]["input"]["ac_units"][0]["watt"], json!(1500.0));
}

#[tokio::test]
async fn plans_route_rejects_non_json_bodies() {
    let router = planning_router(Arc::new(planning_loop(
        ScriptedProposer::repeating(Vec::new()),
        1,
    )));

    let response = router
        .oneshot(
            Request::post("/api/v1/plans")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert!(response.status().is_client_error());
}
