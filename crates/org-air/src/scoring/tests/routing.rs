use super::common::*;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::scoring::config::{ModelVersion, ScoringConfig};
use crate::scoring::domain::ScoringRunId;
use crate::scoring::router::{results_handler, ResultsQuery, RunRequest};
use crate::scoring::ScoringService;

fn run_request() -> RunRequest {
    RunRequest { companies: batch() }
}

fn json_request(method: &str, uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn create_run_route_returns_created() {
    let (service, scores, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request("POST", "/api/v1/scoring/runs", &run_request()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["run"]["status"], "success");
    assert_eq!(payload["run"]["companies_scored"], 3);
    assert_eq!(payload["scores"].as_array().map(Vec::len), Some(3));
    assert_eq!(payload["failures"], json!([]));
    assert_eq!(scores.len(), 3);
}

#[tokio::test]
async fn empty_batch_is_bad_request() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/scoring/runs",
            &json!({ "companies": [] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn run_status_and_audit_routes_follow_a_run() {
    let (service, _, _, _) = build_service();
    let service = Arc::new(service);
    let summary = service.run_batch(batch()).expect("batch runs");
    let router = crate::scoring::scoring_router(service);

    let status = router
        .clone()
        .oneshot(get(&format!("/api/v1/scoring/runs/{}", summary.run.id)))
        .await
        .expect("route executes");
    assert_eq!(status.status(), StatusCode::OK);
    let payload = read_json_body(status).await;
    assert_eq!(payload["id"], summary.run.id.to_string());
    assert_eq!(payload["model_version"], "org-air-v2");

    let audit = router
        .oneshot(get(&format!(
            "/api/v1/scoring/runs/{}/audit?company_id=NVDA",
            summary.run.id
        )))
        .await
        .expect("route executes");
    assert_eq!(audit.status(), StatusCode::OK);
    let records = read_json_body(audit).await;
    let records = records.as_array().expect("audit array");
    assert_eq!(records.len(), 8);
    assert!(records.iter().all(|record| record["company_id"] == "NVDA"));
}

#[tokio::test]
async fn malformed_run_id_is_bad_request() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/scoring/runs/not-a-uuid"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);
    let missing = ScoringRunId::new();

    let status = router
        .clone()
        .oneshot(get(&format!("/api/v1/scoring/runs/{missing}")))
        .await
        .expect("route executes");
    assert_eq!(status.status(), StatusCode::NOT_FOUND);

    let rerun = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/scoring/runs/{missing}"),
            &run_request(),
        ))
        .await
        .expect("route executes");
    assert_eq!(rerun.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rerun_route_reuses_the_run_id() {
    let (service, scores, _, _) = build_service();
    let service = Arc::new(service);
    let first = service.run_batch(batch()).expect("batch runs");
    let router = crate::scoring::scoring_router(service);

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/scoring/runs/{}", first.run.id),
            &run_request(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["run"]["id"], first.run.id.to_string());
    assert_eq!(scores.len(), 3);
}

#[tokio::test]
async fn results_routes_validate_limit_and_company() {
    let (service, _, _, _) = build_service();
    let service = Arc::new(service);
    service.run_batch(batch()).expect("batch runs");
    let router = crate::scoring::scoring_router(service);

    let zero = router
        .clone()
        .oneshot(get("/api/v1/scoring/results?limit=0"))
        .await
        .expect("route executes");
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let listed = router
        .clone()
        .oneshot(get("/api/v1/scoring/results"))
        .await
        .expect("route executes");
    assert_eq!(listed.status(), StatusCode::OK);
    let payload = read_json_body(listed).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(3));

    let company = router
        .clone()
        .oneshot(get("/api/v1/scoring/results/DG"))
        .await
        .expect("route executes");
    assert_eq!(company.status(), StatusCode::OK);
    let payload = read_json_body(company).await;
    assert_eq!(payload["company_id"], "DG");
    assert!(payload["breakdown"]["dimension_scores"].is_array());

    let missing = router
        .oneshot(get("/api/v1/scoring/results/AAPL"))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dimensions_route_previews_evidence() {
    let (service, _, runs, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/scoring/dimensions",
            &json!({ "evidence": strong_evidence() }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["scores"].as_array().map(Vec::len), Some(7));
    assert!(payload["payloads"].get("technology_hiring").is_some());
    assert!(runs.runs.lock().expect("run mutex poisoned").is_empty());
}

#[tokio::test]
async fn results_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(ScoringService::new(
        ScoringConfig::standard(),
        ModelVersion::V2,
        Arc::new(UnavailableScores),
        Arc::new(MemoryRuns::default()),
        Arc::new(MemoryAudit::default()),
    ));

    let response = results_handler::<UnavailableScores, MemoryRuns, MemoryAudit>(
        State(service),
        Query(ResultsQuery { limit: Some(10) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("database offline")));
}
