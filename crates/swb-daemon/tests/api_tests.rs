// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end scenarios against the Axum router, covering the literal
//! scenarios from spec §8.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use swb_backend_mock::{CatalogEntry, MockBackend};
use swb_core::PackageId;
use swb_daemon::{build_app, AppState};
use swb_policy::{AllowAll, DenyAll};
use swb_txndb::TransactionDb;
use tower::ServiceExt;

async fn test_state(policy: Arc<dyn swb_policy::PolicyEngine>) -> Arc<AppState> {
    let tmp = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::new(vec![CatalogEntry {
        package_id: PackageId::new("powertop", "1.8-1.fc30", "x86_64", "installed").unwrap(),
        summary: "powertop summary".into(),
        installed: true,
    }]));
    let txndb = Arc::new(TransactionDb::open(tmp.path().join("txndb.jsonl")).await.unwrap());
    Arc::new(AppState::new(swb_config::BrokerConfig::default(), backend, policy, txndb))
}

async fn json_post(app: &axum::Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn json_get(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app.clone().oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn wait_for_finish(app: &axum::Router, tid: &str) -> serde_json::Value {
    for _ in 0..50 {
        let (status, snap) = json_get(app, &format!("/transactions/{tid}")).await;
        assert_eq!(status, StatusCode::OK);
        if snap["state"] == "finished" {
            return snap;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("transaction {tid} did not finish in time");
}

#[tokio::test]
async fn s1_resolve_with_empty_inputs_fails_input_invalid() {
    let state = test_state(Arc::new(AllowAll)).await;
    let app = build_app(state);

    let (status, body) = json_post(&app, "/tid", serde_json::json!({ "role": "resolve", "uid": 1000 })).await;
    assert_eq!(status, StatusCode::OK);
    let tid = body["tid"].as_str().unwrap().to_string();

    let (status, _) = json_post(&app, &format!("/transactions/{tid}/hints"), serde_json::json!([])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = json_post(&app, &format!("/transactions/{tid}/resolve"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let snap = wait_for_finish(&app, &tid).await;
    assert_eq!(snap["exit"], "failed");
    assert_eq!(snap["error"][0], "INPUT_INVALID");
}

#[tokio::test]
async fn s2_simple_search_returns_one_package_then_success() {
    let state = test_state(Arc::new(AllowAll)).await;
    let app = build_app(state);

    let (_, body) = json_post(&app, "/tid", serde_json::json!({ "role": "search-name", "uid": 1000 })).await;
    let tid = body["tid"].as_str().unwrap().to_string();
    json_post(&app, &format!("/transactions/{tid}/hints"), serde_json::json!([])).await;

    let (status, _) = json_post(
        &app,
        &format!("/transactions/{tid}/search-name"),
        serde_json::json!({ "filters": 0, "search_terms": ["power"] }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let snap = wait_for_finish(&app, &tid).await;
    assert_eq!(snap["exit"], "success");

    let (status, results) = json_get(&app, &format!("/transactions/{tid}/results")).await;
    assert_eq!(status, StatusCode::OK);
    let packages = results["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["summary"], "powertop summary");
}

#[tokio::test]
async fn s3_install_with_policy_denial_never_reaches_backend() {
    let state = test_state(Arc::new(DenyAll)).await;
    let app = build_app(state);

    let (_, body) = json_post(&app, "/tid", serde_json::json!({ "role": "install-packages", "uid": 2000 })).await;
    let tid = body["tid"].as_str().unwrap().to_string();
    json_post(&app, &format!("/transactions/{tid}/hints"), serde_json::json!([])).await;

    let (status, _) = json_post(
        &app,
        &format!("/transactions/{tid}/install-packages"),
        serde_json::json!({ "tx_flags": 0, "package_ids": ["nonexistent;1;x86_64;repo"] }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let snap = wait_for_finish(&app, &tid).await;
    assert_eq!(snap["exit"], "failed");
    assert_eq!(snap["error"][0], "NOT_AUTHORIZED");
}

#[tokio::test]
async fn s4_two_reads_and_one_write_all_eventually_finish() {
    let state = test_state(Arc::new(AllowAll)).await;
    let app = build_app(state);

    let (_, r1) = json_post(&app, "/tid", serde_json::json!({ "role": "resolve", "uid": 1000 })).await;
    let r1_tid = r1["tid"].as_str().unwrap().to_string();
    let (_, r2) = json_post(&app, "/tid", serde_json::json!({ "role": "resolve", "uid": 1000 })).await;
    let r2_tid = r2["tid"].as_str().unwrap().to_string();
    let (_, w1) = json_post(&app, "/tid", serde_json::json!({ "role": "install-packages", "uid": 0 })).await;
    let w1_tid = w1["tid"].as_str().unwrap().to_string();

    for tid in [&r1_tid, &r2_tid] {
        json_post(&app, &format!("/transactions/{tid}/hints"), serde_json::json!([])).await;
        json_post(
            &app,
            &format!("/transactions/{tid}/resolve"),
            serde_json::json!({ "package_ids": ["powertop;1.8-1.fc30;x86_64;installed"] }),
        )
        .await;
    }
    json_post(&app, &format!("/transactions/{w1_tid}/hints"), serde_json::json!([])).await;
    json_post(
        &app,
        &format!("/transactions/{w1_tid}/install-packages"),
        serde_json::json!({ "tx_flags": 0, "package_ids": ["powertop;1.8-1.fc30;x86_64;installed"] }),
    )
    .await;

    assert_eq!(wait_for_finish(&app, &r1_tid).await["exit"], "success");
    assert_eq!(wait_for_finish(&app, &r2_tid).await["exit"], "success");
    assert_eq!(wait_for_finish(&app, &w1_tid).await["exit"], "success");
}

#[tokio::test]
async fn status_reports_backend_roles() {
    let state = test_state(Arc::new(AllowAll)).await;
    let app = build_app(state);

    let (status, body) = json_get(&app, "/status").await;
    assert_eq!(status, StatusCode::OK);
    let roles = body["roles"].as_array().unwrap();
    assert!(roles.iter().any(|r| r == "resolve"));
}

#[tokio::test]
async fn unknown_transaction_is_not_found() {
    let state = test_state(Arc::new(AllowAll)).await;
    let app = build_app(state);

    let (status, _) = json_get(&app, "/transactions/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
