// SPDX-License-Identifier: MIT OR Apache-2.0
//! Axum routes for the control surface (spec §4.7) and the per-tid
//! transaction object (spec §4.8).

use std::sync::Arc;

use axum::extract::{Path as AxPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use swb_core::Role;
use swb_error::BrokerError;

use crate::state::AppState;
use crate::wire::{ControlStatus, RoleRequest, TransactionSnapshot};

/// Build the daemon's Axum router over `state`.
#[must_use]
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(cmd_status))
        .route("/tid", post(cmd_get_tid))
        .route("/can-authorize", get(cmd_can_authorize))
        .route("/set-proxy", post(cmd_set_proxy))
        .route("/time-since-action", get(cmd_time_since_action))
        .route("/suggest-quit", post(cmd_suggest_quit))
        .route("/daemon-state", get(cmd_daemon_state))
        .route("/transactions/{tid}/hints", post(cmd_set_hints))
        .route("/transactions/{tid}/cancel", post(cmd_cancel))
        .route("/transactions/{tid}", get(cmd_snapshot))
        .route("/transactions/{tid}/results", get(cmd_results))
        .route("/transactions/{tid}/{role}", post(cmd_submit_role))
        .with_state(state)
}

/// Wraps a [`BrokerError`] for `IntoResponse`, mapping its [`ErrorCode`](swb_error::ErrorCode)
/// category to an HTTP status the way `abp-daemon`'s `ApiError` maps
/// `anyhow` failures.
struct ApiError(BrokerError);

impl From<BrokerError> for ApiError {
    fn from(e: BrokerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use swb_error::ErrorCode::{NoSuchTransaction, NotAuthorized, TransactionError};
        let status = match self.0.code {
            NoSuchTransaction => StatusCode::NOT_FOUND,
            NotAuthorized => StatusCode::FORBIDDEN,
            TransactionError => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = Json(json!({ "code": self.0.code, "message": self.0.message }));
        (status, body).into_response()
    }
}

async fn cmd_status(State(state): State<Arc<AppState>>) -> Json<ControlStatus> {
    let identity = state.backend.identity();
    Json(ControlStatus {
        backend_name: state.daemon.backend_name.clone(),
        backend_description: state.daemon.backend_description.clone(),
        backend_author: state.daemon.backend_author.clone(),
        roles: identity.roles.iter().map(|r| r.wire_token()).collect(),
        mime_types: identity.mime_types.clone(),
        version: (state.daemon.version_major, state.daemon.version_minor, state.daemon.version_micro),
        locked: state.daemon.locked,
        network_state: *state.daemon.network_state.read().await,
        distro_id: state.daemon.distro_id.clone(),
        idle: state.may_quit().await,
    })
}

#[derive(Debug, Deserialize)]
struct GetTidRequest {
    role: String,
    uid: u32,
    #[serde(default)]
    sender: String,
}

async fn cmd_get_tid(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetTidRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let role = parse_role(&req.role)?;
    let tid = state.get_tid(role, req.uid, &req.sender).await?;
    Ok(Json(json!({ "tid": tid })))
}

fn parse_role(token: &str) -> Result<Role, ApiError> {
    Role::from_wire_token(token)
        .ok_or_else(|| ApiError(BrokerError::new(swb_error::ErrorCode::NotSupported, format!("unknown role: {token}"))))
}

fn no_such_transaction(tid: &str) -> ApiError {
    ApiError(BrokerError::new(swb_error::ErrorCode::NoSuchTransaction, format!("no such transaction: {tid}")))
}

#[derive(Debug, Deserialize)]
struct CanAuthorizeQuery {
    role: String,
    uid: u32,
}

async fn cmd_can_authorize(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CanAuthorizeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let role = parse_role(&q.role)?;
    let decision = state.can_authorize(role, q.uid).await;
    Ok(Json(json!({ "decision": format!("{decision:?}") })))
}

#[derive(Debug, Deserialize)]
struct SetProxyRequest {
    uid: u32,
    #[serde(default)]
    http: Option<String>,
    #[serde(default)]
    ftp: Option<String>,
    #[serde(default)]
    no_proxy: Option<String>,
}

async fn cmd_set_proxy(State(state): State<Arc<AppState>>, Json(req): Json<SetProxyRequest>) -> StatusCode {
    state
        .set_proxy(req.uid, swb_config::ProxyHints { http: req.http, ftp: req.ftp, no_proxy: req.no_proxy })
        .await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct TimeSinceActionQuery {
    role: String,
}

async fn cmd_time_since_action(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TimeSinceActionQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let role = parse_role(&q.role)?;
    let seconds = state.time_since_action(role).await;
    Ok(Json(json!({ "seconds": seconds })))
}

async fn cmd_suggest_quit(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "may_quit": state.may_quit().await }))
}

async fn cmd_daemon_state(State(state): State<Arc<AppState>>) -> String {
    state.debug_state().await
}

async fn cmd_set_hints(
    AxPath(tid): AxPath<String>,
    State(state): State<Arc<AppState>>,
    Json(hints): Json<Vec<String>>,
) -> Result<StatusCode, ApiError> {
    state.set_hints(&tid, &hints).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cmd_submit_role(
    AxPath((tid, role)): AxPath<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RoleRequest>,
) -> Result<StatusCode, ApiError> {
    let role = parse_role(&role)?;
    let input = req.into_role_input().map_err(ApiError)?;
    state.submit(&tid, role, input).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn cmd_cancel(AxPath(tid): AxPath<String>, State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.cancel(&tid).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cmd_snapshot(
    AxPath(tid): AxPath<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TransactionSnapshot>, ApiError> {
    Ok(Json(state.snapshot(&tid).await?))
}

async fn cmd_results(
    AxPath(tid): AxPath<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entry = state.registry.read().await.get(&tid).cloned().ok_or_else(|| no_such_transaction(&tid))?;
    let txn = entry.txn.lock().await;
    let results = txn.results();
    Ok(Json(json!({
        "packages": results.packages(),
        "files": results.files(),
        "messages": results.messages(),
    })))
}
