// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP client for `swbrokerd`'s control surface and transaction objects.
//!
//! Deliberately does not depend on `swb-daemon`: a console client talks to
//! the daemon the way any other bus caller would, over the wire shapes
//! alone, not the daemon's internal Rust types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A role method call's request body (spec §6.2), serialized the way
/// `swb-daemon`'s `RoleRequest` expects to deserialize it.
pub type RoleRequest = Value;

/// A transaction object's polled snapshot (mirrors `swb_daemon::TransactionSnapshot`).
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSnapshot {
    /// Current lifecycle state (`"new"`, `"setup"`, ..., `"finished"`).
    pub state: String,
    /// Backend-reported milestone.
    pub status: String,
    /// `0..=100`, or `101` for unknown.
    pub percentage: u32,
    /// The error code and details, if the transaction failed.
    pub error: Option<(String, String)>,
    /// The transaction's terminal exit (`"success"`, `"failed"`, `"cancelled"`, ...).
    pub exit: Option<String>,
}

impl TransactionSnapshot {
    /// Whether the transaction has reached its terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == "finished"
    }
}

/// Thin wrapper over [`reqwest::Client`] pointed at one daemon instance.
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
}

/// Errors talking to the daemon, distinct from errors the daemon reports
/// about a transaction it ran (those arrive as a [`TransactionSnapshot`]
/// field, not as an [`Err`] here).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The daemon could not be reached, or stopped responding mid-call.
    #[error("cannot reach daemon at {0}: {1}")]
    Unreachable(String, reqwest::Error),
    /// The daemon replied with a non-2xx status.
    #[error("daemon returned {status}: {body}")]
    Daemon {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },
}

impl BrokerClient {
    /// Point a client at `base_url` (e.g. `http://127.0.0.1:8415`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// `GetTid`: allocate a transaction and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unreachable`] if the daemon cannot be
    /// reached, or [`ClientError::Daemon`] if it refuses the request.
    pub async fn get_tid(&self, role: &str, uid: u32) -> Result<String, ClientError> {
        let sender = format!("swb-cli:{}", std::process::id());
        let body = json!({ "role": role, "uid": uid, "sender": sender });
        let resp: Value = self.post("/tid", &body).await?;
        Ok(resp["tid"].as_str().unwrap_or_default().to_string())
    }

    /// `SetHints`.
    ///
    /// # Errors
    ///
    /// See [`Self::get_tid`].
    pub async fn set_hints(&self, tid: &str, hints: &[String]) -> Result<(), ClientError> {
        let _: Value = self.post(&format!("/transactions/{tid}/hints"), &hints).await?;
        Ok(())
    }

    /// Submit a role method call's parameters.
    ///
    /// # Errors
    ///
    /// See [`Self::get_tid`].
    pub async fn submit(&self, tid: &str, role: &str, request: &RoleRequest) -> Result<(), ClientError> {
        let _: Value = self.post(&format!("/transactions/{tid}/{role}"), request).await?;
        Ok(())
    }

    /// `Cancel`.
    ///
    /// # Errors
    ///
    /// See [`Self::get_tid`].
    pub async fn cancel(&self, tid: &str) -> Result<(), ClientError> {
        let _: Value = self.post(&format!("/transactions/{tid}/cancel"), &json!({})).await?;
        Ok(())
    }

    /// Poll a transaction object's current snapshot.
    ///
    /// # Errors
    ///
    /// See [`Self::get_tid`].
    pub async fn snapshot(&self, tid: &str) -> Result<TransactionSnapshot, ClientError> {
        self.get(&format!("/transactions/{tid}")).await
    }

    /// Poll `snapshot` every `interval` until the transaction reports
    /// `Finished`.
    ///
    /// # Errors
    ///
    /// See [`Self::get_tid`].
    pub async fn wait_for_finish(&self, tid: &str, interval: Duration) -> Result<TransactionSnapshot, ClientError> {
        loop {
            let snap = self.snapshot(tid).await?;
            if snap.is_finished() {
                return Ok(snap);
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.http.post(&url).json(body).send().await.map_err(|e| ClientError::Unreachable(url.clone(), e))?;
        Self::into_typed(resp).await
    }

    async fn get<R: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<R, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(|e| ClientError::Unreachable(url.clone(), e))?;
        Self::into_typed(resp).await
    }

    async fn into_typed<R: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<R, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Daemon { status: status.as_u16(), body });
        }
        let bytes = resp.bytes().await.map_err(|e| ClientError::Daemon { status: status.as_u16(), body: e.to_string() })?;
        if bytes.is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|e| ClientError::Daemon { status: status.as_u16(), body: e.to_string() });
        }
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Daemon { status: status.as_u16(), body: e.to_string() })
    }
}
