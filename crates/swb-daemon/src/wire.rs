// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON wire shapes for the HTTP transport: one request DTO covering the
//! union of every role's parameters (spec §6.2's method table), and
//! response snapshots of control-surface and transaction state.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use swb_backend::RoleInput;
use swb_core::{PackageId, Role, SigType, Status, UpgradeKind};
use swb_error::{BrokerError, ErrorCode};
use swb_transaction::{State, Transaction};

/// Role-specific parameters for one role method call (spec §6.2).
///
/// Every field is optional on the wire; [`RoleRequest::into_role_input`]
/// enforces which ones a given [`Role`] actually requires (delegating to
/// [`swb_transaction::validate::validate_role_input`] once converted).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoleRequest {
    /// Filter bits (`Resolve`, `SearchNames`, `GetUpdates`, ...).
    pub filters: u64,
    /// Transaction-flag bits (`InstallPackages`, `RemovePackages`, ...).
    pub tx_flags: u64,
    /// Package-id wire strings.
    pub package_ids: Vec<String>,
    /// A single package-id wire string (`InstallSignature`).
    pub package_id: Option<String>,
    /// Local file paths (`InstallFiles`, `GetDetailsLocal`, ...).
    pub files: Vec<String>,
    /// Free-text search terms.
    pub search_terms: Vec<String>,
    /// Destination directory (`DownloadPackages`).
    pub directory: Option<String>,
    /// `store-in-cache` / `force` / `recursive` / `allow-deps` /
    /// `autoremove` / `enabled` flags, reused across roles per §6.2.
    pub force: bool,
    /// See [`Self::force`].
    pub recursive: bool,
    /// See [`Self::force`].
    pub allow_deps: bool,
    /// See [`Self::force`].
    pub autoremove: bool,
    /// `RepoEnable`'s enabled flag.
    pub enabled: Option<bool>,
    /// Repository identifier (`RepoEnable`/`RepoSetData`/`RepoRemove`).
    pub repo_id: Option<String>,
    /// Repository parameter name (`RepoSetData`).
    pub parameter: Option<String>,
    /// Repository parameter value (`RepoSetData`).
    pub value: Option<String>,
    /// Target distribution id (`UpgradeSystem`).
    pub distro_id: Option<String>,
    /// Upgrade aggressiveness wire token (`UpgradeSystem`).
    pub upgrade_kind: Option<String>,
    /// EULA identifier (`AcceptEula`).
    pub eula_id: Option<String>,
    /// Signature scheme wire token (`InstallSignature`).
    pub sig_type: Option<String>,
    /// Signing key identifier (`InstallSignature`).
    pub key_id: Option<String>,
    /// Result-count limit (`GetOldTransactions`).
    pub number: Option<u64>,
}

impl RoleRequest {
    /// Convert a raw wire request into a typed [`RoleInput`].
    ///
    /// This only performs *parsing* (bitfields, package-ids, enum
    /// tokens); the role-specific required-field checks happen later, in
    /// [`swb_transaction::validate::validate_role_input`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::PackageIdInvalid`], [`ErrorCode::FilterInvalid`],
    /// or [`ErrorCode::InputInvalid`] if a field fails to parse.
    pub fn into_role_input(self) -> Result<RoleInput, BrokerError> {
        let package_ids = self
            .package_ids
            .iter()
            .map(|s| PackageId::from_str(s).map_err(|e| BrokerError::new(ErrorCode::PackageIdInvalid, e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let package_id = self
            .package_id
            .map(|s| PackageId::from_str(&s).map_err(|e| BrokerError::new(ErrorCode::PackageIdInvalid, e.to_string())))
            .transpose()?;
        let sig_type = self
            .sig_type
            .map(|s| {
                SigType::from_wire_token(&s).ok_or_else(|| BrokerError::new(ErrorCode::InputInvalid, format!("unknown sig-type: {s}")))
            })
            .transpose()?;
        let upgrade_kind = self
            .upgrade_kind
            .map(|s| {
                UpgradeKind::from_wire_token(&s)
                    .ok_or_else(|| BrokerError::new(ErrorCode::InputInvalid, format!("unknown upgrade-kind: {s}")))
            })
            .transpose()?;

        Ok(RoleInput {
            filters: swb_transaction::validate::validate_filters(self.filters)?,
            transaction_flags: swb_transaction::validate::validate_transaction_flags(self.tx_flags)?,
            package_ids,
            files: self.files.into_iter().map(PathBuf::from).collect(),
            search_terms: self.search_terms,
            directory: self.directory.map(PathBuf::from),
            force: self.force,
            recursive: self.recursive,
            allow_deps: self.allow_deps,
            autoremove: self.autoremove,
            repo_id: self.repo_id,
            parameter: self.parameter,
            value: self.value,
            enabled: self.enabled,
            distro_id: self.distro_id,
            upgrade_kind,
            eula_id: self.eula_id,
            sig_type,
            key_id: self.key_id,
            package_id,
            number: self.number,
        })
    }
}

/// Snapshot of the control surface's read-only properties (spec §4.7).
#[derive(Debug, Clone, Serialize)]
pub struct ControlStatus {
    /// See [`crate::state::DaemonState::backend_name`].
    pub backend_name: String,
    /// See [`crate::state::DaemonState::backend_description`].
    pub backend_description: String,
    /// See [`crate::state::DaemonState::backend_author`].
    pub backend_author: String,
    /// Roles the active backend declares support for, as wire tokens.
    pub roles: Vec<String>,
    /// MIME types the active backend can install directly.
    pub mime_types: Vec<String>,
    /// Broker version `major.minor.micro`.
    pub version: (u32, u32, u32),
    /// Whether the package database is locked by another process.
    pub locked: bool,
    /// Current network reachability.
    pub network_state: swb_core::NetworkState,
    /// Distribution identifier.
    pub distro_id: String,
    /// Whether any transaction is currently running or queued.
    pub idle: bool,
}

/// Snapshot of one transaction's lifecycle/progress state (spec §3.4,
/// §3.5, §6.3 properties-changed keys).
#[derive(Debug, Clone, Serialize)]
pub struct TransactionSnapshot {
    /// Current lifecycle state.
    pub state: &'static str,
    /// The role this transaction runs.
    pub role: String,
    /// Backend-reported status.
    pub status: Status,
    /// Overall completion, `0..=100` or `101` for unknown (spec §6.4).
    pub percentage: u32,
    /// Whether cancellation is currently possible.
    pub allow_cancel: bool,
    /// Requesting uid.
    pub uid: u32,
    /// Opaque caller/session identifier.
    pub sender: String,
    /// The error code and details, if the transaction failed.
    pub error: Option<(ErrorCode, String)>,
    /// The transaction's terminal exit, if it has finished.
    pub exit: Option<swb_core::Exit>,
}

impl TransactionSnapshot {
    pub(crate) fn from_transaction(txn: &Transaction) -> Self {
        let progress = txn.progress().snapshot();
        Self {
            state: match txn.state() {
                State::New => "new",
                State::Setup => "setup",
                State::WaitingForAuth => "waiting-for-auth",
                State::Waiting => "waiting",
                State::Running => "running",
                State::Finished => "finished",
            },
            role: txn.role().wire_token(),
            status: progress.status,
            percentage: progress.percentage.wire_value(),
            allow_cancel: progress.allow_cancel,
            uid: txn.uid(),
            sender: txn.sender().to_string(),
            error: txn.results().error().map(|e| (e.code, e.details.clone())),
            exit: txn.results().exit_code(),
        }
    }
}
