// SPDX-License-Identifier: MIT OR Apache-2.0
//! Result record types (spec §3.3). Every record is immutable once built —
//! a transaction appends it to its [`crate::ResultsContainer`] and forwards
//! the same data as a bus signal; there is no mutation path afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swb_core::{
    DistroUpgradeState, InfoAndSeverity, MediaType, PackageId, Percentage, RestartRequired, Role,
    SigType, Status, UpdateState,
};
use swb_error::ErrorCode;
use uuid::Uuid;

/// Common prefix carried by every record produced during a transaction:
/// which role emitted it and which transaction it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// The role of the transaction that produced this record.
    pub role: Role,
    /// The transaction's id.
    pub transaction_id: Uuid,
}

/// A package mention: identity, info/severity, and a short summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Record provenance.
    pub source: Source,
    /// The package being described.
    pub package_id: PackageId,
    /// What kind of mention this is (installed, available, an update's
    /// severity, ...).
    pub info: InfoAndSeverity,
    /// Short, one-line human-readable summary.
    pub summary: String,
}

/// Full descriptive detail for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    /// Record provenance.
    pub source: Source,
    /// The package being described.
    pub package_id: PackageId,
    /// License identifier/expression.
    pub license: String,
    /// Package category.
    pub group: swb_core::Group,
    /// Long-form description.
    pub description: String,
    /// Project homepage, if known.
    pub url: String,
    /// Installed size in bytes.
    pub size: u64,
    /// Download size in bytes, if it differs from `size` and is known
    /// (spec §5 `details-with-deps-size` hint may populate this with the
    /// transitive total).
    pub download_size: Option<u64>,
}

/// Changelog and update metadata for a pending update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetail {
    /// Record provenance.
    pub source: Source,
    /// The package being updated.
    pub package_id: PackageId,
    /// Package-ids this update supersedes.
    pub updates: Vec<PackageId>,
    /// Package-ids this update makes obsolete.
    pub obsoletes: Vec<PackageId>,
    /// Upstream vendor URLs.
    pub vendor_urls: Vec<String>,
    /// Bugzilla (or equivalent tracker) URLs.
    pub bugzilla_urls: Vec<String>,
    /// CVE URLs addressed by this update.
    pub cve_urls: Vec<String>,
    /// Restart required after applying, if any.
    pub restart: RestartRequired,
    /// Free-text update description.
    pub update_text: String,
    /// Raw changelog text.
    pub changelog: String,
    /// Repository state the update comes from.
    pub state: UpdateState,
    /// When the update was issued.
    pub issued: Option<DateTime<Utc>>,
    /// When the update was last revised.
    pub updated: Option<DateTime<Utc>>,
}

/// The files owned by one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Files {
    /// Record provenance.
    pub source: Source,
    /// The package being described.
    pub package_id: PackageId,
    /// Absolute paths owned by the package.
    pub files: Vec<String>,
}

/// A package category/group, possibly nested under a parent category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Record provenance.
    pub source: Source,
    /// Parent category id, empty for a top-level category.
    pub parent_id: String,
    /// This category's own id.
    pub cat_id: String,
    /// Display name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Icon name/path.
    pub icon: String,
}

/// A configured software repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDetail {
    /// Record provenance.
    pub source: Source,
    /// Repository identifier.
    pub repo_id: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the repository is currently enabled.
    pub enabled: bool,
}

/// A package install is blocked on an untrusted repository signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSignatureRequired {
    /// Record provenance.
    pub source: Source,
    /// The package whose repository needs a signature.
    pub package_id: PackageId,
    /// Name of the offending repository.
    pub repo_name: String,
    /// URL the key can be fetched from.
    pub key_url: String,
    /// Key user id string.
    pub key_userid: String,
    /// Key id.
    pub key_id: String,
    /// Key fingerprint.
    pub key_fingerprint: String,
    /// Key creation timestamp, as reported by the signing tool.
    pub key_timestamp: String,
    /// Signature scheme.
    pub sig_type: SigType,
}

/// A package install is blocked pending EULA acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EulaRequired {
    /// Record provenance.
    pub source: Source,
    /// Opaque EULA identifier (passed back to `accept-eula`).
    pub eula_id: String,
    /// The package requiring acceptance.
    pub package_id: PackageId,
    /// Vendor name.
    pub vendor_name: String,
    /// Full license agreement text.
    pub license_agreement: String,
}

/// A package install is blocked pending a physical media change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaChangeRequired {
    /// Record provenance.
    pub source: Source,
    /// Kind of media required.
    pub media_type: MediaType,
    /// Identifier of the specific medium (volume label, disc id, ...).
    pub media_id: String,
    /// Human-readable prompt text.
    pub media_text: String,
}

/// A package requires a restart of some scope after this transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireRestart {
    /// Record provenance.
    pub source: Source,
    /// Scope of the restart required.
    pub restart: RestartRequired,
    /// The package that triggered the requirement.
    pub package_id: PackageId,
}

/// An available distribution upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistroUpgrade {
    /// Record provenance.
    pub source: Source,
    /// Stability state of the upgrade target.
    pub state: DistroUpgradeState,
    /// Target distribution name/version.
    pub name: String,
    /// One-line summary.
    pub summary: String,
}

/// Per-item completion for the package currently being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgress {
    /// Record provenance.
    pub source: Source,
    /// The package currently being processed.
    pub package_id: PackageId,
    /// The backend status active while processing this item.
    pub status: Status,
    /// Completion percentage for this item (`0..=100`, or unknown).
    pub percentage: Percentage,
}

/// An error surfaced mid-transaction (distinct from the transaction's own
/// terminal failure, e.g. a per-package warning during a batch operation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Record provenance.
    pub source: Source,
    /// The stable error code.
    pub code: ErrorCode,
    /// Free-text elaboration.
    pub details: String,
}

/// One historical transaction, as persisted by the transaction database
/// (spec §3.3/§4.9). Carries its own `tid`/`role` rather than a [`Source`]
/// prefix, since it outlives the transaction it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPast {
    /// The historical transaction's id.
    pub tid: String,
    /// When the transaction started, in ISO-8601.
    pub timespec: DateTime<Utc>,
    /// Whether the transaction completed successfully.
    pub succeeded: bool,
    /// The role that ran.
    pub role: Role,
    /// Wall-clock duration, in milliseconds.
    pub duration_ms: u64,
    /// Implementation-opaque summary, typically a newline/tab-delimited
    /// listing of affected packages.
    pub data: String,
    /// Uid of the caller that requested the transaction.
    pub uid: u32,
    /// The caller's command line, if it could be determined.
    pub cmdline: String,
}
