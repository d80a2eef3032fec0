// SPDX-License-Identifier: MIT OR Apache-2.0
//! The parameter bag passed into a backend entry point (spec §4.4).
//!
//! Roles only ever read the handful of fields relevant to them; the
//! transaction layer is responsible for populating those (role dispatch
//! validation happens before the backend ever sees a `RoleInput`, per
//! spec §4.5).

use std::path::PathBuf;
use swb_core::{Filter, PackageId, SigType, TransactionFlag, UpgradeKind};

/// Role-specific parameters for one backend entry-point call.
#[derive(Debug, Clone, Default)]
pub struct RoleInput {
    /// Filter bits constraining a listing/search role.
    pub filters: Filter,
    /// Flags controlling a mutating role's behavior.
    pub transaction_flags: TransactionFlag,
    /// Package identifiers the role operates on.
    pub package_ids: Vec<PackageId>,
    /// Local file paths the role operates on (already staged native
    /// paths; see spec §4.5 non-native file handling).
    pub files: Vec<PathBuf>,
    /// Free-text search terms.
    pub search_terms: Vec<String>,
    /// A target directory (e.g. `download-packages`'s destination).
    pub directory: Option<PathBuf>,
    /// Force the operation even if the backend would otherwise refuse.
    pub force: bool,
    /// Recurse into dependencies/sub-trees.
    pub recursive: bool,
    /// Pull in missing dependencies automatically.
    pub allow_deps: bool,
    /// Remove now-unneeded dependencies after the operation.
    pub autoremove: bool,
    /// A repository identifier (`repo-*` roles).
    pub repo_id: Option<String>,
    /// A repo parameter name (`repo-set-data`).
    pub parameter: Option<String>,
    /// A repo parameter value (`repo-set-data`).
    pub value: Option<String>,
    /// Enable/disable flag (`repo-enable`).
    pub enabled: Option<bool>,
    /// Target distribution id (`get-distro-upgrades`-adjacent roles).
    pub distro_id: Option<String>,
    /// Requested upgrade aggressiveness (`upgrade-system`).
    pub upgrade_kind: Option<UpgradeKind>,
    /// The EULA being responded to (`accept-eula`).
    pub eula_id: Option<String>,
    /// Signature scheme (`install-signature`).
    pub sig_type: Option<SigType>,
    /// Key identifier (`install-signature`).
    pub key_id: Option<String>,
    /// A single package identifier, for roles that take exactly one.
    pub package_id: Option<PackageId>,
    /// A numeric parameter (`get-old-transactions`'s result-count limit).
    pub number: Option<u64>,
}
