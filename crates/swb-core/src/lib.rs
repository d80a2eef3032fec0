// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! swb-core
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The stable contract for the package broker: closed-set enumerations,
//! bitfields, the package identifier, and their wire encodings.
//!
//! If you only take one dependency from this workspace, take this one.

mod macros;

/// Bitfield enumerations: [`Filter`] and [`TransactionFlag`].
pub mod bitfield;
/// Closed-set enumerations: [`Role`], [`Status`], [`Exit`], [`Info`], etc.
pub mod enums;
/// `Info`/`UpdateSeverity` 32-bit co-encoding.
pub mod info_severity;
/// The `name;version;arch;data` package identifier.
pub mod package_id;
/// `0..=100` or "unknown" percentage encoding.
pub mod percentage;

pub use bitfield::{Filter, TransactionFlag};
pub use enums::{
    DistroUpgradeState, Exit, Group, Info, MediaType, NetworkState, ProvidesKind,
    RestartRequired, Role, SigType, Status, UpdateSeverity, UpgradeKind,
};
pub use info_severity::InfoAndSeverity;
pub use package_id::{PackageId, PackageIdError};
pub use percentage::Percentage;

/// Current contract version string embedded in all wire messages.
///
/// # Examples
///
/// ```
/// assert_eq!(swb_core::CONTRACT_VERSION, "swb/v1");
/// ```
pub const CONTRACT_VERSION: &str = "swb/v1";

/// `true` if `role` mutates system state and therefore must be serialized
/// against other WRITE transactions (spec §4.6).
///
/// READ roles (`resolve`, `search-*`, `get-*`, `what-provides`, `depends-on`,
/// `required-by`) may run concurrently with each other and with at most one
/// WRITE role.
#[must_use]
pub fn is_write_role(role: Role) -> bool {
    use Role::*;
    matches!(
        role,
        InstallFiles
            | InstallPackages
            | InstallSignature
            | RefreshCache
            | RemovePackages
            | UpdatePackages
            | RepoEnable
            | RepoSetData
            | RepoRemove
            | AcceptEula
            | UpgradeSystem
            | RepairSystem
            | DownloadPackages
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_roles_are_exactly_the_mutating_ones() {
        assert!(is_write_role(Role::InstallPackages));
        assert!(is_write_role(Role::DownloadPackages));
        assert!(!is_write_role(Role::Resolve));
        assert!(!is_write_role(Role::SearchName));
        assert!(!is_write_role(Role::GetUpdates));
    }
}
