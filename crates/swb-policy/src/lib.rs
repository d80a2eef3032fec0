// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-policy
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The authorization check a transaction awaits while in
//! `WAITING_FOR_AUTH` (spec §4.5), and the `CanAuthorize` query exposed on
//! the control surface (spec §4.7).

use async_trait::async_trait;
use swb_core::Role;

/// Result of an authorization check.
///
/// Mirrors the three-valued `CanAuthorize` result on the control surface
/// (spec §4.7): a caller may already be authorized, may be refused
/// outright, or may be able to obtain authorization interactively (e.g. a
/// polkit-style prompt) if `interactive` was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The caller is authorized; proceed to `WAITING`.
    Allow,
    /// The caller is not authorized and no interactive path exists.
    Deny,
    /// The caller could be authorized via an interactive prompt.
    Interactive,
}

/// Pluggable authorization mechanism.
///
/// A real deployment backs this with whatever privilege-escalation
/// framework the host platform provides; tests and the reference daemon
/// configuration use [`AllowAll`] or [`DenyAll`].
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Decide whether `uid` may run `role`.
    ///
    /// `interactive` mirrors the `interactive` hint (spec §4.5): if the
    /// caller declared it cannot handle an interactive prompt, a engine
    /// that would otherwise return `Interactive` should resolve eagerly
    /// to `Allow` or `Deny` instead.
    async fn check(&self, role: Role, uid: u32, interactive: bool) -> Decision;
}

/// `true` if `role` requires a policy check before admission.
///
/// The reference policy requires authorization for every WRITE role
/// (spec §4.6 defines the WRITE/READ split); READ roles never pause in
/// `WAITING_FOR_AUTH`.
#[must_use]
pub fn requires_authorization(role: Role) -> bool {
    swb_core::is_write_role(role)
}

/// A policy engine that allows every request. Used in tests and in
/// single-user/trusted deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PolicyEngine for AllowAll {
    async fn check(&self, _role: Role, _uid: u32, _interactive: bool) -> Decision {
        Decision::Allow
    }
}

/// A policy engine that denies every request requiring authorization.
/// Used in tests exercising the `WAITING_FOR_AUTH → FINISHED(failed)`
/// path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl PolicyEngine for DenyAll {
    async fn check(&self, _role: Role, _uid: u32, _interactive: bool) -> Decision {
        Decision::Deny
    }
}

/// A policy engine backed by a fixed per-uid allow-list, for a "root plus
/// a trusted admin group" deployment.
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    allowed_uids: std::collections::HashSet<u32>,
}

impl AllowListPolicy {
    /// Build a policy that allows exactly `allowed_uids`.
    #[must_use]
    pub fn new(allowed_uids: impl IntoIterator<Item = u32>) -> Self {
        Self { allowed_uids: allowed_uids.into_iter().collect() }
    }
}

#[async_trait]
impl PolicyEngine for AllowListPolicy {
    async fn check(&self, _role: Role, uid: u32, interactive: bool) -> Decision {
        if uid == 0 || self.allowed_uids.contains(&uid) {
            Decision::Allow
        } else if interactive {
            Decision::Interactive
        } else {
            Decision::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_write_roles_require_authorization() {
        assert!(requires_authorization(Role::InstallPackages));
        assert!(!requires_authorization(Role::Resolve));
    }

    #[tokio::test]
    async fn allow_list_grants_root_and_listed_uids() {
        let policy = AllowListPolicy::new([1000]);
        assert_eq!(policy.check(Role::InstallPackages, 0, false).await, Decision::Allow);
        assert_eq!(policy.check(Role::InstallPackages, 1000, false).await, Decision::Allow);
        assert_eq!(policy.check(Role::InstallPackages, 2000, false).await, Decision::Deny);
        assert_eq!(policy.check(Role::InstallPackages, 2000, true).await, Decision::Interactive);
    }
}
