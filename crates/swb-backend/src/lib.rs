// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-backend
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The plugin contract a package-management backend implements (spec
//! §4.4): a static [`identity::BackendIdentity`], a per-role entry point
//! that streams typed [`events::JobEvent`]s, and an optional cooperative
//! `cancel`.

mod events;
mod identity;
mod input;

pub use events::{JobEvent, JobHandle};
pub use identity::BackendIdentity;
pub use input::RoleInput;

use async_trait::async_trait;
use swb_core::{Exit, Role};
use swb_error::BrokerError;

/// A package-management backend.
///
/// At most one [`Backend::run`] call is in flight across the whole process
/// at any instant (spec §4.4 "single-writer"); the caller — not the
/// backend — enforces that by construction (see `swb-scheduler`), so a
/// `Backend` implementation may treat any private mutable state as
/// exclusively its own for the duration of a call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// This backend's static capability declaration.
    fn identity(&self) -> &BackendIdentity;

    /// Run one role's entry point to completion.
    ///
    /// Implementations must call [`JobHandle::finished`] exactly once,
    /// even on internal error — a `Backend` that returns without ever
    /// calling it has violated the contract, and the transaction layer
    /// treats that as `Exit::Failed` with an internal-error code.
    ///
    /// # Errors
    ///
    /// Returns an error only for a caller-side contract violation (an
    /// absent role was dispatched anyway); operational failures are
    /// reported through `job.finished(Exit::Failed)` plus an `error-code`
    /// event, not through this `Result`.
    async fn run(
        &self,
        job: JobHandle,
        role: Role,
        input: RoleInput,
    ) -> Result<(), BrokerError>;

    /// Ask a running operation to abort.
    ///
    /// The default implementation reports cancellation as infeasible,
    /// which tells the caller to let the operation run to its natural
    /// exit (spec §4.4 "If cancellation is infeasible ... the core still
    /// treats the operation as complete").
    async fn cancel(&self, _job: &JobHandle) -> bool {
        false
    }
}

/// Reject dispatching a role the backend never declared support for.
///
/// Spec §4.4: "Invoking an absent role from the transaction layer is a
/// programmer error and must be rejected before dispatch."
///
/// # Errors
///
/// Returns [`BrokerError`] with [`swb_error::ErrorCode::NotSupported`] if
/// `backend` has no entry point for `role`.
pub fn ensure_role_supported(backend: &dyn Backend, role: Role) -> Result<(), BrokerError> {
    if backend.identity().supports(role) {
        return Ok(());
    }
    Err(BrokerError::new(
        swb_error::ErrorCode::NotSupported,
        format!("backend '{}' has no entry point for role {role:?}", backend.identity().name),
    ))
}

/// Map a backend's failure to exit cleanly without ever calling
/// `finished` into a well-formed terminal state.
///
/// Used by the transaction layer as a last resort when a `Backend::run`
/// future itself errors or panics-and-is-caught before emitting
/// `finished` — the contract violation noted on [`Backend::run`].
#[must_use]
pub fn exit_for_contract_violation() -> Exit {
    Exit::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use swb_core::Filter;

    struct StubBackend(BackendIdentity);

    #[async_trait]
    impl Backend for StubBackend {
        fn identity(&self) -> &BackendIdentity {
            &self.0
        }

        async fn run(&self, job: JobHandle, _role: Role, _input: RoleInput) -> Result<(), BrokerError> {
            job.finished(Exit::Success);
            Ok(())
        }
    }

    fn stub() -> StubBackend {
        StubBackend(BackendIdentity {
            name: "stub".into(),
            description: "test backend".into(),
            author: "nobody".into(),
            roles: HashSet::from([Role::Resolve]),
            filters: Filter::empty(),
            groups: HashSet::new(),
            mime_types: Vec::new(),
        })
    }

    #[test]
    fn ensure_role_supported_rejects_absent_role() {
        let backend = stub();
        assert!(ensure_role_supported(&backend, Role::Resolve).is_ok());
        assert!(ensure_role_supported(&backend, Role::InstallPackages).is_err());
    }

    #[tokio::test]
    async fn run_emits_finished_through_job_handle() {
        let backend = stub();
        let (job, mut rx) = JobHandle::channel();
        backend.run(job, Role::Resolve, RoleInput::default()).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, JobEvent::Finished(Exit::Success)));
    }
}
