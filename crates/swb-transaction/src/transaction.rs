// SPDX-License-Identifier: MIT OR Apache-2.0
//! The per-transaction state machine (spec §4.5, §3.5): `NEW` → `SETUP` →
//! (`WAITING_FOR_AUTH` →) `WAITING` → `RUNNING` → `FINISHED`. One
//! [`Transaction`] owns exactly one role's worth of work, from the moment a
//! client calls a role method through to the terminal `Finished` signal.

use std::path::PathBuf;
use std::sync::Arc;

use swb_backend::{ensure_role_supported, exit_for_contract_violation, Backend, JobEvent, JobHandle, RoleInput};
use swb_core::{Exit, Role, Status};
use swb_error::{BrokerError, ErrorCode};
use swb_policy::{Decision, PolicyEngine};
use swb_progress::Progress;
use swb_results::{ErrorRecord, Record, ResultsContainer, Source};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::hints::Hints;
use crate::validate;

/// Everything a caller needs to run a backend entry point and drive its
/// event stream without holding this transaction's lock for the duration
/// (spec §5). Produced by [`Transaction::begin_dispatch`].
pub struct DispatchSetup {
    /// Handle passed to `Backend::run` as its emission sink.
    pub job: JobHandle,
    /// The paired receiver to drain for [`JobEvent`]s.
    pub rx: UnboundedReceiver<JobEvent>,
    /// Clone of `job`, kept aside to pass to `Backend::cancel`.
    pub cancel_job: JobHandle,
    /// Notified when [`Transaction::request_cancel`] is called while
    /// `Running`.
    pub cancel_signal: Arc<Notify>,
    /// The role to invoke `Backend::run` with.
    pub role: Role,
    /// The validated input to invoke `Backend::run` with.
    pub input: RoleInput,
}

/// Lifecycle state of a [`Transaction`] (spec §3.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Allocated, no role method called yet.
    New,
    /// Role method called; validating parameters.
    Setup,
    /// Validated; blocked on an authorization decision.
    WaitingForAuth,
    /// Validated and authorized (if required); queued for the scheduler.
    Waiting,
    /// Admitted; the backend entry point is executing.
    Running,
    /// Terminal: the transaction will not run again.
    Finished,
}

/// One package-management operation, from submission to completion.
///
/// A `Transaction` does not itself enforce the single-WRITE mutual
/// exclusion rule — that is `swb-scheduler`'s job. It only refuses to
/// leave `Waiting` via [`Self::admit`] before the caller says so.
pub struct Transaction {
    id: Uuid,
    role: Role,
    uid: u32,
    sender: String,
    state: State,
    hints: Hints,
    input: RoleInput,
    staging_dir: PathBuf,
    progress: Progress,
    results: ResultsContainer,
    cancel_signal: Arc<Notify>,
    cancel_requested: bool,
}

impl Transaction {
    /// Allocate a new transaction in state `New`.
    ///
    /// `staging_dir` is where non-native input files get copied during
    /// [`Self::submit_input`] (spec §4.5).
    #[must_use]
    pub fn new(role: Role, uid: u32, sender: impl Into<String>, staging_dir: impl Into<PathBuf>) -> Self {
        let id = Uuid::new_v4();
        let sender = sender.into();
        Self {
            id,
            role,
            uid,
            sender: sender.clone(),
            state: State::New,
            hints: Hints::default(),
            input: RoleInput::default(),
            staging_dir: staging_dir.into(),
            progress: Progress::new(id, role, uid, sender),
            results: ResultsContainer::new(),
            cancel_signal: Arc::new(Notify::new()),
            cancel_requested: false,
        }
    }

    /// This transaction's unique identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The role this transaction will execute.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The uid of the caller that requested this transaction.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Opaque caller/session identifier.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Live progress view (spec §3.4).
    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Accumulated results (spec §4.2).
    #[must_use]
    pub fn results(&self) -> &ResultsContainer {
        &self.results
    }

    /// The parsed hints this transaction was submitted with.
    #[must_use]
    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    fn source(&self) -> Source {
        Source { role: self.role, transaction_id: self.id }
    }

    /// Move from `New` to `Setup`, recording the caller's hints.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::TransactionError`] if called outside `New`.
    pub fn begin_setup<'a>(&mut self, hints: impl IntoIterator<Item = &'a str>) -> Result<(), BrokerError> {
        self.require_state(State::New)?;
        self.hints = Hints::parse(hints);
        self.state = State::Setup;
        self.progress.set_status(Status::Setup);
        Ok(())
    }

    /// Validate and record role-specific input, staging any non-native
    /// input files, then move on to either `WaitingForAuth` (if
    /// [`swb_policy::requires_authorization`] says so) or directly to
    /// `Waiting`.
    ///
    /// Per spec §7, input-validation and file-staging failures are never
    /// returned as a method error reply: they are recorded as an
    /// `ErrorCode` and immediately finish the transaction as `Failed`,
    /// exactly as a backend-reported failure would.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::TransactionError`] only if called outside
    /// `Setup` (a caller-contract violation, distinct from a business
    /// failure the transaction can finish itself).
    pub async fn submit_input(&mut self, input: RoleInput) -> Result<(), BrokerError> {
        self.require_state(State::Setup)?;
        if let Err(e) = validate::validate_role_input(self.role, &input) {
            self.fail_immediately(e.code, e.message);
            return Ok(());
        }
        let input = match self.stage_non_native_files(input).await {
            Ok(input) => input,
            Err(e) => {
                self.fail_immediately(e.code, e.message);
                return Ok(());
            }
        };
        self.input = input;
        self.progress.set_transaction_flags(self.input.transaction_flags);

        if swb_policy::requires_authorization(self.role) {
            self.state = State::WaitingForAuth;
            self.progress.set_status(Status::WaitingForAuth);
        } else {
            self.state = State::Waiting;
            self.progress.set_status(Status::Wait);
        }
        Ok(())
    }

    async fn stage_non_native_files(&self, mut input: RoleInput) -> Result<RoleInput, BrokerError> {
        let takes_local_files = matches!(self.role, Role::InstallFiles | Role::GetDetailsLocal | Role::GetFilesLocal);
        if takes_local_files && !input.files.is_empty() {
            input.files = validate::stage_files(&input.files, &self.staging_dir).await?;
        }
        Ok(input)
    }

    /// Resolve the pending authorization check (spec §4.5).
    ///
    /// `Decision::Interactive` leaves the transaction in `WaitingForAuth` —
    /// the caller is expected to drive an interactive prompt out of band
    /// and call this again with the caller's eventual `Allow`/`Deny`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::TransactionError`] if called outside
    /// `WaitingForAuth`.
    pub fn resolve_authorization(&mut self, decision: Decision) -> Result<(), BrokerError> {
        self.require_state(State::WaitingForAuth)?;
        match decision {
            Decision::Allow => {
                self.state = State::Waiting;
                self.progress.set_status(Status::Wait);
            }
            Decision::Deny => {
                self.fail_immediately(ErrorCode::NotAuthorized, "caller is not authorized for this role");
            }
            Decision::Interactive => {}
        }
        Ok(())
    }

    /// Ask `policy` whether this transaction's caller is authorized, and
    /// apply the result. A convenience wrapper around
    /// [`Self::resolve_authorization`] for callers that just hand the
    /// check off to a [`PolicyEngine`].
    ///
    /// # Errors
    ///
    /// As [`Self::resolve_authorization`].
    pub async fn authorize(&mut self, policy: &dyn PolicyEngine) -> Result<(), BrokerError> {
        let decision = policy.check(self.role, self.uid, self.hints.interactive).await;
        self.resolve_authorization(decision)
    }

    /// Move from `Waiting` to `Running`. Callers drive this once
    /// `swb-scheduler` admits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::TransactionError`] if called outside `Waiting`.
    pub fn admit(&mut self) -> Result<(), BrokerError> {
        self.require_state(State::Waiting)?;
        self.state = State::Running;
        self.progress.set_status(Status::Running);
        Ok(())
    }

    /// Begin dispatching the backend entry point (spec §5: "no lock may be
    /// held across a suspension point" — this is the synchronous half of
    /// what used to be a single `dispatch` call, so a caller holding this
    /// transaction behind a lock can release it before awaiting anything).
    ///
    /// The returned [`DispatchSetup`] carries everything the caller needs
    /// to run `backend.run(..)` and drive its event stream without further
    /// access to this transaction; feed each event back through
    /// [`Self::apply_job_event`], [`Self::record_run_error`], and finally
    /// [`Self::finish_dispatch`], re-acquiring the lock only for those
    /// short, synchronous calls.
    ///
    /// # Errors
    ///
    /// Returns an error only for a caller-side contract violation (an
    /// absent role dispatched anyway, or called outside `Running`).
    pub fn begin_dispatch(&mut self, backend: &dyn Backend) -> Result<DispatchSetup, BrokerError> {
        self.require_state(State::Running)?;
        ensure_role_supported(backend, self.role)?;

        let (job, rx) = JobHandle::channel();
        let cancel_job = job.clone();
        let cancel_signal = self.cancel_signal.clone();
        if self.cancel_requested {
            cancel_signal.notify_one();
        }

        Ok(DispatchSetup { job, rx, cancel_job, cancel_signal, role: self.role, input: self.input.clone() })
    }

    /// Run [`Self::begin_dispatch`] and drive it to completion inline,
    /// applying every event directly to `self`.
    ///
    /// This holds `self` for the whole backend run, so it suits tests and
    /// single-transaction embedders; `swb-daemon` does not use this — it
    /// drives [`DispatchSetup`] itself so the transaction registry's lock
    /// is only ever held across the short, synchronous calls to
    /// [`Self::apply_job_event`] and friends, never across the backend's
    /// own suspension points.
    ///
    /// # Errors
    ///
    /// As [`Self::begin_dispatch`].
    pub async fn dispatch(&mut self, backend: &dyn Backend) -> Result<Exit, BrokerError> {
        let DispatchSetup { job, mut rx, cancel_job, cancel_signal, role, input } = self.begin_dispatch(backend)?;
        let run_fut = backend.run(job, role, input);
        tokio::pin!(run_fut);
        let mut cancel_job = Some(cancel_job);
        let mut run_done = false;
        let mut exit = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel_signal.notified(), if cancel_job.is_some() => {
                    if let Some(job) = &cancel_job {
                        if !backend.cancel(job).await {
                            tracing::debug!(tid = %self.id, "backend reports cancellation infeasible");
                        }
                    }
                }
                res = &mut run_fut, if !run_done => {
                    run_done = true;
                    if let Err(e) = res {
                        tracing::warn!(tid = %self.id, code = %e.code, message = %e.message, "backend run() returned an error");
                        self.record_run_error(e);
                    }
                }
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(JobEvent::Finished(e)) => {
                            exit = Some(e);
                            cancel_job = None;
                        }
                        Some(event) => self.apply_job_event(event),
                        None => break,
                    }
                }
            }
        }
        Ok(self.finish_dispatch(exit.unwrap_or_else(exit_for_contract_violation)))
    }

    /// Apply one backend-emitted event to this transaction's live progress
    /// and results. Cheap and synchronous — meant to be called under a
    /// briefly-held lock, once per event, while the caller drives the
    /// event stream [`Self::begin_dispatch`] set up.
    pub fn apply_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Record(Record::Message(err)) => {
                self.results.set_error(err.clone());
                self.results.append(Record::Message(err));
            }
            JobEvent::Record(record) => self.results.append(record),
            JobEvent::SetPercentage(p) => {
                self.progress.set_percentage(p);
            }
            JobEvent::SetStatus(status) => self.progress.set_status(status),
            JobEvent::SetAllowCancel(allow) => self.progress.set_allow_cancel(allow),
            JobEvent::SetSpeed(speed) => self.progress.set_speed(speed),
            JobEvent::SetDownloadSizeRemaining(bytes) => self.progress.set_download_size_remaining(bytes),
            JobEvent::Finished(_) => unreachable!("Finished is intercepted before reaching apply_job_event"),
        }
    }

    /// Record a `Backend::run` future's own error, distinct from an
    /// `error-code` event the backend may also have emitted. A no-op if an
    /// error was already recorded, matching the "first error wins" rule
    /// `apply_job_event` follows for `JobEvent::Record(Record::Message)`.
    pub fn record_run_error(&mut self, e: BrokerError) {
        if self.results.error().is_none() {
            let record = ErrorRecord { source: self.source(), code: e.code, details: e.message };
            self.results.set_error(record.clone());
            self.results.append(Record::Message(record));
        }
    }

    /// Finalize dispatch with the backend's reported (or contract-violation
    /// defaulted) exit and move to `Finished`. Returns `exit` unchanged, for
    /// convenient chaining at the call site.
    pub fn finish_dispatch(&mut self, exit: Exit) -> Exit {
        self.finish(exit);
        exit
    }

    /// Request cancellation. Legal in any state but `Finished`; calling it
    /// again once already requested is a no-op.
    ///
    /// In `New`/`Setup`/`WaitingForAuth`/`Waiting` the transaction is
    /// finished immediately with [`Exit::Cancelled`]; in `Running` the
    /// request is forwarded to the backend cooperatively (spec §4.4 "If
    /// cancellation is infeasible ... the core still treats the operation
    /// as complete").
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::TransactionError`] if the transaction is
    /// already `Finished`.
    pub fn request_cancel(&mut self) -> Result<(), BrokerError> {
        if self.state == State::Finished {
            return Err(BrokerError::new(ErrorCode::TransactionError, "cannot cancel a finished transaction"));
        }
        if self.cancel_requested {
            return Ok(());
        }
        self.cancel_requested = true;
        if self.state == State::Running {
            self.cancel_signal.notify_one();
        } else {
            self.finish(Exit::Cancelled);
        }
        Ok(())
    }

    fn require_state(&self, expected: State) -> Result<(), BrokerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BrokerError::new(
                ErrorCode::TransactionError,
                format!("expected state {expected:?}, found {:?}", self.state),
            ))
        }
    }

    fn fail_immediately(&mut self, code: ErrorCode, details: impl Into<String>) {
        let record = ErrorRecord { source: self.source(), code, details: details.into() };
        self.results.set_error(record.clone());
        self.results.append(Record::Message(record));
        self.finish(Exit::Failed);
    }

    fn finish(&mut self, exit: Exit) {
        if self.state == State::Finished {
            return;
        }
        self.state = State::Finished;
        self.progress.set_status(Status::Finished);
        self.results.set_exit(exit);
        self.results.snapshot_progress(self.progress.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swb_backend_mock::{CatalogEntry, MockBackend};
    use swb_core::PackageId;
    use swb_policy::{AllowAll, DenyAll};

    fn vim() -> PackageId {
        PackageId::new("vim", "9.1", "x86_64", "").unwrap()
    }

    fn catalog() -> MockBackend {
        MockBackend::new(vec![CatalogEntry { package_id: vim(), summary: "text editor".into(), installed: false }])
    }

    async fn setup_read_transaction(staging: &std::path::Path) -> Transaction {
        let mut txn = Transaction::new(Role::Resolve, 1000, "session-1", staging);
        txn.begin_setup(["interactive=true"]).unwrap();
        let input = RoleInput { search_terms: vec!["vim".into()], ..Default::default() };
        txn.submit_input(input).await.unwrap();
        txn
    }

    #[tokio::test]
    async fn read_role_skips_authorization_entirely() {
        let staging = tempfile::tempdir().unwrap();
        let txn = setup_read_transaction(staging.path()).await;
        assert_eq!(txn.state(), State::Waiting);
    }

    #[tokio::test]
    async fn write_role_waits_for_authorization_then_runs() {
        let staging = tempfile::tempdir().unwrap();
        let mut txn = Transaction::new(Role::InstallPackages, 1000, "session-1", staging.path());
        txn.begin_setup([]).unwrap();
        let input = RoleInput { package_ids: vec![vim()], ..Default::default() };
        txn.submit_input(input).await.unwrap();
        assert_eq!(txn.state(), State::WaitingForAuth);

        txn.authorize(&AllowAll).await.unwrap();
        assert_eq!(txn.state(), State::Waiting);

        txn.admit().unwrap();
        assert_eq!(txn.state(), State::Running);

        let backend = catalog();
        let exit = txn.dispatch(&backend).await.unwrap();
        assert_eq!(exit, Exit::Success);
        assert_eq!(txn.state(), State::Finished);
        assert_eq!(txn.results().exit_code(), Some(Exit::Success));
        assert_eq!(txn.results().packages().len(), 1);
    }

    #[tokio::test]
    async fn denied_authorization_fails_the_transaction_without_dispatch() {
        let staging = tempfile::tempdir().unwrap();
        let mut txn = Transaction::new(Role::RemovePackages, 1000, "session-1", staging.path());
        txn.begin_setup([]).unwrap();
        let input = RoleInput { package_ids: vec![vim()], ..Default::default() };
        txn.submit_input(input).await.unwrap();

        txn.authorize(&DenyAll).await.unwrap();
        assert_eq!(txn.state(), State::Finished);
        assert_eq!(txn.results().exit_code(), Some(Exit::Failed));
        assert_eq!(txn.results().error().unwrap().code, ErrorCode::NotAuthorized);
    }

    #[tokio::test]
    async fn missing_package_ids_finishes_as_failed_input_invalid() {
        let staging = tempfile::tempdir().unwrap();
        let mut txn = Transaction::new(Role::InstallPackages, 1000, "session-1", staging.path());
        txn.begin_setup([]).unwrap();
        txn.submit_input(RoleInput::default()).await.unwrap();
        assert_eq!(txn.state(), State::Finished);
        assert_eq!(txn.results().exit_code(), Some(Exit::Failed));
        assert_eq!(txn.results().error().unwrap().code, ErrorCode::InputInvalid);
    }

    #[tokio::test]
    async fn cancel_while_waiting_finishes_immediately_as_cancelled() {
        let staging = tempfile::tempdir().unwrap();
        let mut txn = setup_read_transaction(staging.path()).await;
        txn.request_cancel().unwrap();
        assert_eq!(txn.state(), State::Finished);
        assert_eq!(txn.results().exit_code(), Some(Exit::Cancelled));
    }

    #[tokio::test]
    async fn cancel_after_finished_is_rejected() {
        let staging = tempfile::tempdir().unwrap();
        let mut txn = setup_read_transaction(staging.path()).await;
        txn.admit().unwrap();
        let backend = catalog();
        txn.dispatch(&backend).await.unwrap();
        assert!(txn.request_cancel().is_err());
    }

    #[tokio::test]
    async fn unknown_package_produces_package_not_found_error() {
        let staging = tempfile::tempdir().unwrap();
        let mut txn = Transaction::new(Role::InstallPackages, 0, "session-1", staging.path());
        txn.begin_setup([]).unwrap();
        let missing = PackageId::new("doesnotexist", "1", "noarch", "").unwrap();
        let input = RoleInput { package_ids: vec![missing], ..Default::default() };
        txn.submit_input(input).await.unwrap();
        txn.authorize(&AllowAll).await.unwrap();
        txn.admit().unwrap();

        let backend = catalog();
        let exit = txn.dispatch(&backend).await.unwrap();
        assert_eq!(exit, Exit::Failed);
        assert_eq!(txn.results().error().unwrap().code, ErrorCode::PackageNotFound);
    }
}
