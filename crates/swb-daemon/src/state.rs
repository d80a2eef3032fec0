// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared daemon state: the transaction registry, the admission scheduler,
//! the configured backend/policy, and the transaction history database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use swb_backend::Backend;
use swb_config::{BrokerConfig, ProxyHints};
use swb_core::{NetworkState, Role};
use swb_error::{BrokerError, ErrorCode};
use swb_policy::{Decision, PolicyEngine};
use swb_results::TransactionPast;
use swb_scheduler::{Kind, Tid, TransactionList};
use swb_transaction::Transaction;
use swb_txndb::TransactionDb;
use tokio::sync::{oneshot, Mutex, RwLock};

/// One allocated transaction together with the scheduler bookkeeping the
/// daemon needs to admit it later.
pub(crate) struct TxnEntry {
    pub(crate) txn: Mutex<Transaction>,
    pub(crate) tid: Tid,
    pub(crate) kind: Kind,
}

/// Everything the control surface reports about itself (spec §4.7
/// properties). Pinned at startup; a real backend discovery step would
/// populate this from the loaded plugin rather than a constant.
pub struct DaemonState {
    /// Human-readable backend name.
    pub backend_name: String,
    /// One-line backend description.
    pub backend_description: String,
    /// Backend author/maintainer string.
    pub backend_author: String,
    /// Broker version, major component.
    pub version_major: u32,
    /// Broker version, minor component.
    pub version_minor: u32,
    /// Broker version, micro component.
    pub version_micro: u32,
    /// Whether the package database is currently locked by another
    /// process (e.g. a concurrent non-broker package manager invocation).
    pub locked: bool,
    /// Current network reachability, as probed by an external collaborator
    /// (spec §1); updated via [`AppState::set_network_state`].
    pub network_state: RwLock<NetworkState>,
    /// Distribution identifier string (e.g. `"fedora-42"`).
    pub distro_id: String,
}

impl Default for DaemonState {
    fn default() -> Self {
        Self {
            backend_name: "mock".to_string(),
            backend_description: "in-memory reference backend".to_string(),
            backend_author: "swbrokerd contributors".to_string(),
            version_major: 0,
            version_minor: 1,
            version_micro: 0,
            locked: false,
            network_state: RwLock::new(NetworkState::Online),
            distro_id: "unknown".to_string(),
        }
    }
}

/// Shared daemon state handed to every Axum handler.
pub struct AppState {
    pub(crate) config: RwLock<BrokerConfig>,
    pub(crate) daemon: DaemonState,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) policy: Arc<dyn PolicyEngine>,
    pub(crate) txndb: Arc<TransactionDb>,
    pub(crate) scheduler: Mutex<TransactionList>,
    pub(crate) registry: RwLock<HashMap<String, Arc<TxnEntry>>>,
    pub(crate) waiters: Mutex<HashMap<String, oneshot::Sender<()>>>,
    pub(crate) started_at: chrono::DateTime<Utc>,
}

impl AppState {
    /// Build fresh daemon state around an already-open transaction
    /// database and a backend/policy pair.
    #[must_use]
    pub fn new(
        config: BrokerConfig,
        backend: Arc<dyn Backend>,
        policy: Arc<dyn PolicyEngine>,
        txndb: Arc<TransactionDb>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            daemon: DaemonState::default(),
            backend,
            policy,
            txndb,
            scheduler: Mutex::new(TransactionList::new()),
            registry: RwLock::new(HashMap::new()),
            waiters: Mutex::new(HashMap::new()),
            started_at: Utc::now(),
        }
    }

    /// Update the probed network state (spec §4.7 `network-state`
    /// property / `NetworkStateChanged` signal). Emission of the signal
    /// itself is left to the transport layer that calls this, matching
    /// how properties-changed delivery is a bus concern, not a core one.
    pub async fn set_network_state(&self, state: NetworkState) {
        *self.daemon.network_state.write().await = state;
    }

    /// `GetTid`: allocate a fresh transaction and register it.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` is reserved for a future quota or
    /// resource-exhaustion check (spec §4.6 admission policy).
    pub async fn get_tid(&self, role: Role, uid: u32, sender: &str) -> Result<String, BrokerError> {
        let mut scheduler = self.scheduler.lock().await;
        let tid = scheduler.allocate_tid();
        drop(scheduler);
        let path = tid.to_string();
        let kind = if swb_core::is_write_role(role) { Kind::Write } else { Kind::Read };
        let staging_dir = std::env::temp_dir().join("swbrokerd").join(&path.trim_start_matches('/').replace('/', "_"));
        let txn = Transaction::new(role, uid, sender, staging_dir);
        let entry = Arc::new(TxnEntry { txn: Mutex::new(txn), tid, kind });
        self.registry.write().await.insert(path.clone(), entry);
        Ok(path)
    }

    async fn entry(&self, tid: &str) -> Result<Arc<TxnEntry>, BrokerError> {
        self.registry
            .read()
            .await
            .get(tid)
            .cloned()
            .ok_or_else(|| BrokerError::new(ErrorCode::NoSuchTransaction, format!("no such transaction: {tid}")))
    }

    /// `SetHints`: move a transaction from `NEW` to `SETUP`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NoSuchTransaction`] if `tid` is unknown, or
    /// whatever [`swb_transaction::Transaction::begin_setup`] returns.
    pub async fn set_hints(&self, tid: &str, hints: &[String]) -> Result<(), BrokerError> {
        let entry = self.entry(tid).await?;
        let mut txn = entry.txn.lock().await;
        txn.begin_setup(hints.iter().map(String::as_str))
    }

    /// Submit role-specific input, authorize, and — once authorized —
    /// hand the transaction to the admission scheduler. Returns as soon
    /// as the transaction is queued or admitted; dispatch against the
    /// backend happens on a spawned task (spec §6.2: the method call
    /// itself returns immediately).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NoSuchTransaction`] if `tid` is unknown, or an
    /// input-validation/authorization error from the transaction layer.
    pub async fn submit(self: &Arc<Self>, tid: &str, role: Role, input: swb_backend::RoleInput) -> Result<(), BrokerError> {
        let entry = self.entry(tid).await?;
        {
            let mut txn = entry.txn.lock().await;
            txn.submit_input(input).await?;
            if txn.state() == swb_transaction::State::WaitingForAuth {
                txn.authorize(self.policy.as_ref()).await?;
            }
        }
        self.schedule(tid.to_string(), entry, role).await;
        Ok(())
    }

    async fn schedule(self: &Arc<Self>, tid: String, entry: Arc<TxnEntry>, role: Role) {
        let finished_already = { entry.txn.lock().await.state() == swb_transaction::State::Finished };
        if finished_already {
            self.record_history(&tid, &entry, role).await;
            return;
        }

        let admission = {
            let mut scheduler = self.scheduler.lock().await;
            scheduler.request_admission(entry.tid.clone(), entry.kind)
        };
        match admission {
            // Spawned rather than awaited in-line: spec §6.2 the role call
            // itself returns as soon as the transaction is queued or
            // admitted, not once the backend run finishes.
            swb_scheduler::Admission::Admitted => {
                let this = self.clone();
                tokio::spawn(async move {
                    this.admit_and_run(tid, entry, role).await;
                });
            }
            swb_scheduler::Admission::Queued => {
                let (tx, rx) = oneshot::channel();
                self.waiters.lock().await.insert(tid.clone(), tx);
                let this = self.clone();
                tokio::spawn(async move {
                    if rx.await.is_ok() {
                        this.admit_and_run(tid, entry, role).await;
                    }
                });
            }
        }
    }

    /// Admit `entry` and drive its backend run to completion.
    ///
    /// Spec §5 forbids holding a lock across a suspension point, so unlike
    /// a naive single `lock().await` wrapping the whole run, this only
    /// takes `entry.txn`'s lock for the short, synchronous steps: `admit`,
    /// `begin_dispatch`, one `apply_job_event`/`record_run_error` call per
    /// backend event, and the final `finish_dispatch`. Every await in
    /// between (waiting on the backend's event stream or its own future)
    /// happens with the lock released, so [`Self::cancel`] and
    /// [`Self::snapshot`] can still reach this same transaction while it
    /// runs.
    async fn admit_and_run(self: &Arc<Self>, tid: String, entry: Arc<TxnEntry>, role: Role) {
        let backend = self.backend.clone();

        let setup = {
            let mut txn = entry.txn.lock().await;
            if let Err(e) = txn.admit() {
                tracing::warn!(tid = %tid, error = %e.message, "admit() failed unexpectedly");
                return;
            }
            match txn.begin_dispatch(backend.as_ref()) {
                Ok(setup) => setup,
                Err(e) => {
                    tracing::warn!(tid = %tid, error = %e.message, "begin_dispatch() rejected the role");
                    return;
                }
            }
        };

        let swb_transaction::DispatchSetup { job, mut rx, cancel_job, cancel_signal, role: dispatch_role, input } =
            setup;
        let run_fut = backend.run(job, dispatch_role, input);
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
                            tracing::debug!(tid = %tid, "backend reports cancellation infeasible");
                        }
                    }
                }
                res = &mut run_fut, if !run_done => {
                    run_done = true;
                    if let Err(e) = res {
                        tracing::warn!(tid = %tid, code = %e.code, message = %e.message, "backend run() returned an error");
                        entry.txn.lock().await.record_run_error(e);
                    }
                }
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(swb_backend::JobEvent::Finished(e)) => {
                            exit = Some(e);
                            cancel_job = None;
                        }
                        Some(event) => entry.txn.lock().await.apply_job_event(event),
                        None => break,
                    }
                }
            }
        }

        let exit = exit.unwrap_or_else(swb_backend::exit_for_contract_violation);
        entry.txn.lock().await.finish_dispatch(exit);
        tracing::info!(tid = %tid, role = ?role, exit = ?exit, "transaction finished");

        self.record_history(&tid, &entry, role).await;

        let next = {
            let mut scheduler = self.scheduler.lock().await;
            scheduler.complete(&entry.tid)
        };
        if let Some(next_tid) = next {
            let mut waiters = self.waiters.lock().await;
            if let Some(tx) = waiters.remove(&next_tid.to_string()) {
                let _ = tx.send(());
            }
        }
    }

    async fn record_history(&self, tid: &str, entry: &Arc<TxnEntry>, role: Role) {
        let txn = entry.txn.lock().await;
        let Some(exit) = txn.results().exit_code() else { return };
        let record = TransactionPast {
            tid: tid.to_string(),
            timespec: Utc::now(),
            succeeded: exit == swb_core::Exit::Success,
            role,
            duration_ms: txn.progress().snapshot().elapsed_time * 1000,
            data: txn
                .results()
                .packages()
                .iter()
                .map(|p| p.package_id.to_string())
                .collect::<Vec<_>>()
                .join("\t"),
            uid: txn.uid(),
            cmdline: String::new(),
        };
        if let Err(e) = self.txndb.append(record).await {
            tracing::warn!(tid = %tid, error = %e, "failed to persist transaction history");
        }
    }

    /// `Cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NoSuchTransaction`] if `tid` is unknown, or
    /// whatever [`swb_transaction::Transaction::request_cancel`] returns.
    pub async fn cancel(&self, tid: &str) -> Result<(), BrokerError> {
        let entry = self.entry(tid).await?;
        let mut txn = entry.txn.lock().await;
        let was_queued = txn.state() == swb_transaction::State::Waiting;
        txn.request_cancel()?;
        if was_queued {
            self.scheduler.lock().await.withdraw_queued(&entry.tid);
        }
        Ok(())
    }

    /// Snapshot a transaction's current lifecycle/progress state.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NoSuchTransaction`] if `tid` is unknown.
    pub async fn snapshot(&self, tid: &str) -> Result<crate::wire::TransactionSnapshot, BrokerError> {
        let entry = self.entry(tid).await?;
        let txn = entry.txn.lock().await;
        Ok(crate::wire::TransactionSnapshot::from_transaction(&txn))
    }

    /// `CanAuthorize`.
    pub async fn can_authorize(&self, role: Role, uid: u32) -> Decision {
        self.policy.check(role, uid, false).await
    }

    /// `SetProxy`.
    pub async fn set_proxy(&self, uid: u32, hints: ProxyHints) {
        self.config.write().await.set_proxy(uid, hints);
    }

    /// `GetTimeSinceAction`.
    pub async fn time_since_action(&self, role: Role) -> Option<i64> {
        self.txndb.seconds_since_last(role, Utc::now()).await
    }

    /// `SuggestDaemonQuit`: `true` if no transaction is in flight or
    /// queued, meaning the supervisor may tear the process down.
    pub async fn may_quit(&self) -> bool {
        self.scheduler.lock().await.is_idle()
    }

    /// `GetDaemonState`: an opaque debug dump (spec §4.7).
    pub async fn debug_state(&self) -> String {
        let registry = self.registry.read().await;
        let idle = self.scheduler.lock().await.is_idle();
        format!(
            "uptime_secs={} transactions={} idle={idle}",
            (Utc::now() - self.started_at).num_seconds(),
            registry.len()
        )
    }
}
