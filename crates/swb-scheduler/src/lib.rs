// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-scheduler
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The transaction list and admission scheduler (spec §4.6): allocates
//! tids, tracks which transactions are admitted to run, and enforces the
//! single-WRITE mutual-exclusion rule. READ transactions are admitted on
//! arrival; WRITE transactions queue FIFO behind whichever WRITE is
//! currently running.

use std::collections::VecDeque;
use tokio::sync::watch;
use uuid::Uuid;

/// An opaque transaction identifier.
///
/// Spec §4.6 only guarantees uniqueness; the textual form ("an opaque
/// string path") is cosmetic, but bus objects are addressed by it, so it
/// is rendered as a path-shaped string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tid(String);

impl Tid {
    fn fresh() -> Self {
        Self(format!("/transactions/{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for Tid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an admitted transaction mutates system state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Must run alone relative to other `Write` transactions.
    Write,
    /// May run alongside any number of `Read` transactions and at most
    /// one `Write`.
    Read,
}

/// Outcome of requesting admission for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The transaction may move to RUNNING immediately.
    Admitted,
    /// The transaction must stay in WAITING; it will be admitted later
    /// when the current WRITE completes.
    Queued,
}

/// Owns every in-flight transaction id and decides admission order.
///
/// Spec §5: "The transaction list: sole mutator is the scheduler; everyone
/// else reads." All mutating methods take `&mut self` for that reason —
/// callers serialize access themselves (the core's single event loop, or
/// a mutex at the call site on a multi-threaded runtime).
pub struct TransactionList {
    write_running: Option<Tid>,
    write_queue: VecDeque<Tid>,
    read_running: std::collections::HashSet<Tid>,
    idle_tx: watch::Sender<bool>,
}

impl Default for TransactionList {
    fn default() -> Self {
        let (idle_tx, _) = watch::channel(true);
        Self { write_running: None, write_queue: VecDeque::new(), read_running: Default::default(), idle_tx }
    }
}

impl TransactionList {
    /// Create an empty, idle transaction list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, unique tid. Does not admit it for running.
    pub fn allocate_tid(&mut self) -> Tid {
        Tid::fresh()
    }

    /// Request admission for `tid` of the given `kind`.
    ///
    /// READ transactions are always `Admitted` immediately. WRITE
    /// transactions are `Admitted` only if no WRITE is currently running;
    /// otherwise they are queued FIFO and `Queued` is returned — the
    /// caller must wait for a later call to [`Self::admit_next_write`]
    /// (driven by [`Self::complete`]) naming this same tid.
    pub fn request_admission(&mut self, tid: Tid, kind: Kind) -> Admission {
        let result = match kind {
            Kind::Read => {
                self.read_running.insert(tid);
                Admission::Admitted
            }
            Kind::Write => {
                if self.write_running.is_none() {
                    self.write_running = Some(tid);
                    Admission::Admitted
                } else {
                    self.write_queue.push_back(tid);
                    Admission::Queued
                }
            }
        };
        self.update_idle();
        result
    }

    /// Mark `tid` as no longer running (its transaction reached
    /// `FINISHED`). If `tid` was the running WRITE, admits the next
    /// queued WRITE, if any, and returns it.
    pub fn complete(&mut self, tid: &Tid) -> Option<Tid> {
        self.read_running.remove(tid);
        let next = if self.write_running.as_ref() == Some(tid) {
            self.write_running = self.write_queue.pop_front();
            self.write_running.clone()
        } else {
            None
        };
        self.update_idle();
        next
    }

    /// Remove a queued-but-not-yet-admitted WRITE transaction (e.g. it was
    /// cancelled while still in WAITING). No-op if `tid` is not queued.
    pub fn withdraw_queued(&mut self, tid: &Tid) {
        self.write_queue.retain(|t| t != tid);
        self.update_idle();
    }

    /// `true` if no transaction is running or queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.write_running.is_none() && self.write_queue.is_empty() && self.read_running.is_empty()
    }

    /// Subscribe to idle-state changes (spec §4.6 "an `idle` bit flips and
    /// the control surface emits a signal").
    #[must_use]
    pub fn idle_watch(&self) -> watch::Receiver<bool> {
        self.idle_tx.subscribe()
    }

    fn update_idle(&self) {
        let idle = self.is_idle();
        self.idle_tx.send_if_modified(|current| {
            if *current != idle {
                *current = idle;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_admit_concurrently() {
        let mut list = TransactionList::new();
        let a = list.allocate_tid();
        let b = list.allocate_tid();
        assert_eq!(list.request_admission(a, Kind::Read), Admission::Admitted);
        assert_eq!(list.request_admission(b, Kind::Read), Admission::Admitted);
        assert!(!list.is_idle());
    }

    #[test]
    fn writes_serialize_fifo() {
        let mut list = TransactionList::new();
        let w1 = list.allocate_tid();
        let w2 = list.allocate_tid();
        let w3 = list.allocate_tid();
        assert_eq!(list.request_admission(w1.clone(), Kind::Write), Admission::Admitted);
        assert_eq!(list.request_admission(w2.clone(), Kind::Write), Admission::Queued);
        assert_eq!(list.request_admission(w3.clone(), Kind::Write), Admission::Queued);

        let next = list.complete(&w1);
        assert_eq!(next, Some(w2.clone()));
        let next = list.complete(&w2);
        assert_eq!(next, Some(w3.clone()));
        let next = list.complete(&w3);
        assert_eq!(next, None);
        assert!(list.is_idle());
    }

    #[test]
    fn write_and_reads_coexist_but_not_two_writes() {
        let mut list = TransactionList::new();
        let r = list.allocate_tid();
        let w1 = list.allocate_tid();
        let w2 = list.allocate_tid();
        assert_eq!(list.request_admission(r, Kind::Read), Admission::Admitted);
        assert_eq!(list.request_admission(w1, Kind::Write), Admission::Admitted);
        assert_eq!(list.request_admission(w2, Kind::Write), Admission::Queued);
    }

    #[tokio::test]
    async fn idle_signal_flips_on_last_completion() {
        let mut list = TransactionList::new();
        let mut idle = list.idle_watch();
        assert!(*idle.borrow());
        let w = list.allocate_tid();
        list.request_admission(w.clone(), Kind::Write);
        idle.changed().await.unwrap();
        assert!(!*idle.borrow());
        list.complete(&w);
        idle.changed().await.unwrap();
        assert!(*idle.borrow());
    }

    #[test]
    fn withdraw_queued_removes_without_admitting() {
        let mut list = TransactionList::new();
        let w1 = list.allocate_tid();
        let w2 = list.allocate_tid();
        list.request_admission(w1.clone(), Kind::Write);
        list.request_admission(w2.clone(), Kind::Write);
        list.withdraw_queued(&w2);
        let next = list.complete(&w1);
        assert_eq!(next, None);
    }
}
