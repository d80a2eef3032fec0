// SPDX-License-Identifier: MIT OR Apache-2.0
//! The transaction-facing progress aggregate (spec §3.4): the flat set of
//! fields a client observes while a transaction runs, each independently
//! notifiable. This sits above [`crate::Completion`], which a backend may
//! use internally to compute the `percentage` field when a sub-task has its
//! own discrete steps (e.g. metadata download phases).

use swb_core::{PackageId, Percentage, Role, Status, TransactionFlag};
use uuid::Uuid;

/// One field of [`Progress`] having just changed, carried to subscribers.
///
/// Mirrors the bus's properties-changed mechanism (spec §6.3): every
/// mutator triggers exactly one of these, keyed by the field it touched.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressChange {
    /// The transaction's role was set (fixed for the transaction's lifetime).
    Role(Role),
    /// The transaction moved to a new lifecycle status.
    Status(Status),
    /// Overall completion percentage advanced (or was set to "unknown").
    Percentage(Percentage),
    /// Whether the transaction can currently be cancelled.
    AllowCancel(bool),
    /// Whether the originating caller is still connected.
    CallerActive(bool),
    /// Seconds elapsed since the transaction started running.
    ElapsedTime(u64),
    /// Estimated seconds remaining, if known.
    RemainingTime(Option<u64>),
    /// Current transfer speed in bytes/second.
    Speed(u32),
    /// Bytes remaining to download across the whole transaction.
    DownloadSizeRemaining(u64),
    /// The transaction flags this run was started with.
    TransactionFlags(TransactionFlag),
    /// The uid of the user that requested the transaction.
    Uid(u32),
    /// Opaque caller/session identifier ("sender" on the bus).
    Sender(String),
    /// The package currently being acted upon, if any.
    PackageId(Option<PackageId>),
    /// Per-item completion percentage for the current package, if tracked.
    ItemProgress(Option<Percentage>),
}

/// Live progress state for a single in-flight transaction (spec §3.4).
///
/// `percentage` is monotonic for the lifetime of one `Progress` instance;
/// every other field is a total, unconstrained function of the backend's
/// reporting — a status can move in any direction the backend chooses to
/// report, most usually forward through the lifecycle in §3.5.
pub struct Progress {
    transaction_id: Uuid,
    role: Role,
    status: Status,
    percentage: Percentage,
    allow_cancel: bool,
    caller_active: bool,
    elapsed_time: u64,
    remaining_time: Option<u64>,
    speed: u32,
    download_size_remaining: u64,
    transaction_flags: TransactionFlag,
    uid: u32,
    sender: String,
    package_id: Option<PackageId>,
    item_progress: Option<Percentage>,
    subscribers: Vec<Box<dyn FnMut(&ProgressChange) + Send>>,
}

impl Progress {
    /// Create a fresh progress record for a newly-allocated transaction.
    #[must_use]
    pub fn new(transaction_id: Uuid, role: Role, uid: u32, sender: impl Into<String>) -> Self {
        Self {
            transaction_id,
            role,
            status: Status::Wait,
            percentage: Percentage::Unknown,
            allow_cancel: true,
            caller_active: true,
            elapsed_time: 0,
            remaining_time: None,
            speed: 0,
            download_size_remaining: 0,
            transaction_flags: TransactionFlag::empty(),
            uid,
            sender: sender.into(),
            package_id: None,
            item_progress: None,
            subscribers: Vec::new(),
        }
    }

    /// Register a callback invoked with every field-level change.
    pub fn on_change(&mut self, cb: impl FnMut(&ProgressChange) + Send + 'static) {
        self.subscribers.push(Box::new(cb));
    }

    fn notify(&mut self, change: ProgressChange) {
        for cb in &mut self.subscribers {
            cb(&change);
        }
    }

    /// The transaction this progress record belongs to.
    #[must_use]
    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    /// The role requested for this transaction.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The transaction's current lifecycle status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The last reported overall completion percentage.
    #[must_use]
    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    /// Whether cancellation is currently permitted.
    #[must_use]
    pub fn allow_cancel(&self) -> bool {
        self.allow_cancel
    }

    /// The package currently being processed, if any.
    #[must_use]
    pub fn package_id(&self) -> Option<&PackageId> {
        self.package_id.as_ref()
    }

    /// Set the lifecycle status. Status transitions are total: any value
    /// may follow any other here, the scheduler is responsible for only
    /// driving legal sequences (spec §3.5).
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.notify(ProgressChange::Status(status));
    }

    /// Set overall percentage. Accepted only if `p >= ` the last known
    /// value; an `Unknown` value is always accepted (it carries no
    /// ordering). Duplicates are silent no-ops; regressions are rejected
    /// with no state change. Returns whether the value was applied.
    pub fn set_percentage(&mut self, p: Percentage) -> bool {
        if let (Percentage::Known(old), Percentage::Known(new)) = (self.percentage, p) {
            match new.cmp(&old) {
                std::cmp::Ordering::Less => return false,
                std::cmp::Ordering::Equal => return true,
                std::cmp::Ordering::Greater => {}
            }
        }
        self.percentage = p;
        self.notify(ProgressChange::Percentage(p));
        true
    }

    /// Update whether the transaction can currently be cancelled.
    pub fn set_allow_cancel(&mut self, allow: bool) {
        self.allow_cancel = allow;
        self.notify(ProgressChange::AllowCancel(allow));
    }

    /// Update whether the originating caller is still connected.
    pub fn set_caller_active(&mut self, active: bool) {
        self.caller_active = active;
        self.notify(ProgressChange::CallerActive(active));
    }

    /// Update elapsed running time, in seconds.
    pub fn set_elapsed_time(&mut self, seconds: u64) {
        self.elapsed_time = seconds;
        self.notify(ProgressChange::ElapsedTime(seconds));
    }

    /// Update the estimated remaining time, in seconds.
    pub fn set_remaining_time(&mut self, seconds: Option<u64>) {
        self.remaining_time = seconds;
        self.notify(ProgressChange::RemainingTime(seconds));
    }

    /// Update current transfer speed in bytes/second.
    pub fn set_speed(&mut self, bytes_per_sec: u32) {
        self.speed = bytes_per_sec;
        self.notify(ProgressChange::Speed(bytes_per_sec));
    }

    /// Update remaining download size in bytes.
    pub fn set_download_size_remaining(&mut self, bytes: u64) {
        self.download_size_remaining = bytes;
        self.notify(ProgressChange::DownloadSizeRemaining(bytes));
    }

    /// Record the transaction flags this run started with.
    pub fn set_transaction_flags(&mut self, flags: TransactionFlag) {
        self.transaction_flags = flags;
        self.notify(ProgressChange::TransactionFlags(flags));
    }

    /// Set the package currently being processed.
    pub fn set_package_id(&mut self, package_id: Option<PackageId>) {
        self.package_id = package_id.clone();
        self.notify(ProgressChange::PackageId(package_id));
    }

    /// Set per-item completion percentage for the current package.
    pub fn set_item_progress(&mut self, item_progress: Option<Percentage>) {
        self.item_progress = item_progress;
        self.notify(ProgressChange::ItemProgress(item_progress));
    }

    /// Capture a plain-data copy of the current state (spec §4.2
    /// "retains a clone of the final progress for post-mortem queries").
    /// Subscribers are not part of the snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            transaction_id: self.transaction_id,
            role: self.role,
            status: self.status,
            percentage: self.percentage,
            allow_cancel: self.allow_cancel,
            caller_active: self.caller_active,
            elapsed_time: self.elapsed_time,
            remaining_time: self.remaining_time,
            speed: self.speed,
            download_size_remaining: self.download_size_remaining,
            transaction_flags: self.transaction_flags,
            uid: self.uid,
            sender: self.sender.clone(),
            package_id: self.package_id.clone(),
            item_progress: self.item_progress,
        }
    }
}

/// An immutable, cloneable copy of a [`Progress`]'s fields at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// The transaction this snapshot was taken from.
    pub transaction_id: Uuid,
    /// The role requested for this transaction.
    pub role: Role,
    /// Lifecycle status at snapshot time.
    pub status: Status,
    /// Overall completion percentage at snapshot time.
    pub percentage: Percentage,
    /// Whether cancellation was permitted at snapshot time.
    pub allow_cancel: bool,
    /// Whether the caller was still connected at snapshot time.
    pub caller_active: bool,
    /// Seconds elapsed at snapshot time.
    pub elapsed_time: u64,
    /// Estimated seconds remaining at snapshot time, if known.
    pub remaining_time: Option<u64>,
    /// Transfer speed in bytes/second at snapshot time.
    pub speed: u32,
    /// Bytes remaining to download at snapshot time.
    pub download_size_remaining: u64,
    /// Transaction flags the run was started with.
    pub transaction_flags: TransactionFlag,
    /// Uid of the requesting user.
    pub uid: u32,
    /// Opaque caller/session identifier.
    pub sender: String,
    /// Package being processed at snapshot time, if any.
    pub package_id: Option<PackageId>,
    /// Per-item completion percentage at snapshot time, if tracked.
    pub item_progress: Option<Percentage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Progress {
        Progress::new(Uuid::nil(), Role::InstallPackages, 1000, "session-1")
    }

    #[test]
    fn percentage_rejects_regression() {
        let mut p = sample();
        assert!(p.set_percentage(Percentage::known(40)));
        assert!(!p.set_percentage(Percentage::known(10)));
        assert_eq!(p.percentage(), Percentage::known(40));
    }

    #[test]
    fn unknown_percentage_always_accepted() {
        let mut p = sample();
        p.set_percentage(Percentage::known(80));
        assert!(p.set_percentage(Percentage::Unknown));
        assert_eq!(p.percentage(), Percentage::Unknown);
    }

    #[test]
    fn status_transitions_are_unrestricted() {
        let mut p = sample();
        p.set_status(Status::Running);
        p.set_status(Status::WaitingForLock);
        p.set_status(Status::Running);
        assert_eq!(p.status(), Status::Running);
    }

    #[test]
    fn every_setter_emits_exactly_one_typed_change() {
        use std::sync::{Arc, Mutex};
        let log = Arc::new(Mutex::new(Vec::new()));
        let log2 = log.clone();
        let mut p = sample();
        p.on_change(move |c| log2.lock().unwrap().push(c.clone()));
        p.set_status(Status::Running);
        p.set_percentage(Percentage::known(5));
        p.set_allow_cancel(false);
        assert_eq!(log.lock().unwrap().len(), 3);
        assert!(matches!(log.lock().unwrap()[0], ProgressChange::Status(Status::Running)));
    }

    #[test]
    fn snapshot_captures_current_fields_without_subscribers() {
        let mut p = sample();
        p.set_status(Status::Running);
        p.set_percentage(Percentage::known(60));
        let snap = p.snapshot();
        assert_eq!(snap.status, Status::Running);
        assert_eq!(snap.percentage, Percentage::known(60));
        assert_eq!(snap.uid, 1000);
    }
}
