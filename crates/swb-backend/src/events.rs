// SPDX-License-Identifier: MIT OR Apache-2.0
//! The job event channel a backend emits into while an entry point runs
//! (spec §4.4). Emission is only meaningful between entry and `finished`;
//! anything sent after `finished` is silently dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use swb_core::{Exit, Percentage};
use swb_results::Record;
use tokio::sync::mpsc;

/// One event a running backend operation can emit.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Append a result record (package, details, files, ...).
    Record(Record),
    /// Update overall completion percentage.
    SetPercentage(Percentage),
    /// Update the backend-reported status.
    SetStatus(swb_core::Status),
    /// Update whether cancellation is currently possible.
    SetAllowCancel(bool),
    /// Update current transfer speed, bytes/second.
    SetSpeed(u32),
    /// Update remaining bytes to download.
    SetDownloadSizeRemaining(u64),
    /// Terminal: the operation is done. Emitted exactly once; anything
    /// the backend sends afterward is dropped.
    Finished(Exit),
}

/// Handle a backend uses to emit [`JobEvent`]s while its entry point runs.
///
/// Cloning a handle is cheap and all clones share the same "already
/// finished" latch, so a backend that fans work out across tasks cannot
/// accidentally emit events past its own `finished` call.
#[derive(Clone)]
pub struct JobHandle {
    tx: mpsc::UnboundedSender<JobEvent>,
    finished: Arc<AtomicBool>,
}

impl JobHandle {
    /// Create a handle paired with the receiver the transaction layer
    /// drains events from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, finished: Arc::new(AtomicBool::new(false)) }, rx)
    }

    /// `true` once [`Self::finished`] has been called on any clone of this
    /// handle.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn send(&self, event: JobEvent) {
        if self.finished.load(Ordering::Acquire) {
            tracing::debug!("dropping job event emitted after finished()");
            return;
        }
        // The receiver is only dropped once the transaction itself has
        // stopped polling; a send failure there means the transaction
        // already tore down, so there is nothing left to notify.
        let _ = self.tx.send(event);
    }

    /// Append a result record.
    pub fn record(&self, record: Record) {
        self.send(JobEvent::Record(record));
    }

    /// Report overall completion percentage.
    pub fn set_percentage(&self, percentage: Percentage) {
        self.send(JobEvent::SetPercentage(percentage));
    }

    /// Report the current backend status.
    pub fn set_status(&self, status: swb_core::Status) {
        self.send(JobEvent::SetStatus(status));
    }

    /// Report whether cancellation is currently possible.
    pub fn set_allow_cancel(&self, allow: bool) {
        self.send(JobEvent::SetAllowCancel(allow));
    }

    /// Report current transfer speed, bytes/second.
    pub fn set_speed(&self, bytes_per_sec: u32) {
        self.send(JobEvent::SetSpeed(bytes_per_sec));
    }

    /// Report remaining bytes to download.
    pub fn set_download_size_remaining(&self, bytes: u64) {
        self.send(JobEvent::SetDownloadSizeRemaining(bytes));
    }

    /// Signal that the operation is complete. Idempotent: only the first
    /// call takes effect, matching "backend signals finished exactly
    /// once" (spec §4.4).
    pub fn finished(&self, exit: Exit) {
        if self.finished.swap(true, Ordering::AcqRel) {
            tracing::warn!("backend called finished() more than once; ignoring");
            return;
        }
        let _ = self.tx.send(JobEvent::Finished(exit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_after_finished_are_dropped() {
        let (job, mut rx) = JobHandle::channel();
        job.finished(Exit::Success);
        job.set_percentage(Percentage::known(50));
        drop(job);
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, JobEvent::Finished(Exit::Success)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn second_finished_call_is_ignored() {
        let (job, mut rx) = JobHandle::channel();
        job.finished(Exit::Success);
        job.finished(Exit::Failed);
        drop(job);
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, JobEvent::Finished(Exit::Success)));
        assert!(rx.recv().await.is_none());
    }
}
