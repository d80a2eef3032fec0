// SPDX-License-Identifier: MIT OR Apache-2.0
//! The append-only results container a transaction accumulates into
//! (spec §4.2): one typed slot per record kind, a single-valued exit code
//! and error (last write wins), and a snapshot of the final progress for
//! post-mortem queries.

use crate::records::{
    Category, DistroUpgrade, ErrorRecord, EulaRequired, Files, MediaChangeRequired, Package,
    RepoDetail, RepoSignatureRequired, RequireRestart, TransactionPast, UpdateDetail,
};
use swb_core::Exit;
use swb_progress::ProgressSnapshot;

/// The union of every record kind a backend can append.
///
/// Dispatch is by variant, not by a fallible slot lookup — the "wrong
/// record type for slot" misuse the original container contract guards
/// against (spec §4.2) cannot arise here: each variant carries its slot's
/// value type, so [`ResultsContainer::append`] is total.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// spec §3.3 `Package`.
    Package(Package),
    /// spec §3.3 `Details`.
    Details(crate::records::Details),
    /// spec §3.3 `UpdateDetail`.
    UpdateDetail(UpdateDetail),
    /// spec §3.3 `Files`.
    Files(Files),
    /// spec §3.3 `Category`.
    Category(Category),
    /// spec §3.3 `RepoDetail`.
    RepoDetail(RepoDetail),
    /// spec §3.3 `RepoSignatureRequired`.
    RepoSignatureRequired(RepoSignatureRequired),
    /// spec §3.3 `EulaRequired`.
    EulaRequired(EulaRequired),
    /// spec §3.3 `MediaChangeRequired`.
    MediaChangeRequired(MediaChangeRequired),
    /// spec §3.3 `RequireRestart`.
    RequireRestart(RequireRestart),
    /// spec §3.3 `DistroUpgrade`.
    DistroUpgrade(DistroUpgrade),
    /// A mid-transaction message/warning (the container's `messages[]`
    /// slot); distinct from the single terminal error set via
    /// [`ResultsContainer::set_error`].
    Message(ErrorRecord),
    /// spec §3.3 `TransactionPast`, appended when replaying history from
    /// the transaction database into a live container (§6.2
    /// `GetOldTransactions`).
    TransactionPast(TransactionPast),
}

/// Append-only accumulator for everything one transaction produces.
///
/// Slots preserve insertion order. `exit_code` and `error` are
/// single-valued: the most recent `set_exit`/`set_error` call wins.
#[derive(Debug, Clone, Default)]
pub struct ResultsContainer {
    packages: Vec<Package>,
    details: Vec<crate::records::Details>,
    update_details: Vec<UpdateDetail>,
    files: Vec<Files>,
    categories: Vec<Category>,
    repo_details: Vec<RepoDetail>,
    repo_signatures_required: Vec<RepoSignatureRequired>,
    eulas_required: Vec<EulaRequired>,
    media_changes_required: Vec<MediaChangeRequired>,
    require_restarts: Vec<RequireRestart>,
    distro_upgrades: Vec<DistroUpgrade>,
    messages: Vec<ErrorRecord>,
    transactions: Vec<TransactionPast>,
    exit_code: Option<Exit>,
    error: Option<ErrorRecord>,
    progress_snapshot: Option<ProgressSnapshot>,
}

impl ResultsContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record to its slot.
    pub fn append(&mut self, record: Record) {
        match record {
            Record::Package(r) => self.packages.push(r),
            Record::Details(r) => self.details.push(r),
            Record::UpdateDetail(r) => self.update_details.push(r),
            Record::Files(r) => self.files.push(r),
            Record::Category(r) => self.categories.push(r),
            Record::RepoDetail(r) => self.repo_details.push(r),
            Record::RepoSignatureRequired(r) => self.repo_signatures_required.push(r),
            Record::EulaRequired(r) => self.eulas_required.push(r),
            Record::MediaChangeRequired(r) => self.media_changes_required.push(r),
            Record::RequireRestart(r) => self.require_restarts.push(r),
            Record::DistroUpgrade(r) => self.distro_upgrades.push(r),
            Record::Message(r) => self.messages.push(r),
            Record::TransactionPast(r) => self.transactions.push(r),
        }
    }

    /// Record the transaction's terminal exit code. Last call wins.
    pub fn set_exit(&mut self, exit: Exit) {
        self.exit_code = Some(exit);
    }

    /// Record the transaction's terminal error, if it failed. Last call
    /// wins.
    pub fn set_error(&mut self, error: ErrorRecord) {
        self.error = Some(error);
    }

    /// Store a snapshot of the transaction's progress for later,
    /// post-mortem inspection.
    pub fn snapshot_progress(&mut self, snapshot: ProgressSnapshot) {
        self.progress_snapshot = Some(snapshot);
    }

    /// The terminal exit code, if one has been set.
    #[must_use]
    pub fn exit_code(&self) -> Option<Exit> {
        self.exit_code
    }

    /// The terminal error, if one has been set.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.as_ref()
    }

    /// The last progress snapshot taken, if any.
    #[must_use]
    pub fn progress_snapshot(&self) -> Option<&ProgressSnapshot> {
        self.progress_snapshot.as_ref()
    }

    /// Packages in insertion order.
    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Details records in insertion order.
    #[must_use]
    pub fn details(&self) -> &[crate::records::Details] {
        &self.details
    }

    /// Update details in insertion order.
    #[must_use]
    pub fn update_details(&self) -> &[UpdateDetail] {
        &self.update_details
    }

    /// File listings in insertion order.
    #[must_use]
    pub fn files(&self) -> &[Files] {
        &self.files
    }

    /// Categories in insertion order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Repository details in insertion order.
    #[must_use]
    pub fn repo_details(&self) -> &[RepoDetail] {
        &self.repo_details
    }

    /// Pending repo-signature requirements in insertion order.
    #[must_use]
    pub fn repo_signatures_required(&self) -> &[RepoSignatureRequired] {
        &self.repo_signatures_required
    }

    /// Pending EULA acceptances in insertion order.
    #[must_use]
    pub fn eulas_required(&self) -> &[EulaRequired] {
        &self.eulas_required
    }

    /// Pending media-change prompts in insertion order.
    #[must_use]
    pub fn media_changes_required(&self) -> &[MediaChangeRequired] {
        &self.media_changes_required
    }

    /// Restart requirements in insertion order.
    #[must_use]
    pub fn require_restarts(&self) -> &[RequireRestart] {
        &self.require_restarts
    }

    /// Distro upgrades in insertion order.
    #[must_use]
    pub fn distro_upgrades(&self) -> &[DistroUpgrade] {
        &self.distro_upgrades
    }

    /// Mid-transaction messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[ErrorRecord] {
        &self.messages
    }

    /// Historical transaction records in insertion order.
    #[must_use]
    pub fn transactions(&self) -> &[TransactionPast] {
        &self.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Source;
    use swb_core::{InfoAndSeverity, Info, PackageId, Role, UpdateSeverity};
    use uuid::Uuid;

    fn source() -> Source {
        Source { role: Role::Resolve, transaction_id: Uuid::nil() }
    }

    fn pkg_id() -> PackageId {
        PackageId::new("vim", "9.1", "x86_64", "").unwrap()
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut c = ResultsContainer::new();
        for name in ["a", "b", "c"] {
            c.append(Record::Package(Package {
                source: source(),
                package_id: PackageId::new(name, "1", "noarch", "").unwrap(),
                info: InfoAndSeverity::new(Info::Available, UpdateSeverity::Unknown),
                summary: String::new(),
            }));
        }
        let names: Vec<_> = c.packages().iter().map(|p| p.package_id.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn exit_and_error_are_last_write_wins() {
        let mut c = ResultsContainer::new();
        c.set_exit(Exit::Failed);
        c.set_exit(Exit::Success);
        assert_eq!(c.exit_code(), Some(Exit::Success));

        c.set_error(ErrorRecord {
            source: source(),
            code: swb_error::ErrorCode::NoNetwork,
            details: "first".into(),
        });
        c.set_error(ErrorRecord {
            source: source(),
            code: swb_error::ErrorCode::Oom,
            details: "second".into(),
        });
        assert_eq!(c.error().unwrap().details, "second");
    }

    #[test]
    fn distinct_slots_do_not_interfere() {
        let mut c = ResultsContainer::new();
        c.append(Record::Files(Files {
            source: source(),
            package_id: pkg_id(),
            files: vec!["/usr/bin/vim".into()],
        }));
        assert_eq!(c.packages().len(), 0);
        assert_eq!(c.files().len(), 1);
    }
}
