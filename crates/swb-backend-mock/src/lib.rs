// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-backend-mock
#![deny(unsafe_code)]
//!
//! An in-memory [`swb_backend::Backend`] over a fixed package catalog.
//! Exists to exercise `swb-transaction`/`swb-scheduler` in tests without a
//! real package manager, and as a worked example of the backend contract.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use swb_backend::{Backend, BackendIdentity, JobHandle, RoleInput};
use swb_core::{Exit, Filter, Info, InfoAndSeverity, PackageId, Role, UpdateSeverity};
use swb_error::{BrokerError, ErrorCode};
use swb_results::{Package, Record, Source};

/// A catalog entry: a package and whether it is currently installed.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// The package identity.
    pub package_id: PackageId,
    /// One-line summary shown in `Package` records.
    pub summary: String,
    /// Whether the mock considers this package installed.
    pub installed: bool,
}

/// In-memory backend: a mutable catalog of packages, install/remove just
/// flip the `installed` bit.
pub struct MockBackend {
    identity: BackendIdentity,
    catalog: Mutex<HashMap<String, CatalogEntry>>,
}

impl MockBackend {
    /// Build a mock backend seeded with `entries`, keyed by package name.
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let catalog = entries.into_iter().map(|e| (e.package_id.name().to_string(), e)).collect();
        Self {
            identity: BackendIdentity {
                name: "mock".into(),
                description: "in-memory reference backend".into(),
                author: "swbrokerd contributors".into(),
                roles: HashSet::from([
                    Role::Resolve,
                    Role::SearchName,
                    Role::GetPackages,
                    Role::InstallPackages,
                    Role::RemovePackages,
                ]),
                filters: Filter::INSTALLED.union(Filter::NOT_INSTALLED),
                groups: HashSet::new(),
                mime_types: Vec::new(),
            },
            catalog: Mutex::new(catalog),
        }
    }

    fn source(role: Role) -> Source {
        Source { role, transaction_id: uuid::Uuid::nil() }
    }

    fn emit_matching(&self, job: &JobHandle, role: Role, filters: Filter, names: &[&str]) {
        let catalog = self.catalog.lock().unwrap();
        for entry in catalog.values() {
            if !names.is_empty() && !names.contains(&entry.package_id.name()) {
                continue;
            }
            if filters.contains(Filter::INSTALLED) && !entry.installed {
                continue;
            }
            if filters.contains(Filter::NOT_INSTALLED) && entry.installed {
                continue;
            }
            let info = if entry.installed { Info::Installed } else { Info::Available };
            job.record(Record::Package(Package {
                source: Self::source(role),
                package_id: entry.package_id.clone(),
                info: InfoAndSeverity::new(info, UpdateSeverity::Unknown),
                summary: entry.summary.clone(),
            }));
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    async fn run(&self, job: JobHandle, role: Role, input: RoleInput) -> Result<(), BrokerError> {
        swb_backend::ensure_role_supported(self, role)?;
        job.set_status(swb_core::Status::Running);

        match role {
            Role::Resolve | Role::SearchName => {
                let names: Vec<&str> = if role == Role::Resolve {
                    input.package_ids.iter().map(PackageId::name).collect()
                } else {
                    input.search_terms.iter().map(String::as_str).collect()
                };
                self.emit_matching(&job, role, input.filters, &names);
                job.set_percentage(swb_core::Percentage::known(100));
                job.finished(Exit::Success);
            }
            Role::GetPackages => {
                self.emit_matching(&job, role, input.filters, &[]);
                job.set_percentage(swb_core::Percentage::known(100));
                job.finished(Exit::Success);
            }
            Role::InstallPackages | Role::RemovePackages => {
                let target_installed = role == Role::InstallPackages;
                let mut catalog = self.catalog.lock().unwrap();
                let total = input.package_ids.len().max(1) as u8;
                for (i, pid) in input.package_ids.iter().enumerate() {
                    match catalog.get_mut(pid.name()) {
                        Some(entry) => {
                            entry.installed = target_installed;
                            let info = if target_installed { Info::Installing } else { Info::Removing };
                            job.record(Record::Package(Package {
                                source: Self::source(role),
                                package_id: entry.package_id.clone(),
                                info: InfoAndSeverity::new(info, UpdateSeverity::Unknown),
                                summary: entry.summary.clone(),
                            }));
                        }
                        None => {
                            drop(catalog);
                            job.finished(Exit::Failed);
                            return Err(BrokerError::new(
                                ErrorCode::PackageNotFound,
                                format!("unknown package '{}'", pid.name()),
                            ));
                        }
                    }
                    job.set_percentage(swb_core::Percentage::known(
                        (((i + 1) as u32 * 100) / u32::from(total)) as u8,
                    ));
                }
                job.finished(Exit::Success);
            }
            other => {
                job.finished(Exit::Failed);
                return Err(BrokerError::new(
                    ErrorCode::NotSupported,
                    format!("mock backend does not implement {other:?}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swb_backend::JobEvent;

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry {
                package_id: PackageId::new("vim", "9.1", "x86_64", "").unwrap(),
                summary: "Vi IMproved".into(),
                installed: false,
            },
            CatalogEntry {
                package_id: PackageId::new("htop", "3.3", "x86_64", "").unwrap(),
                summary: "Interactive process viewer".into(),
                installed: true,
            },
        ]
    }

    #[tokio::test]
    async fn resolve_matches_by_name() {
        let backend = MockBackend::new(catalog());
        let (job, mut rx) = JobHandle::channel();
        let input = RoleInput {
            package_ids: vec![PackageId::new("vim", "", "", "").unwrap()],
            ..Default::default()
        };
        backend.run(job, Role::Resolve, input).await.unwrap();
        let mut saw_vim = false;
        while let Some(event) = rx.recv().await {
            if let JobEvent::Record(Record::Package(p)) = event {
                assert_eq!(p.package_id.name(), "vim");
                saw_vim = true;
            }
        }
        assert!(saw_vim);
    }

    #[tokio::test]
    async fn install_flips_installed_bit_and_reports_progress() {
        let backend = MockBackend::new(catalog());
        let (job, mut rx) = JobHandle::channel();
        let input = RoleInput {
            package_ids: vec![PackageId::new("vim", "", "", "").unwrap()],
            ..Default::default()
        };
        backend.run(job, Role::InstallPackages, input).await.unwrap();
        let mut finished_ok = false;
        while let Some(event) = rx.recv().await {
            if let JobEvent::Finished(exit) = event {
                finished_ok = exit == Exit::Success;
            }
        }
        assert!(finished_ok);
    }

    #[tokio::test]
    async fn unknown_package_fails_without_double_finish() {
        let backend = MockBackend::new(catalog());
        let (job, mut rx) = JobHandle::channel();
        let input = RoleInput {
            package_ids: vec![PackageId::new("ghost", "", "", "").unwrap()],
            ..Default::default()
        };
        let result = backend.run(job, Role::InstallPackages, input).await;
        assert!(result.is_err());
        let mut finish_count = 0;
        while let Some(event) = rx.recv().await {
            if matches!(event, JobEvent::Finished(_)) {
                finish_count += 1;
            }
        }
        assert_eq!(finish_count, 1);
    }
}
