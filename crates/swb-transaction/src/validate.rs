// SPDX-License-Identifier: MIT OR Apache-2.0
//! Role-dispatch input validation (spec §4.5): package-id lists, file
//! lists (with non-native staging), and filter/transaction-flag bits.
//! This runs during `SETUP`, before a transaction can move on to
//! `WAITING_FOR_AUTH`/`WAITING`.

use std::path::{Path, PathBuf};
use swb_backend::RoleInput;
use swb_core::{Filter, PackageId, Role, TransactionFlag};
use swb_error::{BrokerError, ErrorCode};

/// Parse a list of package-id wire strings. Every element must parse;
/// an empty list is rejected.
///
/// # Errors
///
/// Returns [`ErrorCode::PackageIdInvalid`] on the first unparsable
/// element, or if `raw` is empty.
pub fn validate_package_ids(raw: &[String]) -> Result<Vec<PackageId>, BrokerError> {
    if raw.is_empty() {
        return Err(BrokerError::new(ErrorCode::PackageIdInvalid, "package-id list must not be empty"));
    }
    raw.iter()
        .map(|s| {
            s.parse::<PackageId>().map_err(|e| {
                BrokerError::new(ErrorCode::PackageIdInvalid, format!("invalid package-id '{s}': {e}"))
            })
        })
        .collect()
}

/// Validate a filter bitfield. Unknown bits are rejected.
///
/// # Errors
///
/// Returns [`ErrorCode::FilterInvalid`] if `bits` sets any bit outside
/// [`Filter::all_known`].
pub fn validate_filters(bits: u64) -> Result<Filter, BrokerError> {
    let filter = Filter::from_bits(bits);
    if !filter.is_valid() {
        return Err(BrokerError::new(ErrorCode::FilterInvalid, format!("unknown filter bits: {bits:#x}")));
    }
    Ok(filter)
}

/// Validate a transaction-flags bitfield. Unknown bits are rejected with
/// the same code as an invalid filter (spec §4.5 groups both checks
/// together).
///
/// # Errors
///
/// Returns [`ErrorCode::FilterInvalid`] if `bits` sets any bit outside
/// [`TransactionFlag::all_known`].
pub fn validate_transaction_flags(bits: u64) -> Result<TransactionFlag, BrokerError> {
    let flags = TransactionFlag::from_bits(bits);
    if !flags.is_valid() {
        return Err(BrokerError::new(ErrorCode::FilterInvalid, format!("unknown transaction-flag bits: {bits:#x}")));
    }
    Ok(flags)
}

/// Validate a fully-populated [`RoleInput`] against the requirements of
/// `role` (spec §4.5 role dispatch validation): the filter/transaction-flag
/// bits must be known, and the role's characteristic required fields
/// (package-ids, local files, search terms, or role-specific parameters)
/// must be present.
///
/// # Errors
///
/// Returns [`ErrorCode::FilterInvalid`] for unknown bitfield bits, or
/// [`ErrorCode::InputInvalid`]/[`ErrorCode::SearchInvalid`] for a missing
/// required field.
pub fn validate_role_input(role: Role, input: &RoleInput) -> Result<(), BrokerError> {
    use Role::{
        AcceptEula, DependsOn, DownloadPackages, GetDetails, GetDetailsLocal, GetFiles,
        GetFilesLocal, GetUpdateDetail, InstallFiles, InstallPackages, InstallSignature,
        RemovePackages, RepoEnable, RepoRemove, RepoSetData, RequiredBy, Resolve, SearchDetails,
        SearchFile, SearchGroup, SearchName, UpdatePackages, WhatProvides,
    };

    if !input.filters.is_valid() {
        return Err(BrokerError::new(
            ErrorCode::FilterInvalid,
            format!("unknown filter bits: {:#x}", input.filters.bits()),
        ));
    }
    if !input.transaction_flags.is_valid() {
        return Err(BrokerError::new(
            ErrorCode::FilterInvalid,
            format!("unknown transaction-flag bits: {:#x}", input.transaction_flags.bits()),
        ));
    }

    let need_package_ids = matches!(
        role,
        Resolve
            | DependsOn
            | RequiredBy
            | GetDetails
            | GetFiles
            | GetUpdateDetail
            | InstallPackages
            | RemovePackages
            | UpdatePackages
            | DownloadPackages
    );
    if need_package_ids && input.package_ids.is_empty() {
        return Err(BrokerError::new(ErrorCode::InputInvalid, format!("{role:?} requires at least one package-id")));
    }

    let need_files = matches!(role, InstallFiles | GetDetailsLocal | GetFilesLocal);
    if need_files && input.files.is_empty() {
        return Err(BrokerError::new(ErrorCode::InputInvalid, format!("{role:?} requires at least one local file")));
    }

    let need_search_terms = matches!(role, SearchName | SearchDetails | SearchGroup | SearchFile | WhatProvides);
    if need_search_terms && input.search_terms.is_empty() {
        return Err(BrokerError::new(ErrorCode::SearchInvalid, format!("{role:?} requires at least one search term")));
    }

    if role == RepoEnable && (input.repo_id.is_none() || input.enabled.is_none()) {
        return Err(BrokerError::new(ErrorCode::InputInvalid, "repo-enable requires repo-id and enabled"));
    }
    if role == RepoSetData && (input.repo_id.is_none() || input.parameter.is_none()) {
        return Err(BrokerError::new(ErrorCode::InputInvalid, "repo-set-data requires repo-id and parameter"));
    }
    if role == RepoRemove && input.repo_id.is_none() {
        return Err(BrokerError::new(ErrorCode::InputInvalid, "repo-remove requires repo-id"));
    }
    if role == AcceptEula && input.eula_id.is_none() {
        return Err(BrokerError::new(ErrorCode::InputInvalid, "accept-eula requires eula-id"));
    }
    if role == InstallSignature
        && (input.sig_type.is_none() || input.key_id.is_none() || input.package_id.is_none())
    {
        return Err(BrokerError::new(
            ErrorCode::InputInvalid,
            "install-signature requires sig-type, key-id, and package-id",
        ));
    }

    Ok(())
}

/// Resolve and stage a list of input files before dispatch.
///
/// Every path must be absolute and must resolve to a real, existing file.
/// Every file is copied into `staging_dir` so the backend always sees a
/// stable native path — the implementation does not attempt to
/// distinguish FUSE/remote filesystems from local ones (that detection is
/// inherently platform-specific); staging unconditionally gives the same
/// guarantee at the cost of one extra copy for already-native inputs.
///
/// # Errors
///
/// Returns [`ErrorCode::NoSuchFile`] if a path is not absolute or does not
/// resolve to an existing regular file, or [`ErrorCode::LocalInstallFailed`]
/// if the copy itself fails.
pub async fn stage_files(paths: &[PathBuf], staging_dir: &Path) -> Result<Vec<PathBuf>, BrokerError> {
    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(|e| BrokerError::new(ErrorCode::LocalInstallFailed, e.to_string()))?;

    let mut staged = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.is_absolute() {
            return Err(BrokerError::new(
                ErrorCode::NoSuchFile,
                format!("not an absolute path: {}", path.display()),
            ));
        }
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| BrokerError::new(ErrorCode::NoSuchFile, format!("no such file: {}", path.display())))?;
        if !metadata.is_file() {
            return Err(BrokerError::new(ErrorCode::NoSuchFile, format!("not a regular file: {}", path.display())));
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| BrokerError::new(ErrorCode::NoSuchFile, format!("no file name: {}", path.display())))?;
        let dest = staging_dir.join(file_name);
        tokio::fs::copy(path, &dest).await.map_err(|e| BrokerError::new(ErrorCode::LocalInstallFailed, e.to_string()))?;
        staged.push(dest);
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_package_id_list() {
        assert!(validate_package_ids(&[]).is_err());
    }

    #[test]
    fn rejects_unparsable_package_id() {
        let raw = vec!["not-enough-parts".to_string()];
        assert!(validate_package_ids(&raw).is_err());
    }

    #[test]
    fn accepts_well_formed_package_ids() {
        let raw = vec!["vim;9.1;x86_64;".to_string()];
        let parsed = validate_package_ids(&raw).unwrap();
        assert_eq!(parsed[0].name(), "vim");
    }

    #[test]
    fn rejects_unknown_filter_bits() {
        assert!(validate_filters(1u64 << 40).is_err());
    }

    #[test]
    fn accepts_known_filter_bits() {
        let f = Filter::INSTALLED.union(Filter::NEWEST);
        assert!(validate_filters(f.bits()).is_ok());
    }

    #[tokio::test]
    async fn stage_files_copies_into_staging_dir() {
        let src_dir = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let src_path = src_dir.path().join("pkg.rpm");
        tokio::fs::write(&src_path, b"fake package bytes").await.unwrap();

        let staged = stage_files(&[src_path.clone()], staging.path()).await.unwrap();
        assert_eq!(staged.len(), 1);
        assert!(staged[0].starts_with(staging.path()));
        assert_eq!(tokio::fs::read(&staged[0]).await.unwrap(), b"fake package bytes");
    }

    #[tokio::test]
    async fn stage_files_rejects_relative_paths() {
        let staging = tempfile::tempdir().unwrap();
        let result = stage_files(&[PathBuf::from("relative.rpm")], staging.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stage_files_rejects_missing_files() {
        let staging = tempfile::tempdir().unwrap();
        let result = stage_files(&[PathBuf::from("/nonexistent/path/pkg.rpm")], staging.path()).await;
        assert!(result.is_err());
    }

    #[test]
    fn install_packages_requires_package_ids() {
        let input = RoleInput::default();
        assert!(validate_role_input(Role::InstallPackages, &input).is_err());
    }

    #[test]
    fn search_name_requires_a_search_term() {
        let input = RoleInput::default();
        assert!(validate_role_input(Role::SearchName, &input).is_err());
        let input = RoleInput { search_terms: vec!["vim".into()], ..Default::default() };
        assert!(validate_role_input(Role::SearchName, &input).is_ok());
    }

    #[test]
    fn repo_enable_requires_repo_id_and_enabled_flag() {
        let input = RoleInput { repo_id: Some("updates".into()), ..Default::default() };
        assert!(validate_role_input(Role::RepoEnable, &input).is_err());
        let input = RoleInput { repo_id: Some("updates".into()), enabled: Some(true), ..Default::default() };
        assert!(validate_role_input(Role::RepoEnable, &input).is_ok());
    }

    #[test]
    fn rejects_unknown_bits_before_role_specific_checks() {
        let input = RoleInput { filters: Filter::from_bits(1u64 << 40), ..Default::default() };
        assert!(validate_role_input(Role::GetPackages, &input).is_err());
    }

    #[test]
    fn resolve_requires_at_least_one_package_id() {
        assert!(validate_role_input(Role::Resolve, &RoleInput::default()).is_err());
        let input = RoleInput {
            package_ids: vec![PackageId::new("htop", "", "", "").unwrap()],
            ..Default::default()
        };
        assert!(validate_role_input(Role::Resolve, &input).is_ok());
    }
}
