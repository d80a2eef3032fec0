// SPDX-License-Identifier: MIT OR Apache-2.0
//! Closed-set enumerations with a total, bijective mapping to a kebab-case
//! wire token (spec §3.2). Each is a plain Rust enum; no inheritance, no
//! dynamic property bag — see the "deep virtual inheritance" redesign note
//! in spec.md §9.

use crate::macros::wire_enum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The kind of operation a transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Placeholder before a role method has been called.
    Unknown,
    /// Cancel a running transaction.
    Cancel,
    /// List packages a given package depends on.
    DependsOn,
    /// List packages that depend on a given package.
    RequiredBy,
    /// Fetch full details for remote package-ids.
    GetDetails,
    /// Fetch full details for local package files.
    GetDetailsLocal,
    /// Fetch the file list for remote package-ids.
    GetFiles,
    /// Fetch the file list for local package files.
    GetFilesLocal,
    /// List packages matching a filter.
    GetPackages,
    /// List configured repositories.
    GetRepoList,
    /// Alias of dependency listing used by some backends.
    GetRequires,
    /// Fetch changelog/update metadata for package-ids.
    GetUpdateDetail,
    /// List packages with a pending update.
    GetUpdates,
    /// Install one or more local package files.
    InstallFiles,
    /// Install one or more remote packages.
    InstallPackages,
    /// Import a repository signing key.
    InstallSignature,
    /// Refresh repository metadata.
    RefreshCache,
    /// Remove one or more installed packages.
    RemovePackages,
    /// Resolve package names to package-ids.
    Resolve,
    /// Search by package name.
    SearchName,
    /// Search by package description.
    SearchDetails,
    /// Search by package group.
    SearchGroup,
    /// Search by file owned.
    SearchFile,
    /// Update one or more installed packages.
    UpdatePackages,
    /// Enable or disable a repository.
    RepoEnable,
    /// Set a free-form repository parameter.
    RepoSetData,
    /// Remove a configured repository.
    RepoRemove,
    /// List packages providing a given capability string.
    WhatProvides,
    /// Accept a pending EULA.
    AcceptEula,
    /// Download packages without installing them.
    DownloadPackages,
    /// List available distribution upgrades.
    GetDistroUpgrades,
    /// List package categories/groups.
    GetCategories,
    /// Query the transaction database.
    GetOldTransactions,
    /// Perform a full distribution upgrade.
    UpgradeSystem,
    /// Attempt to repair a broken package database.
    RepairSystem,
    /// Adopt an in-flight transaction from another client.
    Adopt,
    /// Query this transaction's own progress.
    GetProgress,
}

wire_enum!(Role);

/// Transaction milestone reported while `RUNNING` (spec §3.2, §3.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Role method called, validating parameters.
    Setup,
    /// Queued behind another transaction.
    Wait,
    /// Backend entry point running, no finer-grained status yet.
    Running,
    /// Querying local state.
    Query,
    /// Fetching informational metadata.
    Info,
    /// Removing packages.
    Remove,
    /// Refreshing repository metadata.
    RefreshCache,
    /// Downloading package data.
    Download,
    /// Installing packages.
    Install,
    /// Updating packages.
    Update,
    /// Cleaning up temporary state.
    Cleanup,
    /// Marking a package obsolete.
    Obsolete,
    /// Resolving dependencies.
    DepResolve,
    /// Checking signatures.
    SigCheck,
    /// Performing a dry-run commit.
    TestCommit,
    /// Committing the transaction.
    Commit,
    /// Waiting on an external request (e.g. EULA, media change).
    Request,
    /// Terminal: transaction finished.
    Finished,
    /// Terminal: transaction cancelled.
    Cancel,
    /// Downloading repository metadata.
    DownloadRepository,
    /// Downloading the package list.
    DownloadPackagelist,
    /// Downloading the file list.
    DownloadFilelist,
    /// Downloading changelog data.
    DownloadChangelog,
    /// Downloading group/category data.
    DownloadGroup,
    /// Downloading update-info data.
    DownloadUpdateinfo,
    /// Re-packaging files.
    Repackaging,
    /// Loading the local metadata cache.
    LoadingCache,
    /// Scanning installed desktop applications.
    ScanApplications,
    /// Generating a package list.
    GeneratePackageList,
    /// Waiting for the single-writer backend lock.
    WaitingForLock,
    /// Waiting for the policy check to resolve.
    WaitingForAuth,
    /// Scanning the process list.
    ScanProcessList,
    /// Checking whether a process holds an affected file open.
    CheckExecutingProcess,
    /// Checking shared library usage.
    CheckLibraries,
    /// Copying staged files into place.
    CopyFiles,
}

wire_enum!(Status);

/// Terminal outcome of a transaction (spec §3.2, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Exit {
    /// The transaction completed successfully.
    Success,
    /// The transaction failed; an `ErrorCode` preceded this.
    Failed,
    /// The transaction was cancelled.
    Cancelled,
    /// A repository signing key is required before proceeding.
    KeyRequired,
    /// A EULA must be accepted before proceeding.
    EulaRequired,
    /// The backend process was killed.
    Killed,
    /// Removable media must be swapped before proceeding.
    MediaChangeRequired,
    /// The transaction needs to be resubmitted without `only-trusted`.
    NeedUntrusted,
    /// Cancelled because a higher-priority transaction pre-empted it.
    CancelledPriority,
}

wire_enum!(Exit);

/// Per-package informational tag (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Info {
    /// Already installed.
    Installed,
    /// Available for install.
    Available,
    /// Available low-priority update.
    Low,
    /// Available enhancement update.
    Enhancement,
    /// Available normal-priority update.
    Normal,
    /// Available bugfix update.
    Bugfix,
    /// Available important update.
    Important,
    /// Available security update.
    Security,
    /// Package is held back/blocked.
    Blocked,
    /// Currently downloading.
    Downloading,
    /// Currently updating.
    Updating,
    /// Currently installing.
    Installing,
    /// Currently removing.
    Removing,
    /// Currently cleaning up.
    Cleanup,
    /// Currently being obsoleted.
    Obsoleting,
    /// Collection/meta-package already installed.
    CollectionInstalled,
    /// Collection/meta-package available.
    CollectionAvailable,
    /// Finished processing this package.
    Finished,
    /// Currently reinstalling.
    Reinstalling,
    /// Currently downgrading.
    Downgrading,
    /// Preparing for the operation.
    Preparing,
    /// Decompressing archive data.
    Decompressing,
    /// Signature is untrusted.
    Untrusted,
    /// Signature is trusted.
    Trusted,
    /// Package is unavailable.
    Unavailable,
    /// Available critical update.
    Critical,
}

wire_enum!(Info);

/// Update severity, co-encoded with [`Info`] in the same 32-bit wire value
/// (low 16 bits = info, high 16 bits = severity — see [`crate::InfoAndSeverity`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateSeverity {
    /// Not an update, or severity not classified.
    #[default]
    Unknown,
    /// Low-priority.
    Low,
    /// Ordinary priority.
    Normal,
    /// Important/bugfix.
    Important,
    /// Security-relevant.
    Security,
    /// Security-critical.
    Critical,
}

wire_enum!(UpdateSeverity);

/// Package category (spec §3.2; a representative subset of the closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    /// Unclassified.
    Unknown,
    /// Accessibility tools.
    Accessibility,
    /// Desktop accessories/utilities.
    Accessories,
    /// System administration tools.
    AdminTools,
    /// Communication software.
    Communication,
    /// GNOME desktop environment.
    DesktopGnome,
    /// KDE desktop environment.
    DesktopKde,
    /// Other desktop environments.
    DesktopOther,
    /// Xfce desktop environment.
    DesktopXfce,
    /// Educational software.
    Education,
    /// Electronics design tools.
    Electronics,
    /// Fonts.
    Fonts,
    /// Games.
    Games,
    /// Graphics and imaging software.
    Graphics,
    /// Internet clients and servers.
    Internet,
    /// Legacy/deprecated packages.
    Legacy,
    /// Localization/translation data.
    Localization,
    /// Mapping and geography tools.
    Maps,
    /// Multimedia playback and authoring.
    Multimedia,
    /// Core networking tools.
    Network,
    /// Office productivity software.
    Office,
    /// Uncategorized.
    Other,
    /// Power management tools.
    PowerManagement,
    /// Programming languages and tools.
    Programming,
    /// Publishing/desktop-publishing tools.
    Publishing,
    /// Meta-package describing a repository.
    Repos,
    /// Security tools.
    Security,
    /// Server software.
    Servers,
    /// Core system packages.
    System,
    /// Scientific/engineering software.
    Scientific,
    /// Documentation packages.
    Documentation,
    /// Virtualization tools.
    Virtualization,
    /// Vendor-specific grouping.
    Vendor,
    /// Newest-packages pseudo-group.
    Newest,
}

wire_enum!(Group);

/// Kind of restart a completed transaction requires (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RestartRequired {
    /// No restart needed.
    #[default]
    None,
    /// The affected application should be restarted.
    Application,
    /// The user's session should be restarted.
    Session,
    /// The whole system should be restarted.
    System,
    /// The session should be restarted for security reasons.
    SecuritySession,
    /// The system should be restarted for security reasons.
    SecuritySystem,
}

wire_enum!(RestartRequired);

/// Signature kind for [`crate::records::RepoSignatureRequired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SigType {
    /// GnuPG detached signature.
    Gpg,
}

wire_enum!(SigType);

/// Kind of capability string accepted by `WhatProvides`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ProvidesKind {
    /// Match any provides kind.
    Any,
    /// Kernel module alias.
    Modalias,
    /// Media codec.
    Codec,
    /// MIME type handler.
    Mimetype,
    /// Font.
    Font,
    /// Hardware device id.
    Hardware,
    /// PostScript printer driver.
    PostscriptDriver,
    /// Plasma (KDE) service.
    PlasmaService,
    /// Shared library soname.
    SharedLib,
    /// Language-support pack.
    LanguageSupport,
}

wire_enum!(ProvidesKind);

/// Physical media kind for [`crate::records::MediaChangeRequired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    /// Unknown/unspecified media.
    Unknown,
    /// Optical CD.
    Cd,
    /// Optical DVD.
    Dvd,
    /// Generic removable disc.
    Disc,
}

wire_enum!(MediaType);

/// Maturity state of a distribution-upgrade candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DistroUpgradeState {
    /// Unknown state.
    Unknown,
    /// Stable release.
    Stable,
    /// Unstable/development release.
    Unstable,
}

wire_enum!(DistroUpgradeState);

/// Maturity state of an individual update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateState {
    /// Unknown state.
    Unknown,
    /// Stable.
    Stable,
    /// Unstable.
    Unstable,
    /// Pre-release testing.
    Testing,
}

wire_enum!(UpdateState);

/// Scope of an `UpgradeSystem` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum UpgradeKind {
    /// Unknown/unspecified scope.
    Unknown,
    /// Minimal set of changes.
    Minimal,
    /// The distribution's recommended default.
    Default,
    /// Every available package.
    Complete,
}

wire_enum!(UpgradeKind);

/// Current network reachability state (spec §1: network-reachability probing
/// is an external collaborator; this is the one enum its contract fixes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkState {
    /// No network connectivity.
    #[default]
    Offline,
    /// Connected, medium unspecified.
    Online,
    /// Connected via a wired interface.
    Wired,
    /// Connected via Wi-Fi.
    Wifi,
    /// Connected via a mobile data interface.
    Mobile,
}

wire_enum!(NetworkState);

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! round_trip_test {
        ($name:ident, $ty:ty, $variants:expr) => {
            #[test]
            fn $name() {
                for v in $variants {
                    let token = v.wire_token();
                    assert_eq!(<$ty>::from_wire_token(&token), Some(v), "token={token}");
                }
            }
        };
    }

    round_trip_test!(
        role_round_trips,
        Role,
        [Role::Resolve, Role::InstallPackages, Role::GetOldTransactions, Role::Unknown]
    );
    round_trip_test!(
        status_round_trips,
        Status,
        [Status::WaitingForAuth, Status::DepResolve, Status::Finished]
    );
    round_trip_test!(exit_round_trips, Exit, [Exit::NeedUntrusted, Exit::CancelledPriority]);
    round_trip_test!(info_round_trips, Info, [Info::CollectionInstalled, Info::Untrusted]);
    round_trip_test!(group_round_trips, Group, [Group::DesktopGnome, Group::PowerManagement]);
    round_trip_test!(
        restart_round_trips,
        RestartRequired,
        [RestartRequired::SecuritySystem, RestartRequired::None]
    );

    #[test]
    fn unknown_token_rejected() {
        assert_eq!(Role::from_wire_token("totally-bogus"), None);
    }
}
