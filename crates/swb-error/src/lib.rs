// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for the package broker.
//!
//! Every broker error carries an [`ErrorCode`] (the wire-stable fine-grained
//! kind from the daemon's error-code enumeration), a human-readable message,
//! an optional cause chain, and arbitrary key-value context. The same code
//! flows both through the few method failures the core produces (input
//! validation, before a role is ever dispatched) and through the `ErrorCode`
//! event a backend emits mid-transaction — never both for the same failure.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Broad family an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or unsupported client input (package ids, filters, files).
    Input,
    /// Authorization / policy-check failures.
    Policy,
    /// Backend lifecycle and execution failures.
    Backend,
    /// Repository and signature/trust failures.
    Repository,
    /// Transaction scheduling / lifecycle failures.
    Transaction,
    /// Resource exhaustion (disk, memory, locks).
    Resource,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Policy => "policy",
            Self::Backend => "backend",
            Self::Repository => "repository",
            Self::Transaction => "transaction",
            Self::Resource => "resource",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Machine-readable, stable error code (the §3.2 Error-code enum).
///
/// Each variant serializes to a `SCREAMING_SNAKE_CASE` string and has a
/// matching kebab-case wire token (see [`ErrorCode::wire_token`] and
/// [`ErrorCode::from_wire_token`]) — the two encodings used respectively by
/// the JSON signal payloads and by the `details` free-text companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Out of memory.
    Oom,
    /// No network connectivity.
    NoNetwork,
    /// Role or operation not supported by the active backend.
    NotSupported,
    /// Generic GPG failure.
    GpgFailure,
    /// A GPG signature was present but did not validate.
    BadGpgSignature,
    /// A GPG signature was required but absent.
    MissingGpgSignature,
    /// The transaction was cancelled.
    TransactionCancelled,
    /// A package-id string failed to parse.
    PackageIdInvalid,
    /// A search term is invalid.
    SearchInvalid,
    /// An unknown bit was set in a filter bitfield.
    FilterInvalid,
    /// A `Provides` string is malformed.
    InvalidProvide,
    /// Generic malformed input (empty list, bad hint value, ...).
    InputInvalid,
    /// A package archive failed to parse.
    PackInvalid,
    /// A referenced file does not exist.
    NoSuchFile,
    /// A file's MIME type is not one the backend accepts.
    MimeTypeNotSupported,
    /// A referenced directory does not exist.
    NoSuchDirectory,
    /// Two or more packages in the transaction conflict on a file.
    FileConflicts,
    /// Installing would add an unsigned repository.
    CannotInstallRepoUnsigned,
    /// Updating would pull from an unsigned repository.
    CannotUpdateRepoUnsigned,
    /// The caller is not authorized to perform this role.
    NotAuthorized,
    /// No package matches the given identifier.
    PackageNotFound,
    /// The package is already installed.
    PackageAlreadyInstalled,
    /// Dependency resolution could not produce a consistent set.
    DepResolutionFailed,
    /// No repository with that id is configured.
    RepoNotFound,
    /// Repository configuration is invalid or could not be written.
    RepoConfigurationFailed,
    /// Could not acquire the single-writer backend lock.
    CannotGetLock,
    /// Unexpected internal error; always paired with free-text detail.
    InternalError,
    /// The transaction object itself is in an invalid state for the request.
    TransactionError,
    /// No transaction exists with the given tid.
    NoSuchTransaction,
    /// An operation that requires the write lock was attempted without it.
    NotLocked,
    /// The metadata cache does not exist or is empty.
    NoCache,
    /// The repository is configured but currently unreachable.
    RepoNotAvailable,
    /// Removing a package protected by the backend was attempted.
    CannotRemoveSystemPackage,
    /// A running process had to be killed to complete the transaction.
    ProcessKill,
    /// The repository could not be disabled.
    CannotDisableRepository,
    /// Download was blocked by a restricted-network policy.
    RestrictedDownload,
    /// A package archive's integrity check failed.
    PackageCorrupt,
    /// No-op: every requested package is already installed.
    AllPackagesAlreadyInstalled,
    /// A file argument does not resolve to an existing path.
    FileNotFound,
    /// All known mirrors for a repository have failed.
    NoMoreMirrorsToTry,
    /// No distribution-upgrade metadata is available.
    NoDistroUpgradeData,
    /// Package architecture is incompatible with this machine.
    IncompatibleArchitecture,
    /// Insufficient free space to complete the transaction.
    NoSpaceOnDevice,
    /// Installation requires swapping removable media.
    MediaChangeRequired,
    /// Backend has not completed its startup sequence.
    NotInitialized,
    /// Requested object is not present in the local cache.
    NotInCache,
    /// Package cannot be altered because it is in active use.
    PackageInUse,
    /// Configuration file failed to parse.
    FailedConfigParsing,
    /// Installing a local file package failed.
    LocalInstallFailed,
    /// The repository signature key was already imported.
    RepoSignatureAlreadyImported,
    /// A higher-priority transaction pre-empted this one.
    TransactionCancelledPriority,
    /// Backend failed to initialize.
    FailedInitialization,
    /// Backend failed to finalize (commit) the transaction.
    FailedFinalise,
    /// Could not obtain the file list for a package.
    CannotGetFilelist,
    /// Could not obtain the requires list for a package.
    CannotGetRequires,
    /// A dependency could not be disabled/ignored as requested.
    CannotDisableDependency,
    /// The operation targets something that is not actually required.
    NotRequired,
    /// Could not fetch package sources.
    CannotFetchSources,
    /// A backend reported a condition needing an `only-trusted` retry.
    NeedUntrusted,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        use ErrorCode::*;
        match self {
            PackageIdInvalid | SearchInvalid | FilterInvalid | InvalidProvide | InputInvalid
            | PackInvalid | NoSuchFile | MimeTypeNotSupported | NoSuchDirectory
            | FileNotFound => ErrorCategory::Input,

            NotAuthorized => ErrorCategory::Policy,

            NotSupported | CannotGetLock | NotLocked | ProcessKill | PackageInUse
            | FailedInitialization | FailedFinalise | CannotGetFilelist | CannotGetRequires
            | CannotDisableDependency | NotRequired | LocalInstallFailed | PackageCorrupt
            | AllPackagesAlreadyInstalled | PackageAlreadyInstalled | PackageNotFound
            | DepResolutionFailed | FileConflicts | CannotRemoveSystemPackage
            | IncompatibleArchitecture => ErrorCategory::Backend,

            GpgFailure | BadGpgSignature | MissingGpgSignature | CannotInstallRepoUnsigned
            | CannotUpdateRepoUnsigned | RepoNotFound | RepoConfigurationFailed | NoCache
            | RepoNotAvailable | CannotDisableRepository | NoMoreMirrorsToTry
            | RepoSignatureAlreadyImported | CannotFetchSources | NoDistroUpgradeData => {
                ErrorCategory::Repository
            }

            TransactionCancelled | TransactionError | NoSuchTransaction
            | TransactionCancelledPriority | MediaChangeRequired | NeedUntrusted => {
                ErrorCategory::Transaction
            }

            Oom | NoNetwork | NoSpaceOnDevice | RestrictedDownload | NotInitialized
            | NotInCache | FailedConfigParsing => ErrorCategory::Resource,

            InternalError => ErrorCategory::Internal,
        }
    }

    /// Stable `SCREAMING_SNAKE_CASE` representation.
    #[must_use]
    pub fn as_code_str(&self) -> &'static str {
        match self {
            Self::Oom => "OOM",
            Self::NoNetwork => "NO_NETWORK",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::GpgFailure => "GPG_FAILURE",
            Self::BadGpgSignature => "BAD_GPG_SIGNATURE",
            Self::MissingGpgSignature => "MISSING_GPG_SIGNATURE",
            Self::TransactionCancelled => "TRANSACTION_CANCELLED",
            Self::PackageIdInvalid => "PACKAGE_ID_INVALID",
            Self::SearchInvalid => "SEARCH_INVALID",
            Self::FilterInvalid => "FILTER_INVALID",
            Self::InvalidProvide => "INVALID_PROVIDE",
            Self::InputInvalid => "INPUT_INVALID",
            Self::PackInvalid => "PACK_INVALID",
            Self::NoSuchFile => "NO_SUCH_FILE",
            Self::MimeTypeNotSupported => "MIME_TYPE_NOT_SUPPORTED",
            Self::NoSuchDirectory => "NO_SUCH_DIRECTORY",
            Self::FileConflicts => "FILE_CONFLICTS",
            Self::CannotInstallRepoUnsigned => "CANNOT_INSTALL_REPO_UNSIGNED",
            Self::CannotUpdateRepoUnsigned => "CANNOT_UPDATE_REPO_UNSIGNED",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::PackageNotFound => "PACKAGE_NOT_FOUND",
            Self::PackageAlreadyInstalled => "PACKAGE_ALREADY_INSTALLED",
            Self::DepResolutionFailed => "DEP_RESOLUTION_FAILED",
            Self::RepoNotFound => "REPO_NOT_FOUND",
            Self::RepoConfigurationFailed => "REPO_CONFIGURATION_FAILED",
            Self::CannotGetLock => "CANNOT_GET_LOCK",
            Self::InternalError => "INTERNAL_ERROR",
            Self::TransactionError => "TRANSACTION_ERROR",
            Self::NoSuchTransaction => "NO_SUCH_TRANSACTION",
            Self::NotLocked => "NOT_LOCKED",
            Self::NoCache => "NO_CACHE",
            Self::RepoNotAvailable => "REPO_NOT_AVAILABLE",
            Self::CannotRemoveSystemPackage => "CANNOT_REMOVE_SYSTEM_PACKAGE",
            Self::ProcessKill => "PROCESS_KILL",
            Self::CannotDisableRepository => "CANNOT_DISABLE_REPOSITORY",
            Self::RestrictedDownload => "RESTRICTED_DOWNLOAD",
            Self::PackageCorrupt => "PACKAGE_CORRUPT",
            Self::AllPackagesAlreadyInstalled => "ALL_PACKAGES_ALREADY_INSTALLED",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::NoMoreMirrorsToTry => "NO_MORE_MIRRORS_TO_TRY",
            Self::NoDistroUpgradeData => "NO_DISTRO_UPGRADE_DATA",
            Self::IncompatibleArchitecture => "INCOMPATIBLE_ARCHITECTURE",
            Self::NoSpaceOnDevice => "NO_SPACE_ON_DEVICE",
            Self::MediaChangeRequired => "MEDIA_CHANGE_REQUIRED",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NotInCache => "NOT_IN_CACHE",
            Self::PackageInUse => "PACKAGE_IN_USE",
            Self::FailedConfigParsing => "FAILED_CONFIG_PARSING",
            Self::LocalInstallFailed => "LOCAL_INSTALL_FAILED",
            Self::RepoSignatureAlreadyImported => "REPO_SIGNATURE_ALREADY_IMPORTED",
            Self::TransactionCancelledPriority => "TRANSACTION_CANCELLED_PRIORITY",
            Self::FailedInitialization => "FAILED_INITIALIZATION",
            Self::FailedFinalise => "FAILED_FINALISE",
            Self::CannotGetFilelist => "CANNOT_GET_FILELIST",
            Self::CannotGetRequires => "CANNOT_GET_REQUIRES",
            Self::CannotDisableDependency => "CANNOT_DISABLE_DEPENDENCY",
            Self::NotRequired => "NOT_REQUIRED",
            Self::CannotFetchSources => "CANNOT_FETCH_SOURCES",
            Self::NeedUntrusted => "NEED_UNTRUSTED",
        }
    }

    /// Kebab-case wire token used on the bus (e.g. `"package-id-invalid"`).
    #[must_use]
    pub fn wire_token(&self) -> String {
        self.as_code_str().to_ascii_lowercase().replace('_', "-")
    }

    /// Parse a kebab-case wire token back into an [`ErrorCode`].
    #[must_use]
    pub fn from_wire_token(token: &str) -> Option<Self> {
        let upper = token.to_ascii_uppercase().replace('-', "_");
        Self::from_code_str(&upper)
    }

    /// Parse a `SCREAMING_SNAKE_CASE` code string.
    #[must_use]
    pub fn from_code_str(s: &str) -> Option<Self> {
        Some(match s {
            "OOM" => Self::Oom,
            "NO_NETWORK" => Self::NoNetwork,
            "NOT_SUPPORTED" => Self::NotSupported,
            "GPG_FAILURE" => Self::GpgFailure,
            "BAD_GPG_SIGNATURE" => Self::BadGpgSignature,
            "MISSING_GPG_SIGNATURE" => Self::MissingGpgSignature,
            "TRANSACTION_CANCELLED" => Self::TransactionCancelled,
            "PACKAGE_ID_INVALID" => Self::PackageIdInvalid,
            "SEARCH_INVALID" => Self::SearchInvalid,
            "FILTER_INVALID" => Self::FilterInvalid,
            "INVALID_PROVIDE" => Self::InvalidProvide,
            "INPUT_INVALID" => Self::InputInvalid,
            "PACK_INVALID" => Self::PackInvalid,
            "NO_SUCH_FILE" => Self::NoSuchFile,
            "MIME_TYPE_NOT_SUPPORTED" => Self::MimeTypeNotSupported,
            "NO_SUCH_DIRECTORY" => Self::NoSuchDirectory,
            "FILE_CONFLICTS" => Self::FileConflicts,
            "CANNOT_INSTALL_REPO_UNSIGNED" => Self::CannotInstallRepoUnsigned,
            "CANNOT_UPDATE_REPO_UNSIGNED" => Self::CannotUpdateRepoUnsigned,
            "NOT_AUTHORIZED" => Self::NotAuthorized,
            "PACKAGE_NOT_FOUND" => Self::PackageNotFound,
            "PACKAGE_ALREADY_INSTALLED" => Self::PackageAlreadyInstalled,
            "DEP_RESOLUTION_FAILED" => Self::DepResolutionFailed,
            "REPO_NOT_FOUND" => Self::RepoNotFound,
            "REPO_CONFIGURATION_FAILED" => Self::RepoConfigurationFailed,
            "CANNOT_GET_LOCK" => Self::CannotGetLock,
            "INTERNAL_ERROR" => Self::InternalError,
            "TRANSACTION_ERROR" => Self::TransactionError,
            "NO_SUCH_TRANSACTION" => Self::NoSuchTransaction,
            "NOT_LOCKED" => Self::NotLocked,
            "NO_CACHE" => Self::NoCache,
            "REPO_NOT_AVAILABLE" => Self::RepoNotAvailable,
            "CANNOT_REMOVE_SYSTEM_PACKAGE" => Self::CannotRemoveSystemPackage,
            "PROCESS_KILL" => Self::ProcessKill,
            "CANNOT_DISABLE_REPOSITORY" => Self::CannotDisableRepository,
            "RESTRICTED_DOWNLOAD" => Self::RestrictedDownload,
            "PACKAGE_CORRUPT" => Self::PackageCorrupt,
            "ALL_PACKAGES_ALREADY_INSTALLED" => Self::AllPackagesAlreadyInstalled,
            "FILE_NOT_FOUND" => Self::FileNotFound,
            "NO_MORE_MIRRORS_TO_TRY" => Self::NoMoreMirrorsToTry,
            "NO_DISTRO_UPGRADE_DATA" => Self::NoDistroUpgradeData,
            "INCOMPATIBLE_ARCHITECTURE" => Self::IncompatibleArchitecture,
            "NO_SPACE_ON_DEVICE" => Self::NoSpaceOnDevice,
            "MEDIA_CHANGE_REQUIRED" => Self::MediaChangeRequired,
            "NOT_INITIALIZED" => Self::NotInitialized,
            "NOT_IN_CACHE" => Self::NotInCache,
            "PACKAGE_IN_USE" => Self::PackageInUse,
            "FAILED_CONFIG_PARSING" => Self::FailedConfigParsing,
            "LOCAL_INSTALL_FAILED" => Self::LocalInstallFailed,
            "REPO_SIGNATURE_ALREADY_IMPORTED" => Self::RepoSignatureAlreadyImported,
            "TRANSACTION_CANCELLED_PRIORITY" => Self::TransactionCancelledPriority,
            "FAILED_INITIALIZATION" => Self::FailedInitialization,
            "FAILED_FINALISE" => Self::FailedFinalise,
            "CANNOT_GET_FILELIST" => Self::CannotGetFilelist,
            "CANNOT_GET_REQUIRES" => Self::CannotGetRequires,
            "CANNOT_DISABLE_DEPENDENCY" => Self::CannotDisableDependency,
            "NOT_REQUIRED" => Self::NotRequired,
            "CANNOT_FETCH_SOURCES" => Self::CannotFetchSources,
            "NEED_UNTRUSTED" => Self::NeedUntrusted,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code_str())
    }
}

/// Unified broker error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Examples
///
/// ```
/// use swb_error::{BrokerError, ErrorCode};
///
/// let err = BrokerError::new(ErrorCode::PackageIdInvalid, "missing ';' separators")
///     .with_context("input", "hello-2.0")
///     .with_context("expected_parts", 4);
/// assert_eq!(err.code.wire_token(), "package-id-invalid");
/// ```
#[derive(Debug)]
pub struct BrokerError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description (the `details` free-text string on the wire).
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl BrokerError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialization
    /// fails, the entry is silently skipped.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for BrokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Errors in the narrow bus-transport layer, mapped from transport-specific
/// failures into the categories the core understands (§7 Error handling).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The daemon process could not be reached at all.
    #[error("cannot reach daemon")]
    CannotReachDaemon,
    /// The request body failed to deserialize.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A referenced file path was rejected by the transport layer.
    #[error("invalid file: {0}")]
    InvalidFile(String),
    /// The requested role has no route on this transport.
    #[error("not supported")]
    NotSupported,
    /// A policy-kit style remote refusal string was observed.
    #[error("policy denied: {0}")]
    PolicyDenied(String),
    /// Anything else.
    #[error("generic failure: {0}")]
    GenericFailed(String),
}

impl TransportError {
    /// Maps a transport error onto the closed [`ErrorCode`] set.
    #[must_use]
    pub fn into_error_code(self) -> ErrorCode {
        match self {
            Self::CannotReachDaemon => ErrorCode::InternalError,
            Self::InvalidInput(_) => ErrorCode::InputInvalid,
            Self::InvalidFile(_) => ErrorCode::NoSuchFile,
            Self::NotSupported => ErrorCode::NotSupported,
            Self::PolicyDenied(_) => ErrorCode::NotAuthorized,
            Self::GenericFailed(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_token_round_trips() {
        let codes = [
            ErrorCode::PackageIdInvalid,
            ErrorCode::NotAuthorized,
            ErrorCode::TransactionCancelled,
            ErrorCode::NeedUntrusted,
            ErrorCode::Oom,
        ];
        for code in codes {
            let token = code.wire_token();
            assert_eq!(ErrorCode::from_wire_token(&token), Some(code));
        }
    }

    #[test]
    fn code_str_round_trips() {
        let codes = [
            ErrorCode::FilterInvalid,
            ErrorCode::RepoNotFound,
            ErrorCode::CannotGetLock,
        ];
        for code in codes {
            assert_eq!(ErrorCode::from_code_str(code.as_code_str()), Some(code));
        }
    }

    #[test]
    fn unknown_token_rejected() {
        assert_eq!(ErrorCode::from_wire_token("not-a-real-code"), None);
    }

    #[test]
    fn builder_attaches_context_and_source() {
        let io_err = std::io::Error::other("boom");
        let err = BrokerError::new(ErrorCode::InternalError, "wrapped")
            .with_context("attempt", 3)
            .with_source(io_err);
        assert_eq!(err.context.get("attempt").and_then(|v| v.as_i64()), Some(3));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn transport_error_maps_to_error_code() {
        assert_eq!(
            TransportError::PolicyDenied("refused".into()).into_error_code(),
            ErrorCode::NotAuthorized
        );
        assert_eq!(
            TransportError::InvalidFile("x".into()).into_error_code(),
            ErrorCode::NoSuchFile
        );
    }
}
