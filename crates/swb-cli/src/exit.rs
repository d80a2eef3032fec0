// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process exit codes for the console client (spec §6.7).

use swb_error::ErrorCode;

/// The five outcomes the console client can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The role ran to completion.
    Success = 0,
    /// The role finished, was refused, or errored for any reason not
    /// covered by a more specific code below.
    GenericFailure = 1,
    /// The daemon connection was lost mid-transaction (could not reach it,
    /// or it stopped responding while the transaction was in flight).
    DaemonDied = 2,
    /// The invocation itself was malformed (bad role name, unparsable
    /// package-id, wrong argument count).
    SyntaxInvalid = 3,
    /// A referenced local file does not exist.
    FileNotFound = 4,
}

impl ExitCode {
    /// Map a transaction's terminal [`ErrorCode`] to the exit code the
    /// console client should report.
    #[must_use]
    pub fn from_error_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::NoSuchFile | ErrorCode::NoSuchDirectory => Self::FileNotFound,
            _ => Self::GenericFailure,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
