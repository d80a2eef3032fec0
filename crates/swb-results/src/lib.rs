// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-results
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Result record types and the append-only container a transaction
//! accumulates them into (spec §3.3/§4.2).

pub mod container;
pub mod records;

pub use container::{Record, ResultsContainer};
pub use records::{
    Category, DistroUpgrade, Details, ErrorRecord, EulaRequired, Files, ItemProgress,
    MediaChangeRequired, Package, RepoDetail, RepoSignatureRequired, RequireRestart, Source,
    TransactionPast, UpdateDetail,
};
