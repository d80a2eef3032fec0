// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-transaction
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The per-transaction state machine, hints parsing, and role-input
//! validation for the package broker (spec §4.5): everything that happens
//! to one role method call between a client invoking it and the terminal
//! `Finished` signal, short of the cross-transaction admission ordering
//! that `swb-scheduler` owns.

mod hints;
mod transaction;
/// Role-dispatch input validation: package-id lists, file staging, and
/// filter/transaction-flag bitfield checks.
pub mod validate;

pub use hints::{Hints, CACHE_AGE_MAX};
pub use transaction::{DispatchSetup, State, Transaction};
