// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-daemon
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The bus identity (spec §6.1), control surface (spec §4.7), and
//! transaction object (spec §4.8) for the package broker, realized over
//! HTTP: a control-surface router fixed at a well-known base path, and one
//! logical "transaction object" per allocated tid, addressed by the path
//! `GetTid` returns. A role method call validates, authorizes, and queues
//! for admission, then returns immediately — matching spec §6.2's "returns
//! immediately with no in-line result; actual results arrive via signals" —
//! and the caller polls the transaction object's snapshot/results routes
//! the way a bus subscriber would receive properties-changed and signal
//! emissions.

mod api;
mod state;
mod wire;

pub use api::build_app;
pub use state::{AppState, DaemonState};
pub use wire::{ControlStatus, RoleRequest, TransactionSnapshot};
