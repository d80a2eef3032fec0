// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-cli
#![deny(unsafe_code)]
//!
//! The thin external console client (spec §6.7): one subcommand per role,
//! talking to `swbrokerd`'s HTTP control surface. Carries none of the
//! daemon's policy or scheduling logic — it allocates a tid, submits the
//! role's parameters, polls the transaction object until `Finished`, and
//! prints what it observed.

pub mod client;
pub mod exit;

pub use client::BrokerClient;
pub use exit::ExitCode;
