// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-progress
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Progress reporting for the package broker (spec §3.4/§4.3): the
//! hierarchical [`Completion`] tracker a backend uses to turn discrete
//! sub-task completion into a monotonic percentage, and the flat [`Progress`]
//! aggregate a transaction exposes to its caller.

mod aggregate;
mod completion;

pub use aggregate::{Progress, ProgressChange, ProgressSnapshot};
pub use completion::{ChildGuard, Completion, CompletionError};
