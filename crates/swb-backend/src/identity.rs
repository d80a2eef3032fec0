// SPDX-License-Identifier: MIT OR Apache-2.0
//! What a backend declares about itself (spec §4.4).

use std::collections::HashSet;
use swb_core::{Filter, Group, Role};

/// Static capability declaration a backend exposes once at load time.
#[derive(Debug, Clone)]
pub struct BackendIdentity {
    /// Short machine-readable name (e.g. `"dnf"`, `"apt"`).
    pub name: String,
    /// Human-readable one-line description.
    pub description: String,
    /// Author/maintainer string.
    pub author: String,
    /// Roles this backend implements an entry point for. The control
    /// surface (spec §4.7) advertises only these.
    pub roles: HashSet<Role>,
    /// Filter bits this backend honors when listing packages.
    pub filters: Filter,
    /// Package groups this backend can classify into.
    pub groups: HashSet<Group>,
    /// MIME types this backend can install directly (`install-files`).
    pub mime_types: Vec<String>,
}

impl BackendIdentity {
    /// `true` if this backend has an entry point for `role`.
    #[must_use]
    pub fn supports(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
