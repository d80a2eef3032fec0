// SPDX-License-Identifier: MIT OR Apache-2.0
//! The package identifier: `name;version;arch;data` (spec §3.1, §4.1).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed package identifier: `(name, version, architecture, data)`.
///
/// `data` may be empty; every other component must be non-empty. The
/// canonical textual form is `name;version;arch;data` — this is the sole
/// on-wire representation (spec §6.5). Ordering is not implied: no
/// `Ord`/`PartialOrd` impl is provided, since the broker never compares
/// versions itself (that is a backend concern).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId {
    name: String,
    version: String,
    architecture: String,
    data: String,
}

/// Error returned when a string fails to parse as a [`PackageId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackageIdError {
    /// The string does not split into exactly four `;`-delimited parts.
    #[error("expected exactly 3 ';' separators (4 components), got {separators}")]
    WrongComponentCount {
        /// Number of `;` characters found.
        separators: usize,
    },
    /// The `name` component was empty.
    #[error("package name must not be empty")]
    EmptyName,
}

impl PackageId {
    /// Parse a package-id string of the form `name;version;arch;data`.
    ///
    /// Requires exactly three `;` separators (four components) and a
    /// non-empty `name`. `version`, `architecture`, and `data` may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`PackageIdError`] if the separator count is wrong or `name`
    /// is empty.
    pub fn parse(s: &str) -> Result<Self, PackageIdError> {
        let parts: Vec<&str> = s.split(';').collect();
        if parts.len() != 4 {
            return Err(PackageIdError::WrongComponentCount {
                separators: parts.len().saturating_sub(1),
            });
        }
        if parts[0].is_empty() {
            return Err(PackageIdError::EmptyName);
        }
        Ok(Self {
            name: parts[0].to_string(),
            version: parts[1].to_string(),
            architecture: parts[2].to_string(),
            data: parts[3].to_string(),
        })
    }

    /// Construct directly from components, bypassing the wire parser.
    ///
    /// # Errors
    ///
    /// Returns [`PackageIdError::EmptyName`] if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        architecture: impl Into<String>,
        data: impl Into<String>,
    ) -> Result<Self, PackageIdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PackageIdError::EmptyName);
        }
        Ok(Self {
            name,
            version: version.into(),
            architecture: architecture.into(),
            data: data.into(),
        })
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version string (backend-defined format, not ordered here).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Architecture string.
    #[must_use]
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// Free-form data component (commonly the originating repository id).
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Component-wise equality ignoring `architecture` — used by roles such
    /// as `DependsOn`/`RequiredBy` that must match a package across
    /// multi-arch repositories.
    #[must_use]
    pub fn eq_fuzzy_arch(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version && self.data == other.data
    }

    /// Render back to the canonical `name;version;arch;data` wire form.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        format!("{};{};{};{}", self.name, self.version, self.architecture, self.data)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl std::str::FromStr for PackageId {
    type Err = PackageIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageId {
    type Error = PackageIdError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PackageId> for String {
    fn from(pid: PackageId) -> Self {
        pid.to_wire_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed() {
        let pid = PackageId::parse("powertop;1.8-1.fc30;x86_64;installed").unwrap();
        assert_eq!(pid.name(), "powertop");
        assert_eq!(pid.version(), "1.8-1.fc30");
        assert_eq!(pid.architecture(), "x86_64");
        assert_eq!(pid.data(), "installed");
    }

    #[test]
    fn empty_data_is_preserved() {
        let pid = PackageId::parse("hello;2.10;noarch;").unwrap();
        assert_eq!(pid.data(), "");
        assert_eq!(pid.to_wire_string(), "hello;2.10;noarch;");
    }

    #[test]
    fn rejects_wrong_separator_count() {
        assert!(matches!(
            PackageId::parse("hello;2.10;noarch"),
            Err(PackageIdError::WrongComponentCount { separators: 2 })
        ));
        assert!(matches!(
            PackageId::parse("hello;2.10;noarch;fedora;extra"),
            Err(PackageIdError::WrongComponentCount { separators: 4 })
        ));
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(
            PackageId::parse(";2.10;noarch;fedora"),
            Err(PackageIdError::EmptyName)
        ));
    }

    #[test]
    fn full_equality_considers_architecture() {
        let a = PackageId::parse("hello;2.10;x86_64;fedora").unwrap();
        let b = PackageId::parse("hello;2.10;noarch;fedora").unwrap();
        assert_ne!(a, b);
        assert!(a.eq_fuzzy_arch(&b));
    }

    #[test]
    fn fuzzy_arch_ignores_only_architecture() {
        let a = PackageId::parse("hello;2.10;x86_64;fedora").unwrap();
        let diff_version = PackageId::parse("hello;2.11;x86_64;fedora").unwrap();
        assert!(!a.eq_fuzzy_arch(&diff_version));
    }

    proptest::proptest! {
        #[test]
        fn round_trip_parse_format(
            name in "[a-zA-Z0-9_.+-]{1,32}",
            version in "[a-zA-Z0-9_.:~-]{0,32}",
            arch in "[a-zA-Z0-9_]{0,16}",
            data in "[a-zA-Z0-9_.-]{0,32}",
        ) {
            let pid = PackageId::new(&name, &version, &arch, &data).unwrap();
            let wire = pid.to_wire_string();
            let reparsed = PackageId::parse(&wire).unwrap();
            prop_assert_eq!(pid, reparsed);
        }

        #[test]
        fn parse_rejects_any_non_four_part_string(s in "[^;]{0,10}") {
            // A string with no ';' at all never has exactly 4 parts unless empty-name edge.
            prop_assert!(PackageId::parse(&s).is_err());
        }
    }
}
