// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bitfield enumerations (spec §3.2). On the wire these travel either as a
//! 64-bit integer or as a `;`-delimited list of kebab-case tokens; both
//! encodings round-trip through the same bit pattern (spec §8 invariant 6).

/// Declares a bitfield type backed by a `u64`, with named single-bit flags.
///
/// Generates a `Copy` struct with `empty()`, `bits()`/`from_bits()`,
/// `contains`/`insert`/`remove`, set algebra (`union`/`intersection`), and
/// the text-list wire encoding (`to_text_list`/`from_text_list`).
macro_rules! bitfield {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            bitfield!(@consts 0u32; $($(#[$fmeta])* $flag),+);

            /// The empty set (wire value `0`, token `"none"`).
            #[must_use]
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Raw 64-bit wire value.
            #[must_use]
            pub const fn bits(&self) -> u64 {
                self.0
            }

            /// Construct from a raw 64-bit wire value (unknown bits are kept,
            /// but [`Self::is_valid`] will report them).
            #[must_use]
            pub const fn from_bits(bits: u64) -> Self {
                Self(bits)
            }

            /// Every bit this type recognizes, OR'd together.
            #[must_use]
            pub const fn all_known() -> u64 {
                $(Self::$flag.0)|+
            }

            /// `true` if `bits()` contains no bit outside [`Self::all_known`].
            #[must_use]
            pub const fn is_valid(&self) -> bool {
                self.0 & !Self::all_known() == 0
            }

            /// `true` if every bit set in `flag` is also set in `self`.
            #[must_use]
            pub const fn contains(&self, flag: Self) -> bool {
                self.0 & flag.0 == flag.0
            }

            /// Returns a copy with `flag`'s bits set.
            #[must_use]
            pub const fn insert(&self, flag: Self) -> Self {
                Self(self.0 | flag.0)
            }

            /// Returns a copy with `flag`'s bits cleared.
            #[must_use]
            pub const fn remove(&self, flag: Self) -> Self {
                Self(self.0 & !flag.0)
            }

            /// Set union.
            #[must_use]
            pub const fn union(&self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Set intersection.
            #[must_use]
            pub const fn intersection(&self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            /// Render as a `;`-delimited list of kebab-case tokens. The empty
            /// set renders as `"none"`.
            #[must_use]
            pub fn to_text_list(&self) -> String {
                if self.0 == 0 {
                    return "none".to_string();
                }
                let mut tokens = Vec::new();
                $(if self.contains(Self::$flag) { tokens.push($token); })+
                tokens.join(";")
            }

            /// Parse a `;`-delimited list of kebab-case tokens (or the single
            /// token `"none"`). Unknown tokens are rejected.
            pub fn from_text_list(s: &str) -> Result<Self, String> {
                let mut out = Self::empty();
                for tok in s.split(';').map(str::trim).filter(|t| !t.is_empty()) {
                    if tok == "none" {
                        continue;
                    }
                    let flag = match tok {
                        $($token => Self::$flag,)+
                        other => return Err(format!("unknown filter token: {other}")),
                    };
                    out = out.insert(flag);
                }
                Ok(out)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_text_list())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                Self::from_text_list(&s).map_err(serde::de::Error::custom)
            }
        }
    };

    (@consts $counter:expr; $(#[$fmeta:meta])* $flag:ident $(, $(#[$rmeta:meta])* $rest:ident)*) => {
        $(#[$fmeta])*
        pub const $flag: Self = Self(1u64 << $counter);
        bitfield!(@consts_next $counter; $($(#[$rmeta])* $rest),*);
    };

    (@consts_next $counter:expr; $(#[$fmeta:meta])* $flag:ident $(, $(#[$rmeta:meta])* $rest:ident)*) => {
        $(#[$fmeta])*
        pub const $flag: Self = Self(1u64 << ($counter + 1));
        bitfield!(@consts_next ($counter + 1); $($(#[$rmeta])* $rest),*);
    };
    (@consts_next $counter:expr;) => {};
}

bitfield! {
    /// Result-set filter bitfield (spec §3.2 Filter).
    Filter {
        /// Only already-installed packages.
        INSTALLED = "installed",
        /// Only not-installed packages.
        NOT_INSTALLED = "not-installed",
        /// Only development packages.
        DEVEL = "devel",
        /// Exclude development packages.
        NOT_DEVEL = "not-devel",
        /// Only packages with a GUI.
        GUI = "gui",
        /// Exclude packages with a GUI.
        NOT_GUI = "not-gui",
        /// Only free-licensed packages.
        FREE = "free",
        /// Exclude free-licensed packages.
        NOT_FREE = "not-free",
        /// Only user-visible packages.
        VISIBLE = "visible",
        /// Exclude user-visible packages.
        NOT_VISIBLE = "not-visible",
        /// Only packages from supported repositories.
        SUPPORTED = "supported",
        /// Exclude packages from supported repositories.
        NOT_SUPPORTED = "not-supported",
        /// Collapse to one entry per basename.
        BASENAME = "basename",
        /// Disable basename collapsing.
        NOT_BASENAME = "not-basename",
        /// Only the newest version of each package.
        NEWEST = "newest",
        /// Include all versions, not just the newest.
        NOT_NEWEST = "not-newest",
        /// Only packages matching the native architecture.
        ARCH = "arch",
        /// Exclude packages matching the native architecture.
        NOT_ARCH = "not-arch",
        /// Only source packages.
        SOURCE = "source",
        /// Exclude source packages.
        NOT_SOURCE = "not-source",
        /// Only package collections/meta-packages.
        COLLECTIONS = "collections",
        /// Exclude package collections.
        NOT_COLLECTIONS = "not-collections",
        /// Only packages backing a desktop application.
        APPLICATION = "application",
        /// Exclude packages backing a desktop application.
        NOT_APPLICATION = "not-application",
        /// Only already-downloaded packages.
        DOWNLOADED = "downloaded",
        /// Exclude already-downloaded packages.
        NOT_DOWNLOADED = "not-downloaded",
    }
}

bitfield! {
    /// Transaction behavior flags (spec §3.2 TransactionFlag).
    TransactionFlag {
        /// Reject any package that is not cryptographically trusted.
        ONLY_TRUSTED = "only-trusted",
        /// Download only; do not apply changes.
        ONLY_DOWNLOAD = "only-download",
        /// Dry-run: report what would happen without changing anything.
        SIMULATE = "simulate",
        /// Allow reinstalling an already-installed package.
        ALLOW_REINSTALL = "allow-reinstall",
        /// Force a reinstall even if the version is unchanged.
        JUST_REINSTALL = "just-reinstall",
        /// Allow installing an older version over a newer one.
        ALLOW_DOWNGRADE = "allow-downgrade",
    }
}

impl Filter {
    /// `true` if this filter and its `not-*` counterpart are both set
    /// (a self-contradictory filter the validator should reject).
    #[must_use]
    pub fn has_contradiction(&self) -> bool {
        const PAIRS: &[(Filter, Filter)] = &[
            (Filter::INSTALLED, Filter::NOT_INSTALLED),
            (Filter::DEVEL, Filter::NOT_DEVEL),
            (Filter::GUI, Filter::NOT_GUI),
            (Filter::FREE, Filter::NOT_FREE),
            (Filter::VISIBLE, Filter::NOT_VISIBLE),
            (Filter::SUPPORTED, Filter::NOT_SUPPORTED),
            (Filter::BASENAME, Filter::NOT_BASENAME),
            (Filter::NEWEST, Filter::NOT_NEWEST),
            (Filter::ARCH, Filter::NOT_ARCH),
            (Filter::SOURCE, Filter::NOT_SOURCE),
            (Filter::COLLECTIONS, Filter::NOT_COLLECTIONS),
            (Filter::APPLICATION, Filter::NOT_APPLICATION),
            (Filter::DOWNLOADED, Filter::NOT_DOWNLOADED),
        ];
        PAIRS.iter().any(|(a, b)| self.contains(*a) && self.contains(*b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_round_trips_as_none() {
        assert_eq!(Filter::empty().to_text_list(), "none");
        assert_eq!(Filter::from_text_list("none").unwrap(), Filter::empty());
    }

    #[test]
    fn text_round_trips_regardless_of_order() {
        let f = Filter::INSTALLED.union(Filter::GUI).union(Filter::NEWEST);
        let text = f.to_text_list();
        let reparsed = Filter::from_text_list(&text).unwrap();
        assert_eq!(f, reparsed);

        // Construct the same set from tokens in a different order.
        let alt = Filter::from_text_list("newest;gui;installed").unwrap();
        assert_eq!(f, alt);
    }

    #[test]
    fn bits_round_trip() {
        let f = Filter::INSTALLED.union(Filter::NOT_GUI);
        assert_eq!(Filter::from_bits(f.bits()), f);
    }

    #[test]
    fn rejects_unknown_token() {
        assert!(Filter::from_text_list("bogus-filter").is_err());
    }

    #[test]
    fn contradiction_detection() {
        let f = Filter::INSTALLED.union(Filter::NOT_INSTALLED);
        assert!(f.has_contradiction());
        assert!(!Filter::INSTALLED.has_contradiction());
    }

    #[test]
    fn transaction_flag_round_trips() {
        let f = TransactionFlag::ONLY_TRUSTED.union(TransactionFlag::SIMULATE);
        let text = f.to_text_list();
        assert_eq!(TransactionFlag::from_text_list(&text).unwrap(), f);
    }

    #[test]
    fn is_valid_detects_unknown_bits() {
        let valid = Filter::INSTALLED;
        assert!(valid.is_valid());
        let invalid = Filter::from_bits(1u64 << 40);
        assert!(!invalid.is_valid());
    }
}
