// SPDX-License-Identifier: MIT OR Apache-2.0
//! Free-form `key=value` hints submitted before a role method (spec §4.5).
//! Unknown hints are ignored; recognized ones are parsed into typed
//! fields and become immutable once the role method runs.

/// Maximum tolerated metadata age: "never stale".
pub const CACHE_AGE_MAX: u32 = u32::MAX;

/// Parsed, typed view of a transaction's hints.
#[derive(Debug, Clone, Default)]
pub struct Hints {
    /// IETF-like locale tag for backend-visible human text.
    pub locale: Option<String>,
    /// Run at lower priority / throttle network use.
    pub background: bool,
    /// Permit the backend to prompt the client interactively.
    pub interactive: bool,
    /// Maximum tolerated metadata age, in seconds. [`CACHE_AGE_MAX`] means
    /// "never stale".
    pub cache_age: Option<u32>,
    /// Request transitive download sizes from `get-details`.
    pub details_with_deps_size: bool,
    /// The client can accept batched `Packages`/`UpdateDetails` signals.
    pub supports_plural_signals: bool,
    /// Unix-domain socket path the backend may drive an interactive
    /// front-end through.
    pub frontend_socket: Option<String>,
}

impl Hints {
    /// Parse a sequence of `key=value` strings. Entries that are not
    /// `key=value`, or whose key is unrecognized, are ignored rather than
    /// rejected (spec §4.5 "Unknown hints are ignored").
    #[must_use]
    pub fn parse<'a>(entries: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hints = Self::default();
        for entry in entries {
            let Some((key, value)) = entry.split_once('=') else { continue };
            match key {
                "locale" => hints.locale = Some(value.to_string()),
                "background" => hints.background = parse_bool(value),
                "interactive" => hints.interactive = parse_bool(value),
                "cache-age" => {
                    hints.cache_age = if value.eq_ignore_ascii_case("max") {
                        Some(CACHE_AGE_MAX)
                    } else {
                        value.parse().ok()
                    };
                }
                "details-with-deps-size" => hints.details_with_deps_size = parse_bool(value),
                "supports-plural-signals" => hints.supports_plural_signals = parse_bool(value),
                "frontend-socket" => hints.frontend_socket = Some(value.to_string()),
                _ => {}
            }
        }
        hints
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_hints() {
        let hints = Hints::parse(["locale=en_US.UTF-8", "background=true", "cache-age=3600"]);
        assert_eq!(hints.locale.as_deref(), Some("en_US.UTF-8"));
        assert!(hints.background);
        assert_eq!(hints.cache_age, Some(3600));
    }

    #[test]
    fn cache_age_max_is_case_insensitive() {
        let hints = Hints::parse(["cache-age=MAX"]);
        assert_eq!(hints.cache_age, Some(CACHE_AGE_MAX));
    }

    #[test]
    fn unknown_hints_and_malformed_entries_are_ignored() {
        let hints = Hints::parse(["bogus-hint=1", "no-equals-sign", "interactive=yes"]);
        assert!(hints.interactive);
        assert!(hints.locale.is_none());
    }
}
