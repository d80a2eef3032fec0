// SPDX-License-Identifier: MIT OR Apache-2.0
//! Helper macros shared by the closed-set enums in this crate.

/// Adds `wire_token`/`from_wire_token` to an enum that already derives
/// `serde::Serialize`/`Deserialize` with `#[serde(rename_all = "kebab-case")]`.
///
/// The enum's own serde mapping is the single source of truth for the
/// bijective text encoding (spec §3.2); these two methods just expose it
/// without requiring callers to go through `serde_json`.
macro_rules! wire_enum {
    ($ty:ty) => {
        impl $ty {
            /// Kebab-case wire token for this value (e.g. `"not-installed"`).
            #[must_use]
            pub fn wire_token(&self) -> String {
                match serde_json::to_value(self) {
                    Ok(serde_json::Value::String(s)) => s,
                    _ => unreachable!("{} always serializes to a string", stringify!($ty)),
                }
            }

            /// Parse a kebab-case wire token back into this type.
            #[must_use]
            pub fn from_wire_token(token: &str) -> Option<Self> {
                serde_json::from_value(serde_json::Value::String(token.to_string())).ok()
            }
        }
    };
}

pub(crate) use wire_enum;
