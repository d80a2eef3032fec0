// SPDX-License-Identifier: MIT OR Apache-2.0
//! Percentage encoding shared by [`crate::records::ItemProgress`] and the
//! progress object (spec §6.4): `0..=100`, or `101` meaning "unknown".

use serde::{Deserialize, Serialize};

/// A percentage value, or the indeterminate sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Percentage {
    /// A known value in `0..=100`.
    Known(u8),
    /// Indeterminate / not yet known (wire value `101`).
    Unknown,
}

/// Wire value used for [`Percentage::Unknown`].
pub const UNKNOWN_WIRE_VALUE: u32 = 101;

impl Percentage {
    /// Construct from a `0..=100` value.
    ///
    /// # Panics
    ///
    /// Panics if `value > 100`. Callers with untrusted input should use
    /// [`TryFrom<u32>`] instead.
    #[must_use]
    pub fn known(value: u8) -> Self {
        assert!(value <= 100, "percentage out of range: {value}");
        Self::Known(value)
    }

    /// The raw wire value (`0..=100`, or `101` for unknown).
    #[must_use]
    pub fn wire_value(&self) -> u32 {
        match self {
            Self::Known(v) => u32::from(*v),
            Self::Unknown => UNKNOWN_WIRE_VALUE,
        }
    }

    /// `true` for [`Percentage::Unknown`].
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl TryFrom<u32> for Percentage {
    type Error = String;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            0..=100 => Ok(Self::Known(v as u8)),
            UNKNOWN_WIRE_VALUE => Ok(Self::Unknown),
            other => Err(format!("percentage out of range: {other}")),
        }
    }
}

impl From<Percentage> for u32 {
    fn from(p: Percentage) -> Self {
        p.wire_value()
    }
}

impl PartialOrd for Percentage {
    /// `Unknown` does not compare to anything, including itself — matching
    /// the "no ordering implied" treatment the progress object gives it.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_round_trips() {
        let p = Percentage::known(42);
        assert_eq!(p.wire_value(), 42);
        assert_eq!(Percentage::try_from(42u32).unwrap(), p);
    }

    #[test]
    fn unknown_round_trips() {
        assert_eq!(Percentage::try_from(101u32).unwrap(), Percentage::Unknown);
        assert_eq!(Percentage::Unknown.wire_value(), 101);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Percentage::try_from(102u32).is_err());
    }

    #[test]
    fn unknown_is_unordered() {
        assert_eq!(Percentage::Unknown.partial_cmp(&Percentage::known(50)), None);
        assert!(Percentage::known(10) < Percentage::known(20));
    }
}
