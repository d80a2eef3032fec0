// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Info` and `UpdateSeverity` co-encoded into a single 32-bit wire value:
//! low 16 bits carry `Info`, high 16 bits carry `UpdateSeverity` (spec §3.2).

use crate::enums::{Info, UpdateSeverity};
use serde::{Deserialize, Serialize};

/// A [`Info`] paired with its co-encoded [`UpdateSeverity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoAndSeverity {
    /// The package info tag.
    pub info: Info,
    /// The update severity, if this info describes an available update.
    pub severity: UpdateSeverity,
}

impl InfoAndSeverity {
    /// Build from components.
    #[must_use]
    pub fn new(info: Info, severity: UpdateSeverity) -> Self {
        Self { info, severity }
    }

    /// Pack into the 32-bit wire representation: `info as u16 | (severity as u16) << 16`.
    #[must_use]
    pub fn to_u32(&self) -> u32 {
        let info_bits = info_discriminant(self.info) as u32;
        let severity_bits = severity_discriminant(self.severity) as u32;
        info_bits | (severity_bits << 16)
    }

    /// Unpack from the 32-bit wire representation.
    #[must_use]
    pub fn from_u32(bits: u32) -> Option<Self> {
        let info = info_from_discriminant((bits & 0xFFFF) as u16)?;
        let severity = severity_from_discriminant(((bits >> 16) & 0xFFFF) as u16)?;
        Some(Self { info, severity })
    }
}

// Explicit discriminant tables rather than `as` casts on the enum directly:
// this keeps the wire numbering stable even if variants are reordered for
// readability in `enums.rs`.

fn info_discriminant(info: Info) -> u16 {
    use Info::*;
    match info {
        Installed => 1,
        Available => 2,
        Low => 3,
        Enhancement => 4,
        Normal => 5,
        Bugfix => 6,
        Important => 7,
        Security => 8,
        Blocked => 9,
        Downloading => 10,
        Updating => 11,
        Installing => 12,
        Removing => 13,
        Cleanup => 14,
        Obsoleting => 15,
        CollectionInstalled => 16,
        CollectionAvailable => 17,
        Finished => 18,
        Reinstalling => 19,
        Downgrading => 20,
        Preparing => 21,
        Decompressing => 22,
        Untrusted => 23,
        Trusted => 24,
        Unavailable => 25,
        Critical => 26,
    }
}

fn info_from_discriminant(bits: u16) -> Option<Info> {
    use Info::*;
    Some(match bits {
        1 => Installed,
        2 => Available,
        3 => Low,
        4 => Enhancement,
        5 => Normal,
        6 => Bugfix,
        7 => Important,
        8 => Security,
        9 => Blocked,
        10 => Downloading,
        11 => Updating,
        12 => Installing,
        13 => Removing,
        14 => Cleanup,
        15 => Obsoleting,
        16 => CollectionInstalled,
        17 => CollectionAvailable,
        18 => Finished,
        19 => Reinstalling,
        20 => Downgrading,
        21 => Preparing,
        22 => Decompressing,
        23 => Untrusted,
        24 => Trusted,
        25 => Unavailable,
        26 => Critical,
        _ => return None,
    })
}

fn severity_discriminant(sev: UpdateSeverity) -> u16 {
    use UpdateSeverity::*;
    match sev {
        Unknown => 0,
        Low => 1,
        Normal => 2,
        Important => 3,
        Security => 4,
        Critical => 5,
    }
}

fn severity_from_discriminant(bits: u16) -> Option<UpdateSeverity> {
    use UpdateSeverity::*;
    Some(match bits {
        0 => Unknown,
        1 => Low,
        2 => Normal,
        3 => Important,
        4 => Security,
        5 => Critical,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks() {
        let v = InfoAndSeverity::new(Info::Security, UpdateSeverity::Critical);
        let bits = v.to_u32();
        assert_eq!(InfoAndSeverity::from_u32(bits), Some(v));
    }

    #[test]
    fn installed_has_zero_severity_by_default() {
        let v = InfoAndSeverity::new(Info::Installed, UpdateSeverity::Unknown);
        assert_eq!(v.to_u32() >> 16, 0);
    }

    proptest::proptest! {
        #[test]
        fn round_trips_for_every_combination(info_idx in 1u16..=26, sev_idx in 0u16..=5) {
            let info = info_from_discriminant(info_idx).unwrap();
            let sev = severity_from_discriminant(sev_idx).unwrap();
            let v = InfoAndSeverity::new(info, sev);
            prop_assert_eq!(InfoAndSeverity::from_u32(v.to_u32()), Some(v));
        }
    }
}
