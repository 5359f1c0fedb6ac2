//! Channel identity and the per-channel radio metrics the store consumes
//!
//! Descriptor format: `C<carrier>T<timeslot> <type-and-offset>`
//!
//! Examples:
//! - `C0T2 TCH/F`
//! - `C1T0 SDCCH/4-3`
//! - `C0T6 TCH/H-1`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of timeslots on one GSM carrier.
pub const TIMESLOTS: u8 = 8;

/// Logical channel type together with its subchannel offset on the timeslot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeAndOffset {
    /// Idle or unassigned multiframe position
    Misc,
    /// Full-rate traffic channel
    TchF,
    /// Half-rate traffic channel, subchannel 0..=1
    TchH(u8),
    /// SDCCH on a combined C-V timeslot, subchannel 0..=3
    Sdcch4(u8),
    /// SDCCH on a C-VII timeslot, subchannel 0..=7
    Sdcch8(u8),
    /// Broadcast control channel on the beacon
    BeaconBcch,
    /// Common control channel on the beacon
    BeaconCcch,
    /// The beacon timeslot as a whole
    Beacon,
}

impl TypeAndOffset {
    /// Numeric code used by the transceiver layer
    ///
    /// Fails for a subchannel offset outside the channel type's range, so
    /// no two valid values share a code.
    pub fn code(&self) -> Result<u8> {
        Ok(match self.validate()? {
            TypeAndOffset::Misc => 0,
            TypeAndOffset::TchF => 1,
            TypeAndOffset::TchH(sub) => 2 + sub,
            TypeAndOffset::Sdcch4(sub) => 4 + sub,
            TypeAndOffset::Sdcch8(sub) => 8 + sub,
            TypeAndOffset::BeaconBcch => 16,
            TypeAndOffset::BeaconCcch => 17,
            TypeAndOffset::Beacon => 18,
        })
    }

    /// Check the subchannel offset against the channel type
    pub fn validate(self) -> Result<Self> {
        match self {
            TypeAndOffset::TchH(sub) => Self::check_subchannel(sub, 2, "TCH/H").map(TypeAndOffset::TchH),
            TypeAndOffset::Sdcch4(sub) => {
                Self::check_subchannel(sub, 4, "SDCCH/4").map(TypeAndOffset::Sdcch4)
            }
            TypeAndOffset::Sdcch8(sub) => {
                Self::check_subchannel(sub, 8, "SDCCH/8").map(TypeAndOffset::Sdcch8)
            }
            other => Ok(other),
        }
    }

    /// Inverse of [`TypeAndOffset::code`]
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(TypeAndOffset::Misc),
            1 => Ok(TypeAndOffset::TchF),
            2..=3 => Ok(TypeAndOffset::TchH(code - 2)),
            4..=7 => Ok(TypeAndOffset::Sdcch4(code - 4)),
            8..=15 => Ok(TypeAndOffset::Sdcch8(code - 8)),
            16 => Ok(TypeAndOffset::BeaconBcch),
            17 => Ok(TypeAndOffset::BeaconCcch),
            18 => Ok(TypeAndOffset::Beacon),
            _ => Err(Error::InvalidChannel(format!("Unknown type-and-offset code: {}", code))),
        }
    }

    fn check_subchannel(sub: u8, limit: u8, name: &str) -> Result<u8> {
        if sub < limit {
            Ok(sub)
        } else {
            Err(Error::InvalidChannel(format!("{} subchannel out of range: {}", name, sub)))
        }
    }
}

impl fmt::Display for TypeAndOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAndOffset::Misc => write!(f, "misc"),
            TypeAndOffset::TchF => write!(f, "TCH/F"),
            TypeAndOffset::TchH(sub) => write!(f, "TCH/H-{}", sub),
            TypeAndOffset::Sdcch4(sub) => write!(f, "SDCCH/4-{}", sub),
            TypeAndOffset::Sdcch8(sub) => write!(f, "SDCCH/8-{}", sub),
            TypeAndOffset::BeaconBcch => write!(f, "BCCH"),
            TypeAndOffset::BeaconCcch => write!(f, "CCCH"),
            TypeAndOffset::Beacon => write!(f, "beacon"),
        }
    }
}

impl FromStr for TypeAndOffset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse_sub = |digits: &str| {
            digits
                .parse::<u8>()
                .map_err(|_| Error::InvalidChannel(format!("Invalid subchannel: {}", digits)))
        };

        match s {
            "misc" => return Ok(TypeAndOffset::Misc),
            "TCH/F" => return Ok(TypeAndOffset::TchF),
            "BCCH" => return Ok(TypeAndOffset::BeaconBcch),
            "CCCH" => return Ok(TypeAndOffset::BeaconCcch),
            "beacon" => return Ok(TypeAndOffset::Beacon),
            _ => {}
        }

        if let Some(sub) = s.strip_prefix("TCH/H-") {
            return TypeAndOffset::TchH(parse_sub(sub)?).validate();
        }
        if let Some(sub) = s.strip_prefix("SDCCH/4-") {
            return TypeAndOffset::Sdcch4(parse_sub(sub)?).validate();
        }
        if let Some(sub) = s.strip_prefix("SDCCH/8-") {
            return TypeAndOffset::Sdcch8(parse_sub(sub)?).validate();
        }

        Err(Error::InvalidChannel(format!("Unknown channel type: {}", s)))
    }
}

/// Stable, unique identity of one logical channel on a physical carrier.
///
/// The rendered descriptor is the primary key of the status table, so two
/// different descriptors must never render to the same string. Fields are
/// only set through [`ChannelDescriptor::new`], which rejects any value
/// `parse` would not accept back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelDescriptor {
    cn: u8,
    tn: u8,
    type_and_offset: TypeAndOffset,
}

impl ChannelDescriptor {
    /// Create a new descriptor
    pub fn new(cn: u8, tn: u8, type_and_offset: TypeAndOffset) -> Result<Self> {
        if tn >= TIMESLOTS {
            return Err(Error::InvalidChannel(format!("Timeslot out of range: {}", tn)));
        }
        let type_and_offset = type_and_offset.validate()?;
        Ok(Self { cn, tn, type_and_offset })
    }

    /// Carrier number within the cell
    pub fn cn(&self) -> u8 {
        self.cn
    }

    /// Timeslot number (0-7)
    pub fn tn(&self) -> u8 {
        self.tn
    }

    /// Channel type and subchannel offset
    pub fn type_and_offset(&self) -> TypeAndOffset {
        self.type_and_offset
    }

    /// Parse a descriptor string
    ///
    /// Expected format: `C<cn>T<tn> <type-and-offset>`
    pub fn parse(descriptor: &str) -> Result<Self> {
        let rest = descriptor
            .strip_prefix('C')
            .ok_or_else(|| Error::InvalidChannel("Descriptor must start with C".to_string()))?;

        let (slot, kind) = rest
            .split_once(' ')
            .ok_or_else(|| Error::InvalidChannel("Descriptor must contain a channel type".to_string()))?;

        let (cn_str, tn_str) = slot
            .split_once('T')
            .ok_or_else(|| Error::InvalidChannel("Descriptor must contain C<cn>T<tn>".to_string()))?;

        let cn: u8 = cn_str
            .parse()
            .map_err(|_| Error::InvalidChannel(format!("Invalid carrier number: {}", cn_str)))?;
        let tn: u8 = tn_str
            .parse()
            .map_err(|_| Error::InvalidChannel(format!("Invalid timeslot: {}", tn_str)))?;

        Self::new(cn, tn, kind.parse()?)
    }

    /// Render the descriptor used as the storage key
    pub fn descriptive_string(&self) -> String {
        format!("C{}T{} {}", self.cn, self.tn, self.type_and_offset)
    }
}

impl fmt::Display for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptive_string())
    }
}

impl FromStr for ChannelDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ChannelDescriptor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.descriptive_string())
    }
}

impl<'de> Deserialize<'de> for ChannelDescriptor {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChannelDescriptor::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Radio metrics a logical channel exposes to the status store.
///
/// Implemented by the channel-handling layer; the store only reads from it.
pub trait ChannelStatus {
    /// Unique key for this channel instance
    fn descriptive_string(&self) -> String;

    /// Uplink RSSI relative to full scale input
    fn rssi(&self) -> f64;

    /// Timing advance error in symbol periods
    fn timing_error(&self) -> f64;

    /// Commanded handset tx power in dBm
    fn actual_ms_power(&self) -> i32;

    /// Commanded handset timing advance in symbol periods
    fn actual_ms_timing(&self) -> i32;

    /// Uplink frame erasure rate
    fn fer(&self) -> f64;

    /// Assigned carrier frequency index
    fn arfcn(&self) -> u32;
}

/// Point-in-time copy of a channel's metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub descriptor: ChannelDescriptor,
    pub arfcn: u32,
    pub rssi: f64,
    pub timing_error: f64,
    pub ms_power: i32,
    pub ms_timing: i32,
    pub fer: f64,
}

impl ChannelSnapshot {
    /// Snapshot with all metrics zeroed
    pub fn new(descriptor: ChannelDescriptor, arfcn: u32) -> Self {
        Self {
            descriptor,
            arfcn,
            rssi: 0.0,
            timing_error: 0.0,
            ms_power: 0,
            ms_timing: 0,
            fer: 0.0,
        }
    }
}

impl ChannelStatus for ChannelSnapshot {
    fn descriptive_string(&self) -> String {
        self.descriptor.descriptive_string()
    }

    fn rssi(&self) -> f64 {
        self.rssi
    }

    fn timing_error(&self) -> f64 {
        self.timing_error
    }

    fn actual_ms_power(&self) -> i32 {
        self.ms_power
    }

    fn actual_ms_timing(&self) -> i32 {
        self.ms_timing
    }

    fn fer(&self) -> f64 {
        self.fer
    }

    fn arfcn(&self) -> u32 {
        self.arfcn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_roundtrip() {
        let desc = ChannelDescriptor::new(1, 0, TypeAndOffset::Sdcch4(3)).unwrap();
        let key = desc.descriptive_string();
        assert_eq!(key, "C1T0 SDCCH/4-3");

        let parsed = ChannelDescriptor::parse(&key).unwrap();
        assert_eq!(parsed, desc);
    }

    #[test]
    fn test_descriptor_parse() {
        let desc: ChannelDescriptor = "C0T6 TCH/H-1".parse().unwrap();
        assert_eq!(desc.cn(), 0);
        assert_eq!(desc.tn(), 6);
        assert_eq!(desc.type_and_offset(), TypeAndOffset::TchH(1));
    }

    #[test]
    fn test_invalid_descriptor() {
        assert!(ChannelDescriptor::parse("invalid").is_err());
        assert!(ChannelDescriptor::parse("C0T2").is_err()); // missing type
        assert!(ChannelDescriptor::parse("C0T8 TCH/F").is_err()); // timeslot out of range
        assert!(ChannelDescriptor::parse("C0T1 SDCCH/4-4").is_err());
        assert!(ChannelDescriptor::parse("C0T1 TCH/X").is_err());
    }

    #[test]
    fn test_descriptors_are_distinct() {
        let mut keys = std::collections::HashSet::new();
        for cn in 0..2 {
            for tn in 0..TIMESLOTS {
                for code in 0..=18 {
                    let tao = TypeAndOffset::from_code(code).unwrap();
                    let desc = ChannelDescriptor::new(cn, tn, tao).unwrap();
                    assert!(keys.insert(desc.descriptive_string()), "collision for {:?}", desc);
                }
            }
        }
        assert_eq!(keys.len(), 2 * 8 * 19);
    }

    #[test]
    fn test_type_and_offset_codes() {
        for code in 0..=18 {
            let tao = TypeAndOffset::from_code(code).unwrap();
            assert_eq!(tao.code().unwrap(), code);
            assert_eq!(tao.to_string().parse::<TypeAndOffset>().unwrap(), tao);
        }
        assert!(TypeAndOffset::from_code(19).is_err());
    }

    #[test]
    fn test_out_of_range_subchannel_is_rejected() {
        assert!(ChannelDescriptor::new(0, 1, TypeAndOffset::TchH(2)).is_err());
        assert!(ChannelDescriptor::new(0, 1, TypeAndOffset::TchH(5)).is_err());
        assert!(ChannelDescriptor::new(0, 0, TypeAndOffset::Sdcch4(4)).is_err());
        assert!(ChannelDescriptor::new(0, 1, TypeAndOffset::Sdcch8(250)).is_err());

        // codes stay unique and never overflow
        assert!(TypeAndOffset::TchH(2).code().is_err());
        assert_eq!(TypeAndOffset::Sdcch4(0).code().unwrap(), 4);
        assert!(TypeAndOffset::Sdcch8(250).code().is_err());

        // every descriptor `new` accepts survives a serde roundtrip
        let desc = ChannelDescriptor::new(0, 1, TypeAndOffset::TchH(1)).unwrap();
        let json = serde_json::to_string(&desc).unwrap();
        assert_eq!(json, "\"C0T1 TCH/H-1\"");
        assert_eq!(serde_json::from_str::<ChannelDescriptor>(&json).unwrap(), desc);
    }

    #[test]
    fn test_snapshot_serde() {
        let desc = ChannelDescriptor::new(0, 2, TypeAndOffset::TchF).unwrap();
        let snap = ChannelSnapshot::new(desc, 51);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"C0T2 TCH/F\""));

        let back: ChannelSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
