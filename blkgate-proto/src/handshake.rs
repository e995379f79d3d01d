//! Typed views of the attributes each endpoint publishes during negotiation
//!
//! The frontend announces its ring ([`RingInfo`]) and optional indirect
//! support ([`FeatureIndirect`]); the backend announces device geometry
//! ([`DiskInfo`]). Each record converts to and from a flat attribute map with
//! the exact key strings both endpoints expect.

use crate::{
    kv::{parse_int, parse_int32, parse_int64, require, AttrMap, KvError},
    types::{Media, Mode, Protocol},
};

pub const KEY_STATE: &str = "state";
pub const KEY_RING_REF: &str = "ring-ref";
pub const KEY_EVENT_CHANNEL: &str = "event-channel";
pub const KEY_PROTOCOL: &str = "protocol";
pub const KEY_FEATURE_INDIRECT: &str = "feature-max-indirect-segments";
pub const KEY_SECTOR_SIZE: &str = "sector-size";
pub const KEY_SECTORS: &str = "sectors";
pub const KEY_INFO: &str = "info";

// Live backend keys with no typed codec at this layer; owned by the toolstack
// and hotplug scripts.
pub const KEY_HOTPLUG_STATUS: &str = "hotplug-status";
pub const KEY_ONLINE: &str = "online";
pub const KEY_PARAMS: &str = "params";

/// Frontend advertisement of indirect-segment support
///
/// A value of zero means the feature is not advertised, in which case no
/// attribute is written at all; the absent key decodes back to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureIndirect {
    pub max_indirect_segments: u32,
}

impl FeatureIndirect {
    /// Returns the attributes to publish, empty when the feature is off
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        match self.max_indirect_segments {
            0 => Vec::new(),
            n => vec![(KEY_FEATURE_INDIRECT.to_string(), n.to_string())],
        }
    }

    /// Reads the advertisement back from an attribute map
    pub fn from_pairs(attrs: &AttrMap) -> Result<Self, KvError> {
        let max_indirect_segments = match attrs.get(KEY_FEATURE_INDIRECT) {
            None => 0,
            Some(raw) => parse_int(raw)?,
        };

        Ok(Self {
            max_indirect_segments,
        })
    }
}

/// Backend advertisement of device geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskInfo {
    /// Bytes per sector
    pub sector_size: u32,

    /// Total sectors on the device
    pub sectors: u64,

    pub media: Media,
    pub mode: Mode,
}

impl DiskInfo {
    /// Returns the attributes to publish
    ///
    /// The `info` word packs media into bit 0 and mode into bit 2.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let info = self.media.to_bits() | self.mode.to_bits();
        vec![
            (KEY_SECTOR_SIZE.to_string(), self.sector_size.to_string()),
            (KEY_SECTORS.to_string(), self.sectors.to_string()),
            (KEY_INFO.to_string(), info.to_string()),
        ]
    }

    /// Reads the geometry back from an attribute map; all three keys are
    /// required
    pub fn from_pairs(attrs: &AttrMap) -> Result<Self, KvError> {
        let sector_size = parse_int(require(attrs, KEY_SECTOR_SIZE)?)?;
        let sectors = parse_int64(require(attrs, KEY_SECTORS)?)?;
        let info = parse_int(require(attrs, KEY_INFO)?)?;

        Ok(Self {
            sector_size,
            sectors,
            media: Media::from_bits(info),
            mode: Mode::from_bits(info),
        })
    }
}

/// Frontend advertisement of its shared ring
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingInfo {
    /// Grant reference of the ring page
    pub ring_ref: u32,

    /// Event channel for ring notifications
    pub event_channel: u32,

    pub protocol: Protocol,
}

impl RingInfo {
    /// Returns the attributes to publish
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            (KEY_RING_REF.to_string(), self.ring_ref.to_string()),
            (
                KEY_EVENT_CHANNEL.to_string(),
                self.event_channel.to_string(),
            ),
            (KEY_PROTOCOL.to_string(), self.protocol.as_str().to_string()),
        ]
    }

    /// Reads the ring description back from an attribute map; all three keys
    /// are required and the protocol string must be recognised
    pub fn from_pairs(attrs: &AttrMap) -> Result<Self, KvError> {
        let ring_ref = parse_int32(require(attrs, KEY_RING_REF)?)?;
        let event_channel = parse_int(require(attrs, KEY_EVENT_CHANNEL)?)?;
        let raw = require(attrs, KEY_PROTOCOL)?;
        let protocol =
            Protocol::parse(raw).ok_or_else(|| KvError::UnknownProtocol(raw.to_string()))?;

        Ok(Self {
            ring_ref,
            event_channel,
            protocol,
        })
    }
}
