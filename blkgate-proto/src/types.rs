//! Enumerations shared by both endpoints of a block channel
//!
//! Each enumeration carries two projections: a canonical string form used in
//! the key-value store and an integer form used on the wire or in packed
//! attribute words. Parsing the string form returns `None` on unknown input;
//! integer parsing is total where the wire encoding is a bit test and partial
//! where it is a code.

use serde::{Deserialize, Serialize};

/// Access mode granted to the frontend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "r")]
    ReadOnly,

    #[serde(rename = "w")]
    ReadWrite,
}

impl Mode {
    /// Returns the canonical store string ("r" or "w")
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::ReadOnly => "r",
            Mode::ReadWrite => "w",
        }
    }

    /// Parses the canonical store string, returning `None` on unknown input
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "r" => Some(Mode::ReadOnly),
            "w" => Some(Mode::ReadWrite),
            _ => None,
        }
    }

    /// Returns the mode's contribution to a packed info word (bit 2)
    pub fn to_bits(self) -> u32 {
        match self {
            Mode::ReadOnly => 0x4,
            Mode::ReadWrite => 0x0,
        }
    }

    /// Recovers the mode from a packed info word. Total over all integers,
    /// only bit 2 is inspected.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x4 {
            0 => Mode::ReadWrite,
            _ => Mode::ReadOnly,
        }
    }
}

/// Kind of medium the backend exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Media {
    CDROM,
    Disk,
}

impl Media {
    /// Returns the canonical store string ("cdrom" or "disk")
    pub fn as_str(self) -> &'static str {
        match self {
            Media::CDROM => "cdrom",
            Media::Disk => "disk",
        }
    }

    /// Parses the canonical store string, returning `None` on unknown input
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cdrom" => Some(Media::CDROM),
            "disk" => Some(Media::Disk),
            _ => None,
        }
    }

    /// Returns the media's contribution to a packed info word (bit 0)
    pub fn to_bits(self) -> u32 {
        match self {
            Media::CDROM => 0x1,
            Media::Disk => 0x0,
        }
    }

    /// Recovers the media kind from a packed info word. Total over all
    /// integers, only bit 0 is inspected.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x1 {
            0 => Media::Disk,
            _ => Media::CDROM,
        }
    }
}

/// Lifecycle state published under each endpoint's `state` key
///
/// The store transports states, not transitions; the expected order
/// (Initialising through Closed) is enforced by the endpoints themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Initialising = 1,
    InitWait = 2,
    Initialised = 3,
    Connected = 4,
    Closing = 5,
    Closed = 6,
}

impl State {
    /// Returns the state's integer code
    pub fn to_int(self) -> u32 {
        self as u32
    }

    /// Recovers a state from its integer code, `None` for unknown codes
    pub fn from_int(v: u32) -> Option<Self> {
        match v {
            1 => Some(State::Initialising),
            2 => Some(State::InitWait),
            3 => Some(State::Initialised),
            4 => Some(State::Connected),
            5 => Some(State::Closing),
            6 => Some(State::Closed),
            _ => None,
        }
    }

    /// Returns the store form of the state, the decimal string of its code
    pub fn as_str(self) -> &'static str {
        match self {
            State::Initialising => "1",
            State::InitWait => "2",
            State::Initialised => "3",
            State::Connected => "4",
            State::Closing => "5",
            State::Closed => "6",
        }
    }

    /// Parses the store form, returning `None` on unknown input
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<u32>().ok().and_then(Self::from_int)
    }
}

/// ABI the frontend compiled against, fixing the ring slot layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    X86_64,
    X86_32,
    Native,
}

impl Protocol {
    /// Returns the canonical store string
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::X86_64 => "x86_64-abi",
            Protocol::X86_32 => "x86_32-abi",
            Protocol::Native => "native",
        }
    }

    /// Parses the canonical store string, returning `None` on unknown input
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x86_64-abi" => Some(Protocol::X86_64),
            "x86_32-abi" => Some(Protocol::X86_32),
            "native" => Some(Protocol::Native),
            _ => None,
        }
    }
}

/// Operation tag carried in a request slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    Read = 0,
    Write = 1,
    WriteBarrier = 2,
    Flush = 3,
    Reserved1 = 4,
    Trim = 5,
    Indirect = 6,
}

impl Op {
    /// Returns the 8-bit wire tag
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Recovers an operation from its wire tag
    ///
    /// Unknown tags (including the 0xFF absent sentinel) decode to `None`, a
    /// malformed remote must not turn into a decode failure here.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Op::Read),
            1 => Some(Op::Write),
            2 => Some(Op::WriteBarrier),
            3 => Some(Op::Flush),
            4 => Some(Op::Reserved1),
            5 => Some(Op::Trim),
            6 => Some(Op::Indirect),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Read => "read",
            Op::Write => "write",
            Op::WriteBarrier => "write-barrier",
            Op::Flush => "flush",
            Op::Reserved1 => "reserved-1",
            Op::Trim => "trim",
            Op::Indirect => "indirect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Op::Read),
            "write" => Some(Op::Write),
            "write-barrier" => Some(Op::WriteBarrier),
            "flush" => Some(Op::Flush),
            "reserved-1" => Some(Op::Reserved1),
            "trim" => Some(Op::Trim),
            "indirect" => Some(Op::Indirect),
            _ => None,
        }
    }
}

/// Completion status carried in a response slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum RspStatus {
    OK = 0,
    Error = 0xFFFF,
    NotSupported = 0xFFFE,
}

impl RspStatus {
    /// Returns the 16-bit wire tag
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Recovers a status from its wire tag, `None` for unknown tags
    ///
    /// 0xFFFF doubles as the absent sentinel on the wire; this decoder
    /// prefers `Some(Error)` for it.
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(RspStatus::OK),
            0xFFFF => Some(RspStatus::Error),
            0xFFFE => Some(RspStatus::NotSupported),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RspStatus::OK => "ok",
            RspStatus::Error => "error",
            RspStatus::NotSupported => "not-supported",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(RspStatus::OK),
            "error" => Some(RspStatus::Error),
            "not-supported" => Some(RspStatus::NotSupported),
            _ => None,
        }
    }
}
