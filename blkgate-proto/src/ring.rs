//! Shared-ring slot codecs
//!
//! One ring slot holds either a request or a response. Layouts are
//! little-endian and bit-exact against the hypervisor ABI; the 32- and 64-bit
//! variants differ only in compiler-inserted padding, so both are spelled out
//! here as explicit offsets rather than trusting any native struct layout.
//!
//! The ring transport itself (producer/consumer indices, notification) lives
//! outside this crate; callers hand each codec a slot they have exclusive
//! access to for the duration of the call.

mod request;
mod response;

pub use self::{
    request::{Request, SegmentPayload},
    response::Response,
};

use crate::types::Protocol;

/// Segment slots reserved in every request, fixing the slot footprint
pub const SEGMENTS_PER_REQUEST: usize = 11;

/// Segments one indirect page can address
pub const SEGMENTS_PER_INDIRECT_PAGE: usize = 512;

/// Most grant references an indirect request's payload can carry
pub const MAX_INDIRECT_PAGES: usize = 8;

/// Slot layout negotiated for a session
///
/// Both endpoints must agree on a layout before the first slot is written;
/// the remote may impose either width regardless of the local word size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Abi {
    X86_32,
    X86_64,
}

impl From<Protocol> for Abi {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::X86_32 => Abi::X86_32,
            Protocol::X86_64 => Abi::X86_64,
            #[cfg(target_pointer_width = "64")]
            Protocol::Native => Abi::X86_64,
            #[cfg(not(target_pointer_width = "64"))]
            Protocol::Native => Abi::X86_32,
        }
    }
}

impl Abi {
    /// Bytes in a direct request header
    pub const fn direct_header_len(self) -> usize {
        match self {
            Abi::X86_32 => 20,
            Abi::X86_64 => 24,
        }
    }

    /// Bytes in an indirect request header
    pub const fn indirect_header_len(self) -> usize {
        match self {
            Abi::X86_32 => 24,
            Abi::X86_64 => 28,
        }
    }

    /// Total bytes in a request slot: the direct header plus the reserved
    /// segment area. Indirect requests share the same footprint.
    pub const fn request_len(self) -> usize {
        self.direct_header_len() + SEGMENTS_PER_REQUEST * Segment::LEN
    }

    /// Total bytes in a response slot. The 64-bit layout ends in a pad word
    /// that is never read or written.
    pub const fn response_len(self) -> usize {
        match self {
            Abi::X86_32 => Response::LEN,
            Abi::X86_64 => Response::LEN + 4,
        }
    }
}

/// One contiguous run of sectors within a granted page
///
/// `first_sector`/`last_sector` index 512-byte sectors within the page; the
/// codec passes the values through without checking their order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Grant reference of the page holding the data
    pub gref: u32,

    pub first_sector: u8,
    pub last_sector: u8,
}

impl Segment {
    /// Encoded size, identical across ABIs
    pub const LEN: usize = 8;

    pub(crate) fn write(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.gref.to_le_bytes());
        buf[4] = self.first_sector;
        buf[5] = self.last_sector;
        buf[6..8].copy_from_slice(&[0, 0]);
    }

    pub(crate) fn read(buf: &[u8]) -> Self {
        Self {
            gref: crate::cast!(le32, buf[0..4]),
            first_sector: buf[4],
            last_sector: buf[5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Abi, Segment};
    use crate::types::Protocol;

    #[test]
    fn slot_sizes_match_the_abi() {
        assert_eq!(Abi::X86_64.request_len(), 112);
        assert_eq!(Abi::X86_32.request_len(), 108);
        assert_eq!(Abi::X86_64.response_len(), 16);
        assert_eq!(Abi::X86_32.response_len(), 12);
    }

    #[test]
    fn explicit_protocols_pick_their_abi() {
        assert_eq!(Abi::from(Protocol::X86_64), Abi::X86_64);
        assert_eq!(Abi::from(Protocol::X86_32), Abi::X86_32);
    }

    #[test]
    fn segment_encoding_is_abi_independent() {
        let seg = Segment {
            gref: 0xDEAD_BEEF,
            first_sector: 2,
            last_sector: 7,
        };

        let mut buf = [0u8; Segment::LEN];
        seg.write(&mut buf);
        assert_eq!(buf, [0xEF, 0xBE, 0xAD, 0xDE, 2, 7, 0, 0]);
        assert_eq!(Segment::read(&buf), seg);
    }
}
