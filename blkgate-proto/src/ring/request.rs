//! Request slot marshalling
//!
//! Four marshallers share this module: {32-bit, 64-bit} × {direct, indirect}.
//! The ABI is fixed per session by the negotiated protocol; the direct or
//! indirect form is chosen per request by its segment payload. A request
//! naming more segments than fit inline carries grant references to auxiliary
//! pages instead, each page holding up to
//! [`SEGMENTS_PER_INDIRECT_PAGE`](crate::ring::SEGMENTS_PER_INDIRECT_PAGE)
//! segment records.

use crate::{
    cast,
    ring::{Abi, Segment, MAX_INDIRECT_PAGES, SEGMENTS_PER_INDIRECT_PAGE, SEGMENTS_PER_REQUEST},
    types::Op,
    ProtocolError,
};

/// Wire sentinel for "no operation tag"
const OP_NONE: u8 = 0xFF;

/// Where a request's segments live
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentPayload {
    /// Segments carried inline in the slot, at most
    /// [`SEGMENTS_PER_REQUEST`](crate::ring::SEGMENTS_PER_REQUEST)
    Direct(Vec<Segment>),

    /// Grant references of pages holding the segment records
    Indirect(Vec<u32>),
}

/// One block request as written into a ring slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Operation to perform; `None` round-trips as the 0xFF sentinel
    pub op: Option<Op>,

    /// Backend handle for the target device
    pub handle: u16,

    /// Caller-chosen identifier echoed back in the response
    pub id: u64,

    /// First sector of the transfer
    pub sector: u64,

    /// Total segment count. For a direct request this is the inline segment
    /// count; for an indirect request it counts the segments inside the
    /// granted pages.
    pub nr_segs: u32,

    pub segments: SegmentPayload,
}

/// Grant references needed to carry `nr_segs` segments indirectly
fn grefs_for(nr_segs: u32) -> usize {
    (nr_segs as usize).div_ceil(SEGMENTS_PER_INDIRECT_PAGE)
}

impl Request {
    /// Writes the request into a ring slot and returns its `id` so the
    /// caller can match the eventual completion
    ///
    /// ### Arguments
    /// * `abi` - Negotiated slot layout
    /// * `slot` - Slot buffer, at least [`Abi::request_len`] bytes
    pub fn write(&self, abi: Abi, slot: &mut [u8]) -> Result<u64, ProtocolError> {
        if slot.len() < abi.request_len() {
            return Err(ProtocolError::NotEnoughData(slot.len(), abi.request_len()));
        }

        match &self.segments {
            SegmentPayload::Direct(segs) => self.write_direct(abi, segs, slot)?,
            SegmentPayload::Indirect(grefs) => self.write_indirect(abi, grefs, slot)?,
        }

        Ok(self.id)
    }

    fn write_direct(&self, abi: Abi, segs: &[Segment], slot: &mut [u8]) -> Result<(), ProtocolError> {
        if segs.len() > SEGMENTS_PER_REQUEST {
            return Err(ProtocolError::MalformedRequest(format!(
                "{} segments exceed the {} inline slots",
                segs.len(),
                SEGMENTS_PER_REQUEST
            )));
        }

        if segs.len() != self.nr_segs as usize {
            return Err(ProtocolError::MalformedRequest(format!(
                "nr_segs = {} but {} segments attached",
                self.nr_segs,
                segs.len()
            )));
        }

        slot[0] = self.op.map(Op::to_u8).unwrap_or(OP_NONE);
        slot[1] = self.nr_segs as u8;
        slot[2..4].copy_from_slice(&self.handle.to_le_bytes());

        match abi {
            Abi::X86_64 => {
                slot[4..8].copy_from_slice(&[0; 4]);
                slot[8..16].copy_from_slice(&self.id.to_le_bytes());
                slot[16..24].copy_from_slice(&self.sector.to_le_bytes());
            }
            Abi::X86_32 => {
                slot[4..12].copy_from_slice(&self.id.to_le_bytes());
                slot[12..20].copy_from_slice(&self.sector.to_le_bytes());
            }
        }

        let base = abi.direct_header_len();
        for (i, seg) in segs.iter().enumerate() {
            let off = base + i * Segment::LEN;
            seg.write(&mut slot[off..off + Segment::LEN]);
        }

        Ok(())
    }

    fn write_indirect(&self, abi: Abi, grefs: &[u32], slot: &mut [u8]) -> Result<(), ProtocolError> {
        if grefs.len() > MAX_INDIRECT_PAGES {
            return Err(ProtocolError::MalformedRequest(format!(
                "{} grant refs exceed the {} payload slots",
                grefs.len(),
                MAX_INDIRECT_PAGES
            )));
        }

        if grefs.len() != grefs_for(self.nr_segs) {
            return Err(ProtocolError::MalformedRequest(format!(
                "nr_segs = {} needs {} grant refs, {} attached",
                self.nr_segs,
                grefs_for(self.nr_segs),
                grefs.len()
            )));
        }

        // the primary op byte frames the slot as indirect; the semantic
        // operation moves into the indirect_op field
        slot[0] = Op::Indirect.to_u8();
        slot[1] = self.op.map(Op::to_u8).unwrap_or(OP_NONE);
        slot[2..4].copy_from_slice(&(self.nr_segs as u16).to_le_bytes());

        match abi {
            Abi::X86_64 => {
                slot[4..8].copy_from_slice(&[0; 4]);
                slot[8..16].copy_from_slice(&self.id.to_le_bytes());
                slot[16..24].copy_from_slice(&self.sector.to_le_bytes());
                slot[24..26].copy_from_slice(&self.handle.to_le_bytes());
                slot[26..28].copy_from_slice(&[0; 2]);
            }
            Abi::X86_32 => {
                slot[4..12].copy_from_slice(&self.id.to_le_bytes());
                slot[12..20].copy_from_slice(&self.sector.to_le_bytes());
                slot[20..22].copy_from_slice(&self.handle.to_le_bytes());
                slot[22..24].copy_from_slice(&[0; 2]);
            }
        }

        let base = abi.indirect_header_len();
        for (i, gref) in grefs.iter().enumerate() {
            let off = base + i * 4;
            slot[off..off + 4].copy_from_slice(&gref.to_le_bytes());
        }

        Ok(())
    }

    /// Reads a request back out of a ring slot
    ///
    /// The low byte decides the framing: the indirect tag switches to the
    /// indirect header layout, anything else reads as a direct request.
    /// Unknown operation tags decode to `None` rather than failing.
    ///
    /// ### Arguments
    /// * `abi` - Negotiated slot layout
    /// * `slot` - Slot buffer, at least [`Abi::request_len`] bytes
    pub fn read(abi: Abi, slot: &[u8]) -> Result<Self, ProtocolError> {
        if slot.len() < abi.request_len() {
            return Err(ProtocolError::NotEnoughData(slot.len(), abi.request_len()));
        }

        match slot[0] == Op::Indirect.to_u8() {
            true => Self::read_indirect(abi, slot),
            false => Self::read_direct(abi, slot),
        }
    }

    fn read_direct(abi: Abi, slot: &[u8]) -> Result<Self, ProtocolError> {
        let op = decode_op(slot[0]);
        let nr_segs = u32::from(slot[1]);
        let handle = cast!(le16, slot[2..4]);

        let (id, sector) = match abi {
            Abi::X86_64 => (cast!(le64, slot[8..16]), cast!(le64, slot[16..24])),
            Abi::X86_32 => (cast!(le64, slot[4..12]), cast!(le64, slot[12..20])),
        };

        if nr_segs as usize > SEGMENTS_PER_REQUEST {
            return Err(ProtocolError::MalformedRequest(format!(
                "direct request names {} segments, slot holds {}",
                nr_segs, SEGMENTS_PER_REQUEST
            )));
        }

        let base = abi.direct_header_len();
        let segs = (0..nr_segs as usize)
            .map(|i| {
                let off = base + i * Segment::LEN;
                Segment::read(&slot[off..off + Segment::LEN])
            })
            .collect();

        Ok(Self {
            op,
            handle,
            id,
            sector,
            nr_segs,
            segments: SegmentPayload::Direct(segs),
        })
    }

    fn read_indirect(abi: Abi, slot: &[u8]) -> Result<Self, ProtocolError> {
        let op = decode_op(slot[1]);
        let nr_segs = u32::from(cast!(le16, slot[2..4]));

        let (id, sector, handle) = match abi {
            Abi::X86_64 => (
                cast!(le64, slot[8..16]),
                cast!(le64, slot[16..24]),
                cast!(le16, slot[24..26]),
            ),
            Abi::X86_32 => (
                cast!(le64, slot[4..12]),
                cast!(le64, slot[12..20]),
                cast!(le16, slot[20..22]),
            ),
        };

        let nr_grefs = grefs_for(nr_segs);
        if nr_grefs > MAX_INDIRECT_PAGES {
            return Err(ProtocolError::MalformedRequest(format!(
                "indirect request names {} segments, needing {} of {} payload slots",
                nr_segs, nr_grefs, MAX_INDIRECT_PAGES
            )));
        }

        let base = abi.indirect_header_len();
        let grefs = (0..nr_grefs)
            .map(|i| {
                let off = base + i * 4;
                cast!(le32, slot[off..off + 4])
            })
            .collect();

        Ok(Self {
            op,
            handle,
            id,
            sector,
            nr_segs,
            segments: SegmentPayload::Indirect(grefs),
        })
    }
}

fn decode_op(tag: u8) -> Option<Op> {
    let op = Op::from_u8(tag);
    if op.is_none() && tag != OP_NONE {
        tracing::trace!(tag, "unknown op tag, treating as absent");
    }
    op
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::{Request, SegmentPayload};
    use crate::{
        ring::{Abi, Segment},
        types::Op,
        ProtocolError,
    };

    fn direct(op: Option<Op>, segs: Vec<Segment>) -> Request {
        Request {
            op,
            handle: 0,
            id: 42,
            sector: 1000,
            nr_segs: segs.len() as u32,
            segments: SegmentPayload::Direct(segs),
        }
    }

    fn two_segments() -> Vec<Segment> {
        vec![
            Segment {
                gref: 7,
                first_sector: 0,
                last_sector: 7,
            },
            Segment {
                gref: 9,
                first_sector: 0,
                last_sector: 3,
            },
        ]
    }

    #[test]
    fn direct_round_trip_both_abis() {
        let req = direct(Some(Op::Read), two_segments());

        for abi in [Abi::X86_32, Abi::X86_64] {
            let mut slot = vec![0u8; abi.request_len()];
            let id = req.write(abi, &mut slot).unwrap();
            assert_eq!(id, 42);
            assert_eq!(Request::read(abi, &slot).unwrap(), req);
        }
    }

    #[test]
    fn direct_64bit_byte_layout() {
        let req = direct(Some(Op::Read), two_segments());

        let mut slot = vec![0u8; Abi::X86_64.request_len()];
        req.write(Abi::X86_64, &mut slot).unwrap();

        assert_eq!(slot[0], 0, "op tag");
        assert_eq!(slot[1], 2, "nr_segs");
        assert_eq!(u64::from_le_bytes(slot[8..16].try_into().unwrap()), 42);
        assert_eq!(u64::from_le_bytes(slot[16..24].try_into().unwrap()), 1000);
        // segment 0 starts right after the header
        assert_eq!(slot[24..32], [7, 0, 0, 0, 0, 7, 0, 0]);
    }

    #[test]
    fn direct_32bit_header_drops_the_pad_word() {
        let req = direct(Some(Op::Write), two_segments());

        let mut slot = vec![0u8; Abi::X86_32.request_len()];
        req.write(Abi::X86_32, &mut slot).unwrap();

        assert_eq!(u64::from_le_bytes(slot[4..12].try_into().unwrap()), 42);
        assert_eq!(u64::from_le_bytes(slot[12..20].try_into().unwrap()), 1000);
        assert_eq!(slot[20..28], [7, 0, 0, 0, 0, 7, 0, 0]);
    }

    #[test]
    fn segment_bytes_are_identical_across_marshallers() {
        let req = direct(Some(Op::Read), two_segments());

        let mut wide = vec![0u8; Abi::X86_64.request_len()];
        let mut narrow = vec![0u8; Abi::X86_32.request_len()];
        req.write(Abi::X86_64, &mut wide).unwrap();
        req.write(Abi::X86_32, &mut narrow).unwrap();

        assert_eq!(wide[24..40], narrow[20..36]);
    }

    #[test]
    fn absent_op_writes_the_sentinel() {
        let req = direct(None, Vec::new());

        let mut slot = vec![0u8; Abi::X86_64.request_len()];
        req.write(Abi::X86_64, &mut slot).unwrap();

        assert_eq!(slot[0], 0xFF);
        assert_eq!(Request::read(Abi::X86_64, &slot).unwrap().op, None);
    }

    #[test]
    fn indirect_round_trip_both_abis() {
        let req = Request {
            op: Some(Op::Write),
            handle: 3,
            id: 77,
            sector: 4096,
            nr_segs: 600,
            segments: SegmentPayload::Indirect(vec![11, 12]),
        };

        for abi in [Abi::X86_32, Abi::X86_64] {
            let mut slot = vec![0u8; abi.request_len()];
            req.write(abi, &mut slot).unwrap();
            assert_eq!(Request::read(abi, &slot).unwrap(), req);
        }
    }

    #[test]
    fn indirect_framing_moves_the_op() {
        let req = Request {
            op: Some(Op::Write),
            handle: 0,
            id: 1,
            sector: 0,
            nr_segs: 600,
            segments: SegmentPayload::Indirect(vec![11, 12]),
        };

        let mut slot = vec![0u8; Abi::X86_64.request_len()];
        req.write(Abi::X86_64, &mut slot).unwrap();

        assert_eq!(slot[0], 6, "primary op byte is the indirect tag");
        assert_eq!(slot[1], 1, "semantic op lives in indirect_op");

        let back = Request::read(Abi::X86_64, &slot).unwrap();
        assert_eq!(back.op, Some(Op::Write));
        assert_eq!(back.segments, SegmentPayload::Indirect(vec![11, 12]));
    }

    #[test]
    fn short_slot_is_rejected() {
        let req = direct(Some(Op::Read), Vec::new());

        let mut slot = vec![0u8; 64];
        assert_eq!(
            req.write(Abi::X86_64, &mut slot),
            Err(ProtocolError::NotEnoughData(64, 112))
        );
        assert!(matches!(
            Request::read(Abi::X86_64, &slot),
            Err(ProtocolError::NotEnoughData(64, 112))
        ));
    }

    #[test]
    fn oversubscribed_direct_request_is_rejected() {
        let segs = vec![
            Segment {
                gref: 1,
                first_sector: 0,
                last_sector: 7,
            };
            12
        ];
        let req = direct(Some(Op::Read), segs);

        let mut slot = vec![0u8; Abi::X86_64.request_len()];
        assert!(matches!(
            req.write(Abi::X86_64, &mut slot),
            Err(ProtocolError::MalformedRequest(_))
        ));
    }

    #[test]
    fn direct_slot_naming_too_many_segments_is_rejected() {
        let mut slot = vec![0u8; Abi::X86_64.request_len()];
        slot[0] = 0;
        slot[1] = 12;
        assert!(matches!(
            Request::read(Abi::X86_64, &slot),
            Err(ProtocolError::MalformedRequest(_))
        ));
    }

    #[test]
    fn random_requests_round_trip() {
        let mut rng = rand::thread_rng();

        for _ in 0..64 {
            let nr_segs = rng.gen_range(0..=11u32);
            let segs = (0..nr_segs)
                .map(|_| Segment {
                    gref: rng.gen(),
                    first_sector: rng.gen(),
                    last_sector: rng.gen(),
                })
                .collect();

            let req = Request {
                op: Op::from_u8(rng.gen_range(0..=5)),
                handle: rng.gen(),
                id: rng.gen(),
                sector: rng.gen(),
                nr_segs,
                segments: SegmentPayload::Direct(segs),
            };

            for abi in [Abi::X86_32, Abi::X86_64] {
                let mut slot = vec![0u8; abi.request_len()];
                req.write(abi, &mut slot).unwrap();
                assert_eq!(Request::read(abi, &slot).unwrap(), req);
            }
        }
    }
}
