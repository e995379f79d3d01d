//! Response slot marshalling
//!
//! Responses share one layout across ABIs; the 64-bit variant only appends a
//! pad word that neither side reads or writes.

use crate::{
    cast,
    types::{Op, RspStatus},
    ProtocolError,
};

const OP_NONE: u8 = 0xFF;
const RSP_NONE: u16 = 0xFFFF;

/// One completion record as written into a ring slot
///
/// The status sentinel for "absent" is numerically the error tag, so writing
/// `status: None` and `status: Some(Error)` produce identical bytes; reading
/// either back yields `Some(Error)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    /// Operation the completion refers to; `None` round-trips as 0xFF
    pub op: Option<Op>,

    pub status: Option<RspStatus>,
}

impl Response {
    /// Bytes read and written; the 64-bit slot adds 4 trailing pad bytes
    /// that are never touched
    pub const LEN: usize = 12;

    /// Writes the completion for request `id` into a ring slot
    ///
    /// ### Arguments
    /// * `id` - Identifier copied from the request being completed
    /// * `slot` - Slot buffer, at least [`Response::LEN`] bytes
    pub fn write(&self, id: u64, slot: &mut [u8]) -> Result<(), ProtocolError> {
        if slot.len() < Self::LEN {
            return Err(ProtocolError::NotEnoughData(slot.len(), Self::LEN));
        }

        slot[0..8].copy_from_slice(&id.to_le_bytes());
        slot[8] = self.op.map(Op::to_u8).unwrap_or(OP_NONE);
        slot[9] = 0;
        let st = self.status.map(RspStatus::to_u16).unwrap_or(RSP_NONE);
        slot[10..12].copy_from_slice(&st.to_le_bytes());

        Ok(())
    }

    /// Reads a completion back out of a ring slot, returning the request id
    /// it answers alongside the decoded record
    pub fn read(slot: &[u8]) -> Result<(u64, Self), ProtocolError> {
        if slot.len() < Self::LEN {
            return Err(ProtocolError::NotEnoughData(slot.len(), Self::LEN));
        }

        let id = cast!(le64, slot[0..8]);
        let op = Op::from_u8(slot[8]);
        let status = RspStatus::from_u16(cast!(le16, slot[10..12]));

        Ok((id, Self { op, status }))
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::Response;
    use crate::{
        ring::Abi,
        types::{Op, RspStatus},
        ProtocolError,
    };

    #[test]
    fn round_trip() {
        let rsp = Response {
            op: Some(Op::Flush),
            status: Some(RspStatus::NotSupported),
        };

        let mut slot = vec![0u8; Abi::X86_64.response_len()];
        rsp.write(0x1122_3344_5566_7788, &mut slot).unwrap();

        assert_eq!(
            Response::read(&slot).unwrap(),
            (0x1122_3344_5566_7788, rsp)
        );
    }

    #[test]
    fn byte_layout() {
        let rsp = Response {
            op: Some(Op::Read),
            status: Some(RspStatus::OK),
        };

        let mut slot = [0xAAu8; 16];
        rsp.write(513, &mut slot).unwrap();

        assert_eq!(slot[0..8], 513u64.to_le_bytes());
        assert_eq!(slot[8], 0);
        assert_eq!(slot[10..12], [0, 0]);
        // trailing 64-bit pad is never written
        assert_eq!(slot[12..16], [0xAA; 4]);
    }

    #[test]
    fn absent_tags_write_sentinels() {
        let rsp = Response {
            op: None,
            status: None,
        };

        let mut slot = [0u8; Response::LEN];
        rsp.write(0, &mut slot).unwrap();

        assert_eq!(slot[8], 0xFF);
        assert_eq!(slot[10..12], [0xFF, 0xFF]);

        // the absent-status sentinel reads back as the error tag
        let (_, back) = Response::read(&slot).unwrap();
        assert_eq!(back.op, None);
        assert_eq!(back.status, Some(RspStatus::Error));
    }

    #[test]
    fn error_status_and_absent_status_collide_on_the_wire() {
        let mut absent = [0u8; Response::LEN];
        let mut error = [0u8; Response::LEN];

        Response {
            op: Some(Op::Write),
            status: None,
        }
        .write(9, &mut absent)
        .unwrap();
        Response {
            op: Some(Op::Write),
            status: Some(RspStatus::Error),
        }
        .write(9, &mut error)
        .unwrap();

        assert_eq!(absent, error);
    }

    #[test]
    fn short_slot_is_rejected() {
        let rsp = Response {
            op: None,
            status: None,
        };

        let mut slot = [0u8; 8];
        assert_eq!(
            rsp.write(0, &mut slot),
            Err(ProtocolError::NotEnoughData(8, 12))
        );
    }

    #[test]
    fn random_responses_round_trip() {
        let mut rng = rand::thread_rng();

        for _ in 0..32 {
            let rsp = Response {
                op: Op::from_u8(rng.gen_range(0..=6)),
                status: Some(match rng.gen_range(0..3) {
                    0 => RspStatus::OK,
                    1 => RspStatus::Error,
                    _ => RspStatus::NotSupported,
                }),
            };
            let id = rng.gen();

            let mut slot = [0u8; Response::LEN];
            rsp.write(id, &mut slot).unwrap();
            assert_eq!(Response::read(&slot).unwrap(), (id, rsp));
        }
    }
}
