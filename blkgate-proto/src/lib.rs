//! Protocol core for a paravirtualised block channel
//!
//! A guest-side frontend and a host-side backend share two surfaces: a ring
//! of fixed-size slots carrying block requests and responses, and a
//! hierarchical key-value store carrying identity, capabilities, ring
//! location, geometry, and lifecycle state. This crate owns the bit-exact
//! slot layouts (including both 32- and 64-bit ABI variants) and the typed
//! attribute codecs; transports, grants, and actual block I/O live with the
//! caller.

pub mod connection;
pub mod handshake;
pub mod kv;
mod macros;
pub mod ring;
pub mod types;

pub use self::{
    connection::Connection,
    handshake::{DiskInfo, FeatureIndirect, RingInfo},
    kv::{AttrMap, KvError},
    ring::{Abi, Request, Response, Segment, SegmentPayload},
};

/// Errors surfaced by the ring slot codecs
///
/// Unknown operation and status tags are not errors (they decode to absent
/// values); only a slot too small for its layout or a request whose shape
/// cannot fit one fails loudly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("not enough data for slot, got = {0}, expected = {1}")]
    NotEnoughData(usize, usize),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
