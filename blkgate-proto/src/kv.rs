//! Decode combinators for store attribute maps
//!
//! An attribute map is an unordered set of string key/value pairs scoped
//! under an endpoint's store path. Decoders thread these combinators with `?`
//! so the first missing key or unparsable value stops the decode; a caller
//! never sees a partially populated record.

use std::collections::HashMap;

use crate::types::State;

/// Attributes observed under a single store path
pub type AttrMap = HashMap<String, String>;

/// Errors produced while decoding an attribute map into a typed record
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KvError {
    #[error("missing {0} key")]
    MissingKey(String),

    #[error("not an int: {0}")]
    NotAnInt(String),

    #[error("not an int32: {0}")]
    NotAnInt32(String),

    #[error("not an int64: {0}")]
    NotAnInt64(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("unknown state: {0}")]
    UnknownState(String),
}

/// Looks up a key, failing with the key's name when absent
///
/// ### Arguments
/// * `attrs` - Attribute map to search
/// * `key` - Key that must be present
pub fn require<'a>(attrs: &'a AttrMap, key: &str) -> Result<&'a str, KvError> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| KvError::MissingKey(key.to_string()))
}

/// Parses a decimal integer attribute value
pub fn parse_int(raw: &str) -> Result<u32, KvError> {
    raw.parse().map_err(|_| KvError::NotAnInt(raw.to_string()))
}

/// Parses a decimal 32-bit attribute value
pub fn parse_int32(raw: &str) -> Result<u32, KvError> {
    raw.parse().map_err(|_| KvError::NotAnInt32(raw.to_string()))
}

/// Parses a decimal 64-bit attribute value
pub fn parse_int64(raw: &str) -> Result<u64, KvError> {
    raw.parse().map_err(|_| KvError::NotAnInt64(raw.to_string()))
}

/// Parses a lifecycle state from its decimal store form
pub fn parse_state(raw: &str) -> Result<State, KvError> {
    State::parse(raw).ok_or_else(|| KvError::UnknownState(raw.to_string()))
}
