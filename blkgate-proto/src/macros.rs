//! Helper macros

/// Casts a little-endian byte slice into the named integer type
///
/// The slice must be exactly the width of the target type; slot codecs only
/// invoke this on fixed ranges after bounds-checking the whole slot.
#[macro_export]
macro_rules! cast {
    (le16, $data:expr) => {
        u16::from_le_bytes($data.try_into().unwrap())
    };
    (le32, $data:expr) => {
        u32::from_le_bytes($data.try_into().unwrap())
    };
    (le64, $data:expr) => {
        u64::from_le_bytes($data.try_into().unwrap())
    };
}
