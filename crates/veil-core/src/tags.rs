//! CBOR semantic tags reserved by the envelope wire format.
//!
//! These numbers are part of the interchange format. Changing any of them
//! breaks byte-for-byte compatibility with every other implementation.

/// RFC 8949 "encoded CBOR data item", used to mark envelope leaves.
pub const LEAF: u64 = 24;

/// A tagged envelope (also marks a wrapped envelope inside a tree).
pub const ENVELOPE: u64 = 200;

pub const KNOWN_VALUE: u64 = 40000;
pub const DIGEST: u64 = 40001;
pub const ENCRYPTED: u64 = 40002;
pub const COMPRESSED: u64 = 40003;
pub const SALT: u64 = 40018;
pub const SEALED_MESSAGE: u64 = 40019;
pub const SIGNATURE: u64 = 40020;
pub const PUBLIC_KEY: u64 = 40021;

/// Human-readable name for a reserved tag, if any.
pub fn name_for_tag(tag: u64) -> Option<&'static str> {
    match tag {
        LEAF => Some("leaf"),
        ENVELOPE => Some("envelope"),
        KNOWN_VALUE => Some("known-value"),
        DIGEST => Some("digest"),
        ENCRYPTED => Some("encrypted"),
        COMPRESSED => Some("compressed"),
        SALT => Some("salt"),
        SEALED_MESSAGE => Some("sealed-message"),
        SIGNATURE => Some("signature"),
        PUBLIC_KEY => Some("public-key"),
        _ => None,
    }
}
