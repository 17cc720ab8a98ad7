//! The `(byte_length, write_to)` / `(read_from, byte_length)` contract the
//! framing core needs from a payload, and a passthrough payload type for
//! schemas this crate does not implement (every response body heavier than
//! the fixed-width request headers in `methods`).

use std::io::{self, Read, Write};

use bytes::Bytes;

/// A payload the framing core can write without understanding its schema.
pub trait Serializable {
    /// Declared uncompressed byte length. Must match exactly the number of
    /// bytes `write_to` produces; a mismatch is the implementor's bug and
    /// surfaces downstream as a transport EOF or decode error.
    fn byte_length(&self) -> u64;

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()>;
}

/// A payload the framing core can read without understanding its schema,
/// given the exact number of bytes the wire declared.
pub trait Deserializable: Sized {
    fn read_from(r: &mut dyn Read, byte_length: u64) -> io::Result<Self>;
}

/// An opaque, schema-less payload: exactly `len` raw bytes.
///
/// Stands in for the real SSZ-encoded message bodies (e.g.
/// `SignedBeaconBlock`), which are out of scope for this crate. Any concrete
/// schema can be substituted by implementing the two traits above directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(pub Bytes);

impl Serializable for RawPayload {
    fn byte_length(&self) -> u64 {
        self.0.len() as u64
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&self.0)
    }
}

impl Deserializable for RawPayload {
    fn read_from(r: &mut dyn Read, byte_length: u64) -> io::Result<Self> {
        let mut buf = vec![0u8; byte_length as usize];
        r.read_exact(&mut buf)?;
        Ok(RawPayload(Bytes::from(buf)))
    }
}
