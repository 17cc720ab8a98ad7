//! Opaque peer identity.
//!
//! The transport owns what a peer identity actually means (a libp2p
//! `PeerId`, a TCP socket address, ...); the framing core only needs
//! something hashable and cloneable to pass through `Method::run_request`
//! and the stream-handler callback.

use bytes::Bytes;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(Bytes);

impl PeerId {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        PeerId::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}
