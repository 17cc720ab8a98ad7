//! Error types surfaced by the framing core.
//!
//! One enum covers both the initiator and the responder side; callers match
//! on the variant to decide how to react (abort a stream, emit an error
//! chunk, retry at a higher layer, ...).

use std::io;

/// Errors the framing core can return.
///
/// `Handler` wraps whatever error type the embedding application's chunk or
/// request handler produced; the framing layer never inspects it, only
/// propagates it.
#[derive(Debug, thiserror::Error)]
pub enum ReqRespError {
    #[error("request of {size} bytes violates bounds {min}..={max}")]
    BadRequest { size: u64, min: u64, max: u64 },

    #[error("chunk {chunk_index} declared size {size} violates bounds {min}..={max}")]
    SizeViolation {
        chunk_index: u64,
        size: u64,
        min: u64,
        max: u64,
    },

    #[error("framing error: {0}")]
    Framing(#[source] io::Error),

    #[error("unknown fork digest {digest:02x?}")]
    UnknownFork { digest: [u8; 4] },

    #[error("invalid request input: {0}")]
    InvalidInput(String),

    #[error("decompression error: {0}")]
    Decompression(#[source] io::Error),

    #[error("chunk handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("cancelled")]
    Cancelled,
}

impl ReqRespError {
    pub(crate) fn framing(err: io::Error) -> Self {
        ReqRespError::Framing(err)
    }

    pub(crate) fn decompression(err: io::Error) -> Self {
        ReqRespError::Decompression(err)
    }

    /// Wraps an arbitrary handler error without requiring callers to name
    /// the concrete error type in their own `From` impls.
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ReqRespError::Handler(Box::new(err))
    }
}

impl From<io::Error> for ReqRespError {
    fn from(err: io::Error) -> Self {
        ReqRespError::Framing(err)
    }
}

pub type Result<T> = std::result::Result<T, ReqRespError>;
