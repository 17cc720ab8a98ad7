//! Canonical context-bytes readers: the per-chunk tag that selects a
//! response chunk's payload schema and size bounds.

use std::collections::HashMap;
use std::io::Read;

use bytes::Bytes;

use crate::error::{ReqRespError, Result};
use crate::limit::BufLimitReader;
use crate::size::MinMaxSize;

/// A 4-byte fork digest, the one context tag this protocol family defines.
pub type ForkDigest = [u8; 4];

/// A method-scoped function invoked once per successful response chunk: it
/// consumes the context tag from the wire (if any) and returns the raw tag
/// bytes plus the size bounds that apply to this chunk's body.
pub type ReadContextFn = dyn Fn(&mut BufLimitReader<'_>) -> Result<(Bytes, MinMaxSize)> + Send + Sync;

/// No context tag: every chunk uses the same fixed bounds. Consumes zero
/// bytes from the wire. Used by single-schema methods (status, goodbye,
/// ping, metadata v1, blocks v1).
pub fn no_context(bounds: MinMaxSize) -> Box<ReadContextFn> {
    Box::new(move |_r| Ok((Bytes::new(), bounds)))
}

/// A 4-byte fork-digest tag selecting per-fork size bounds from `table`.
/// Used by v2 block methods to admit multiple block schemas on one stream.
/// An unknown digest is a [`ReqRespError::UnknownFork`].
pub fn fork_digest_context(table: HashMap<ForkDigest, MinMaxSize>) -> Box<ReadContextFn> {
    Box::new(move |r| {
        r.set_limit(4, false);
        let mut digest = [0u8; 4];
        r.read_exact(&mut digest)
            .map_err(ReqRespError::framing)?;

        match table.get(&digest) {
            Some(bounds) => Ok((Bytes::copy_from_slice(&digest), *bounds)),
            None => Err(ReqRespError::UnknownFork { digest }),
        }
    })
}
