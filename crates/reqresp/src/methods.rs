//! The eight canonical method descriptors: request payload schemas
//! fixed-width enough to express without a full SSZ codec, wired up with
//! their protocol IDs, size bounds, and context readers so embedders
//! normally do not hand-construct [`Method`] values themselves.
//!
//! Response chunk bodies stay opaque ([`crate::codec::RawPayload`] or a
//! caller-supplied [`crate::codec::Deserializable`] type): concrete
//! SSZ-encoded schemas (`SignedBeaconBlock` and friends) are out of scope for
//! this crate.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::codec::{Deserializable, Serializable};
use crate::compression::SnappyCompression;
use crate::context::{ForkDigest, fork_digest_context, no_context};
use crate::method::Method;
use crate::size::{HARD_CHUNK_CAP, MAX_REQUEST_BLOCKS_BY_ROOT, MinMaxSize};

/// Fixed byte length of the status v1 request/response payload.
pub const STATUS_V1_BYTE_LEN: u64 = 84;
/// Fixed byte length of the goodbye v1 request/response payload.
pub const GOODBYE_V1_BYTE_LEN: u64 = 8;
/// Fixed byte length of the ping v1 request/response payload.
pub const PING_V1_BYTE_LEN: u64 = 8;
/// Fixed byte length of the metadata v1 response payload: an 8-byte
/// `seq_number` plus an 8-byte `attnets` bitvector.
pub const METADATA_V1_BYTE_LEN: u64 = 16;
/// Byte length of a `blocks_by_range` request: three little-endian `u64`
/// fields (`start_slot`, `count`, `step`).
pub const BLOCKS_BY_RANGE_REQUEST_BYTE_LEN: u64 = 24;
/// Byte length of one root in a `blocks_by_root` request.
pub const ROOT_LEN: u64 = 32;

/// Shared lower bound on a signed block payload across every fork: smaller
/// than any real block, just large enough to reject an obviously truncated
/// chunk early.
pub const SIGNED_BLOCK_MIN: u64 = 64;
/// Upper bound on a pre-Deneb signed block chunk, used by the v1 methods
/// (which have no per-fork context to narrow the bound) and inherited by the
/// v2 table's earlier forks. 10 MiB mirrors the historical `MAX_CHUNK_SIZE`
/// used by mainnet clients before blob-carrying forks needed more headroom.
pub const SIGNED_BLOCK_MAX_V1: u64 = 10 * 1024 * 1024;

/// `{start_slot, count, step}`, each an 8-byte little-endian unsigned
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlocksByRangeRequest {
    pub start_slot: u64,
    pub count: u64,
    pub step: u64,
}

impl Serializable for BlocksByRangeRequest {
    fn byte_length(&self) -> u64 {
        BLOCKS_BY_RANGE_REQUEST_BYTE_LEN
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&self.start_slot.to_le_bytes())?;
        w.write_all(&self.count.to_le_bytes())?;
        w.write_all(&self.step.to_le_bytes())
    }
}

impl Deserializable for BlocksByRangeRequest {
    fn read_from(r: &mut dyn Read, byte_length: u64) -> io::Result<Self> {
        if byte_length != BLOCKS_BY_RANGE_REQUEST_BYTE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "blocks_by_range request must be exactly 24 bytes",
            ));
        }
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf)?;
        let start_slot = u64::from_le_bytes(buf);
        r.read_exact(&mut buf)?;
        let count = u64::from_le_bytes(buf);
        r.read_exact(&mut buf)?;
        let step = u64::from_le_bytes(buf);
        Ok(Self {
            start_slot,
            count,
            step,
        })
    }
}

/// A `blocks_by_root` request body: a sequence of 32-byte roots, at most
/// [`MAX_REQUEST_BLOCKS_BY_ROOT`] of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocksByRootRequest(pub Vec<[u8; 32]>);

impl Serializable for BlocksByRootRequest {
    fn byte_length(&self) -> u64 {
        self.0.len() as u64 * ROOT_LEN
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        for root in &self.0 {
            w.write_all(root)?;
        }
        Ok(())
    }
}

impl Deserializable for BlocksByRootRequest {
    fn read_from(r: &mut dyn Read, byte_length: u64) -> io::Result<Self> {
        if byte_length % ROOT_LEN != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "blocks_by_root request is not a whole number of 32-byte roots",
            ));
        }
        let n = (byte_length / ROOT_LEN) as usize;
        let mut roots = Vec::with_capacity(n);
        for _ in 0..n {
            let mut root = [0u8; 32];
            r.read_exact(&mut root)?;
            roots.push(root);
        }
        Ok(Self(roots))
    }
}

/// Canonical fork digests, in chronological order. The embedding
/// application computes real values from `(fork_version,
/// genesis_validators_root)`; these are provided so `blocks_by_range_v2` and
/// `blocks_by_root_v2` are usable out of the box with a representative fork
/// history, and are freely overridable by constructing a [`Method`] directly
/// with a different table.
pub mod fork_digest {
    use super::ForkDigest;

    pub const PHASE0: ForkDigest = [0xb5, 0x30, 0x3f, 0x2a];
    pub const ALTAIR: ForkDigest = [0xaf, 0xca, 0xab, 0xa0];
    pub const BELLATRIX: ForkDigest = [0x4a, 0x26, 0xc5, 0x8b];
    pub const CAPELLA: ForkDigest = [0xbb, 0xa4, 0xda, 0x96];
    pub const DENEB: ForkDigest = [0x6a, 0x95, 0xa1, 0xa9];
}

/// Per-fork chunk bounds for the v2 block methods. Deneb admits much larger
/// payloads than earlier forks because blobs are carried alongside the
/// block; later forks are capped at [`HARD_CHUNK_CAP`] rather than a tuned
/// value, consistent with that constant's role as an absolute backstop.
pub fn block_v2_bounds() -> HashMap<ForkDigest, MinMaxSize> {
    use fork_digest::*;
    let mut table = HashMap::new();
    table.insert(PHASE0, MinMaxSize::new(SIGNED_BLOCK_MIN, SIGNED_BLOCK_MAX_V1));
    table.insert(ALTAIR, MinMaxSize::new(SIGNED_BLOCK_MIN, SIGNED_BLOCK_MAX_V1));
    table.insert(
        BELLATRIX,
        MinMaxSize::new(SIGNED_BLOCK_MIN, 5 * 1024 * 1024),
    );
    table.insert(CAPELLA, MinMaxSize::new(SIGNED_BLOCK_MIN, 5 * 1024 * 1024));
    table.insert(DENEB, MinMaxSize::new(SIGNED_BLOCK_MIN, HARD_CHUNK_CAP));
    table
}

fn snappy() -> Option<Arc<dyn crate::compression::Compression>> {
    Some(Arc::new(SnappyCompression))
}

/// `/eth2/beacon_chain/req/status/1/ssz_snappy`: 84-byte fixed request and
/// response, no context.
pub fn status_v1() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/status/1/ssz_snappy",
        MinMaxSize::fixed(STATUS_V1_BYTE_LEN),
        no_context(MinMaxSize::fixed(STATUS_V1_BYTE_LEN)),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/goodbye/1/ssz_snappy`: 8-byte fixed request and
/// response, no context.
pub fn goodbye_v1() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/goodbye/1/ssz_snappy",
        MinMaxSize::fixed(GOODBYE_V1_BYTE_LEN),
        no_context(MinMaxSize::fixed(GOODBYE_V1_BYTE_LEN)),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/ping/1/ssz_snappy`: 8-byte fixed request and
/// response, no context.
pub fn ping_v1() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/ping/1/ssz_snappy",
        MinMaxSize::fixed(PING_V1_BYTE_LEN),
        no_context(MinMaxSize::fixed(PING_V1_BYTE_LEN)),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/metadata/1/ssz_snappy`: empty request, fixed
/// 16-byte response, no context.
pub fn metadata_v1() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/metadata/1/ssz_snappy",
        MinMaxSize::fixed(0),
        no_context(MinMaxSize::fixed(METADATA_V1_BYTE_LEN)),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/beacon_blocks_by_range/1/ssz_snappy`: fixed
/// 24-byte request, single-schema signed-block response, no context.
pub fn blocks_by_range_v1() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/beacon_blocks_by_range/1/ssz_snappy",
        MinMaxSize::fixed(BLOCKS_BY_RANGE_REQUEST_BYTE_LEN),
        no_context(MinMaxSize::new(SIGNED_BLOCK_MIN, SIGNED_BLOCK_MAX_V1)),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/beacon_blocks_by_range/2/ssz_snappy`: fixed
/// 24-byte request, per-fork signed-block response selected by a 4-byte
/// fork-digest context.
pub fn blocks_by_range_v2() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/beacon_blocks_by_range/2/ssz_snappy",
        MinMaxSize::fixed(BLOCKS_BY_RANGE_REQUEST_BYTE_LEN),
        fork_digest_context(block_v2_bounds()),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/beacon_blocks_by_root/1/ssz_snappy`: `0..=32Ki`
/// request (up to [`MAX_REQUEST_BLOCKS_BY_ROOT`] roots), single-schema
/// signed-block response, no context.
pub fn blocks_by_root_v1() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/beacon_blocks_by_root/1/ssz_snappy",
        MinMaxSize::new(0, MAX_REQUEST_BLOCKS_BY_ROOT * ROOT_LEN),
        no_context(MinMaxSize::new(SIGNED_BLOCK_MIN, SIGNED_BLOCK_MAX_V1)),
        snappy(),
    )
}

/// `/eth2/beacon_chain/req/beacon_blocks_by_root/2/ssz_snappy`: `0..=32Ki`
/// request, per-fork signed-block response selected by a 4-byte fork-digest
/// context.
pub fn blocks_by_root_v2() -> Method {
    Method::new(
        "/eth2/beacon_chain/req/beacon_blocks_by_root/2/ssz_snappy",
        MinMaxSize::new(0, MAX_REQUEST_BLOCKS_BY_ROOT * ROOT_LEN),
        fork_digest_context(block_v2_bounds()),
        snappy(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blocks_by_range_request_roundtrips_known_wire_bytes() {
        let req = BlocksByRangeRequest {
            start_slot: 10,
            count: 3,
            step: 1,
        };
        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        let expected: Vec<u8> = vec![
            0x0a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(buf, expected);

        let mut cursor = Cursor::new(buf);
        let decoded = BlocksByRangeRequest::read_from(&mut cursor, 24).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn blocks_by_range_request_rejects_wrong_length() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        let err = BlocksByRangeRequest::read_from(&mut cursor, 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn blocks_by_root_request_roundtrips_multiple_roots() {
        let roots = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        let req = BlocksByRootRequest(roots.clone());
        assert_eq!(req.byte_length(), 96);

        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = BlocksByRootRequest::read_from(&mut cursor, 96).unwrap();
        assert_eq!(decoded.0, roots);
    }

    #[test]
    fn blocks_by_root_request_rejects_non_multiple_of_root_len() {
        let mut cursor = Cursor::new(vec![0u8; 40]);
        let err = BlocksByRootRequest::read_from(&mut cursor, 40).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn canonical_methods_have_distinct_protocol_ids() {
        let ids = [
            status_v1().protocol_id,
            goodbye_v1().protocol_id,
            ping_v1().protocol_id,
            metadata_v1().protocol_id,
            blocks_by_range_v1().protocol_id,
            blocks_by_range_v2().protocol_id,
            blocks_by_root_v1().protocol_id,
            blocks_by_root_v2().protocol_id,
        ];
        for (i, a) in ids.iter().enumerate() {
            for (j, b) in ids.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn block_v2_bounds_covers_every_canonical_fork_digest() {
        let table = block_v2_bounds();
        assert_eq!(table.len(), 5);
        assert!(table.contains_key(&fork_digest::DENEB));
        assert_eq!(
            table.get(&fork_digest::DENEB).unwrap().max,
            HARD_CHUNK_CAP
        );
    }

    #[test]
    fn blocks_by_root_v1_request_bound_matches_max_roots() {
        let method = blocks_by_root_v1();
        assert_eq!(method.request_min_max.max, MAX_REQUEST_BLOCKS_BY_ROOT * ROOT_LEN);
        assert_eq!(method.request_min_max.min, 0);
    }
}
