//! Framed-Snappy compression, the canonical codec for this protocol family
//! (protocol IDs end in `ssz_snappy`).
//!
//! Wraps the `snap` crate's streaming frame reader/writer. Framed Snappy
//! splits its input into blocks of at most 65536 uncompressed bytes, each
//! prefixed with a 4-byte chunk header and a 4-byte CRC32C checksum, and
//! falls back to storing a block uncompressed when compression would not
//! shrink it: the worst case per block is `max(block_len,
//! max_compress_len(block_len))` plus the 8 bytes of header/checksum, and
//! the whole stream additionally carries a fixed 10-byte stream identifier
//! chunk up front.

use std::cmp;
use std::io::{Read, Write};

use super::Compression;

const STREAM_IDENTIFIER_CHUNK_LEN: u64 = 10;
const CHUNK_HEADER_LEN: u64 = 4;
const CHECKSUM_LEN: u64 = 4;
const MAX_UNCOMPRESSED_BLOCK_LEN: u64 = 65_536;

#[derive(Default, Clone, Copy)]
pub struct SnappyCompression;

impl Compression for SnappyCompression {
    fn compress_writer<'w>(&self, w: &'w mut dyn Write) -> Box<dyn Write + 'w> {
        Box::new(snap::write::FrameEncoder::new(w))
    }

    fn decompress_reader<'r>(&self, r: &'r mut dyn Read) -> Box<dyn Read + 'r> {
        Box::new(snap::read::FrameDecoder::new(r))
    }

    fn max_encoded_len(&self, n: u64) -> u64 {
        if n == 0 {
            return STREAM_IDENTIFIER_CHUNK_LEN;
        }

        let full_blocks = n / MAX_UNCOMPRESSED_BLOCK_LEN;
        let remainder = n % MAX_UNCOMPRESSED_BLOCK_LEN;
        let block_lens = (0..full_blocks)
            .map(|_| MAX_UNCOMPRESSED_BLOCK_LEN)
            .chain((remainder > 0).then_some(remainder));

        block_lens.fold(STREAM_IDENTIFIER_CHUNK_LEN, |total, block_len| {
            let worst_compressed = snap::raw::max_compress_len(block_len as usize) as u64;
            total + CHUNK_HEADER_LEN + CHECKSUM_LEN + cmp::max(block_len, worst_compressed)
        })
    }
}
