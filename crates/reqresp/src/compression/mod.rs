//! Compression capability abstraction.
//!
//! The framing core never speaks a concrete compression codec directly; it
//! only needs a writer wrapper, a reader wrapper, and a way to size the
//! worst-case compressed expansion of a declared uncompressed length (used
//! to cap the *compressed* bytes read off the wire before decompression
//! bomb protection kicks in).

mod snappy;

use std::io::{Read, Write};

pub use snappy::SnappyCompression;

/// A compression codec usable for both request and chunk bodies.
pub trait Compression: Send + Sync {
    /// Wraps `w` so that bytes written through the result are compressed
    /// before reaching `w`. The wrapper must be flushed (not merely
    /// dropped) once the caller has written the full uncompressed body.
    fn compress_writer<'w>(&self, w: &'w mut dyn Write) -> Box<dyn Write + 'w>;

    /// Wraps `r` so that bytes read from the result are decompressed.
    fn decompress_reader<'r>(&self, r: &'r mut dyn Read) -> Box<dyn Read + 'r>;

    /// Upper bound on the number of compressed bytes that could result from
    /// compressing `n` uncompressed bytes, used to size the read budget
    /// placed on the wire *before* decompression.
    fn max_encoded_len(&self, n: u64) -> u64;
}
