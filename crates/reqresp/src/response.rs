//! The response reader: parses a bounded sequence of chunks off an
//! already-opened stream and hands each one to a user-supplied handler.

use std::io::Read;

use bytes::Bytes;

use crate::cancel::CancelToken;
use crate::codec::Deserializable;
use crate::compression::Compression;
use crate::context::ReadContextFn;
use crate::error::{ReqRespError, Result};
use crate::limit::BufLimitReader;
use crate::size::{ERR_CHUNK_BOUNDS, ResponseCode, check_chunk_size};
use crate::varint;

/// One chunk handed to the caller's `on_chunk` closure.
///
/// The caller must consume exactly `size` decompressed bytes from `body`
/// (via [`ChunkHandle::read_raw`], [`ChunkHandle::read_obj`], or
/// [`ChunkHandle::read_err_msg`]) before returning, or an error.
pub struct ChunkHandle<'a> {
    pub chunk_index: u64,
    pub result: ResponseCode,
    pub context_bytes: Bytes,
    pub size: u64,
    body: Box<dyn Read + 'a>,
    compressed: bool,
}

impl<'a> ChunkHandle<'a> {
    /// Wraps a body I/O error in the right variant: a compressed body's
    /// decoder can itself fail (bad frame, checksum mismatch), which is
    /// distinct from a truncated or disconnected transport.
    fn body_err(&self, err: std::io::Error) -> ReqRespError {
        if self.compressed {
            ReqRespError::decompression(err)
        } else {
            ReqRespError::framing(err)
        }
    }

    /// Reads the declared `size` bytes of the body verbatim.
    pub fn read_raw(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.size as usize];
        self.body.read_exact(&mut buf).map_err(|e| self.body_err(e))?;
        Ok(buf)
    }

    /// Reads a non-success chunk's body as a UTF-8 error message. Per the
    /// wire format, this is not schema-validated beyond being read as bytes;
    /// invalid UTF-8 is replaced with the Unicode replacement character.
    pub fn read_err_msg(&mut self) -> Result<String> {
        let raw = self.read_raw()?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Decodes the body as `T`, consuming exactly `size` bytes.
    pub fn read_obj<T: Deserializable>(&mut self) -> Result<T> {
        T::read_from(&mut self.body, self.size).map_err(|e| self.body_err(e))
    }
}

/// Reads up to `max_chunks` chunks from `reader` until clean EOF.
pub struct ResponseReader<'a> {
    reader: &'a mut dyn Read,
    max_chunks: u64,
    read_context: &'a ReadContextFn,
    compression: Option<&'a dyn Compression>,
    cancel: Option<&'a CancelToken>,
}

impl<'a> ResponseReader<'a> {
    pub fn new(
        reader: &'a mut dyn Read,
        max_chunks: u64,
        read_context: &'a ReadContextFn,
        compression: Option<&'a dyn Compression>,
    ) -> Self {
        Self {
            reader,
            max_chunks,
            read_context,
            compression,
            cancel: None,
        }
    }

    pub fn with_cancel_token(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Drives the reader to completion, invoking `on_chunk` once per chunk
    /// in order. Stops and propagates the first error from either the
    /// framing layer or `on_chunk` itself.
    pub fn for_each_chunk(
        self,
        mut on_chunk: impl FnMut(ChunkHandle<'_>) -> Result<()>,
    ) -> Result<()> {
        if self.max_chunks == 0 {
            return Ok(());
        }

        let mut limit = BufLimitReader::new(self.reader);

        for chunk_index in 0..self.max_chunks {
            if let Some(cancel) = self.cancel {
                if cancel.is_cancelled() {
                    return Err(ReqRespError::Cancelled);
                }
            }

            limit.set_limit(1, false);
            let mut result_byte = [0u8; 1];
            let n = limit.read(&mut result_byte).map_err(ReqRespError::framing)?;
            if n == 0 {
                tracing::trace!(chunk_index, "clean EOF, response complete");
                break;
            }
            let result = ResponseCode::from_byte(result_byte[0]);

            let (context_bytes, chunk_bounds) = if result.is_success() {
                (self.read_context)(&mut limit)?
            } else {
                (Bytes::new(), ERR_CHUNK_BOUNDS)
            };

            limit.set_limit(varint::MAX_VARINT_LEN as u64, true);
            let size = varint::decode_u64(&mut limit)?;
            limit.set_limit(0, false);

            check_chunk_size(chunk_index, size, chunk_bounds)?;

            let body_cap = match self.compression {
                Some(compression) => compression.max_encoded_len(size),
                None => size,
            };
            limit.set_limit(body_cap, false);

            tracing::trace!(chunk_index, ?result, size, body_cap, "reading chunk body");

            let handle = match self.compression {
                Some(compression) => ChunkHandle {
                    chunk_index,
                    result,
                    context_bytes,
                    size,
                    body: compression.decompress_reader(&mut limit),
                    compressed: true,
                },
                None => ChunkHandle {
                    chunk_index,
                    result,
                    context_bytes,
                    size,
                    body: Box::new(&mut limit),
                    compressed: false,
                },
            };

            on_chunk(handle)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::SnappyCompression;
    use crate::context::no_context;
    use crate::encode::stream_chunk;
    use crate::size::MinMaxSize;
    use std::io::{self, Cursor, Write};

    fn write_success_chunk(out: &mut Vec<u8>, payload: &[u8], compression: Option<&dyn Compression>) {
        stream_chunk(
            ResponseCode::Success,
            payload.len() as u64,
            &Bytes::new(),
            |w| w.write_all(payload),
            out,
            compression,
        )
        .unwrap();
    }

    #[test]
    fn roundtrips_uncompressed_payload() {
        let payload = b"status-response-of-exactly-this-length-ok!!";
        let mut wire = Vec::new();
        write_success_chunk(&mut wire, payload, None);

        let bounds = MinMaxSize::fixed(payload.len() as u64);
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let mut seen = Vec::new();
        ResponseReader::new(&mut cursor, 10, &*read_context, None)
            .for_each_chunk(|mut chunk| {
                seen.push(chunk.read_raw()?);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![payload.to_vec()]);
    }

    #[test]
    fn roundtrips_snappy_payload() {
        let payload = b"compressed chunk body";
        let snappy = SnappyCompression;
        let mut wire = Vec::new();
        write_success_chunk(&mut wire, payload, Some(&snappy));

        let bounds = MinMaxSize::fixed(payload.len() as u64);
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let mut seen = Vec::new();
        ResponseReader::new(&mut cursor, 10, &*read_context, Some(&snappy))
            .for_each_chunk(|mut chunk| {
                seen.push(chunk.read_raw()?);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![payload.to_vec()]);
    }

    #[test]
    fn corrupt_snappy_frame_surfaces_as_decompression_error() {
        let payload = b"compressed chunk body";
        let snappy = SnappyCompression;
        let mut wire = Vec::new();
        write_success_chunk(&mut wire, payload, Some(&snappy));

        // Flip a byte inside the frame body (past the stream identifier
        // chunk) so the decoder rejects it instead of silently misreading.
        let corrupt_at = wire.len() - 2;
        wire[corrupt_at] ^= 0xff;

        let bounds = MinMaxSize::fixed(payload.len() as u64);
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let err = ResponseReader::new(&mut cursor, 10, &*read_context, Some(&snappy))
            .for_each_chunk(|mut chunk| {
                chunk.read_raw()?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ReqRespError::Decompression(_)));
    }

    #[test]
    fn oversized_chunk_is_size_violation() {
        let payload = b"way too long for the declared bound";
        let mut wire = Vec::new();
        write_success_chunk(&mut wire, payload, None);

        let bounds = MinMaxSize::fixed(4); // payload is longer than 4 bytes
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let err = ResponseReader::new(&mut cursor, 10, &*read_context, None)
            .for_each_chunk(|mut chunk| {
                chunk.read_raw()?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ReqRespError::SizeViolation { .. }));
    }

    #[test]
    fn max_chunks_cutoff_leaves_remainder_unread() {
        let mut wire = Vec::new();
        for i in 0..5u8 {
            write_success_chunk(&mut wire, &[i], None);
        }

        let bounds = MinMaxSize::fixed(1);
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let mut seen = Vec::new();
        ResponseReader::new(&mut cursor, 2, &*read_context, None)
            .for_each_chunk(|mut chunk| {
                seen.push(chunk.read_raw()?[0]);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![0, 1]);
        // 3 chunks (3 bytes header + payload each) remain in the cursor.
        let remaining = cursor.get_ref().len() as u64 - cursor.position();
        assert!(remaining > 0);
    }

    #[test]
    fn zero_max_chunks_reads_nothing() {
        let mut wire = Vec::new();
        write_success_chunk(&mut wire, b"x", None);
        let bounds = MinMaxSize::fixed(1);
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let mut called = false;
        ResponseReader::new(&mut cursor, 0, &*read_context, None)
            .for_each_chunk(|_| {
                called = true;
                Ok(())
            })
            .unwrap();
        assert!(!called);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn handler_error_is_propagated_and_stops_iteration() {
        let mut wire = Vec::new();
        write_success_chunk(&mut wire, b"a", None);
        write_success_chunk(&mut wire, b"b", None);

        let bounds = MinMaxSize::fixed(1);
        let read_context = no_context(bounds);
        let mut cursor = Cursor::new(wire);
        let mut seen = 0;
        let err = ResponseReader::new(&mut cursor, 10, &*read_context, None)
            .for_each_chunk(|mut chunk| {
                seen += 1;
                chunk.read_raw()?;
                Err(ReqRespError::handler(io::Error::other("downstream decode failed")))
            })
            .unwrap_err();

        assert_eq!(seen, 1, "second chunk must not be read after the handler errors");
        assert!(matches!(err, ReqRespError::Handler(_)));
    }

    #[test]
    fn non_success_chunk_yields_empty_context_regardless_of_method_context() {
        let mut wire = Vec::new();
        stream_chunk(
            ResponseCode::ServerError,
            3,
            &Bytes::new(),
            |w| w.write_all(b"err"),
            &mut wire,
            None,
        )
        .unwrap();

        // method defines a fork-digest context reader, but it must not be
        // invoked for a non-success chunk.
        let mut table = std::collections::HashMap::new();
        table.insert([0xaau8, 0, 0, 0], MinMaxSize::new(0, 10));
        let read_context = crate::context::fork_digest_context(table);

        let mut cursor = Cursor::new(wire);
        let mut seen_context = None;
        ResponseReader::new(&mut cursor, 1, &*read_context, None)
            .for_each_chunk(|mut chunk| {
                seen_context = Some(chunk.context_bytes.clone());
                let msg = chunk.read_err_msg()?;
                assert_eq!(msg, "err");
                Ok(())
            })
            .unwrap();

        assert_eq!(seen_context, Some(Bytes::new()));
    }
}
