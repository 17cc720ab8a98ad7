//! The request-payload handler: responder-side parsing of the inbound
//! request frame, plus the response-chunk-writing operations the user's
//! method listener drives afterwards.

use std::io::{self, Write};

use bytes::Bytes;

use crate::codec::{Deserializable, Serializable};
use crate::compression::Compression;
use crate::encode::stream_chunk;
use crate::error::{ReqRespError, Result};
use crate::limit::BufLimitReader;
use crate::size::{MAX_ERR_SIZE, MinMaxSize, ResponseCode};
use crate::transport::Stream;
use crate::varint;

/// Message length a non-success chunk truncates to before appending `"..."`,
/// keeping the total within [`MAX_ERR_SIZE`].
const TRUNCATED_ERR_MSG_LEN: usize = 253;

/// Parses `[varint req_size]` off `stream` under a 10-byte budget and
/// validates it against `request_min_max`.
///
/// Returns `(req_size, is_valid)` rather than failing outright on an
/// out-of-bounds size: the listener must still be invoked so it
/// can reply with an error chunk before the stream closes.
fn read_request_header(
    stream: &mut dyn Stream,
    request_min_max: MinMaxSize,
) -> Result<(u64, bool)> {
    let mut limit = BufLimitReader::new(stream);
    limit.set_limit(varint::MAX_VARINT_LEN as u64, true);
    let req_size = varint::decode_u64(&mut limit)?;
    Ok((req_size, request_min_max.contains(req_size)))
}

/// Bound to one inbound stream: owns the raw duplex stream (request body is
/// read from it, response chunks are written to it), plus the method's
/// compression and the outcome of parsing the request header.
///
/// Holding a single `&mut dyn Stream` rather than separate reader/writer
/// fields means read and write calls always borrow the same underlying
/// connection sequentially, never simultaneously (the natural shape for a
/// duplex byte stream, and why [`crate::transport::Stream`] is `Read + Write`
/// on one trait object instead of two).
pub struct ChunkedRequestHandler<'s> {
    stream: &'s mut dyn Stream,
    compression: Option<&'s dyn Compression>,
    req_size: u64,
    valid: bool,
}

/// Parses the request header off `stream` and constructs the handler the
/// user's method listener drives. Invoking the listener itself is the
/// caller's responsibility (normally
/// [`crate::method::Method::make_stream_handler`]).
pub fn accept_request<'s>(
    stream: &'s mut dyn Stream,
    request_min_max: MinMaxSize,
    compression: Option<&'s dyn Compression>,
) -> Result<ChunkedRequestHandler<'s>> {
    let (req_size, valid) = read_request_header(&mut *stream, request_min_max)?;
    if !valid {
        tracing::warn!(req_size, "request size outside method bounds");
    }
    Ok(ChunkedRequestHandler {
        stream,
        compression,
        req_size,
        valid,
    })
}

impl<'s> ChunkedRequestHandler<'s> {
    /// The declared uncompressed request body length, regardless of
    /// validity.
    pub fn request_size(&self) -> u64 {
        self.req_size
    }

    /// Whether the declared size fell within the method's `request_min_max`.
    /// When `false`, [`Self::read_request`] returns `InvalidInput` instead
    /// of attempting to parse a body, and the listener is expected to reply
    /// with [`Self::write_error_chunk`].
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Reads and decodes the request body as `T`. Fails with
    /// [`ReqRespError::InvalidInput`] without touching the stream if the
    /// declared size was out of bounds.
    pub fn read_request<T: Deserializable>(&mut self) -> Result<T> {
        if !self.valid {
            return Err(ReqRespError::InvalidInput(format!(
                "request size {} outside method bounds",
                self.req_size
            )));
        }

        let mut limit = BufLimitReader::new(self.stream);
        let body_cap = match self.compression {
            Some(compression) => compression.max_encoded_len(self.req_size),
            None => self.req_size,
        };
        limit.set_limit(body_cap, false);

        match self.compression {
            Some(compression) => {
                let mut body = compression.decompress_reader(&mut limit);
                T::read_from(&mut body, self.req_size).map_err(ReqRespError::decompression)
            }
            None => T::read_from(&mut limit, self.req_size).map_err(ReqRespError::framing),
        }
    }

    /// Streams `payload` as a success chunk without buffering its encoded
    /// form.
    pub fn stream_ssz<T: Serializable>(&mut self, context_bytes: &Bytes, payload: &T) -> Result<()> {
        stream_chunk(
            ResponseCode::Success,
            payload.byte_length(),
            context_bytes,
            |w| payload.write_to(w),
            self.stream,
            self.compression,
        )
    }

    /// Writes a success chunk from an already-encoded body.
    pub fn write_raw_response_chunk(&mut self, context_bytes: &Bytes, raw: &[u8]) -> Result<()> {
        stream_chunk(
            ResponseCode::Success,
            raw.len() as u64,
            context_bytes,
            |w| w.write_all(raw),
            self.stream,
            self.compression,
        )
    }

    /// Writes a chunk with an explicit result code, streaming its body from
    /// `write_source` the way [`crate::encode::stream_chunk`] does.
    pub fn stream_response_chunk(
        &mut self,
        result: ResponseCode,
        context_bytes: &Bytes,
        size: u64,
        write_source: impl FnOnce(&mut dyn Write) -> io::Result<()>,
    ) -> Result<()> {
        stream_chunk(
            result,
            size,
            context_bytes,
            write_source,
            self.stream,
            self.compression,
        )
    }

    /// Writes a non-success chunk carrying a UTF-8 error message, truncating
    /// messages longer than [`MAX_ERR_SIZE`] to [`TRUNCATED_ERR_MSG_LEN`]
    /// bytes plus `"..."`. The body is framed like any other chunk, through
    /// `self.compression` when the method has one configured.
    pub fn write_error_chunk(&mut self, result: ResponseCode, msg: &str) -> Result<()> {
        debug_assert!(!result.is_success(), "write_error_chunk requires a non-success code");

        let bytes = msg.as_bytes();
        let truncated;
        let body: &[u8] = if bytes.len() as u64 > MAX_ERR_SIZE {
            tracing::warn!(len = bytes.len(), "truncating oversized error chunk");
            let mut v = Vec::with_capacity(TRUNCATED_ERR_MSG_LEN + 3);
            let cut = floor_char_boundary(msg, TRUNCATED_ERR_MSG_LEN);
            v.extend_from_slice(&bytes[..cut]);
            v.extend_from_slice(b"...");
            truncated = v;
            &truncated
        } else {
            bytes
        };

        stream_chunk(
            result,
            body.len() as u64,
            &Bytes::new(),
            |w| w.write_all(body),
            self.stream,
            self.compression,
        )
    }
}

/// Finds the largest byte index `<= max` that lands on a UTF-8 char
/// boundary, so truncation never splits a multi-byte codepoint.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut i = max;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
