//! Writing the `[varint size][optional compressed body]` payload frame and
//! the `[result][context][varint size][body]` chunk frame.

use std::io::Write;

use bytes::Bytes;

use crate::compression::Compression;
use crate::error::{ReqRespError, Result};
use crate::size::ResponseCode;
use crate::varint;

/// Writes `size` as a varint, then streams `size` uncompressed bytes from
/// `write_source` through `compression` (if any) into `w`.
///
/// `write_source` must write exactly `size` bytes; this is the caller's
/// contract to uphold, not something this function can check (the
/// uncompressed byte count is not observable once compression is layered
/// on top).
pub fn stream_header_and_payload(
    size: u64,
    write_source: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
    w: &mut dyn Write,
    compression: Option<&dyn Compression>,
) -> Result<()> {
    varint::encode_u64(size, w).map_err(ReqRespError::framing)?;

    match compression {
        Some(compression) => {
            let mut compressed = compression.compress_writer(w);
            write_source(&mut *compressed).map_err(ReqRespError::framing)?;
            compressed.flush().map_err(ReqRespError::framing)?;
        }
        None => write_source(w).map_err(ReqRespError::framing)?,
    }

    Ok(())
}

/// Writes one full chunk: the result byte, then (for success chunks only)
/// the context bytes, then the payload frame.
pub fn stream_chunk(
    result: ResponseCode,
    size: u64,
    context_bytes: &Bytes,
    write_source: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
    w: &mut dyn Write,
    compression: Option<&dyn Compression>,
) -> Result<()> {
    w.write_all(&[result.to_byte()])
        .map_err(ReqRespError::framing)?;

    if result.is_success() {
        w.write_all(context_bytes).map_err(ReqRespError::framing)?;
    }

    stream_header_and_payload(size, write_source, w, compression)
}
