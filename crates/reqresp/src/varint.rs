//! Little-endian base-128 varint framing for payload sizes.
//!
//! Uses the same wire format as `unsigned-varint` (continuation bit
//! semantics identical to protobuf's 64-bit varint); we reuse that crate's
//! decode table directly instead of hand-rolling the bit-twiddling.

use std::io::{self, Read, Write};

use crate::error::ReqRespError;

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Writes `n` as a varint to `w`.
pub fn encode_u64(n: u64, w: &mut dyn Write) -> io::Result<()> {
    let mut buf = unsigned_varint::encode::u64_buffer();
    let encoded = unsigned_varint::encode::u64(n, &mut buf);
    w.write_all(encoded)
}

/// Reads a varint from `r` one byte at a time, rejecting any encoding that
/// would overflow 64 bits or exceed [`MAX_VARINT_LEN`] bytes.
///
/// Callers reading under a [`crate::limit::BufLimitReader`] are expected to
/// have already programmed a `per_read = true` budget of `MAX_VARINT_LEN`
/// bytes so that this function cannot read past the frame boundary even if
/// the encoding were (invalidly) longer.
pub fn decode_u64<R: Read>(r: &mut R) -> Result<u64, ReqRespError> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        match r.read(&mut byte) {
            Ok(0) => {
                return Err(ReqRespError::framing(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated varint",
                )));
            }
            Ok(_) => {}
            Err(e) => return Err(ReqRespError::framing(e)),
        }
        buf[i] = byte[0];
        match unsigned_varint::decode::u64(&buf[..=i]) {
            Ok((value, rest)) => {
                debug_assert!(rest.is_empty());
                return Ok(value);
            }
            Err(unsigned_varint::decode::Error::Insufficient) => continue,
            Err(e) => {
                return Err(ReqRespError::framing(io::Error::new(
                    io::ErrorKind::InvalidData,
                    e.to_string(),
                )));
            }
        }
    }
    Err(ReqRespError::framing(io::Error::new(
        io::ErrorKind::InvalidData,
        "varint exceeds 10 bytes",
    )))
}
