//! A reader with a programmable byte budget.
//!
//! `BufLimitReader` is reused across every frame of a response: callers call
//! [`BufLimitReader::set_limit`] at each framing boundary before reading, so
//! that a single instance can bound the result byte, the context bytes, the
//! size varint, and the body in turn without any of them leaking budget into
//! the next.

use std::cmp;
use std::io::{self, Read};

/// Wraps an upstream reader with a mutable byte budget and a mode switch.
///
/// - `per_read = false`: `n` is the total remaining budget across all reads
///   of this frame; each read decrements `n`. Reading past `n` yields `Ok(0)`
///   (a logical EOF for this framing slice, not necessarily the underlying
///   stream).
/// - `per_read = true`: each call is capped at `n` bytes, but `n` is **not**
///   decremented. This supports reading a varint byte-by-byte without
///   consuming the whole budget of the enclosing frame in one read.
pub struct BufLimitReader<'r> {
    inner: &'r mut dyn Read,
    n: u64,
    per_read: bool,
}

impl<'r> BufLimitReader<'r> {
    pub fn new(inner: &'r mut dyn Read) -> Self {
        Self {
            inner,
            n: 0,
            per_read: false,
        }
    }

    /// Resets the budget and mode for a new framing slice. Must be called at
    /// every frame boundary; a leaked budget across frames is a bug.
    pub fn set_limit(&mut self, n: u64, per_read: bool) {
        self.n = n;
        self.per_read = per_read;
    }

    pub fn remaining(&self) -> u64 {
        self.n
    }
}

impl Read for BufLimitReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.n == 0 {
            return Ok(0);
        }
        let cap = cmp::min(buf.len() as u64, self.n) as usize;
        let read = self.inner.read(&mut buf[..cap])?;
        if !self.per_read {
            self.n -= read as u64;
        }
        Ok(read)
    }
}
