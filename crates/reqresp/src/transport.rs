//! The contract this crate requires from a peer transport. Opening, closing,
//! and multiplexing byte-streams between peers by protocol identifier is the
//! transport's job, not this crate's; the framing core treats every stream as
//! a `Stream` trait object and neither knows nor cares how it was
//! multiplexed.

use std::io::{self, Read, Write};

use crate::error::ReqRespError;
use crate::peer::PeerId;

/// A single already-opened, already protocol-negotiated byte stream.
///
/// `close_write` half-closes the write side only (signalling EOF to the
/// remote's read) while leaving this side able to keep reading; this is the
/// "half-close for write" step `run_request` performs once the request has
/// been fully written.
pub trait Stream: Read + Write + Send {
    fn close_write(&mut self) -> io::Result<()>;
}

/// Opens a stream to `peer_id` for `protocol_id`. The embedding application
/// supplies one of these to [`crate::method::Method::run_request`]; the core
/// performs the request write, half-close, and response read against the
/// stream it returns.
pub type NewStreamFn<Ctx> =
    dyn Fn(&Ctx, &PeerId, &'static str) -> Result<Box<dyn Stream>, ReqRespError> + Send + Sync;

/// What [`crate::method::Method::make_stream_handler`] returns: a callback
/// the transport invokes once per accepted inbound stream already matched to
/// this method's protocol ID.
pub type StreamHandler<Ctx> = Box<dyn Fn(&Ctx, PeerId, Box<dyn Stream>) + Send + Sync>;

/// `Stream` adapter for any in-memory or loopback `Read + Write` pair that
/// has no real half-close concept (e.g. `std::io::Cursor`), for tests and
/// simple same-process transports. `close_write` is a no-op.
pub struct NoHalfClose<S>(pub S);

impl<S: Read + Send> Read for NoHalfClose<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<S: Write + Send> Write for NoHalfClose<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<S: Read + Write + Send> Stream for NoHalfClose<S> {
    fn close_write(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Combines an already-split reader half and writer half into one [`Stream`].
/// Useful both for transports that hand out split halves (e.g. an
/// `into_split` socket) and for tests that want to drive the read and write
/// sides independently. `close_write` is a no-op, same as [`NoHalfClose`].
pub struct JoinStream<R, W> {
    pub reader: R,
    pub writer: W,
}

impl<R, W> JoinStream<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W> Read for JoinStream<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R, W: Write> Write for JoinStream<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<R: Read + Send, W: Write + Send> Stream for JoinStream<R, W> {
    fn close_write(&mut self) -> io::Result<()> {
        Ok(())
    }
}
