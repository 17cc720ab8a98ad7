//! `Method`: the protocol ID, request size bounds, per-chunk context
//! reader, and compression that together describe one RPC method, plus the
//! initiator (`run_request`) and responder (`make_stream_handler`) entry
//! points built from them.
//!
//! A `Method` is captured by reference (or, for the responder side, behind an
//! `Arc` so the stream-handler closure can outlive the call that built it);
//! there is no hidden global registry of methods anywhere in this crate.

use std::sync::Arc;

use crate::codec::Serializable;
use crate::compression::Compression;
use crate::context::ReadContextFn;
use crate::encode::stream_header_and_payload;
use crate::error::{ReqRespError, Result};
use crate::peer::PeerId;
use crate::request::{ChunkedRequestHandler, accept_request};
use crate::response::{ChunkHandle, ResponseReader};
use crate::size::MinMaxSize;
use crate::transport::{NewStreamFn, StreamHandler};

/// Immutable descriptor of one RPC protocol.
pub struct Method {
    pub protocol_id: &'static str,
    pub request_min_max: MinMaxSize,
    pub read_context: Box<ReadContextFn>,
    pub compression: Option<Arc<dyn Compression>>,
}

impl Method {
    pub fn new(
        protocol_id: &'static str,
        request_min_max: MinMaxSize,
        read_context: Box<ReadContextFn>,
        compression: Option<Arc<dyn Compression>>,
    ) -> Self {
        Self {
            protocol_id,
            request_min_max,
            read_context,
            compression,
        }
    }

    fn compression_ref(&self) -> Option<&dyn Compression> {
        self.compression.as_deref()
    }

    /// Initiator side: validate and write `req`, half-close the write
    /// side, then drive the response reader to completion, invoking
    /// `on_chunk` once per chunk in order.
    ///
    /// Returns the first error encountered (request-size validation, framing,
    /// or `on_chunk` itself), or `Ok(())` once the response stream reaches
    /// clean EOF or `max_resp_chunks` chunks have been delivered.
    pub fn run_request<Ctx>(
        &self,
        context: &Ctx,
        new_stream_fn: &NewStreamFn<Ctx>,
        peer_id: &PeerId,
        req: &dyn Serializable,
        max_resp_chunks: u64,
        mut on_chunk: impl FnMut(ChunkHandle<'_>) -> Result<()>,
    ) -> Result<()> {
        let req_size = req.byte_length();
        self.request_min_max
            .check(req_size)
            .map_err(|(min, max)| ReqRespError::BadRequest {
                size: req_size,
                min,
                max,
            })?;

        tracing::debug!(protocol_id = self.protocol_id, %peer_id, req_size, "opening request stream");
        let mut stream = new_stream_fn(context, peer_id, self.protocol_id)?;

        stream_header_and_payload(
            req_size,
            |w| req.write_to(w),
            &mut *stream,
            self.compression_ref(),
        )?;
        stream.close_write().map_err(ReqRespError::framing)?;

        let result = ResponseReader::new(
            &mut *stream,
            max_resp_chunks,
            &*self.read_context,
            self.compression_ref(),
        )
        .for_each_chunk(|chunk| on_chunk(chunk));

        match &result {
            Ok(()) => tracing::debug!(protocol_id = self.protocol_id, %peer_id, "response complete"),
            Err(err) => {
                tracing::error!(protocol_id = self.protocol_id, %peer_id, %err, "response aborted")
            }
        }
        result
    }

    /// Responder side: returns a callback the transport invokes
    /// once per inbound stream already matched to this method's protocol ID.
    /// The callback parses the request header and hands the listener a
    /// [`ChunkedRequestHandler`] bound to the stream; a header parse failure
    /// before the listener runs closes the stream without invoking it, since
    /// there is no way to recover a protocol ID match gone wrong at that
    /// point.
    pub fn make_stream_handler<Ctx>(
        self: Arc<Self>,
        listener: Arc<dyn Fn(&Ctx, PeerId, ChunkedRequestHandler<'_>) + Send + Sync>,
    ) -> StreamHandler<Ctx>
    where
        Ctx: Send + Sync + 'static,
    {
        Box::new(move |context, peer_id, mut stream| {
            tracing::trace!(protocol_id = self.protocol_id, %peer_id, "accepted inbound stream");
            match accept_request(&mut *stream, self.request_min_max, self.compression_ref()) {
                Ok(handler) => listener(context, peer_id, handler),
                Err(err) => {
                    tracing::error!(protocol_id = self.protocol_id, %peer_id, %err, "failed to parse request header");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawPayload;
    use crate::compression::SnappyCompression;
    use crate::context::no_context;
    use crate::encode::stream_chunk;
    use crate::size::ResponseCode;
    use crate::transport::{JoinStream, Stream};
    use crate::varint;
    use bytes::Bytes;
    use std::io::{Cursor, Write as _};

    fn echo_method(compression: Option<Arc<dyn Compression>>) -> Method {
        Method::new(
            "/test/echo/1/ssz_snappy",
            MinMaxSize::fixed(4),
            no_context(MinMaxSize::fixed(4)),
            compression,
        )
    }

    #[test]
    fn run_request_delivers_chunks_from_a_scripted_transport() {
        let method = echo_method(None);

        // Build the response the "remote" will hand back: one chunk echoing
        // the request body.
        let mut response_wire = Vec::new();
        stream_chunk(
            ResponseCode::Success,
            4,
            &Bytes::new(),
            |w| w.write_all(b"abcd"),
            &mut response_wire,
            None,
        )
        .unwrap();

        let new_stream_fn: &NewStreamFn<()> = &|_ctx, _peer, protocol_id| {
            assert_eq!(protocol_id, "/test/echo/1/ssz_snappy");
            let stream = JoinStream::new(Cursor::new(response_wire.clone()), Vec::new());
            Ok(Box::new(stream) as Box<dyn Stream>)
        };

        let peer = PeerId::from("peer-a");
        let req = RawPayload(Bytes::from_static(b"abcd"));
        let mut seen = Vec::new();
        method
            .run_request(&(), new_stream_fn, &peer, &req, 10, |mut chunk| {
                seen.push(chunk.read_raw()?);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![b"abcd".to_vec()]);
    }

    #[test]
    fn run_request_rejects_oversized_request_before_opening_a_stream() {
        let method = echo_method(None);
        let new_stream_fn: &NewStreamFn<()> =
            &|_ctx, _peer, _protocol_id| panic!("must not open a stream for a bad request");

        let peer = PeerId::from("peer-a");
        let req = RawPayload(Bytes::from_static(b"toolong"));
        let err = method
            .run_request(&(), new_stream_fn, &peer, &req, 10, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ReqRespError::BadRequest { .. }));
    }

    #[test]
    fn make_stream_handler_invokes_listener_with_parsed_request() {
        let method = Arc::new(echo_method(Some(Arc::new(SnappyCompression))));

        let mut wire = Vec::new();
        varint::encode_u64(4, &mut wire).unwrap();
        {
            let snappy = SnappyCompression;
            let mut w = snappy.compress_writer(&mut wire);
            w.write_all(b"abcd").unwrap();
            w.flush().unwrap();
        }

        let received = Arc::new(std::sync::Mutex::new(None));
        let received_clone = received.clone();
        let listener = Arc::new(
            move |_ctx: &(), _peer: PeerId, mut handler: ChunkedRequestHandler<'_>| {
                let payload: RawPayload = handler.read_request().unwrap();
                *received_clone.lock().unwrap() = Some(payload.0.to_vec());
                handler.stream_ssz(&Bytes::new(), &payload).unwrap();
            },
        );

        let handler = method.make_stream_handler::<()>(listener);
        let stream = Box::new(JoinStream::new(Cursor::new(wire), Vec::new())) as Box<dyn Stream>;
        handler(&(), PeerId::from("peer-b"), stream);

        assert_eq!(received.lock().unwrap().as_deref(), Some(&b"abcd"[..]));
    }
}
