//! Chunked request/response wire framing for a peer-to-peer beacon-chain
//! protocol family.
//!
//! This crate is the framing engine shared by every method in the family: a
//! length-prefixed, optionally compressed, chunked response stream with a
//! per-method context tag and strict min/max size bounds. It does not open
//! network connections, negotiate protocols, or know any concrete message
//! schema (those are the embedding application's job, expressed through the
//! [`transport`] and [`codec`] contracts).
//!
//! # Layout
//!
//! - [`size`]: `MinMaxSize`, `ResponseCode`, and the crate's declared
//!   constants (`MAX_ERR_SIZE`, `HARD_CHUNK_CAP`, ...).
//! - [`varint`]: the little-endian base-128 varint used for every payload
//!   size header.
//! - [`limit`]: `BufLimitReader`, the programmable-budget reader every
//!   framing boundary is read through.
//! - [`compression`]: the `Compression` capability and its framed-Snappy
//!   implementation.
//! - [`codec`]: the `Serializable`/`Deserializable` contract a payload must
//!   satisfy to be framed.
//! - [`context`]: `no_context` and `fork_digest_context`, the canonical
//!   per-chunk context-bytes readers.
//! - [`encode`]: writing the payload and chunk frames.
//! - [`response`]: the bounded response-chunk reader.
//! - [`request`]: the responder-side request parser and chunk writer.
//! - [`method`]: `Method`, tying the above into `run_request` (initiator)
//!   and `make_stream_handler` (responder).
//! - [`methods`]: the eight canonical method descriptors for this protocol
//!   family, pre-wired so embedders rarely construct a `Method` by hand.
//! - [`transport`], [`peer`]: the `Stream`/`PeerId` contract this crate
//!   requires from the embedding transport.
//! - [`cancel`]: `CancelToken`, the cooperative-cancellation flag the
//!   response reader polls between chunks.
//! - [`error`]: `ReqRespError`, the one error enum covering both sides.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use reqresp_framing::codec::RawPayload;
//! use reqresp_framing::methods::status_v1;
//! use reqresp_framing::peer::PeerId;
//! use reqresp_framing::transport::{JoinStream, NewStreamFn, Stream};
//! use std::io::Cursor;
//!
//! let method = status_v1();
//! let request = RawPayload(Bytes::from(vec![0u8; 84]));
//!
//! let new_stream_fn: &NewStreamFn<()> = &|_ctx, _peer, _protocol_id| {
//!     // A real transport opens a stream to the peer here; tests and small
//!     // examples can hand back an in-memory duplex instead.
//!     Ok(Box::new(JoinStream::new(Cursor::new(Vec::<u8>::new()), Vec::new())) as Box<dyn Stream>)
//! };
//!
//! let mut chunks_seen = 0;
//! method
//!     .run_request(&(), new_stream_fn, &PeerId::from("peer"), &request, 16, |_chunk| {
//!         chunks_seen += 1;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(chunks_seen, 0); // the stub stream above produces no chunks
//! ```

pub mod cancel;
pub mod codec;
pub mod compression;
pub mod context;
pub mod encode;
pub mod error;
pub mod limit;
pub mod method;
pub mod methods;
pub mod peer;
pub mod request;
pub mod response;
pub mod size;
pub mod transport;
pub mod varint;

pub use cancel::CancelToken;
pub use codec::{Deserializable, Serializable};
pub use error::{ReqRespError, Result};
pub use method::Method;
pub use peer::PeerId;
pub use request::{ChunkedRequestHandler, accept_request};
pub use response::{ChunkHandle, ResponseReader};
pub use size::{MAX_ERR_SIZE, MinMaxSize, ResponseCode};
