//! Composable HTTP middleware
//!
//! This crate provides a small set of handler wrappers for asynchronous HTTP
//! services. Each wrapper decorates a [`Handler`] with one concern and they
//! can be stacked in any order.
//!
//! # Features
//!
//! - Gzip compression negotiated through `Accept-Encoding`, with pooled compressor state
//! - Content type sniffing for bodies written without a `Content-Type`
//! - Access logging through `tracing`, or any [`wrapper::AccessLog`]
//! - Public `Cache-Control` headers and cached file serving
//! - Redirects to https behind proxies setting `X-Forwarded-Proto`
//! - JSON handlers with uniform error bodies
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use micro_httputil::handler::handler_fn;
//! use micro_httputil::wrapper::{GzipWrapper, LoggerWrapper, Wrapper, Wrappers};
//! use micro_httputil::{Handler, Request, ResponseRecorder, ResponseSink};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hello = handler_fn(|_req, resp| {
//!         Box::pin(async move {
//!             let _ = resp.write_all(b"hello world").await;
//!         })
//!     });
//!
//!     // the logger sees the compressed bytes since it wraps the gzip writer
//!     let handler = Wrappers::new().and_then(GzipWrapper).and_then(LoggerWrapper::new()).wrap(hello);
//!
//!     let request = http::Request::builder()
//!         .uri("/")
//!         .header(http::header::ACCEPT_ENCODING, "gzip")
//!         .body(Bytes::new())
//!         .unwrap();
//!
//!     let mut recorder = ResponseRecorder::new();
//!     handler.serve(&Request::new(request), &mut recorder).await;
//!
//!     assert_eq!(recorder.sent_headers()[http::header::CONTENT_ENCODING], "gzip");
//! }
//! ```
//!
//! Handlers never own the response: they write to a [`ResponseSink`], and
//! every wrapper that needs to see the response hands its inner handler a sink
//! of its own which delegates to the one it was given.

mod error;
mod request;

pub mod handler;
pub mod sink;
pub mod sniff;
pub mod wrapper;

pub use error::HttpError;
pub use handler::Handler;
pub use handler::handler_fn;
pub use request::Request;
pub use sink::ResponseRecorder;
pub use sink::ResponseSink;
pub use sniff::detect_content_type;
