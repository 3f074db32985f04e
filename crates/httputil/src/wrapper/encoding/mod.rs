//! Gzip response compression.
//!
//! [`GzipWrapper`] compresses response bodies for clients whose
//! `Accept-Encoding` mentions `gzip`. Other requests, and every `HEAD`
//! request, reach the inner handler with the original sink, untouched and
//! without touching the session pool.
//!
//! Compression state is pooled: each compressed request takes a session from
//! a process wide free list and gives it back when it completes, whether the
//! handler returned, panicked, or its future was dropped. Only a handler that
//! returns gets its gzip stream closed; on the other paths the session is
//! returned as is and reset on its next use.

mod session;
mod writer;

use crate::handler::Handler;
use crate::request::Request;
use crate::sink::ResponseSink;
use crate::wrapper::Wrapper;
use async_trait::async_trait;
use http::Method;
use session::SessionPool;

pub use writer::GzipResponseWriter;

/// The content coding this wrapper produces.
pub const GZIP: &str = "gzip";

/// A wrapper that gzips responses for clients accepting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipWrapper;

#[derive(Debug)]
pub struct GzipHandler<H> {
    handler: H,
}

impl<H: Handler> Wrapper<H> for GzipWrapper {
    type Out = GzipHandler<H>;

    fn wrap(&self, handler: H) -> Self::Out {
        GzipHandler { handler }
    }
}

#[async_trait]
impl<H: Handler> Handler for GzipHandler<H> {
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        // a HEAD response carries the headers of the identity body and no gzip framing
        if req.method() == Method::HEAD || !req.accepts_encoding(GZIP) {
            self.handler.serve(req, resp).await;
            return;
        }

        let mut writer = GzipResponseWriter::new(resp, SessionPool::global().acquire());
        self.handler.serve(req, &mut writer).await;
        writer.release().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::handler::{Handler, handler_fn};
    use crate::request::Request;
    use crate::sink::{ResponseRecorder, ResponseSink};
    use crate::wrapper::{GzipWrapper, Wrapper};
    use bytes::Bytes;
    use flate2::read::GzDecoder;
    use http::{StatusCode, header};
    use std::io::Read;

    fn request(accept_encoding: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(value) = accept_encoding {
            builder = builder.header(header::ACCEPT_ENCODING, value);
        }
        Request::new(builder.body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_gzip_when_accepted() {
        let handler = GzipWrapper.wrap(handler_fn(|_req, resp| {
            Box::pin(async move {
                let _ = resp.write_all(b"hello").await;
            })
        }));

        let mut recorder = ResponseRecorder::new();
        handler.serve(&request(Some("gzip, deflate, br")), &mut recorder).await;

        let response = recorder.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
        assert!(!response.headers().contains_key(header::CONTENT_LENGTH));

        let mut body = String::new();
        GzDecoder::new(&response.body()[..]).read_to_string(&mut body).unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_passthrough_without_accept_encoding() {
        let handler = GzipWrapper.wrap(handler_fn(|_req, resp| {
            Box::pin(async move {
                resp.headers_mut().insert(header::CONTENT_LENGTH, 21.into());
                resp.set_status(StatusCode::NOT_FOUND);
                let _ = resp.write_all(br#"{"error":"not found"}"#).await;
            })
        }));

        for accept_encoding in [None, Some("br, deflate")] {
            let mut recorder = ResponseRecorder::new();
            handler.serve(&request(accept_encoding), &mut recorder).await;

            let response = recorder.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
            assert_eq!(response.headers()[header::CONTENT_LENGTH], "21");
            assert_eq!(&response.body()[..], br#"{"error":"not found"}"#);
        }
    }

    #[tokio::test]
    async fn test_head_is_not_compressed() {
        let handler = GzipWrapper.wrap(handler_fn(|_req, resp| {
            Box::pin(async move {
                resp.headers_mut().insert(header::CONTENT_LENGTH, 4096.into());
                resp.set_status(StatusCode::OK);
            })
        }));

        let req = Request::new(
            http::Request::builder()
                .method(http::Method::HEAD)
                .uri("/")
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Bytes::new())
                .unwrap(),
        );
        let mut recorder = ResponseRecorder::new();
        handler.serve(&req, &mut recorder).await;

        assert_eq!(recorder.status(), StatusCode::OK);
        assert!(!recorder.sent_headers().contains_key(header::CONTENT_ENCODING));
        assert_eq!(recorder.sent_headers()[header::CONTENT_LENGTH], "4096");
        assert!(recorder.body().is_empty());
    }

    #[tokio::test]
    async fn test_not_modified_has_no_trailer() {
        let handler = GzipWrapper.wrap(handler_fn(|_req, resp| {
            Box::pin(async move {
                resp.headers_mut().insert(header::CONTENT_LENGTH, 512.into());
                resp.set_status(StatusCode::NOT_MODIFIED);
            })
        }));

        let mut recorder = ResponseRecorder::new();
        handler.serve(&request(Some("gzip")), &mut recorder).await;

        assert_eq!(recorder.status(), StatusCode::NOT_MODIFIED);
        assert!(!recorder.sent_headers().contains_key(header::CONTENT_ENCODING));
        assert_eq!(recorder.sent_headers()[header::CONTENT_LENGTH], "512");
        assert!(recorder.body().is_empty());
    }
}
