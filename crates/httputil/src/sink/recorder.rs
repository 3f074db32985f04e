use crate::sink::ResponseSink;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use std::io;
use tracing::warn;

/// An in-memory [`ResponseSink`].
///
/// The recorder behaves like a connection that never fails: the first status
/// is latched together with a snapshot of the headers at that moment, body
/// bytes are appended to a buffer and flushes are counted. It is used to
/// drive handlers outside of a server, and by the tests of this crate.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    sent: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
    flushed: usize,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latched status, or `200 OK` if nothing was sent.
    pub fn status(&self) -> StatusCode {
        self.sent.as_ref().map_or(StatusCode::OK, |(status, _)| *status)
    }

    /// Whether a status line has been latched.
    pub fn is_header_sent(&self) -> bool {
        self.sent.is_some()
    }

    /// The headers as they went out with the status line.
    ///
    /// Before anything is sent this is the live header map.
    pub fn sent_headers(&self) -> &HeaderMap {
        self.sent.as_ref().map_or(&self.headers, |(_, headers)| headers)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn flush_count(&self) -> usize {
        self.flushed
    }

    /// Converts the recording into the response a peer would have received.
    pub fn into_response(self) -> Response<Bytes> {
        let (status, headers) = self.sent.unwrap_or((StatusCode::OK, self.headers));
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

#[async_trait]
impl ResponseSink for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if let Some((sent, _)) = &self.sent {
            warn!(sent = %sent, ignored = %status, "superfluous set_status call");
            return;
        }
        self.sent = Some((status, self.headers.clone()));
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.sent.is_none() {
            self.set_status(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.flushed += 1;
        Ok(())
    }
}
