use crate::sink::ResponseSink;
use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use std::fmt;
use std::io;

/// Spies on a [`ResponseSink`], recording status and body size.
///
/// Content is forwarded untouched and every result of the underlying sink is
/// returned as is. The recorded status is the first one set, or the implicit
/// `200 OK` latched by a write that came first.
pub struct ResponseObserver<'a> {
    inner: &'a mut dyn ResponseSink,
    status: Option<StatusCode>,
    written: u64,
}

impl<'a> ResponseObserver<'a> {
    pub fn new(inner: &'a mut dyn ResponseSink) -> Self {
        Self { inner, status: None, written: 0 }
    }

    /// The observed status; `200 OK` when nothing has been sent yet.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn is_header_sent(&self) -> bool {
        self.status.is_some()
    }

    /// Total number of body bytes the underlying sink accepted.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl fmt::Debug for ResponseObserver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseObserver")
            .field("status", &self.status)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<'a> ResponseSink for ResponseObserver<'a> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self.inner.set_status(status);
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.set_status(StatusCode::OK);
        }
        let n = self.inner.write(buf).await?;
        self.written += n as u64;
        Ok(n)
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }
}
