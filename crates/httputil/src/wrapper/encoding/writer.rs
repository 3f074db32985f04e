use crate::sink::ResponseSink;
use crate::sniff::detect_content_type;
use crate::wrapper::encoding::GZIP;
use crate::wrapper::encoding::session::PooledSession;
use async_trait::async_trait;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use std::fmt;
use std::io;
use tracing::error;

/// Compressed output is handed to the underlying sink once this much has built up.
const DRAIN_THRESHOLD: usize = 4 * 1024;

/// A [`ResponseSink`] that gzips the body on its way to the underlying sink.
///
/// The writer goes through these states:
///
/// - pending: bound to a fresh session, nothing sent. A non-empty `write`
///   sniffs the content type if none is set and finalizes with `200 OK`;
///   empty writes leave the writer pending.
/// - active: the status is sent, body bytes go through the compressor.
/// - released: [`release`](Self::release) ended the gzip stream and the
///   session went back to the pool.
///
/// `204 No Content` and `304 Not Modified` carry no body, so for those the
/// headers are left alone and no gzip framing is ever emitted.
pub struct GzipResponseWriter<'a> {
    inner: &'a mut dyn ResponseSink,
    session: PooledSession<'static>,
}

impl<'a> GzipResponseWriter<'a> {
    pub(crate) fn new(inner: &'a mut dyn ResponseSink, session: PooledSession<'static>) -> Self {
        Self { inner, session }
    }

    /// Ends the response and hands the session back to the pool.
    ///
    /// Unless the status forbids a body, the remaining compressed bytes and
    /// the gzip trailer are written. Failures are logged: the response is
    /// already on its way and there is no one left to report them to.
    pub(crate) async fn release(mut self) {
        let status = self.finalized_status();
        if !is_bodyless(status) {
            if let Err(e) = self.close().await {
                error!(cause = %e, "failed to close gzip response");
            }
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        self.session.finish()?;
        self.drain().await
    }

    /// The latched status, finalizing with `200 OK` if nothing was sent yet.
    fn finalized_status(&mut self) -> StatusCode {
        match self.session.status {
            Some(status) => status,
            None => {
                self.set_status(StatusCode::OK);
                StatusCode::OK
            }
        }
    }

    async fn drain(&mut self) -> io::Result<()> {
        if self.session.output().is_empty() {
            return Ok(());
        }
        let result = self.inner.write_all(self.session.output()).await;
        self.session.consume_output();
        result
    }
}

impl fmt::Debug for GzipResponseWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GzipResponseWriter")
            .field("status", &self.session.status)
            .field("buffered", &self.session.output().len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<'a> ResponseSink for GzipResponseWriter<'a> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.session.status.is_none() {
            self.session.status = Some(status);
            if !is_bodyless(status) {
                let headers = self.inner.headers_mut();
                headers.remove(header::CONTENT_LENGTH);
                headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(GZIP));
            }
        }
        self.inner.set_status(status);
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let status = match self.session.status {
            Some(status) => status,
            // an empty chunk gives nothing to sniff, keep the header pending
            None if buf.is_empty() => return Ok(0),
            None => {
                if !self.inner.headers().contains_key(header::CONTENT_TYPE) {
                    let content_type = HeaderValue::from_static(detect_content_type(buf));
                    self.inner.headers_mut().insert(header::CONTENT_TYPE, content_type);
                }
                self.set_status(StatusCode::OK);
                StatusCode::OK
            }
        };

        if is_bodyless(status) {
            // nothing to encode, let the underlying sink decide about the bytes
            return self.inner.write(buf).await;
        }

        self.session.write(buf).inspect_err(|e| error!(cause = %e, "gzip compression failed"))?;
        if self.session.output().len() >= DRAIN_THRESHOLD {
            self.drain().await?;
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> io::Result<()> {
        if self.session.status.is_some_and(|status| !is_bodyless(status)) {
            self.session.sync_flush().inspect_err(|e| error!(cause = %e, "gzip sync flush failed"))?;
            self.drain().await?;
        }
        self.inner.flush().await
    }
}

#[inline]
fn is_bodyless(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}
