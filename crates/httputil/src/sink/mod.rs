//! The response sink a handler writes to.
//!
//! A [`ResponseSink`] is the write side of a single response: a mutable header
//! map, a status that is latched exactly once, and a byte stream for the body.
//! Wrappers decorate a sink by implementing the same trait and delegating to
//! the sink they were handed, which is how compression and access logging
//! observe the response without owning it.
//!
//! # Status latching
//!
//! The first call to [`ResponseSink::set_status`] fixes the status and the
//! headers that go out with it. A [`ResponseSink::write`] without a prior
//! status implicitly latches `200 OK`. Later status calls are allowed but must
//! not change what was already sent.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use std::io;

mod recorder;

pub use recorder::ResponseRecorder;

#[async_trait]
pub trait ResponseSink: Send {
    /// Headers that will be sent with the status line.
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sends the status line together with the current headers.
    fn set_status(&mut self, status: StatusCode);

    /// Writes a chunk of body, returning the number of bytes accepted.
    ///
    /// Implicitly latches `200 OK` when no status has been set yet.
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Pushes buffered body bytes towards the peer.
    ///
    /// Sinks that do not buffer keep the default, which does nothing.
    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Writes the whole buffer, retrying on short writes.
    async fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf).await? {
                0 => return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole response body")),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }
}
