//! Reusable gzip compressor state and the pool that hands it out.
//!
//! A [`GzipSession`] owns a raw deflate stream, the running CRC of the
//! uncompressed data and an output buffer. The gzip member header and trailer
//! (RFC 1952) are framed here so the deflate state can be reset and reused
//! across requests instead of being rebuilt for each one.

use flate2::{Compress, Compression, Crc, FlushCompress, Status};
use http::StatusCode;
use once_cell::sync::Lazy;
use std::io;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

/// Member header: magic, deflate, no flags, no mtime, fastest, unknown os.
const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xff];

const OUTPUT_CHUNK: usize = 4 * 1024;

/// Larger output buffers are not kept when a session goes back to the pool.
const MAX_RETAINED_BUFFER: usize = 64 * 1024;

/// Idle sessions above this are dropped instead of pooled.
const MAX_IDLE_SESSIONS: usize = 1024;

static POOL: Lazy<SessionPool> = Lazy::new(SessionPool::new);

pub(crate) struct GzipSession {
    compress: Compress,
    crc: Crc,
    buf: Vec<u8>,
    started: bool,
    /// The status the response was finalized with; `None` until then.
    pub(crate) status: Option<StatusCode>,
}

impl GzipSession {
    fn new() -> Self {
        Self {
            compress: Compress::new(Compression::fast(), false),
            crc: Crc::new(),
            buf: Vec::with_capacity(OUTPUT_CHUNK),
            started: false,
            status: None,
        }
    }

    /// Starts a fresh gzip member.
    pub(crate) fn reset(&mut self) {
        self.compress.reset();
        self.crc.reset();
        self.buf.clear();
        self.started = false;
        self.status = None;
    }

    /// Compressed bytes ready to be sent.
    pub(crate) fn output(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn consume_output(&mut self) {
        self.buf.clear();
    }

    /// Feeds body bytes to the compressor.
    pub(crate) fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.crc.update(data);
        self.deflate(data, FlushCompress::None)
    }

    /// Makes everything written so far available in [`output`](Self::output).
    pub(crate) fn sync_flush(&mut self) -> io::Result<()> {
        self.deflate(&[], FlushCompress::Sync)
    }

    /// Ends the stream and appends the trailer.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        self.deflate(&[], FlushCompress::Finish)?;
        self.buf.extend_from_slice(&self.crc.sum().to_le_bytes());
        self.buf.extend_from_slice(&self.crc.amount().to_le_bytes());
        Ok(())
    }

    fn deflate(&mut self, mut input: &[u8], flush: FlushCompress) -> io::Result<()> {
        if !self.started {
            self.buf.extend_from_slice(&GZIP_HEADER);
            self.started = true;
        }

        loop {
            self.buf.reserve(OUTPUT_CHUNK);
            let before_in = self.compress.total_in();
            let before_out = self.compress.total_out();

            let status = self.compress.compress_vec(input, &mut self.buf, flush).map_err(io::Error::other)?;

            let consumed = (self.compress.total_in() - before_in) as usize;
            let produced = self.compress.total_out() - before_out;
            input = &input[consumed..];

            if status == Status::StreamEnd {
                return Ok(());
            }

            let output_full = self.buf.len() == self.buf.capacity();
            let done = flush != FlushCompress::Finish && input.is_empty() && !output_full;
            let stalled = consumed == 0 && produced == 0 && !output_full;
            if done || stalled {
                return Ok(());
            }
        }
    }

    fn recycle(&mut self) {
        if self.buf.capacity() > MAX_RETAINED_BUFFER {
            self.buf = Vec::with_capacity(OUTPUT_CHUNK);
        }
        self.buf.clear();
        self.status = None;
    }
}

/// A free list of idle [`GzipSession`]s shared by concurrent requests.
pub(crate) struct SessionPool {
    idle: Mutex<Vec<GzipSession>>,
}

impl SessionPool {
    pub(crate) fn new() -> Self {
        Self { idle: Mutex::new(Vec::new()) }
    }

    /// The process wide pool used by the gzip wrapper.
    pub(crate) fn global() -> &'static SessionPool {
        &POOL
    }

    /// Takes an idle session, or creates one, reset for a new response.
    pub(crate) fn acquire(&self) -> PooledSession<'_> {
        let session = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let mut session = session.unwrap_or_else(GzipSession::new);
        session.reset();
        PooledSession { session: Some(session), pool: self }
    }

    fn release(&self, mut session: GzipSession) {
        session.recycle();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE_SESSIONS {
            idle.push(session);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_len(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Exclusive use of one session; it returns to its pool when dropped.
pub(crate) struct PooledSession<'p> {
    session: Option<GzipSession>,
    pool: &'p SessionPool,
}

impl Deref for PooledSession<'_> {
    type Target = GzipSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref().expect("session is only taken out on drop")
    }
}

impl DerefMut for PooledSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut().expect("session is only taken out on drop")
    }
}

impl Drop for PooledSession<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}
