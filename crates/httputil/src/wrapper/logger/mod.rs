//! Access logging.
//!
//! [`LoggerWrapper`] wraps a handler so that each request produces exactly one
//! [`AccessRecord`] once the inner handler has returned. The record carries
//! the peer address, the request line, the status and body size seen by a
//! [`ResponseObserver`], and the `Referer` and `User-Agent` headers.
//!
//! The size is whatever passed through the observer: if the logger wraps the
//! gzip wrapper it counts compressed bytes, if gzip wraps the logger it counts
//! the bytes the handler wrote.

mod observer;

use crate::handler::Handler;
use crate::request::Request;
use crate::sink::ResponseSink;
use crate::wrapper::Wrapper;
use async_trait::async_trait;
use http::StatusCode;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub use observer::ResponseObserver;

/// One completed request.
#[derive(Debug, Clone)]
pub struct AccessRecord<'a> {
    pub remote_addr: Option<SocketAddr>,
    /// `METHOD target VERSION`
    pub request_line: String,
    pub status: StatusCode,
    pub written: u64,
    pub referer: &'a str,
    pub user_agent: &'a str,
}

impl fmt::Display for AccessRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remote_addr {
            Some(addr) => write!(f, "{addr} ")?,
            None => f.write_str("- ")?,
        }
        write!(
            f,
            "{:?} {} {} {:?} {:?}",
            self.request_line,
            self.status.as_u16(),
            self.written,
            self.referer,
            self.user_agent
        )
    }
}

/// Destination of access records.
pub trait AccessLog: Send + Sync {
    fn log(&self, record: &AccessRecord<'_>);
}

/// Emits access records as `tracing` events on the `micro_httputil::access` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn log(&self, record: &AccessRecord<'_>) {
        info!(
            target: "micro_httputil::access",
            remote_addr = record.remote_addr.map(tracing::field::display),
            request = %record.request_line,
            status = record.status.as_u16(),
            written = record.written,
            referer = record.referer,
            user_agent = record.user_agent,
            "{record}"
        );
    }
}

/// A wrapper that logs every request passing through it.
#[derive(Debug, Clone)]
pub struct LoggerWrapper<L = TracingAccessLog> {
    log: Arc<L>,
}

impl LoggerWrapper {
    pub fn new() -> Self {
        Self { log: Arc::new(TracingAccessLog) }
    }
}

impl Default for LoggerWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: AccessLog> LoggerWrapper<L> {
    /// Sends records to `log` instead of `tracing`.
    pub fn with_log(log: L) -> Self {
        Self { log: Arc::new(log) }
    }
}

#[derive(Debug)]
pub struct LoggerHandler<H, L> {
    handler: H,
    log: Arc<L>,
}

impl<H, L> Wrapper<H> for LoggerWrapper<L>
where
    H: Handler,
    L: AccessLog + 'static,
{
    type Out = LoggerHandler<H, L>;

    fn wrap(&self, handler: H) -> Self::Out {
        LoggerHandler { handler, log: Arc::clone(&self.log) }
    }
}

#[async_trait]
impl<H, L> Handler for LoggerHandler<H, L>
where
    H: Handler,
    L: AccessLog + 'static,
{
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        let request_line = format!("{} {} {:?}", req.method(), req.target(), req.version());

        let mut observer = ResponseObserver::new(resp);
        self.handler.serve(req, &mut observer).await;

        let record = AccessRecord {
            remote_addr: req.remote_addr(),
            request_line,
            status: observer.status(),
            written: observer.written(),
            referer: req.referer(),
            user_agent: req.user_agent(),
        };
        self.log.log(&record);
    }
}
