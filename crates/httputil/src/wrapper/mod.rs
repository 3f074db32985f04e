//! Middleware as handler wrappers.
//!
//! A [`Wrapper`] turns one [`Handler`] into another that layers behavior
//! around it. Wrappers compose by nesting: the wrapper applied last sees the
//! request first and the response last, so it is the one closest to the wire.
//!
//! ```
//! use micro_httputil::wrapper::{GzipWrapper, LoggerWrapper, Wrapper, Wrappers};
//! use micro_httputil::handler::handler_fn;
//! use micro_httputil::sink::ResponseSink;
//!
//! let hello = handler_fn(|_req, resp| {
//!     Box::pin(async move {
//!         let _ = resp.write_all(b"hello").await;
//!     })
//! });
//!
//! // logs uncompressed sizes: the logger runs inside the gzip writer
//! let handler = Wrappers::new().and_then(LoggerWrapper::new()).and_then(GzipWrapper).wrap(hello);
//! ```

mod cache;
mod encoding;
mod logger;
mod secure;

use crate::handler::Handler;
use std::time::Duration;

pub use cache::{CacheHandler, CacheWrapper};
pub use encoding::{GZIP, GzipHandler, GzipResponseWriter, GzipWrapper};
pub use logger::{AccessLog, AccessRecord, LoggerHandler, LoggerWrapper, ResponseObserver, TracingAccessLog};
pub use secure::{SecureHandler, SecureWrapper};

/// Wraps a handler into another one.
pub trait Wrapper<H: Handler> {
    type Out: Handler;

    fn wrap(&self, handler: H) -> Self::Out;
}

/// An identity wrapper, which does not do any wrapping
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityWrapper;

impl<H: Handler> Wrapper<H> for IdentityWrapper {
    type Out = H;

    #[inline]
    fn wrap(&self, handler: H) -> Self::Out {
        handler
    }
}

/// A list of [`Wrapper`]s applied in insertion order.
#[derive(Debug, Clone, Copy)]
pub struct Wrappers<Head = IdentityWrapper, Tail = IdentityWrapper> {
    head: Head,
    tail: Tail,
}

impl Wrappers {
    /// An empty list, wrapping nothing.
    pub fn new() -> Self {
        Self { head: IdentityWrapper, tail: IdentityWrapper }
    }
}

impl Default for Wrappers {
    fn default() -> Self {
        Self::new()
    }
}

impl<Head, Tail> Wrappers<Head, Tail> {
    /// Appends `wrapper`; it will wrap everything added before it.
    pub fn and_then<W>(self, wrapper: W) -> Wrappers<Self, W> {
        Wrappers { head: self, tail: wrapper }
    }
}

impl<Head, Tail, H> Wrapper<H> for Wrappers<Head, Tail>
where
    H: Handler,
    Head: Wrapper<H>,
    Tail: Wrapper<Head::Out>,
{
    type Out = Tail::Out;

    fn wrap(&self, handler: H) -> Self::Out {
        let inner = self.head.wrap(handler);
        self.tail.wrap(inner)
    }
}

/// Compresses responses with gzip when the client accepts it.
pub fn gzip<H: Handler>(handler: H) -> GzipHandler<H> {
    GzipWrapper.wrap(handler)
}

/// Logs one access record per request through `tracing`.
pub fn logger<H: Handler>(handler: H) -> LoggerHandler<H, TracingAccessLog> {
    LoggerWrapper::new().wrap(handler)
}

/// Marks every response as publicly cacheable for `max_age`.
pub fn cacher<H: Handler>(max_age: Duration, handler: H) -> CacheHandler<H> {
    CacheWrapper::new(max_age).wrap(handler)
}

/// Redirects plain http requests arriving through a proxy to https.
pub fn secure_enforcer<H: Handler>(handler: H) -> SecureHandler<H> {
    SecureWrapper.wrap(handler)
}
