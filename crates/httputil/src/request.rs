//! Inbound request representation.
//!
//! Middleware only ever reads the request, so [`Request`] exposes the parts
//! of an `http::Request<Bytes>` the wrappers need (method, target, version,
//! headers) together with the peer address the transport accepted it from.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, Method, Uri, Version, header};
use std::net::SocketAddr;

/// An inbound HTTP request as seen by handlers and wrappers.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Bytes>,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn new(inner: http::Request<Bytes>) -> Self {
        Self { inner, remote_addr: None }
    }

    /// Attaches the address of the peer that sent this request.
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// The request target as it appeared on the request line: path plus query.
    pub fn target(&self) -> &str {
        self.inner.uri().path_and_query().map_or("/", |pq| pq.as_str())
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    #[inline]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the first value of `name` if it is present and visible ascii.
    pub fn header_str<K>(&self, name: K) -> Option<&str>
    where
        K: header::AsHeaderName,
    {
        self.inner.headers().get(name).and_then(|value| value.to_str().ok())
    }

    /// The `Referer` header, or an empty string when absent.
    pub fn referer(&self) -> &str {
        self.header_str(header::REFERER).unwrap_or_default()
    }

    /// The `User-Agent` header, or an empty string when absent.
    pub fn user_agent(&self) -> &str {
        self.header_str(header::USER_AGENT).unwrap_or_default()
    }

    /// The host this request was addressed to.
    ///
    /// The `Host` header wins, falling back to the authority of an absolute-form target.
    pub fn host(&self) -> Option<&str> {
        self.header_str(header::HOST).or_else(|| self.inner.uri().authority().map(|authority| authority.as_str()))
    }

    /// Checks whether any `Accept-Encoding` value mentions `coding`.
    pub fn accepts_encoding(&self, coding: &str) -> bool {
        self.header_values_contain(&header::ACCEPT_ENCODING, coding)
    }

    fn header_values_contain(&self, name: &HeaderName, needle: &str) -> bool {
        self.inner
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.contains(needle))
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(inner: http::Request<Bytes>) -> Self {
        Self::new(inner)
    }
}
