use crate::handler::Handler;
use crate::request::Request;
use crate::sink::ResponseSink;
use crate::wrapper::Wrapper;
use async_trait::async_trait;
use http::{HeaderValue, header};
use std::time::Duration;

const VARY_ACCEPT_ENCODING: HeaderValue = HeaderValue::from_static("Accept-Encoding");

/// A wrapper marking responses as publicly cacheable.
///
/// Sets `Cache-Control: public, max-age=N` with `N` the whole seconds of the
/// configured duration, and `Vary: Accept-Encoding` since the body may be
/// compressed further out.
#[derive(Debug, Clone)]
pub struct CacheWrapper {
    cache_control: HeaderValue,
}

impl CacheWrapper {
    pub fn new(max_age: Duration) -> Self {
        let cache_control = format!("public, max-age={}", max_age.as_secs());
        Self { cache_control: HeaderValue::try_from(cache_control).expect("digits and ascii are a valid header value") }
    }
}

#[derive(Debug)]
pub struct CacheHandler<H> {
    handler: H,
    cache_control: HeaderValue,
}

impl<H: Handler> Wrapper<H> for CacheWrapper {
    type Out = CacheHandler<H>;

    fn wrap(&self, handler: H) -> Self::Out {
        CacheHandler { handler, cache_control: self.cache_control.clone() }
    }
}

#[async_trait]
impl<H: Handler> Handler for CacheHandler<H> {
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        let headers = resp.headers_mut();
        headers.insert(header::CACHE_CONTROL, self.cache_control.clone());
        headers.insert(header::VARY, VARY_ACCEPT_ENCODING);
        self.handler.serve(req, resp).await;
    }
}
