//! Request handlers.
//!
//! A [`Handler`] serves one request by writing to the [`ResponseSink`] it is
//! handed. Everything in this crate is either a handler or a
//! [`Wrapper`](crate::wrapper::Wrapper) turning one handler into another.

use crate::request::Request;
use crate::sink::ResponseSink;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

mod file;
mod json;

pub use file::{FileHandler, file_with_cache};
pub use json::{BoxError, JsonHandler, error_handler, json_handler};

#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink);
}

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        (**self).serve(req, resp).await;
    }
}

#[async_trait]
impl<H> Handler for Box<H>
where
    H: Handler + ?Sized,
{
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        (**self).serve(req, resp).await;
    }
}

/// A handler backed by a closure returning a boxed future.
#[derive(Debug, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Creates a [`Handler`] from a closure.
///
/// ```
/// use micro_httputil::handler::handler_fn;
/// use micro_httputil::sink::ResponseSink;
///
/// let hello = handler_fn(|_req, resp| {
///     Box::pin(async move {
///         let _ = resp.write_all(b"hello").await;
///     })
/// });
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a Request, &'a mut dyn ResponseSink) -> BoxFuture<'a, ()> + Send + Sync,
{
    HandlerFn { f }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a Request, &'a mut dyn ResponseSink) -> BoxFuture<'a, ()> + Send + Sync,
{
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        (self.f)(req, resp).await;
    }
}

#[cfg(test)]
mod tests {
    use crate::handler::{Handler, handler_fn};
    use crate::request::Request;
    use crate::sink::{ResponseRecorder, ResponseSink};
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::Arc;

    fn assert_is_handler<T: Handler>(_handler: &T) {
        // no op
    }

    #[tokio::test]
    async fn test_handler_fn_writes_response() {
        let handler = handler_fn(|req, resp| {
            Box::pin(async move {
                resp.set_status(StatusCode::ACCEPTED);
                let _ = resp.write_all(req.target().as_bytes()).await;
            })
        });
        assert_is_handler(&handler);

        let req = Request::new(http::Request::builder().uri("/echo?x=1").body(Bytes::new()).unwrap());
        let mut recorder = ResponseRecorder::new();
        handler.serve(&req, &mut recorder).await;

        assert_eq!(recorder.status(), StatusCode::ACCEPTED);
        assert_eq!(recorder.body(), b"/echo?x=1");
    }

    #[tokio::test]
    async fn test_shared_handlers() {
        let handler: Arc<dyn Handler> = Arc::new(handler_fn(|_req, resp| {
            Box::pin(async move {
                let _ = resp.write_all(b"shared").await;
            })
        }));
        assert_is_handler(&handler);

        let req = Request::new(http::Request::builder().uri("/").body(Bytes::new()).unwrap());
        let mut recorder = ResponseRecorder::new();
        handler.serve(&req, &mut recorder).await;
        assert_eq!(recorder.body(), b"shared");
    }
}
