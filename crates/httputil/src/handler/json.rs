//! JSON response handlers.
//!
//! [`json_handler`] adapts a callback returning `Result<T, BoxError>` into a
//! [`Handler`]: the value is written as JSON, an error becomes an
//! `{"error": "..."}` body whose status comes from [`HttpError`] or defaults
//! to `500`. Every response allows any origin.

use crate::error::HttpError;
use crate::handler::Handler;
use crate::request::Request;
use crate::sink::ResponseSink;
use async_trait::async_trait;
use futures::future::BoxFuture;
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use tracing::{error, warn};

pub type BoxError = Box<dyn Error + Send + Sync>;

const JSON_CONTENT_TYPE: HeaderValue = HeaderValue::from_static("application/json; charset=UTF-8");
const ANY_ORIGIN: HeaderValue = HeaderValue::from_static("*");

pub struct JsonHandler<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<F, T> fmt::Debug for JsonHandler<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonHandler").finish_non_exhaustive()
    }
}

/// Turns a callback producing a serializable value into a [`Handler`].
pub fn json_handler<F, T>(f: F) -> JsonHandler<F, T>
where
    F: for<'a> Fn(&'a Request) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync,
    T: Serialize + Send,
{
    JsonHandler { f, _phantom: PhantomData }
}

/// A handler that always fails with [`HttpError::new`]`(status)`.
pub fn error_handler(status: StatusCode) -> impl Handler {
    json_handler(move |_req| Box::pin(async move { Err::<(), BoxError>(HttpError::new(status).into()) }))
}

#[async_trait]
impl<F, T> Handler for JsonHandler<F, T>
where
    F: for<'a> Fn(&'a Request) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync,
    T: Serialize + Send,
{
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, ANY_ORIGIN);
        headers.insert(header::CONTENT_TYPE, JSON_CONTENT_TYPE);

        let body = match (self.f)(req).await {
            Ok(value) => serde_json::to_vec(&value).map_err(BoxError::from),
            Err(e) => Err(e),
        };

        match body {
            Ok(bytes) => {
                if let Err(e) = resp.write_all(&bytes).await {
                    warn!(cause = %e, "failed to write json response");
                }
            }
            Err(e) => write_error(resp, e).await,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

async fn write_error(resp: &mut dyn ResponseSink, err: BoxError) {
    let status = match err.downcast_ref::<HttpError>() {
        Some(http_error) => http_error.status(),
        None => {
            error!(cause = %err, "unknown non-HTTP error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    resp.set_status(status);

    let message = err.to_string();
    let payload = match serde_json::to_vec(&ErrorBody { error: &message }) {
        Ok(payload) => payload,
        Err(e) => {
            error!(cause = %e, "failed to encode error body");
            return;
        }
    };
    if let Err(e) = resp.write_all(&payload).await {
        warn!(cause = %e, "failed to write json error response");
    }
}
