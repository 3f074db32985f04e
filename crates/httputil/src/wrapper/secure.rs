use crate::handler::Handler;
use crate::request::Request;
use crate::sink::ResponseSink;
use crate::wrapper::Wrapper;
use async_trait::async_trait;
use http::{HeaderName, HeaderValue, Method, StatusCode, header};
use tracing::{debug, warn};

static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

const TEXT_HTML_UTF_8: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");

/// A wrapper redirecting requests that reached a proxy over plain http.
///
/// Only the `X-Forwarded-Proto` header is consulted; requests without it are
/// served as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureWrapper;

#[derive(Debug)]
pub struct SecureHandler<H> {
    handler: H,
}

impl<H: Handler> Wrapper<H> for SecureWrapper {
    type Out = SecureHandler<H>;

    fn wrap(&self, handler: H) -> Self::Out {
        SecureHandler { handler }
    }
}

#[async_trait]
impl<H: Handler> Handler for SecureHandler<H> {
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        if req.header_str(&X_FORWARDED_PROTO) != Some("http") {
            self.handler.serve(req, resp).await;
            return;
        }

        let Some(host) = req.host() else {
            warn!(uri = req.target(), "no host to redirect plain http request to");
            resp.set_status(StatusCode::BAD_REQUEST);
            return;
        };

        let location = format!("https://{host}{}", req.target());
        let Ok(value) = HeaderValue::try_from(location.as_str()) else {
            warn!(%location, "invalid https redirect location");
            resp.set_status(StatusCode::BAD_REQUEST);
            return;
        };

        debug!(%location, "redirecting to https");
        redirect(req.method(), &location, value, resp).await;
    }
}

async fn redirect(method: &Method, location: &str, value: HeaderValue, resp: &mut dyn ResponseSink) {
    let headers = resp.headers_mut();
    headers.insert(header::LOCATION, value);
    let has_content_type = headers.contains_key(header::CONTENT_TYPE);
    if !has_content_type && (method == Method::GET || method == Method::HEAD) {
        headers.insert(header::CONTENT_TYPE, TEXT_HTML_UTF_8);
    }
    resp.set_status(StatusCode::FOUND);

    // a short note for clients that do not follow redirects
    if !has_content_type && method == Method::GET {
        let body = format!("<a href=\"{}\">Found</a>.\n", html_escape(location));
        if let Err(e) = resp.write_all(body.as_bytes()).await {
            warn!(cause = %e, "failed to write redirect body");
        }
    }
}

fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            c => escaped.push(c),
        }
    }
    escaped
}
