use bytes::Bytes;
use http::{StatusCode, header};
use micro_httputil::handler::{BoxError, json_handler};
use micro_httputil::wrapper::{CacheWrapper, GzipWrapper, LoggerWrapper, SecureWrapper, Wrapper, Wrappers};
use micro_httputil::{Handler, HttpError, Request, ResponseRecorder};
use serde::Serialize;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize)]
struct User {
    id: u32,
    name: String,
}

async fn find_user(req: &Request) -> Result<User, BoxError> {
    match req.uri().path().strip_prefix("/users/") {
        Some("1") => Ok(User { id: 1, name: "zava".into() }),
        _ => Err(HttpError::with_message(StatusCode::NOT_FOUND, "not found").into()),
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let handler = Wrappers::new()
        .and_then(CacheWrapper::new(Duration::from_secs(60)))
        .and_then(GzipWrapper)
        .and_then(SecureWrapper)
        .and_then(LoggerWrapper::new())
        .wrap(json_handler(|req| Box::pin(find_user(req))));

    let requests = [
        ("/users/1", "https", Some("gzip, deflate")),
        ("/users/1", "https", None),
        ("/users/2", "https", Some("gzip")),
        ("/users/1", "http", Some("gzip")),
    ];

    for (uri, proto, accept_encoding) in requests {
        let mut builder = http::Request::builder()
            .uri(uri)
            .header(header::HOST, "localhost:8080")
            .header(header::USER_AGENT, "stack-demo")
            .header("x-forwarded-proto", proto);
        if let Some(value) = accept_encoding {
            builder = builder.header(header::ACCEPT_ENCODING, value);
        }
        let request = match builder.body(Bytes::new()) {
            Ok(request) => Request::new(request).with_remote_addr(([127, 0, 0, 1], 52000).into()),
            Err(e) => {
                info!(cause = %e, "invalid demo request");
                continue;
            }
        };

        let mut recorder = ResponseRecorder::new();
        handler.serve(&request, &mut recorder).await;

        let response = recorder.into_response();
        info!(
            status = response.status().as_u16(),
            encoding = ?response.headers().get(header::CONTENT_ENCODING),
            location = ?response.headers().get(header::LOCATION),
            body_len = response.body().len(),
            "served {uri}"
        );
    }
}
