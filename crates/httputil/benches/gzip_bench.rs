use bytes::Bytes;
use criterion::{Criterion, criterion_group, criterion_main};
use http::header;
use micro_httputil::wrapper::{GzipWrapper, LoggerWrapper, Wrapper, Wrappers};
use micro_httputil::{Handler, Request, ResponseRecorder, ResponseSink, handler_fn};
use std::hint::black_box;
use tokio::runtime::Runtime;

const PAGE: &[u8] = include_bytes!("../README.md");

fn request(accept_encoding: &str) -> Request {
    let request =
        http::Request::builder().uri("/readme").header(header::ACCEPT_ENCODING, accept_encoding).body(Bytes::new());
    Request::new(request.unwrap())
}

fn page_handler() -> impl Handler {
    handler_fn(|_req, resp| {
        Box::pin(async move {
            for chunk in PAGE.chunks(1024) {
                let _ = resp.write_all(chunk).await;
            }
        })
    })
}

fn bench_gzip(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let handler = GzipWrapper.wrap(page_handler());
    let gzip = request("gzip");
    let identity = request("identity");

    c.bench_function("gzip_page", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut recorder = ResponseRecorder::new();
            handler.serve(&gzip, &mut recorder).await;
            black_box(recorder.body().len())
        });
    });

    c.bench_function("identity_page", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut recorder = ResponseRecorder::new();
            handler.serve(&identity, &mut recorder).await;
            black_box(recorder.body().len())
        });
    });
}

fn bench_logged_gzip(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let handler = Wrappers::new().and_then(GzipWrapper).and_then(LoggerWrapper::new()).wrap(page_handler());
    let gzip = request("gzip, deflate, br");

    c.bench_function("logged_gzip_page", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut recorder = ResponseRecorder::new();
            handler.serve(&gzip, &mut recorder).await;
            black_box(recorder.body().len())
        });
    });
}

criterion_group!(benches, bench_gzip, bench_logged_gzip);
criterion_main!(benches);
