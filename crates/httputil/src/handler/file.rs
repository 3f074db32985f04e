use crate::handler::Handler;
use crate::request::Request;
use crate::sink::ResponseSink;
use crate::sniff::detect_content_type;
use crate::wrapper::{CacheHandler, CacheWrapper, Wrapper};
use async_trait::async_trait;
use http::{HeaderValue, Method, StatusCode, header};
use mime::Mime;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, warn};

/// Serves a single file from disk.
#[derive(Debug, Clone)]
pub struct FileHandler {
    path: PathBuf,
}

impl FileHandler {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

/// Serves the file at `path` with a public `Cache-Control` of `max_age`.
pub fn file_with_cache<P: Into<PathBuf>>(path: P, max_age: Duration) -> CacheHandler<FileHandler> {
    CacheWrapper::new(max_age).wrap(FileHandler::new(path))
}

#[async_trait]
impl Handler for FileHandler {
    async fn serve(&self, req: &Request, resp: &mut dyn ResponseSink) {
        let content = match read_file(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                write_text(resp, StatusCode::NOT_FOUND, "404 page not found\n").await;
                return;
            }
            Err(e) => {
                error!(path = %self.path.display(), cause = %e, "failed to read file");
                write_text(resp, StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error\n").await;
                return;
            }
        };

        let content_type = match content_type_by_extension(&self.path) {
            Some(mime) => HeaderValue::from_str(mime.as_ref()).ok(),
            None => None,
        }
        .unwrap_or_else(|| HeaderValue::from_static(detect_content_type(&content)));

        let headers = resp.headers_mut();
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content.len()));
        resp.set_status(StatusCode::OK);

        if req.method() == Method::HEAD {
            return;
        }
        if let Err(e) = resp.write_all(&content).await {
            warn!(path = %self.path.display(), cause = %e, "failed to write file");
        }
    }
}

async fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    // directories are treated as missing rather than listed
    if tokio::fs::metadata(path).await?.is_dir() {
        return Err(io::Error::from(io::ErrorKind::NotFound));
    }
    tokio::fs::read(path).await
}

async fn write_text(resp: &mut dyn ResponseSink, status: StatusCode, body: &'static str) {
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    resp.set_status(status);
    if let Err(e) = resp.write_all(body.as_bytes()).await {
        warn!(cause = %e, "failed to write error response");
    }
}

fn content_type_by_extension(path: &Path) -> Option<Mime> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "html" | "htm" => mime::TEXT_HTML_UTF_8,
        "css" => mime::TEXT_CSS_UTF_8,
        "js" | "mjs" => mime::TEXT_JAVASCRIPT,
        "json" => mime::APPLICATION_JSON,
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "xml" => mime::TEXT_XML,
        "svg" => mime::IMAGE_SVG,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "pdf" => mime::APPLICATION_PDF,
        "woff" => mime::FONT_WOFF,
        "woff2" => mime::FONT_WOFF2,
        _ => return None,
    };
    Some(mime)
}
