use http::StatusCode;
use thiserror::Error;

/// An error that maps to a specific response status.
///
/// Returned from [`json_handler`](crate::handler::json_handler) callbacks to
/// pick the status of the error response; any other error becomes a `500`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// An error with the generic message `HTTP {code}`.
    pub fn new(status: StatusCode) -> Self {
        Self { status, message: format!("HTTP {}", status.as_u16()) }
    }

    pub fn with_message<S: ToString>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.to_string() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::HttpError;
    use http::StatusCode;

    #[test]
    fn test_default_message() {
        let error = HttpError::new(StatusCode::NOT_FOUND);
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "HTTP 404");
    }

    #[test]
    fn test_custom_message() {
        let error = HttpError::with_message(StatusCode::BAD_REQUEST, "missing id");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "missing id");
    }
}
