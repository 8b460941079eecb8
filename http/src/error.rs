use thiserror::Error;

/// Failures of an HTTP exchange.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid parameter {0:?}, expected key=value")]
    Parameter(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a status other than 200 or 201.
    #[error("{code}: {message}")]
    Status {
        code: u16,
        message: String,
        /// Response body, often the server's own explanation.
        body: String,
    },
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

impl HttpError {
    /// The HTTP status code for [`HttpError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
