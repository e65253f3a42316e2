#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error message reported by the backend in an `{"error": ...}` body,
    /// or the status text when no such body was present.
    #[error("{0}")]
    Backend(String),

    #[error("Stream error: {message}")]
    Stream { message: String },
}

impl Error {
    pub(crate) fn stream(message: impl Into<String>) -> Self {
        Error::Stream {
            message: message.into(),
        }
    }
}
