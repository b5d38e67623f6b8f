/// Shared error type used across all jobdeck crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("event stream: {0}")]
    Stream(String),

    #[error("config: {0}")]
    Config(String),

    #[error("request cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
