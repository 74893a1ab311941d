use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A stream record that could not be decoded. Never fatal to the stream.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Crawl service returned {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("A scrape job is already in progress")]
    JobInProgress,

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// Protocol errors are reported and skipped; everything else ends the job.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScanError::ProtocolError(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
