use std::time::Duration;
use url::Url;

use crate::error::{Result, ScanError};

pub const DEFAULT_START_PATH: &str = "/api/scrape";
pub const DEFAULT_STOP_PATH: &str = "/api/scrape/stop";
pub const DEFAULT_JOB_ID_HEADER: &str = "X-Job-ID";

/// What a stream that ends without Completion or Error means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamEndPolicy {
    /// Treat the job as completed with whatever was received.
    #[default]
    Complete,
    /// Treat the job as failed. Received pages are still kept.
    Error,
}

/// Where and how to reach the remote crawl service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: Url,
    pub start_path: String,
    /// The job identifier is appended to this path as its last segment.
    pub stop_path: String,
    pub job_id_header: String,
    pub connect_timeout: Duration,
    /// Applies to the cancel call only; the event stream has no total timeout.
    pub stop_timeout: Duration,
    pub end_policy: StreamEndPolicy,
    pub user_agent: String,
}

impl ServiceConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            start_path: DEFAULT_START_PATH.to_string(),
            stop_path: DEFAULT_STOP_PATH.to_string(),
            job_id_header: DEFAULT_JOB_ID_HEADER.to_string(),
            connect_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(5),
            end_policy: StreamEndPolicy::default(),
            user_agent: format!("Linkmatrix/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn parse(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self::new(url))
    }

    pub fn with_start_path(mut self, path: impl Into<String>) -> Self {
        self.start_path = path.into();
        self
    }

    pub fn with_stop_path(mut self, path: impl Into<String>) -> Self {
        self.stop_path = path.into();
        self
    }

    pub fn with_job_id_header(mut self, header: impl Into<String>) -> Self {
        self.job_id_header = header.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn with_end_policy(mut self, policy: StreamEndPolicy) -> Self {
        self.end_policy = policy;
        self
    }

    pub fn start_url(&self) -> Result<Url> {
        self.endpoint(&self.start_path)
    }

    pub fn stop_url(&self, job_id: &str) -> Result<Url> {
        let mut url = self.endpoint(&self.stop_path)?;
        let base = url.to_string();
        url.path_segments_mut()
            .map_err(|_| ScanError::InvalidUrl(format!("{} cannot take a path", base)))?
            .pop_if_empty()
            .push(job_id);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ScanError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }
}
