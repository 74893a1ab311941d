use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::result::PageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Starting,
    Running,
    Completed,
    Errored,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Starting => "starting",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Errored => "errored",
        }
    }

    /// Starting or Running.
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Starting | JobState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Errored)
    }
}

/// Identity and counters of the current (or last) job.
#[derive(Debug, Clone, Default)]
pub struct ScrapeJob {
    /// Assigned by the crawl service; `None` until the start response arrives
    /// or when the service did not send one.
    pub id: Option<String>,
    pub state: JobState,
    pub started_at: Option<DateTime<Utc>>,
    pub processed_page_count: u64,
    pub elapsed_time: f64,
}

/// Latest known progress. Intermediate values may be skipped by readers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    pub message: String,
    pub processed_pages: u64,
    pub elapsed_time: f64,
}

/// Everything a reader can observe about the controller at one instant.
///
/// `pages` is shared: a held snapshot never changes underneath its reader,
/// appends made afterwards go to a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct JobSnapshot {
    pub job: ScrapeJob,
    pub progress: Option<Progress>,
    pub pages: Arc<Vec<PageRecord>>,
    /// The one error message surfaced for this job.
    pub error: Option<String>,
    pub warning: Option<String>,
    /// Stream records skipped because they could not be decoded.
    pub decode_errors: usize,
    pub(crate) generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { processed_pages: u64, total_time: f64 },
    Errored { message: String },
    Cancelled { user_initiated: bool },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

/// Body of the start request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScrapeRequest {
    Single {
        #[serde(rename = "startUrl")]
        start_url: String,
        #[serde(rename = "targetClass", skip_serializing_if = "Option::is_none")]
        target_class: Option<String>,
    },
    Batch {
        #[serde(rename = "startUrls")]
        start_urls: Vec<String>,
        #[serde(rename = "targetClass", skip_serializing_if = "Option::is_none")]
        target_class: Option<String>,
    },
}

impl ScrapeRequest {
    pub fn single(start_url: impl Into<String>) -> Self {
        ScrapeRequest::Single {
            start_url: start_url.into(),
            target_class: None,
        }
    }

    /// The URL count is not limited here; callers apply their own cap.
    pub fn batch(start_urls: Vec<String>) -> Self {
        ScrapeRequest::Batch {
            start_urls,
            target_class: None,
        }
    }

    /// One URL becomes the single form, anything else the batch form.
    pub fn from_urls(mut urls: Vec<String>) -> Self {
        if urls.len() == 1 {
            Self::single(urls.remove(0))
        } else {
            Self::batch(urls)
        }
    }

    pub fn with_target_class(mut self, class: Option<String>) -> Self {
        match &mut self {
            ScrapeRequest::Single { target_class, .. }
            | ScrapeRequest::Batch { target_class, .. } => *target_class = class,
        }
        self
    }

    pub fn urls(&self) -> Vec<&str> {
        match self {
            ScrapeRequest::Single { start_url, .. } => vec![start_url.as_str()],
            ScrapeRequest::Batch { start_urls, .. } => {
                start_urls.iter().map(String::as_str).collect()
            }
        }
    }
}
