pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod event;
pub mod headers;
pub mod job;
pub mod result;

pub use config::{ServiceConfig, StreamEndPolicy};
pub use controller::ScrapeJobController;
pub use decoder::StreamEventDecoder;
pub use error::ScanError;
pub use event::ScrapeEvent;
pub use job::{JobOutcome, JobSnapshot, JobState, Progress, ScrapeJob, ScrapeRequest};
pub use result::{LinkRef, PageRecord};
