use indicatif::{ProgressBar, ProgressStyle};
use linkmatrix_scanner::{
    JobOutcome, JobSnapshot, JobState, ScanError, ScrapeJobController, ScrapeRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Options for configuring a scrape run
pub struct ScrapeOptions {
    pub urls: Vec<String>,
    pub target_class: Option<String>,
    pub show_progress_bars: bool,
}

/// Callback for reporting scrape progress lines
pub type ScrapeProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Result of one scrape run: how it ended and what was collected.
pub struct ScrapeRun {
    pub outcome: JobOutcome,
    pub snapshot: JobSnapshot,
}

/// Run one scrape job to the end, reporting progress as it streams in.
///
/// Cancellation goes through the same controller from another task; the
/// returned run then carries `JobOutcome::Cancelled` and the pages received
/// before the cancel.
pub async fn execute_scrape(
    controller: &ScrapeJobController,
    options: ScrapeOptions,
    progress_callback: Option<ScrapeProgressCallback>,
) -> Result<ScrapeRun, ScanError> {
    let ScrapeOptions {
        urls,
        target_class,
        show_progress_bars,
    } = options;

    if urls.is_empty() {
        return Err(ScanError::InvalidUrl("No start URLs provided".to_string()));
    }

    let request = ScrapeRequest::from_urls(urls).with_target_class(target_class);

    // Set up single spinner for overall job progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting scrape job...");
        Some(pb)
    } else {
        None
    };

    let mut rx = controller.subscribe();
    let outcome = tokio::select! {
        outcome = controller.start(&request) => outcome?,
        () = watch_progress(&mut rx, progress_bar.as_ref(), progress_callback.as_ref()) => {
            return Err(ScanError::Other("progress channel closed".to_string()));
        }
    };

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(outcome_message(&outcome));
    }

    Ok(ScrapeRun {
        outcome,
        snapshot: controller.snapshot(),
    })
}

async fn watch_progress(
    rx: &mut watch::Receiver<JobSnapshot>,
    progress_bar: Option<&ProgressBar>,
    progress_callback: Option<&ScrapeProgressCallback>,
) {
    while rx.changed().await.is_ok() {
        let line = progress_line(&rx.borrow_and_update());
        if let Some(pb) = progress_bar {
            pb.set_message(line.clone());
        }
        if let Some(callback) = progress_callback {
            callback(line);
        }
    }
}

/// One-line description of where a job stands.
pub fn progress_line(snapshot: &JobSnapshot) -> String {
    match snapshot.job.state {
        JobState::Idle => "Idle".to_string(),
        JobState::Starting => "Starting scrape job...".to_string(),
        JobState::Running => {
            let message = snapshot
                .progress
                .as_ref()
                .map(|p| p.message.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or("Scraping");
            format!(
                "{} | {} pages received | {:.1}s",
                message,
                snapshot.pages.len(),
                snapshot.job.elapsed_time
            )
        }
        JobState::Completed => format!("Completed | {} pages", snapshot.pages.len()),
        JobState::Errored => format!(
            "Failed: {}",
            snapshot.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

pub fn outcome_message(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Completed {
            processed_pages,
            total_time,
        } => format!(
            "Scrape complete! {} pages processed in {:.1}s",
            processed_pages, total_time
        ),
        JobOutcome::Errored { message } => format!("Scrape failed: {}", message),
        JobOutcome::Cancelled {
            user_initiated: true,
        } => "Scrape cancelled".to_string(),
        JobOutcome::Cancelled {
            user_initiated: false,
        } => "Scrape aborted".to_string(),
    }
}
