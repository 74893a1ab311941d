use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ServiceConfig, StreamEndPolicy};
use crate::decoder::StreamEventDecoder;
use crate::error::{Result, ScanError};
use crate::event::ScrapeEvent;
use crate::headers::find_header;
use crate::job::{JobOutcome, JobSnapshot, JobState, Progress, ScrapeJob, ScrapeRequest};
use crate::result::PageRecord;

/// Drives one scrape job at a time against the remote crawl service.
///
/// The controller is the only writer of its `JobSnapshot`; readers subscribe
/// to the watch channel or take clones. Share it behind an `Arc` when
/// `cancel` needs to be called from another task.
pub struct ScrapeJobController {
    client: Client,
    config: ServiceConfig,
    state: watch::Sender<JobSnapshot>,
    /// Generation and cancel token of the job currently being driven.
    active: Mutex<Option<(u64, CancellationToken)>>,
    cancel_user_initiated: AtomicBool,
}

impl ScrapeJobController {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: ServiceConfig) -> Self {
        let (state, _) = watch::channel(JobSnapshot::default());
        Self {
            client,
            config,
            state,
            active: Mutex::new(None),
            cancel_user_initiated: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.state.borrow().clone()
    }

    /// Pages received so far, in arrival order.
    pub fn pages(&self) -> Arc<Vec<PageRecord>> {
        self.state.borrow().pages.clone()
    }

    pub fn job_state(&self) -> JobState {
        self.state.borrow().job.state
    }

    pub fn job_id(&self) -> Option<String> {
        self.state.borrow().job.id.clone()
    }

    /// Start a job and drive its event stream to the end.
    ///
    /// Failures after the request is issued are reported through the
    /// returned outcome and the snapshot; only starting while another job is
    /// Starting or Running is an `Err`.
    pub async fn start(&self, request: &ScrapeRequest) -> Result<JobOutcome> {
        let mut guard = self.begin(JobState::Starting, None)?;
        info!(urls = ?request.urls(), "starting scrape job");

        let token = guard.token.clone();
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => {
                guard.disarm();
                return Ok(self.cancelled(guard.generation));
            }
            response = self.send_start(request) => response,
        };

        let outcome = match response {
            Ok(response) => {
                let job_id = find_header(response.headers(), &self.config.job_id_header);
                self.mark_running(guard.generation, job_id);
                let decoder =
                    StreamEventDecoder::new(response.bytes_stream().map_err(ScanError::from));
                self.drive(decoder, &token, guard.generation).await
            }
            Err(e) => {
                warn!(error = %e, "failed to start scrape job");
                self.fail(guard.generation, e.to_string())
            }
        };

        guard.disarm();
        Ok(outcome)
    }

    /// Drive a job from an already-open byte source, e.g. a recorded stream.
    pub async fn start_from_stream<S>(
        &self,
        job_id: Option<String>,
        byte_stream: S,
    ) -> Result<JobOutcome>
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        let mut guard = self.begin(JobState::Running, job_id.clone())?;
        self.mark_running(guard.generation, job_id);

        let token = guard.token.clone();
        let outcome = self
            .drive(StreamEventDecoder::new(byte_stream), &token, guard.generation)
            .await;

        guard.disarm();
        Ok(outcome)
    }

    /// Stop the current job.
    ///
    /// The local stream read stops immediately and the controller returns to
    /// Idle with progress cleared; pages received so far stay available. If
    /// the service gave us a job id a stop request is then sent, but its
    /// failure is only logged. The stop request runs on its own task, so
    /// dropping this future does not abort it.
    pub async fn cancel(&self, user_initiated: bool) {
        self.cancel_user_initiated
            .store(user_initiated, Ordering::SeqCst);

        let taken = self.lock_active().take();
        let job_id = match &taken {
            Some((_, token)) => {
                token.cancel();
                self.job_id()
            }
            None => None,
        };

        if user_initiated {
            info!(job_id = ?job_id, "scrape job cancelled by user");
        } else {
            debug!(job_id = ?job_id, "scrape job aborted");
        }

        self.state.send_if_modified(|snapshot| {
            if let Some((generation, _)) = &taken
                && snapshot.generation != *generation
            {
                return false;
            }
            reset_to_idle(snapshot);
            true
        });

        if let Some(job_id) = job_id
            && let Err(e) = self.spawn_stop(job_id).await
        {
            warn!(error = %e, "stop request task failed");
        }
    }

    /// Return a finished job to Idle, keeping its pages. Returns false when
    /// there was nothing to acknowledge.
    pub fn acknowledge(&self) -> bool {
        self.state.send_if_modified(|snapshot| {
            if !snapshot.job.state.is_terminal() {
                return false;
            }
            snapshot.job.state = JobState::Idle;
            snapshot.progress = None;
            snapshot.error = None;
            snapshot.warning = None;
            true
        })
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, initial: JobState, job_id: Option<String>) -> Result<ActiveJob<'_>> {
        let mut active = self.lock_active();
        if self.state.borrow().job.state.is_active() {
            return Err(ScanError::JobInProgress);
        }

        let token = CancellationToken::new();
        self.cancel_user_initiated.store(false, Ordering::SeqCst);

        let mut generation = 0;
        self.state.send_modify(|snapshot| {
            generation = snapshot.generation + 1;
            *snapshot = JobSnapshot {
                job: ScrapeJob {
                    id: job_id,
                    state: initial,
                    started_at: Some(Utc::now()),
                    ..ScrapeJob::default()
                },
                generation,
                ..JobSnapshot::default()
            };
        });
        *active = Some((generation, token.clone()));

        Ok(ActiveJob {
            controller: self,
            token,
            generation,
            armed: true,
        })
    }

    async fn send_start(&self, request: &ScrapeRequest) -> Result<Response> {
        let url = self.config.start_url()?;
        debug!(url = %url, "sending start request");

        let response = self.client.post(url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::ServiceError {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(response)
    }

    fn spawn_stop(&self, job_id: String) -> JoinHandle<()> {
        let client = self.client.clone();
        let url = self.config.stop_url(&job_id);
        let timeout = self.config.stop_timeout;

        tokio::spawn(async move {
            let url = match url {
                Ok(url) => url,
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "cannot build stop request");
                    return;
                }
            };

            match client.post(url).timeout(timeout).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(job_id = %job_id, "crawl service acknowledged stop");
                }
                Ok(response) => {
                    warn!(job_id = %job_id, status = %response.status(), "crawl service rejected stop request");
                }
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "stop request failed");
                }
            }
        })
    }

    fn mark_running(&self, generation: u64, job_id: Option<String>) {
        match &job_id {
            Some(id) => info!(job_id = %id, "scrape job running"),
            None => warn!(
                header = %self.config.job_id_header,
                "crawl service sent no job id, remote cancellation unavailable"
            ),
        }

        let header = self.config.job_id_header.clone();
        self.update_active(generation, move |snapshot| {
            if job_id.is_none() {
                snapshot.warning = Some(format!(
                    "No {} header in response; the job cannot be stopped on the server",
                    header
                ));
            }
            snapshot.job.id = job_id;
            snapshot.job.state = JobState::Running;
        });
    }

    async fn drive(
        &self,
        mut decoder: StreamEventDecoder,
        token: &CancellationToken,
        generation: u64,
    ) -> JobOutcome {
        loop {
            let item = tokio::select! {
                biased;
                _ = token.cancelled() => return self.cancelled(generation),
                item = decoder.next() => item,
            };

            match item {
                Some(Ok(event)) => {
                    if let Some(outcome) = self.apply(generation, event) {
                        return outcome;
                    }
                }
                Some(Err(e)) if e.is_recoverable() => {
                    warn!(error = %e, "skipping undecodable stream record");
                    self.update_active(generation, |snapshot| snapshot.decode_errors += 1);
                }
                Some(Err(e)) => {
                    if token.is_cancelled() {
                        return self.cancelled(generation);
                    }
                    warn!(error = %e, "scrape stream interrupted");
                    return self.fail(generation, format!("Stream interrupted: {}", e));
                }
                None => {
                    debug!(
                        without_terminal = decoder.ended_without_terminal(),
                        "scrape stream ended"
                    );
                    return self.stream_ended(generation);
                }
            }
        }
    }

    /// Apply one event. Returns the outcome once the job is over.
    fn apply(&self, generation: u64, event: ScrapeEvent) -> Option<JobOutcome> {
        match event {
            ScrapeEvent::Status { message } => {
                self.update_active(generation, |snapshot| {
                    let progress = snapshot.progress.get_or_insert_with(Progress::default);
                    progress.message = message;
                });
                None
            }
            ScrapeEvent::Progress {
                message,
                processed_pages,
                elapsed_time,
            } => {
                self.update_active(generation, |snapshot| {
                    snapshot.progress = Some(Progress {
                        message,
                        processed_pages,
                        elapsed_time,
                    });
                    snapshot.job.processed_page_count = processed_pages;
                    snapshot.job.elapsed_time = elapsed_time;
                });
                None
            }
            ScrapeEvent::Data { page } => {
                self.state.send_if_modified(|snapshot| {
                    if snapshot.generation != generation {
                        return false;
                    }
                    Arc::make_mut(&mut snapshot.pages).push(page);
                    true
                });
                None
            }
            ScrapeEvent::Completion {
                processed_pages,
                total_time,
            } => Some(self.complete(generation, processed_pages, total_time)),
            ScrapeEvent::Error { message } => {
                warn!(error = %message, "crawl service reported an error");
                Some(self.fail(generation, message))
            }
        }
    }

    fn complete(&self, generation: u64, processed_pages: u64, total_time: f64) -> JobOutcome {
        let applied = self.update_active(generation, |snapshot| {
            let progress = snapshot.progress.get_or_insert_with(Progress::default);
            progress.processed_pages = processed_pages;
            progress.elapsed_time = total_time;
            snapshot.job.processed_page_count = processed_pages;
            snapshot.job.elapsed_time = total_time;
            snapshot.job.state = JobState::Completed;
        });
        if !applied {
            return self.cancelled_outcome();
        }

        info!(processed_pages, total_time, "scrape job completed");
        JobOutcome::Completed {
            processed_pages,
            total_time,
        }
    }

    fn fail(&self, generation: u64, message: String) -> JobOutcome {
        let mut surfaced = message.clone();
        let applied = self.update_active(generation, |snapshot| {
            snapshot.job.state = JobState::Errored;
            match &snapshot.error {
                Some(existing) => surfaced = existing.clone(),
                None => snapshot.error = Some(message),
            }
        });
        if !applied {
            return self.cancelled_outcome();
        }

        info!(error = %surfaced, "scrape job failed");
        JobOutcome::Errored { message: surfaced }
    }

    fn stream_ended(&self, generation: u64) -> JobOutcome {
        match self.config.end_policy {
            StreamEndPolicy::Error => self.fail(
                generation,
                "Stream ended without a completion event".to_string(),
            ),
            StreamEndPolicy::Complete => {
                let snapshot = self.state.borrow().clone();
                let processed = snapshot
                    .progress
                    .as_ref()
                    .map(|p| p.processed_pages)
                    .unwrap_or(0)
                    .max(snapshot.pages.len() as u64);
                let elapsed = snapshot
                    .job
                    .started_at
                    .map(|started| (Utc::now() - started).num_milliseconds() as f64 / 1000.0)
                    .unwrap_or(0.0)
                    .max(snapshot.job.elapsed_time);
                self.complete(generation, processed, elapsed)
            }
        }
    }

    /// The job's token fired: make sure the job no longer reads as active.
    fn cancelled(&self, generation: u64) -> JobOutcome {
        self.state.send_if_modified(|snapshot| {
            if snapshot.generation != generation || !snapshot.job.state.is_active() {
                return false;
            }
            reset_to_idle(snapshot);
            true
        });
        self.cancelled_outcome()
    }

    fn cancelled_outcome(&self) -> JobOutcome {
        JobOutcome::Cancelled {
            user_initiated: self.cancel_user_initiated.load(Ordering::SeqCst),
        }
    }

    /// Mutate the snapshot only while this generation's job is still active.
    fn update_active(&self, generation: u64, f: impl FnOnce(&mut JobSnapshot)) -> bool {
        self.state.send_if_modified(|snapshot| {
            if snapshot.generation != generation || !snapshot.job.state.is_active() {
                return false;
            }
            f(snapshot);
            true
        })
    }
}

/// Idle with progress and messages cleared; pages are kept.
fn reset_to_idle(snapshot: &mut JobSnapshot) {
    snapshot.job = ScrapeJob::default();
    snapshot.progress = None;
    snapshot.error = None;
    snapshot.warning = None;
}

/// Registration of the running job. Dropping it without `disarm` (the start
/// future was dropped mid-flight) aborts the job and returns to Idle.
struct ActiveJob<'a> {
    controller: &'a ScrapeJobController,
    token: CancellationToken,
    generation: u64,
    armed: bool,
}

impl ActiveJob<'_> {
    fn disarm(&mut self) {
        self.armed = false;
        self.release();
    }

    fn release(&self) {
        let mut active = self.controller.lock_active();
        if active
            .as_ref()
            .is_some_and(|(generation, _)| *generation == self.generation)
        {
            *active = None;
        }
    }
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        self.token.cancel();
        self.release();
        let generation = self.generation;
        self.controller.state.send_if_modified(|snapshot| {
            if snapshot.generation != generation || !snapshot.job.state.is_active() {
                return false;
            }
            debug!("scrape job dropped while active");
            reset_to_idle(snapshot);
            true
        });
    }
}
