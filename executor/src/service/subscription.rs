use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::ExecutionServiceError;
use crate::core::client::queue::{JobQueue, QueueError};
use crate::types::jobs::{Job, JobEvent, JobStatus, JobStreamEvent, ListenerId};

pub type SubscriptionItem = Result<JobStreamEvent, ExecutionServiceError>;

/// Live events of one job. Yields progress updates, then exactly one terminal item: the
/// receipt of a completed job or the failure reason of a failed one.
///
/// Events come from the queue listener. Queue events only reach listeners of the process that
/// runs the job, so the job is also re-read every `refresh` period and any progress or
/// settlement the listener missed is yielded from the stored record. Progress values are
/// yielded in increasing order without repeats.
///
/// The queue listener is removed when the terminal item is yielded or when the subscription is
/// dropped.
pub struct JobSubscription {
    job_id: String,
    queue: Arc<dyn JobQueue>,
    listener: Option<ListenerId>,
    receiver: mpsc::UnboundedReceiver<JobEvent>,
    listener_closed: bool,
    refresh: Interval,
    pending_fetch: Option<BoxFuture<'static, Result<Job, QueueError>>>,
    progress: u8,
    settled: Option<SubscriptionItem>,
    finished: bool,
}

impl fmt::Debug for JobSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSubscription")
            .field("job_id", &self.job_id)
            .field("listener", &self.listener)
            .field("progress", &self.progress)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

fn terminal_item(job: &Job) -> Option<SubscriptionItem> {
    match job.status {
        JobStatus::Completed => Some(
            job.return_value
                .clone()
                .map(JobStreamEvent::Completed)
                .ok_or_else(|| ExecutionServiceError::MissingResult(job.id.clone())),
        ),
        JobStatus::Failed => {
            Some(Err(ExecutionServiceError::JobFailed(job.failed_reason.clone().unwrap_or_default())))
        }
        _ => None,
    }
}

impl JobSubscription {
    pub async fn open(queue: Arc<dyn JobQueue>, job_id: &str, refresh: Duration) -> Result<Self, QueueError> {
        queue.fetch_by_id(job_id).await?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let watched = job_id.to_string();
        let listener = queue.on_event(Box::new(move |event: &JobEvent| {
            if event.job_id() == watched {
                let _ = sender.send(event.clone());
            }
        }));

        let mut refresh = interval_at(Instant::now() + refresh, refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut subscription = Self {
            job_id: job_id.to_string(),
            queue: queue.clone(),
            listener: Some(listener),
            receiver,
            listener_closed: false,
            refresh,
            pending_fetch: None,
            progress: 0,
            settled: None,
            finished: false,
        };

        // the job may have settled before the listener was registered
        let job = queue.fetch_by_id(job_id).await?;
        subscription.progress = job.progress;
        subscription.settled = terminal_item(&job);
        if subscription.settled.is_some() {
            subscription.release();
        }

        debug!(job_id = %job_id, "Subscribed to job events");
        Ok(subscription)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    fn release(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.queue.remove_listener(listener);
            self.receiver.close();
        }
    }

    fn finish(&mut self, item: SubscriptionItem) -> Poll<Option<SubscriptionItem>> {
        self.finished = true;
        self.pending_fetch = None;
        self.release();
        Poll::Ready(Some(item))
    }

    /// Progress that was not yielded yet, stale values are dropped.
    fn advance(&mut self, progress: u8) -> Option<SubscriptionItem> {
        if progress > self.progress {
            self.progress = progress;
            Some(Ok(JobStreamEvent::Progress(progress)))
        } else {
            None
        }
    }

    fn poll_listener(&mut self, cx: &mut Context<'_>) -> Poll<Option<SubscriptionItem>> {
        while !self.listener_closed {
            match self.receiver.poll_recv(cx) {
                Poll::Ready(Some(JobEvent::Progress { progress, .. })) => {
                    if let Some(item) = self.advance(progress) {
                        return Poll::Ready(Some(item));
                    }
                }
                Poll::Ready(Some(JobEvent::Completed { result, .. })) => {
                    return self.finish(Ok(JobStreamEvent::Completed(result)));
                }
                Poll::Ready(Some(JobEvent::Failed { reason, .. })) => {
                    return self.finish(Err(ExecutionServiceError::JobFailed(reason)));
                }
                Poll::Ready(None) => self.listener_closed = true,
                Poll::Pending => break,
            }
        }
        Poll::Pending
    }

    fn poll_refresh(&mut self, cx: &mut Context<'_>) -> Poll<Option<SubscriptionItem>> {
        loop {
            if let Some(fetch) = self.pending_fetch.as_mut() {
                let result = match fetch.as_mut().poll(cx) {
                    Poll::Ready(result) => result,
                    Poll::Pending => return Poll::Pending,
                };
                self.pending_fetch = None;

                match result {
                    Ok(job) => {
                        if let Some(item) = terminal_item(&job) {
                            debug!(job_id = %self.job_id, status = %job.status, "Job settled outside of this process");
                            return self.finish(item);
                        }
                        if let Some(item) = self.advance(job.progress) {
                            return Poll::Ready(Some(item));
                        }
                    }
                    Err(e) => warn!(job_id = %self.job_id, error = %e, "Failed to refresh the subscribed job"),
                }
            }

            match self.refresh.poll_tick(cx) {
                Poll::Ready(_) => {
                    let queue = self.queue.clone();
                    let job_id = self.job_id.clone();
                    self.pending_fetch = Some(Box::pin(async move { queue.fetch_by_id(&job_id).await }));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Stream for JobSubscription {
    type Item = SubscriptionItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if let Some(item) = this.settled.take() {
            return this.finish(item);
        }

        if let Poll::Ready(item) = this.poll_listener(cx) {
            return Poll::Ready(item);
        }
        this.poll_refresh(cx)
    }
}

impl Drop for JobSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
