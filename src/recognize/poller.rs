use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{PipelineError, Result};
use crate::progress::ProgressSink;
use crate::recognize::aggregate::{aggregate, TranscriptionResult};
use crate::recognize::operation::{Outcome, RecognitionRequest, RecognitionService};

/// Submits a recognition job and waits for it, reporting progress on the
/// calling thread.
///
/// The completion callback hands its outcome over a single-slot channel, so
/// the result is fully written before the poll loop can observe completion.
/// By default the loop waits forever; `with_timeout` and `with_cancel_flag`
/// add optional exits.
pub struct OperationPoller<'a> {
    service: &'a dyn RecognitionService,
    poll_interval: Duration,
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> OperationPoller<'a> {
    pub fn new(service: &'a dyn RecognitionService, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
            timeout: None,
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    pub fn run(
        &self,
        request: &RecognitionRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<TranscriptionResult> {
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let mut operation = self.service.submit(request)?;
        tracing::info!(
            "Processing \"{}\" ({} operation {})...",
            request.uri,
            self.service.name(),
            operation.name()
        );

        let (done_tx, done_rx) = mpsc::sync_channel::<Outcome>(1);
        operation.on_complete(Box::new(move |outcome| {
            // The poller may already have given up; nobody left to tell.
            let _ = done_tx.send(outcome);
        }));

        let started = Instant::now();
        let mut shown: Option<u8> = None;

        let outcome = loop {
            let current = operation.progress();

            match done_rx.recv_timeout(self.poll_interval) {
                Ok(outcome) => break outcome,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    operation.abandon();
                    return Err(PipelineError::RecognitionService(format!(
                        "operation {} ended without reporting a result",
                        operation.name()
                    )));
                }
            }

            // Unknown progress is skipped, not shown as zero.
            if let Some(percent) = current {
                let percent = percent.min(100).max(shown.unwrap_or(0));
                shown = Some(percent);
                progress.update(percent);
            }

            if self.is_cancelled() {
                tracing::warn!("Cancelled while waiting for operation {}", operation.name());
                operation.abandon();
                return Err(PipelineError::Cancelled);
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    operation.abandon();
                    return Err(PipelineError::Timeout(limit));
                }
            }
        };

        progress.update(100);
        tracing::debug!(
            "Operation {} finished after {:.1}s",
            operation.name(),
            started.elapsed().as_secs_f64()
        );

        let fragments = outcome.map_err(|failure| {
            tracing::error!("Operation {} failed: {}", operation.name(), failure);
            PipelineError::RecognitionService(failure.to_string())
        })?;
        aggregate(&fragments)
    }
}
