use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::segments::domain::segment::RawSegment;
use crate::transcription::domain::transcription_service::{
    JobId, JobStatus, TranscriptionService,
};

/// Terminal result of a polled transcription job.
#[derive(Debug, Clone, PartialEq)]
pub enum PollMessage {
    Completed(Vec<RawSegment>),
    Failed(String),
}

/// Owner handle of a running poll. Dropping it cancels the poll.
pub struct PollHandle {
    job: JobId,
    rx: Receiver<PollMessage>,
    cancelled: Arc<AtomicBool>,
}

impl PollHandle {
    pub fn job(&self) -> &JobId {
        &self.job
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Non-blocking check for the terminal message.
    pub fn try_result(&self) -> Option<PollMessage> {
        self.rx.try_recv().ok()
    }

    /// Blocks up to `timeout` for the terminal message.
    pub fn wait(&self, timeout: Duration) -> Option<PollMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a background poller for `job`.
///
/// The worker asks the service for the job status every `interval` until the
/// job is ready or failed, or until the handle is cancelled. A transport
/// error ends the poll as a failure.
pub fn spawn(
    service: Arc<dyn TranscriptionService>,
    job: JobId,
    interval: Duration,
) -> PollHandle {
    let (tx, rx) = crossbeam_channel::bounded::<PollMessage>(1);
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();
    let worker_job = job.clone();

    thread::spawn(move || loop {
        if cancelled_clone.load(Ordering::Relaxed) {
            log::info!("Polling for job {worker_job} cancelled");
            return;
        }
        let message = match service.poll(&worker_job) {
            Ok(JobStatus::Pending) => {
                thread::sleep(interval);
                continue;
            }
            Ok(JobStatus::Ready(segments)) => PollMessage::Completed(segments),
            Ok(JobStatus::Failed) => PollMessage::Failed(format!("job {worker_job} failed")),
            Err(e) => PollMessage::Failed(e.to_string()),
        };
        if !cancelled_clone.load(Ordering::Relaxed) {
            let _ = tx.send(message);
        }
        return;
    });

    PollHandle { job, rx, cancelled }
}
