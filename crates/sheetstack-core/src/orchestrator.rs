//! Merge orchestrator
//!
//! Owns the background worker thread for the active run. The orchestrator
//! enforces the two entry-point rules (no concurrent runs, no empty file
//! lists), hands the job to the chosen [`MergeStrategy`], and turns the
//! strategy's outcome into the run's terminal [`Done`](crate::UiEvent::Done)
//! event. Strategy selection itself happens upstream, once, at run start.

use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::error::{MergeError, Result};
use crate::event::{MergeStatus, SaveAnswer, UiEvent};
use crate::job::{CancelToken, MergeContext, MergeJob};

/// One of the two automation-driving strategies (Excel COM bridge or
/// external script). A strategy runs the whole merge for one job and
/// reports how it ended; per-item failures are its own business and must
/// not escape as errors.
pub trait MergeStrategy: Send {
    fn run(&mut self, job: &MergeJob, ctx: &MergeContext) -> Result<MergeStatus>;
}

/// Drives at most one merge run at a time on a background worker thread.
pub struct Orchestrator {
    worker: Option<thread::JoinHandle<()>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self { worker: None }
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start a merge run on a background thread.
    ///
    /// Returns the run's [`CancelToken`] so the UI side can request
    /// cooperative cancellation. Fails with [`MergeError::AlreadyRunning`]
    /// if a run is active and [`MergeError::NoFiles`] on an empty job.
    pub fn start(
        &mut self,
        job: MergeJob,
        mut strategy: Box<dyn MergeStrategy>,
        events: Sender<UiEvent>,
        save_answers: Receiver<SaveAnswer>,
    ) -> Result<CancelToken> {
        if self.is_running() {
            return Err(MergeError::AlreadyRunning);
        }
        if job.files.is_empty() {
            return Err(MergeError::NoFiles);
        }

        let cancel = job.cancel.clone();
        let ctx = MergeContext::new(events, save_answers, cancel.clone());

        let handle = thread::Builder::new()
            .name("merge-worker".into())
            .spawn(move || {
                let status = match strategy.run(&job, &ctx) {
                    Ok(status) => status,
                    Err(e) => {
                        tracing::error!("merge run failed: {e}");
                        ctx.log(format!("[ERROR] {e}"));
                        MergeStatus::Error
                    }
                };
                ctx.done(status);
            })?;

        self.worker = Some(handle);
        Ok(cancel)
    }

    /// Block until the active run (if any) finishes.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.join();
    }
}
