//! Merge jobs, cancellation and the worker-side context

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use crate::error::{MergeError, Result};
use crate::event::{MergeStatus, SaveAnswer, UiEvent};
use crate::scan::SourceFile;

/// Shared cooperative cancel flag for one run.
///
/// Set at most once, monotone false→true. Strategies observe it only at
/// coarse checkpoints (before each file and before each sheet); an in-flight
/// copy is always allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One merge run's unit of work.
#[derive(Debug)]
pub struct MergeJob {
    /// The source folder (used for the default save filename).
    pub folder: PathBuf,
    /// Ordered source workbooks, sorted case-insensitively by name.
    pub files: Vec<SourceFile>,
    /// The run's cancel flag.
    pub cancel: CancelToken,
}

impl MergeJob {
    pub fn new(folder: PathBuf, files: Vec<SourceFile>) -> Self {
        Self {
            folder,
            files,
            cancel: CancelToken::new(),
        }
    }
}

/// The worker's handle on the UI collaborator: event sink, save-answer
/// source and cancel flag, bundled so strategies take one argument.
pub struct MergeContext {
    events: Sender<UiEvent>,
    save_answers: Receiver<SaveAnswer>,
    cancel: CancelToken,
}

impl MergeContext {
    pub fn new(
        events: Sender<UiEvent>,
        save_answers: Receiver<SaveAnswer>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            events,
            save_answers,
            cancel,
        }
    }

    /// Append a line to the operator log. A hung-up UI is ignored here;
    /// it surfaces as `UiDisconnected` at the next save handshake.
    pub fn log(&self, msg: impl Into<String>) {
        let _ = self.events.send(UiEvent::Log(msg.into()));
    }

    /// Report per-file progress (1-indexed).
    pub fn progress(&self, current: usize, total: usize, filename: &str) {
        let _ = self.events.send(UiEvent::Progress {
            current,
            total,
            filename: filename.to_string(),
        });
    }

    /// Ask the UI collaborator for a save location and block until it
    /// answers. Returns `None` when the operator declines to save.
    pub fn request_save(&self, suggested_name: &str) -> Result<Option<PathBuf>> {
        self.events
            .send(UiEvent::SaveRequested {
                suggested_name: suggested_name.to_string(),
            })
            .map_err(|_| MergeError::UiDisconnected)?;

        match self.save_answers.recv() {
            Ok(SaveAnswer::Path(path)) => Ok(Some(path)),
            Ok(SaveAnswer::Abort) => Ok(None),
            Err(_) => Err(MergeError::UiDisconnected),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Emit the terminal event. Used by the orchestrator after the strategy
    /// returns; always the last event of a run.
    pub(crate) fn done(&self, status: MergeStatus) {
        let _ = self.events.send(UiEvent::Done(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_cancel_token_is_monotone() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        token.cancel(); // second set is a no-op
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_request_save_round_trip() {
        let (event_tx, event_rx) = mpsc::channel();
        let (answer_tx, answer_rx) = mpsc::channel();
        let ctx = MergeContext::new(event_tx, answer_rx, CancelToken::new());

        answer_tx
            .send(SaveAnswer::Path(PathBuf::from("/tmp/out.xlsx")))
            .unwrap();
        let got = ctx.request_save("merged.xlsx").unwrap();
        assert_eq!(got, Some(PathBuf::from("/tmp/out.xlsx")));

        match event_rx.try_recv().unwrap() {
            UiEvent::SaveRequested { suggested_name } => {
                assert_eq!(suggested_name, "merged.xlsx")
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_request_save_abort() {
        let (event_tx, _event_rx) = mpsc::channel();
        let (answer_tx, answer_rx) = mpsc::channel();
        let ctx = MergeContext::new(event_tx, answer_rx, CancelToken::new());

        answer_tx.send(SaveAnswer::Abort).unwrap();
        assert_eq!(ctx.request_save("merged.xlsx").unwrap(), None);
    }

    #[test]
    fn test_request_save_detects_hangup() {
        let (event_tx, _event_rx) = mpsc::channel();
        let (answer_tx, answer_rx) = mpsc::channel::<SaveAnswer>();
        let ctx = MergeContext::new(event_tx, answer_rx, CancelToken::new());

        drop(answer_tx);
        assert!(matches!(
            ctx.request_save("merged.xlsx"),
            Err(MergeError::UiDisconnected)
        ));
    }
}
