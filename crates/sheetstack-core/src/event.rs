//! Worker→UI event protocol
//!
//! The worker thread talks to the UI collaborator exclusively through these
//! typed messages on an mpsc channel; the one message flowing the other way
//! is [`SaveAnswer`]. Events are delivered in emission order, and at most
//! one `SaveRequested` is ever outstanding.

use std::path::PathBuf;

/// Terminal status of a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// All files processed and the destination saved.
    Saved,
    /// All files processed but the operator declined to pick a save path.
    NoSave,
    /// The run observed the cancel flag and stopped cooperatively.
    Cancelled,
    /// An unrecovered failure aborted the run.
    Error,
}

/// A message from the merge worker to the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A line for the scrolling operator log.
    Log(String),
    /// Per-file progress, 1-indexed, monotonically non-decreasing.
    Progress {
        current: usize,
        total: usize,
        filename: String,
    },
    /// The worker is blocked waiting for a save location.
    SaveRequested { suggested_name: String },
    /// The run reached a terminal state; always the last event of a run.
    Done(MergeStatus),
}

/// The UI collaborator's reply to a `SaveRequested` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAnswer {
    /// An absolute destination path; the collaborator has already defaulted
    /// the extension and verified the parent directory exists.
    Path(PathBuf),
    /// The operator declined to save.
    Abort,
}
