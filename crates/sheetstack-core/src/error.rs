//! Error types for merge runs

use std::path::PathBuf;

use thiserror::Error;

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors that can occur while orchestrating a merge run.
///
/// Per-item failures (one unopenable workbook, one uncopyable sheet) are
/// handled inside the strategies as logged warnings and never surface here;
/// these variants are the fatal conditions that abort a run.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A merge run is already active; only one may run at a time.
    #[error("a merge run is already in progress")]
    AlreadyRunning,

    /// The job's file list is empty; starting is a no-op.
    #[error("no spreadsheet files to merge")]
    NoFiles,

    /// The `_2.._9999` suffix probe found no free sheet name.
    #[error("could not find a unique sheet name for '{0}' after 9999 attempts")]
    NameSpaceExhausted(String),

    /// The automation handle could not be acquired or failed irrecoverably.
    #[error("automation error: {0}")]
    Automation(String),

    /// The external merge script required by the fallback strategy is missing.
    #[error("merge script not found: {}", .0.display())]
    ScriptMissing(PathBuf),

    /// The fallback strategy was configured with an empty launcher command.
    #[error("script launcher command is empty")]
    ScriptLauncherEmpty,

    /// The fallback process exited with an undocumented status code.
    #[error("merge script exited with unexpected status {0}")]
    ScriptFailed(i32),

    /// The UI collaborator hung up the event or save-answer channel.
    #[error("UI channel disconnected")]
    UiDisconnected,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
