//! # sheetstack-core
//!
//! The merge orchestration core: everything needed to drive one merge run
//! except the automation strategies themselves.
//!
//! A run takes an ordered list of source workbooks, copies every worksheet
//! into a growing destination workbook under collision-free names, then
//! negotiates a save location with the UI collaborator over a two-way
//! channel pair. The actual copying is delegated to a [`MergeStrategy`]
//! (Excel COM bridge or external script); this crate owns the pieces both
//! strategies share:
//!
//! - [`naming`] — sheet name sanitization, truncation and de-duplication
//! - [`scan`] — folder enumeration into [`SourceFile`] lists
//! - [`event`] — the typed worker→UI message protocol
//! - [`job`] — the run's unit of work, cancel token and worker context
//! - [`orchestrator`] — worker thread lifecycle and single-run enforcement
//! - [`format`] — save format codes and the default output filename

pub mod error;
pub mod event;
pub mod format;
pub mod job;
pub mod naming;
pub mod orchestrator;
pub mod scan;

pub use error::{MergeError, Result};
pub use event::{MergeStatus, SaveAnswer, UiEvent};
pub use job::{CancelToken, MergeContext, MergeJob};
pub use orchestrator::{MergeStrategy, Orchestrator};
pub use scan::SourceFile;
