//! Prelude module - common imports for sheetstack users
//!
//! ```rust
//! use sheetstack::prelude::*;
//! ```

pub use crate::{
    CancelToken,
    MergeError,
    MergeJob,
    MergeStatus,
    MergeStrategy,
    Orchestrator,
    SaveAnswer,
    SourceFile,
    UiEvent,
};
