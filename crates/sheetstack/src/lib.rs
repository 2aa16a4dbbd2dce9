//! # sheetstack
//!
//! Merges the worksheets of every workbook in a folder into one destination
//! workbook, each sheet under a collision-free name, then negotiates a save
//! location with the caller.
//!
//! The heavy lifting runs on a background worker that drives one of two
//! strategies: Excel COM automation through the out-of-process bridge
//! (primary), or the external PowerShell merge script (fallback, selected
//! when the bridge executable is absent). The caller sees a uniform event
//! stream either way.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::mpsc;
//! use sheetstack::prelude::*;
//!
//! # fn main() -> sheetstack::Result<()> {
//! let folder = Path::new("/data/reports");
//! let files = sheetstack::scan_folder(folder)?;
//! let job = MergeJob::new(folder.to_path_buf(), files);
//!
//! let (event_tx, event_rx) = mpsc::channel();
//! let (answer_tx, answer_rx) = mpsc::channel();
//!
//! let mut orchestrator = Orchestrator::new();
//! let cancel = orchestrator.start(job, sheetstack::select_strategy(), event_tx, answer_rx)?;
//!
//! for event in event_rx {
//!     match event {
//!         UiEvent::SaveRequested { suggested_name } => {
//!             answer_tx
//!                 .send(SaveAnswer::Path(folder.join(suggested_name)))
//!                 .unwrap();
//!         }
//!         UiEvent::Done(status) => {
//!             println!("finished: {status:?}");
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! # let _ = cancel;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub use sheetstack_core::{
    format, naming, CancelToken, MergeContext, MergeError, MergeJob, MergeStatus, MergeStrategy,
    Orchestrator, Result, SaveAnswer, SourceFile, UiEvent,
};
pub use sheetstack_excel_com::{bridge_available, ExcelBridgeConfig, ExcelComStrategy};
pub use sheetstack_script::{ScriptConfig, ScriptStrategy};

use sheetstack_core::scan;
use std::io;
use std::path::Path;

/// Scan `folder` for source workbooks (see [`sheetstack_core::scan`]).
pub fn scan_folder(folder: &Path) -> io::Result<Vec<SourceFile>> {
    scan::scan_folder(folder)
}

/// Pick the merge strategy for a run: the COM bridge when its executable
/// can be located, otherwise the external script. The probe runs once, at
/// run start; absence of the bridge is a strategy switch, not an error.
pub fn select_strategy() -> Box<dyn MergeStrategy> {
    select_strategy_with(ExcelBridgeConfig::default(), ScriptConfig::default())
}

/// [`select_strategy`] with explicit configurations.
pub fn select_strategy_with(
    bridge: ExcelBridgeConfig,
    script: ScriptConfig,
) -> Box<dyn MergeStrategy> {
    if bridge_available(&bridge) {
        tracing::debug!("COM bridge available; using the primary strategy");
        Box::new(ExcelComStrategy::new(bridge))
    } else {
        tracing::debug!("COM bridge unavailable; falling back to the merge script");
        Box::new(ScriptStrategy::new(script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_bridge_selects_script_fallback() {
        let bridge = ExcelBridgeConfig {
            bridge_exe_path: Some(PathBuf::from("/nonexistent/excel-com-bridge.exe")),
            ..Default::default()
        };
        assert!(!bridge_available(&bridge));
        // Selection itself must not error; the missing capability only
        // switches strategies.
        let _strategy = select_strategy_with(bridge, ScriptConfig::default());
    }
}
