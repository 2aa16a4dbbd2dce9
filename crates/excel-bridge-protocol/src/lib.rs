//! Shared protocol types for communication between the native client and
//! the Windows COM bridge process (run under WINE on Linux, or natively on
//! Windows).
//!
//! The protocol is JSON-over-stdio: one JSON object per line in each
//! direction. The command surface is merge-oriented: workbook lifecycle,
//! whole-sheet copy/rename/delete, and per-setting application options.

use serde::{Deserialize, Serialize};

/// A command sent from the client to the bridge process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Monotonically increasing request ID for correlating responses.
    pub id: u64,
    /// The command to execute.
    #[serde(flatten)]
    pub command: Command,
}

/// Commands the client can send to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum Command {
    /// Initialize COM and create the Excel.Application instance.
    Init,

    /// Apply one application setting (visibility, alerts, calculation...).
    /// Each option is individually fallible; the client treats failures as
    /// non-fatal.
    SetOption { option: AppOption },

    /// Create a new empty workbook. Returns a workbook handle.
    CreateWorkbook,

    /// Open an existing workbook read-only, without updating links and
    /// without adding it to the recent-files list (Windows path).
    OpenWorkbookReadOnly { path: String },

    /// List the worksheet names of a workbook, in tab order.
    SheetNames { workbook: u64 },

    /// Copy one worksheet (0-based index) of `source` to the end of
    /// `target`. Returns the host-assigned name of the new copy.
    CopySheet {
        source: u64,
        sheet: u32,
        target: u64,
    },

    /// Rename a worksheet, addressed by its current name.
    RenameSheet {
        workbook: u64,
        sheet: String,
        name: String,
    },

    /// Delete a worksheet by name. The bridge refuses to delete the last
    /// remaining sheet (a workbook must always have one).
    DeleteSheet { workbook: u64, sheet: String },

    /// Save the workbook with an explicit XlFileFormat code (Windows path).
    SaveWorkbookAs {
        workbook: u64,
        path: String,
        format: i32,
    },

    /// Close a workbook without saving.
    CloseWorkbook { workbook: u64 },

    /// Shut down the bridge: close all workbooks, quit Excel, uninitialize
    /// COM.
    Shutdown,
}

/// One Excel application setting, applied via `SetOption`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "option", content = "value")]
pub enum AppOption {
    Visible(bool),
    DisplayAlerts(bool),
    ScreenUpdating(bool),
    EnableEvents(bool),
    /// msoAutomationSecurityForceDisable: never auto-run macros.
    MacroSecurityForceDisable,
    /// xlCalculationManual: no recalculation during the merge.
    ManualCalculation,
}

/// A response sent from the bridge back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The request ID this response corresponds to.
    pub id: u64,
    /// The result of the command.
    #[serde(flatten)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ResponseResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Data returned in successful responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Handle to a newly created/opened workbook.
    WorkbookHandle { workbook: u64 },
    /// Worksheet names in tab order.
    SheetNames { names: Vec<String> },
    /// A single worksheet name (e.g. the host-assigned name of a copy).
    SheetName { name: String },
}
