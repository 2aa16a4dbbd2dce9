//! The narrow automation surface the merge driver is written against.
//!
//! The driver never talks to [`ExcelBridge`] directly; it sees only this
//! trait, so the merge algorithm can be exercised against an in-memory
//! fake and stays independent of the bridge wire format.

use std::path::Path;

use excel_bridge_protocol::AppOption;

use crate::bridge::{BridgeError, ExcelBridge};

/// Remote control of a spreadsheet application, reduced to the operations
/// a merge run needs. Workbooks are addressed by opaque handles.
pub trait Automation {
    /// Apply one application setting. Individually fallible; callers treat
    /// failures as non-fatal.
    fn set_option(&mut self, option: AppOption) -> Result<(), BridgeError>;

    /// Create a new empty workbook (with the host's placeholder sheets).
    fn create_workbook(&mut self) -> Result<u64, BridgeError>;

    /// Open a workbook read-only, without updating links or touching the
    /// recent-files list.
    fn open_read_only(&mut self, path: &Path) -> Result<u64, BridgeError>;

    /// Worksheet names of a workbook, in tab order.
    fn sheet_names(&mut self, workbook: u64) -> Result<Vec<String>, BridgeError>;

    /// Copy one worksheet (0-based) of `source` to the end of `target`;
    /// returns the host-assigned name of the copy.
    fn copy_sheet(&mut self, source: u64, sheet: u32, target: u64) -> Result<String, BridgeError>;

    /// Rename a worksheet addressed by its current name. The host raises an
    /// error on a name collision.
    fn rename_sheet(&mut self, workbook: u64, sheet: &str, name: &str)
        -> Result<(), BridgeError>;

    /// Delete a worksheet by name.
    fn delete_sheet(&mut self, workbook: u64, sheet: &str) -> Result<(), BridgeError>;

    /// Save a workbook with an explicit file-format code.
    fn save_as(&mut self, workbook: u64, path: &Path, format: i32) -> Result<(), BridgeError>;

    /// Close a workbook without saving.
    fn close(&mut self, workbook: u64) -> Result<(), BridgeError>;

    /// Release the application handle. Always attempted, even after errors.
    fn quit(&mut self) -> Result<(), BridgeError>;
}

impl Automation for ExcelBridge {
    fn set_option(&mut self, option: AppOption) -> Result<(), BridgeError> {
        ExcelBridge::set_option(self, option)
    }

    fn create_workbook(&mut self) -> Result<u64, BridgeError> {
        ExcelBridge::create_workbook(self)
    }

    fn open_read_only(&mut self, path: &Path) -> Result<u64, BridgeError> {
        self.open_workbook_read_only(path)
    }

    fn sheet_names(&mut self, workbook: u64) -> Result<Vec<String>, BridgeError> {
        ExcelBridge::sheet_names(self, workbook)
    }

    fn copy_sheet(&mut self, source: u64, sheet: u32, target: u64) -> Result<String, BridgeError> {
        ExcelBridge::copy_sheet(self, source, sheet, target)
    }

    fn rename_sheet(
        &mut self,
        workbook: u64,
        sheet: &str,
        name: &str,
    ) -> Result<(), BridgeError> {
        ExcelBridge::rename_sheet(self, workbook, sheet, name)
    }

    fn delete_sheet(&mut self, workbook: u64, sheet: &str) -> Result<(), BridgeError> {
        ExcelBridge::delete_sheet(self, workbook, sheet)
    }

    fn save_as(&mut self, workbook: u64, path: &Path, format: i32) -> Result<(), BridgeError> {
        self.save_workbook_as(workbook, path, format)
    }

    fn close(&mut self, workbook: u64) -> Result<(), BridgeError> {
        self.close_workbook(workbook)
    }

    fn quit(&mut self) -> Result<(), BridgeError> {
        ExcelBridge::quit(self)
    }
}
