//! Subprocess management and JSON IPC for the WINE bridge process.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use excel_bridge_protocol::{
    AppOption, Command as BridgeCommand, Request, Response, ResponseData, ResponseResult,
};
use sheetstack_core::MergeError;

/// Errors from the Excel COM bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to spawn WINE bridge process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Bridge process not running")]
    NotRunning,

    #[error("Failed to send command to bridge: {0}")]
    SendFailed(String),

    #[error("Failed to read response from bridge: {0}")]
    ReadFailed(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Bridge returned error: {0}")]
    BridgeError(String),

    #[error("Unexpected response data")]
    UnexpectedResponse,

    #[error("WINE not found. Install WINE and ensure 'wine' is in PATH.")]
    WineNotFound,

    #[error("Bridge executable not found at: {0}")]
    BridgeExeNotFound(String),
}

impl From<BridgeError> for MergeError {
    fn from(e: BridgeError) -> Self {
        MergeError::Automation(e.to_string())
    }
}

/// Configuration for the Excel COM bridge.
#[derive(Debug, Clone)]
pub struct ExcelBridgeConfig {
    /// Path to the `excel-com-bridge.exe` Windows executable.
    /// If None, will search in common locations relative to the current binary.
    pub bridge_exe_path: Option<PathBuf>,

    /// Path to the WINE executable. Defaults to "wine".
    pub wine_path: PathBuf,

    /// Optional WINEPREFIX to use (for isolating the WINE environment).
    pub wine_prefix: Option<PathBuf>,
}

impl Default for ExcelBridgeConfig {
    fn default() -> Self {
        Self {
            bridge_exe_path: None,
            wine_path: PathBuf::from("wine"),
            wine_prefix: None,
        }
    }
}

/// The availability probe for the primary strategy: can the bridge
/// executable be located at all? Absence is not an error, only a signal to
/// fall back to the script strategy.
pub fn bridge_available(config: &ExcelBridgeConfig) -> bool {
    config
        .bridge_exe_path
        .clone()
        .unwrap_or_else(find_bridge_exe)
        .exists()
}

/// The main handle for communicating with the Excel COM bridge.
///
/// This manages the WINE subprocess lifecycle and provides methods
/// for the automation operations the merge driver needs.
pub struct ExcelBridge {
    child: Mutex<Child>,
    stdin: Mutex<std::process::ChildStdin>,
    stdout: Mutex<BufReader<std::process::ChildStdout>>,
    next_id: AtomicU64,
}

impl ExcelBridge {
    /// Start the bridge process and initialize Excel.
    pub fn start(config: ExcelBridgeConfig) -> Result<Self, BridgeError> {
        let exe_path = config.bridge_exe_path.unwrap_or_else(find_bridge_exe);

        if !exe_path.exists() {
            return Err(BridgeError::BridgeExeNotFound(
                exe_path.display().to_string(),
            ));
        }

        let mut cmd = std::process::Command::new(&config.wine_path);

        if let Some(prefix) = &config.wine_prefix {
            cmd.env("WINEPREFIX", prefix);
        }

        cmd.arg(&exe_path);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit()); // Bridge diagnostics go to our stderr

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::WineNotFound
            } else {
                BridgeError::SpawnFailed(e)
            }
        })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");

        let bridge = Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicU64::new(1),
        };

        // Initialize COM and Excel
        bridge.send_command(BridgeCommand::Init)?;

        Ok(bridge)
    }

    /// Send a command to the bridge and wait for the response.
    fn send_command(&self, command: BridgeCommand) -> Result<Option<ResponseData>, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let request = Request { id, command };
        let json = serde_json::to_string(&request)?;

        // Send the request
        {
            let mut stdin = self.stdin.lock().unwrap();
            writeln!(stdin, "{json}").map_err(|e| BridgeError::SendFailed(e.to_string()))?;
            stdin
                .flush()
                .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        }

        // Read the response
        let response: Response = {
            let mut stdout = self.stdout.lock().unwrap();
            let mut line = String::new();
            stdout
                .read_line(&mut line)
                .map_err(|e| BridgeError::ReadFailed(e.to_string()))?;

            if line.is_empty() {
                return Err(BridgeError::NotRunning);
            }

            serde_json::from_str(&line)?
        };

        match response.result {
            ResponseResult::Ok { data } => Ok(data),
            ResponseResult::Error { message } => Err(BridgeError::BridgeError(message)),
        }
    }

    /// Apply one Excel application setting.
    pub fn set_option(&self, option: AppOption) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::SetOption { option })?;
        Ok(())
    }

    /// Create a new empty workbook and return its handle.
    pub fn create_workbook(&self) -> Result<u64, BridgeError> {
        match self.send_command(BridgeCommand::CreateWorkbook)? {
            Some(ResponseData::WorkbookHandle { workbook }) => Ok(workbook),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Open an existing workbook read-only (no link update, no MRU entry).
    pub fn open_workbook_read_only(&self, path: &Path) -> Result<u64, BridgeError> {
        let wine_path = linux_to_wine_path(path);
        match self.send_command(BridgeCommand::OpenWorkbookReadOnly { path: wine_path })? {
            Some(ResponseData::WorkbookHandle { workbook }) => Ok(workbook),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// List a workbook's worksheet names in tab order.
    pub fn sheet_names(&self, workbook: u64) -> Result<Vec<String>, BridgeError> {
        match self.send_command(BridgeCommand::SheetNames { workbook })? {
            Some(ResponseData::SheetNames { names }) => Ok(names),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Copy one worksheet to the end of `target`; returns the host-assigned
    /// name of the copy.
    pub fn copy_sheet(&self, source: u64, sheet: u32, target: u64) -> Result<String, BridgeError> {
        match self.send_command(BridgeCommand::CopySheet {
            source,
            sheet,
            target,
        })? {
            Some(ResponseData::SheetName { name }) => Ok(name),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Rename a worksheet addressed by its current name.
    pub fn rename_sheet(&self, workbook: u64, sheet: &str, name: &str) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::RenameSheet {
            workbook,
            sheet: sheet.to_string(),
            name: name.to_string(),
        })?;
        Ok(())
    }

    /// Delete a worksheet by name.
    pub fn delete_sheet(&self, workbook: u64, sheet: &str) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::DeleteSheet {
            workbook,
            sheet: sheet.to_string(),
        })?;
        Ok(())
    }

    /// Save a workbook with an explicit XlFileFormat code.
    pub fn save_workbook_as(
        &self,
        workbook: u64,
        path: &Path,
        format: i32,
    ) -> Result<(), BridgeError> {
        let wine_path = linux_to_wine_path(path);
        self.send_command(BridgeCommand::SaveWorkbookAs {
            workbook,
            path: wine_path,
            format,
        })?;
        Ok(())
    }

    /// Close a workbook without saving.
    pub fn close_workbook(&self, workbook: u64) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::CloseWorkbook { workbook })?;
        Ok(())
    }

    /// Shut down the bridge: close all workbooks, quit Excel, and wait for
    /// the process to exit.
    pub fn quit(&mut self) -> Result<(), BridgeError> {
        let _ = self.send_command(BridgeCommand::Shutdown);

        // Wait for the child process to exit
        let mut child = self.child.lock().unwrap();
        let _ = child.wait();

        Ok(())
    }
}

/// Convert a Linux filesystem path to a WINE (Windows) path.
///
/// WINE maps `/` to `Z:\`, so `/home/user/file.xlsx` becomes `Z:\home\user\file.xlsx`.
/// The WINE prefix's `drive_c` maps to `C:\`.
pub fn linux_to_wine_path(linux_path: &Path) -> String {
    let abs = if linux_path.is_absolute() {
        linux_path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(linux_path)
    };

    // WINE maps the root filesystem to Z:
    format!("Z:{}", abs.display()).replace('/', "\\")
}

/// Attempt to locate the bridge exe relative to the current executable or in common paths.
fn find_bridge_exe() -> PathBuf {
    // Check next to the current executable
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        let candidate = exe.join("excel-com-bridge.exe");
        if candidate.exists() {
            return candidate;
        }
    }

    // Check in the target directory (for development)
    let target_path = PathBuf::from("target/x86_64-pc-windows-gnu/release/excel-com-bridge.exe");
    if target_path.exists() {
        return target_path;
    }

    let target_path = PathBuf::from("target/x86_64-pc-windows-gnu/debug/excel-com-bridge.exe");
    if target_path.exists() {
        return target_path;
    }

    // Default: assume it's in the current directory
    PathBuf::from("excel-com-bridge.exe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_to_wine_path() {
        assert_eq!(
            linux_to_wine_path(Path::new("/data/in/a.xlsx")),
            "Z:\\data\\in\\a.xlsx"
        );
    }

    #[test]
    fn test_probe_fails_for_missing_exe() {
        let config = ExcelBridgeConfig {
            bridge_exe_path: Some(PathBuf::from("/nonexistent/excel-com-bridge.exe")),
            ..Default::default()
        };
        assert!(!bridge_available(&config));
    }

    #[test]
    fn test_start_fails_for_missing_exe() {
        let config = ExcelBridgeConfig {
            bridge_exe_path: Some(PathBuf::from("/nonexistent/excel-com-bridge.exe")),
            ..Default::default()
        };
        assert!(matches!(
            ExcelBridge::start(config),
            Err(BridgeError::BridgeExeNotFound(_))
        ));
    }
}
