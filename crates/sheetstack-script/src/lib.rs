//! Fallback merge strategy: external script process.
//!
//! When the COM bridge is unavailable the merge is delegated to
//! `merge_excel_sheets.ps1`, an external PowerShell script that performs the
//! identical merge and reports back over a line-oriented protocol on its
//! standard streams:
//!
//! ```text
//! LOG|<text>                          log line
//! PROGRESS|<current>|<total>|<file>   per-file progress
//! REQUEST_SAVE|<suggestedName>        save handshake; the chosen path (or
//!                                     an empty line on abort) is written
//!                                     back on stdin
//! ```
//!
//! Any other non-empty output line is forwarded verbatim to the log.
//! Cancellation travels through a sentinel file whose path the script
//! receives at launch; exit codes map 0→Saved, 3→NoSave, 2→Cancelled,
//! anything else is a fatal error.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use sheetstack_core::format::default_merge_filename;
use sheetstack_core::{MergeContext, MergeError, MergeJob, MergeStatus, MergeStrategy, Result};

/// Name of the merge script expected next to the executable.
pub const SCRIPT_FILE_NAME: &str = "merge_excel_sheets.ps1";

/// Configuration for the script strategy.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Program plus fixed arguments that launch the merge script. The
    /// strategy appends `-FileListPath`, `-CancelFlagPath` and
    /// `-SuggestedName` argument pairs.
    pub launcher: Vec<String>,
    /// The script file itself, verified to exist before launching.
    /// `None` for launchers that embed their own script text.
    pub script_path: Option<PathBuf>,
    /// Directory for the temporary file list and cancellation sentinel.
    pub temp_dir: PathBuf,
}

impl ScriptConfig {
    /// Standard PowerShell launcher for a script on disk.
    pub fn powershell(script_path: PathBuf) -> Self {
        let launcher = vec![
            "powershell".to_string(),
            "-NoProfile".to_string(),
            "-NoLogo".to_string(),
            "-ExecutionPolicy".to_string(),
            "Bypass".to_string(),
            "-File".to_string(),
            script_path.display().to_string(),
        ];
        Self {
            launcher,
            script_path: Some(script_path),
            temp_dir: std::env::temp_dir().join("sheetstack"),
        }
    }

    /// The default script location: next to the current executable.
    pub fn default_script_path() -> PathBuf {
        let mut path = std::env::current_exe().unwrap_or_default();
        path.pop();
        path.push(SCRIPT_FILE_NAME);
        path
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self::powershell(Self::default_script_path())
    }
}

/// The fallback merge strategy.
pub struct ScriptStrategy {
    config: ScriptConfig,
}

impl ScriptStrategy {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }
}

impl MergeStrategy for ScriptStrategy {
    fn run(&mut self, job: &MergeJob, ctx: &MergeContext) -> Result<MergeStatus> {
        let Some((program, fixed_args)) = self.config.launcher.split_first() else {
            return Err(MergeError::ScriptLauncherEmpty);
        };
        if let Some(script) = &self.config.script_path {
            if !script.exists() {
                return Err(MergeError::ScriptMissing(script.clone()));
            }
        }

        fs::create_dir_all(&self.config.temp_dir)?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let file_list_path = self.config.temp_dir.join(format!("filelist_{stamp}.txt"));
        let cancel_flag_path = self.config.temp_dir.join(format!("cancel_{stamp}.flag"));

        let list = job
            .files
            .iter()
            .map(|f| f.path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&file_list_path, list)?;

        ctx.log(format!("(script) files to merge: {}", job.files.len()));

        let mut cmd = Command::new(program);
        cmd.args(fixed_args);
        cmd.arg("-FileListPath")
            .arg(&file_list_path)
            .arg("-CancelFlagPath")
            .arg(&cancel_flag_path)
            .arg("-SuggestedName")
            .arg(default_merge_filename(&job.folder));
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());

        tracing::debug!("launching merge script: {cmd:?}");
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MergeError::ScriptMissing(PathBuf::from(program))
            } else {
                MergeError::Io(e)
            }
        })?;

        let outcome = drive_process(&mut child, &cancel_flag_path, ctx);

        // Cleanup is unconditional and best-effort: kill a still-running
        // process, then remove the artifacts this run created.
        if matches!(child.try_wait(), Ok(None)) {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = fs::remove_file(&file_list_path);
        let _ = fs::remove_file(&cancel_flag_path);

        outcome
    }
}

/// Relay the line protocol until the process exits, then map its exit code.
fn drive_process(
    child: &mut Child,
    cancel_flag_path: &Path,
    ctx: &MergeContext,
) -> Result<MergeStatus> {
    let stdout = child.stdout.take().expect("stdout was piped");
    let mut stdin = child.stdin.take().expect("stdin was piped");
    let mut lines = BufReader::new(stdout).lines();
    let mut sentinel_written = false;

    loop {
        // Checked once per protocol read; the sentinel is written at most once.
        if ctx.is_cancelled() && !sentinel_written {
            if let Err(e) = fs::write(cancel_flag_path, "1") {
                tracing::debug!("could not write cancel sentinel: {e}");
            }
            sentinel_written = true;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            ProtocolLine::Log(text) => ctx.log(text),
            ProtocolLine::Progress {
                current,
                total,
                filename,
            } => ctx.progress(current, total, &filename),
            ProtocolLine::Skip => {}
            ProtocolLine::RequestSave(suggested) => {
                let answer = ctx.request_save(&suggested)?;
                let reply = answer.map(|p| p.display().to_string()).unwrap_or_default();
                writeln!(stdin, "{reply}")?;
                stdin.flush()?;
            }
        }
    }

    let status = child.wait()?;

    // A cancelled run stays cancelled whatever the script reported.
    if ctx.is_cancelled() {
        return Ok(MergeStatus::Cancelled);
    }

    match status.code() {
        Some(0) => Ok(MergeStatus::Saved),
        Some(3) => Ok(MergeStatus::NoSave),
        Some(2) => Ok(MergeStatus::Cancelled),
        code => Err(MergeError::ScriptFailed(code.unwrap_or(-1))),
    }
}

/// One parsed line of script output.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProtocolLine {
    Log(String),
    Progress {
        current: usize,
        total: usize,
        filename: String,
    },
    RequestSave(String),
    /// Malformed message, silently dropped (e.g. non-numeric PROGRESS).
    Skip,
}

fn parse_line(line: &str) -> ProtocolLine {
    if let Some(text) = line.strip_prefix("LOG|") {
        return ProtocolLine::Log(text.to_string());
    }
    if let Some(rest) = line.strip_prefix("PROGRESS|") {
        let parts: Vec<&str> = rest.splitn(3, '|').collect();
        if parts.len() == 3 {
            if let (Ok(current), Ok(total)) = (parts[0].parse(), parts[1].parse()) {
                return ProtocolLine::Progress {
                    current,
                    total,
                    filename: parts[2].to_string(),
                };
            }
        }
        return ProtocolLine::Skip;
    }
    if let Some(suggested) = line.strip_prefix("REQUEST_SAVE|") {
        return ProtocolLine::RequestSave(suggested.to_string());
    }
    // Anything else is forwarded verbatim.
    ProtocolLine::Log(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_line() {
        assert_eq!(
            parse_line("LOG|opening A.xlsx"),
            ProtocolLine::Log("opening A.xlsx".to_string())
        );
    }

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(
            parse_line("PROGRESS|2|5|b report.xlsx"),
            ProtocolLine::Progress {
                current: 2,
                total: 5,
                filename: "b report.xlsx".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_progress_is_skipped() {
        assert_eq!(parse_line("PROGRESS|two|5|b.xlsx"), ProtocolLine::Skip);
        assert_eq!(parse_line("PROGRESS|2|"), ProtocolLine::Skip);
        assert_eq!(parse_line("PROGRESS|"), ProtocolLine::Skip);
    }

    #[test]
    fn test_progress_filename_may_contain_pipes() {
        assert_eq!(
            parse_line("PROGRESS|1|1|odd|name.xlsx"),
            ProtocolLine::Progress {
                current: 1,
                total: 1,
                filename: "odd|name.xlsx".to_string()
            }
        );
    }

    #[test]
    fn test_parse_request_save() {
        assert_eq!(
            parse_line("REQUEST_SAVE|merged_reports_20240101_090000.xlsx"),
            ProtocolLine::RequestSave("merged_reports_20240101_090000.xlsx".to_string())
        );
    }

    #[test]
    fn test_unknown_lines_forwarded_verbatim() {
        assert_eq!(
            parse_line("WARNING: something odd"),
            ProtocolLine::Log("WARNING: something odd".to_string())
        );
    }
}
