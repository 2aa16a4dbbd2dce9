//! The COM merge driver: the same externally observable merge behavior as
//! the script fallback, implemented on the [`Automation`] trait.
//!
//! Failure policy: a file that cannot be opened or a sheet that cannot be
//! copied is logged as a warning and skipped; losing the application handle
//! or exhausting the sheet-name space aborts the run. Source workbooks are
//! closed on every exit path, and the application handle is released in a
//! final cleanup step regardless of outcome.

use std::collections::HashSet;
use std::path::Path;

use excel_bridge_protocol::AppOption;
use sheetstack_core::format::{default_merge_filename, file_format_for_path};
use sheetstack_core::{naming, MergeContext, MergeError, MergeJob, MergeStatus, MergeStrategy};

use crate::automation::Automation;
use crate::bridge::{ExcelBridge, ExcelBridgeConfig};

/// The primary merge strategy, selected when the COM bridge is available.
pub struct ExcelComStrategy {
    config: ExcelBridgeConfig,
}

impl ExcelComStrategy {
    pub fn new(config: ExcelBridgeConfig) -> Self {
        Self { config }
    }
}

impl MergeStrategy for ExcelComStrategy {
    fn run(&mut self, job: &MergeJob, ctx: &MergeContext) -> sheetstack_core::Result<MergeStatus> {
        // Failing to acquire the handle at all is the one fatal setup error.
        let mut bridge = ExcelBridge::start(self.config.clone())?;

        let outcome = run_merge(&mut bridge, job, ctx);

        // The handle is released whatever happened above.
        if let Err(e) = bridge.quit() {
            tracing::debug!("bridge shutdown failed: {e}");
        }

        outcome
    }
}

/// Excel settings applied for the duration of a run to avoid interactive
/// prompts and recalculation slowdowns. Each is best-effort.
fn apply_quiet_mode<A: Automation>(auto: &mut A) {
    let options = [
        AppOption::Visible(false),
        AppOption::DisplayAlerts(false),
        AppOption::ScreenUpdating(false),
        AppOption::EnableEvents(false),
        AppOption::MacroSecurityForceDisable,
        AppOption::ManualCalculation,
    ];
    for option in options {
        if let Err(e) = auto.set_option(option) {
            tracing::debug!("quiet-mode setting failed: {e}");
        }
    }
}

/// Run the whole merge against an already-acquired automation handle.
/// Public within the crate so tests drive it with a fake.
pub(crate) fn run_merge<A: Automation>(
    auto: &mut A,
    job: &MergeJob,
    ctx: &MergeContext,
) -> sheetstack_core::Result<MergeStatus> {
    apply_quiet_mode(auto);

    let dest = auto.create_workbook()?;
    // The fresh workbook's sheets are placeholders, deleted later once real
    // content has been copied in.
    let placeholders = auto.sheet_names(dest).unwrap_or_default();

    let total = job.files.len();
    ctx.log(format!("files to merge: {total}"));
    let mut copied_any = false;

    for (idx, file) in job.files.iter().enumerate() {
        if ctx.is_cancelled() {
            ctx.log("cancelled; cleaning up...");
            break;
        }

        ctx.progress(idx + 1, total, &file.name);
        ctx.log(format!("open: {}", file.name));

        match copy_workbook_sheets(auto, &file.path, dest, ctx, &mut copied_any) {
            Ok(()) => {}
            // Name-space exhaustion is a configuration error, not a bad file.
            Err(e @ MergeError::NameSpaceExhausted(_)) => return Err(e),
            Err(e) => ctx.log(format!("[WARN] could not process {}: {e}", file.name)),
        }
    }

    if ctx.is_cancelled() {
        let _ = auto.close(dest);
        return Ok(MergeStatus::Cancelled);
    }

    if copied_any {
        delete_placeholders(auto, dest, &placeholders);
    }

    ctx.log("merge complete; choose a save location");
    let suggested = default_merge_filename(&job.folder);

    loop {
        let Some(path) = ctx.request_save(&suggested)? else {
            ctx.log("save declined; closing without saving");
            let _ = auto.close(dest);
            return Ok(MergeStatus::NoSave);
        };

        let format = file_format_for_path(&path);
        match auto.save_as(dest, &path, format) {
            Ok(()) => {
                ctx.log(format!("saved: {}", path.display()));
                break;
            }
            // A failed save re-prompts rather than aborting the run.
            Err(e) => ctx.log(format!("[ERROR] save failed: {e}")),
        }
    }

    let _ = auto.close(dest);
    Ok(MergeStatus::Saved)
}

/// Copy every worksheet of one source workbook into the destination.
/// The source handle is released on every exit path.
fn copy_workbook_sheets<A: Automation>(
    auto: &mut A,
    path: &Path,
    dest: u64,
    ctx: &MergeContext,
    copied_any: &mut bool,
) -> sheetstack_core::Result<()> {
    let src = auto.open_read_only(path)?;

    let result = copy_all_sheets(auto, src, dest, ctx, copied_any);

    if let Err(e) = auto.close(src) {
        tracing::debug!("closing source workbook failed: {e}");
    }

    result
}

fn copy_all_sheets<A: Automation>(
    auto: &mut A,
    src: u64,
    dest: u64,
    ctx: &MergeContext,
    copied_any: &mut bool,
) -> sheetstack_core::Result<()> {
    let source_sheets = auto.sheet_names(src)?;

    for (sidx, desired) in source_sheets.iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }

        // Recomputed before every copy: the host may have adjusted names.
        let existing: HashSet<String> = auto.sheet_names(dest)?.into_iter().collect();

        let host_name = auto.copy_sheet(src, sidx as u32, dest)?;
        *copied_any = true;

        let unique = naming::make_unique(&existing, desired)?;
        match auto.rename_sheet(dest, &host_name, &unique) {
            Ok(()) => ctx.log(format!("  copy: {desired} -> {unique}")),
            Err(first) => {
                // One retry with a marker suffix; a second failure keeps the
                // host-assigned name and the run continues.
                let fallback = naming::make_unique(&existing, &format!("{desired}_copy"))?;
                match auto.rename_sheet(dest, &host_name, &fallback) {
                    Ok(()) => ctx.log(format!("  copy: {desired} -> {fallback}")),
                    Err(second) => {
                        tracing::debug!("rename retry failed after {first}: {second}");
                        ctx.log(format!(
                            "[WARN] could not rename copy of '{desired}'; keeping '{host_name}'"
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Remove the destination's original placeholder sheets, never deleting the
/// last remaining sheet. Individual failures are swallowed.
fn delete_placeholders<A: Automation>(auto: &mut A, dest: u64, placeholders: &[String]) {
    for name in placeholders {
        match auto.sheet_names(dest) {
            Ok(names) if names.len() > 1 => {
                if let Err(e) = auto.delete_sheet(dest, name) {
                    tracing::debug!("placeholder delete failed for '{name}': {e}");
                }
            }
            _ => break,
        }
    }
}
