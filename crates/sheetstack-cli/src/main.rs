//! sheetstack CLI - merge every workbook in a folder into one

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetstack::prelude::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};

#[derive(Parser)]
#[command(name = "sheetstack")]
#[command(
    author,
    version,
    about = "Merge the worksheets of every workbook in a folder into one workbook"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the mergeable workbooks in a folder
    #[command(alias = "ls")]
    List {
        /// Source folder
        folder: PathBuf,
    },

    /// Merge all (or selected) workbooks in a folder
    Merge {
        /// Source folder
        folder: PathBuf,

        /// Merge only these files (by name); default is every scanned file
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,

        /// Destination path; omit to be prompted after the merge
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { folder } => list(&folder),
        Commands::Merge {
            folder,
            only,
            output,
        } => merge(&folder, &only, output),
    }
}

fn list(folder: &Path) -> Result<()> {
    let files = sheetstack::scan_folder(folder)
        .with_context(|| format!("Failed to scan '{}'", folder.display()))?;

    for file in &files {
        println!("{}\t{}", group_digits(file.size), file.name);
    }
    eprintln!("{} workbook(s) found", files.len());
    Ok(())
}

fn merge(folder: &Path, only: &[String], output: Option<PathBuf>) -> Result<()> {
    let mut files = sheetstack::scan_folder(folder)
        .with_context(|| format!("Failed to scan '{}'", folder.display()))?;

    if !only.is_empty() {
        files.retain(|f| only.iter().any(|name| name == &f.name));
        for name in only {
            if !files.iter().any(|f| &f.name == name) {
                bail!("'{}' not found in '{}'", name, folder.display());
            }
        }
    }

    if files.is_empty() {
        bail!("no mergeable workbooks in '{}'", folder.display());
    }

    let job = MergeJob::new(folder.to_path_buf(), files);
    let (event_tx, event_rx) = mpsc::channel();
    let (answer_tx, answer_rx) = mpsc::channel();

    let mut orchestrator = Orchestrator::new();
    let cancel = orchestrator
        .start(job, sheetstack::select_strategy(), event_tx, answer_rx)
        .context("Failed to start the merge")?;

    // Ctrl-C requests cooperative cancellation instead of killing the
    // process: the worker observes the flag at its next checkpoint, closes
    // its workbooks and cleans up, and the run ends with `Cancelled`.
    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || {
            eprintln!("cancelling...");
            cancel.cancel();
        }
    })
    .context("Failed to install the Ctrl-C handler")?;

    // --output answers the first save request; if that save fails the
    // worker asks again and the operator is prompted like the default case.
    let mut output = output;
    let mut status = MergeStatus::Error;

    for event in event_rx {
        match event {
            UiEvent::Log(msg) => println!("{msg}"),
            UiEvent::Progress {
                current,
                total,
                filename,
            } => println!("[{current}/{total}] {filename}"),
            UiEvent::SaveRequested { suggested_name } => {
                answer_save_request(folder, &suggested_name, output.take(), &answer_tx)?;
            }
            UiEvent::Done(s) => {
                status = s;
                break;
            }
        }
    }
    orchestrator.join();

    match status {
        MergeStatus::Saved => println!("Done: saved."),
        MergeStatus::NoSave => println!("Done: finished without saving."),
        MergeStatus::Cancelled => println!("Stopped: cancelled."),
        MergeStatus::Error => bail!("merge failed; see the log above"),
    }
    Ok(())
}

/// Answer one `SaveRequested` event, either from `--output` or by prompting.
/// Invalid paths (missing parent directory) are rejected here and never sent
/// to the worker.
fn answer_save_request(
    folder: &Path,
    suggested_name: &str,
    preset: Option<PathBuf>,
    answers: &Sender<SaveAnswer>,
) -> Result<()> {
    if let Some(path) = preset {
        let answer = match normalize_save_path(&path) {
            Ok(path) => SaveAnswer::Path(path),
            Err(reason) => {
                eprintln!("cannot save to '{}': {reason}", path.display());
                SaveAnswer::Abort
            }
        };
        answers.send(answer).ok();
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        eprint!("save as [{}] (empty to skip): ", folder.join(suggested_name).display());
        io::stderr().flush().ok();

        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        let line = line.trim();

        if line.is_empty() {
            answers.send(SaveAnswer::Abort).ok();
            return Ok(());
        }

        match normalize_save_path(Path::new(line)) {
            Ok(path) => {
                answers.send(SaveAnswer::Path(path)).ok();
                return Ok(());
            }
            Err(reason) => eprintln!("cannot save to '{line}': {reason}"),
        }
    }
}

/// Default a missing extension to `.xlsx` and require an existing parent
/// directory.
fn normalize_save_path(path: &Path) -> std::result::Result<PathBuf, String> {
    let mut path = path.to_path_buf();
    if path.extension().is_none() {
        path.set_extension("xlsx");
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && parent.is_dir() => Ok(path),
        Some(parent) if parent.as_os_str().is_empty() => {
            Err("no parent directory given".to_string())
        }
        Some(parent) => Err(format!("folder '{}' does not exist", parent.display())),
        None => Err("no parent directory given".to_string()),
    }
}

/// Thousands-separated byte count for listings.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }

    #[test]
    fn test_normalize_defaults_extension() {
        let dir = std::env::temp_dir();
        let path = normalize_save_path(&dir.join("merged")).unwrap();
        assert_eq!(path.extension().unwrap(), "xlsx");
    }

    #[test]
    fn test_normalize_rejects_missing_parent() {
        assert!(normalize_save_path(Path::new("/no/such/dir/out.xlsx")).is_err());
        assert!(normalize_save_path(Path::new("bare-name")).is_err());
    }
}
