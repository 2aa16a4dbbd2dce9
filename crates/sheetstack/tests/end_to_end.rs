//! Whole-pipeline test: folder scan → orchestrator → fallback strategy
//! driving a real subprocess → save handshake → terminal event.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use sheetstack::prelude::*;
use sheetstack::{ScriptConfig, ScriptStrategy};

fn sh_strategy(script: &str, temp_dir: PathBuf) -> Box<dyn MergeStrategy> {
    Box::new(ScriptStrategy::new(ScriptConfig {
        launcher: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
        script_path: None,
        temp_dir,
    }))
}

#[test]
fn test_scan_merge_save_round_trip() {
    let source = tempfile::tempdir().unwrap();
    fs::write(source.path().join("b.xlsx"), b"x").unwrap();
    fs::write(source.path().join("A.xlsx"), b"x").unwrap();
    fs::write(source.path().join("~$A.xlsx"), b"x").unwrap();
    fs::write(source.path().join("skip.txt"), b"x").unwrap();

    let files = sheetstack::scan_folder(source.path()).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["A.xlsx", "b.xlsx"]);

    let temp = tempfile::tempdir().unwrap();
    // Report per-file progress from the file list, then ask where to save.
    let script = r#"
n=0
total=$(grep -c . "$1")
while IFS= read -r f || [ -n "$f" ]; do
  n=$((n+1))
  echo "PROGRESS|$n|$total|$(basename "$f")"
done < "$1"
echo "REQUEST_SAVE|$5"
read path
[ -n "$path" ] || exit 3
echo "LOG|saved to $path"
exit 0
"#;

    let job = MergeJob::new(source.path().to_path_buf(), files);
    let (event_tx, event_rx) = mpsc::channel();
    let (answer_tx, answer_rx) = mpsc::channel();

    let mut orchestrator = Orchestrator::new();
    orchestrator
        .start(
            job,
            sh_strategy(script, temp.path().to_path_buf()),
            event_tx,
            answer_rx,
        )
        .unwrap();

    let out = source.path().join("merged.xlsx");
    let mut progress = Vec::new();
    let mut saw_suggested = None;
    let status = loop {
        match event_rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            UiEvent::Progress {
                current,
                total,
                filename,
            } => progress.push((current, total, filename)),
            UiEvent::SaveRequested { suggested_name } => {
                saw_suggested = Some(suggested_name);
                answer_tx.send(SaveAnswer::Path(out.clone())).unwrap();
            }
            UiEvent::Done(status) => break status,
            UiEvent::Log(_) => {}
        }
    };
    orchestrator.join();

    assert_eq!(status, MergeStatus::Saved);
    assert_eq!(
        progress,
        vec![
            (1, 2, "A.xlsx".to_string()),
            (2, 2, "b.xlsx".to_string()),
        ]
    );
    // The suggested name passed to the script came from the source folder.
    let suggested = saw_suggested.unwrap();
    assert!(suggested.starts_with("merged_"), "{suggested}");
    assert!(suggested.ends_with(".xlsx"));

    // A finished orchestrator accepts a new run.
    assert!(!orchestrator.is_running());
}

#[test]
fn test_cancel_via_start_token_ends_run_cancelled() {
    let temp = tempfile::tempdir().unwrap();
    let source = tempfile::tempdir().unwrap();
    fs::write(source.path().join("a.xlsx"), b"x").unwrap();

    // Tick until the cancellation sentinel appears (bounded so a
    // regression can't hang the suite).
    let script = r#"
i=0
while [ ! -f "$3" ] && [ "$i" -lt 100 ]; do
  echo "LOG|tick"
  i=$((i+1))
  sleep 0.05
done
exit 2
"#;

    let files = sheetstack::scan_folder(source.path()).unwrap();
    let job = MergeJob::new(source.path().to_path_buf(), files);
    let (event_tx, event_rx) = mpsc::channel();
    let (_answer_tx, answer_rx) = mpsc::channel();

    let mut orchestrator = Orchestrator::new();
    let cancel = orchestrator
        .start(
            job,
            sh_strategy(script, temp.path().to_path_buf()),
            event_tx,
            answer_rx,
        )
        .unwrap();

    // Wait for proof the run is underway, then cancel through the token
    // handed back by start (the operator-side cancel path).
    let first = event_rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(matches!(first, UiEvent::Log(_)));
    cancel.cancel();
    orchestrator.join();

    let events: Vec<UiEvent> = event_rx.try_iter().collect();
    assert_eq!(events.last(), Some(&UiEvent::Done(MergeStatus::Cancelled)));
    assert!(!events.contains(&UiEvent::Done(MergeStatus::Saved)));
}

#[test]
fn test_script_error_surfaces_as_error_status_with_log() {
    let temp = tempfile::tempdir().unwrap();
    let source = tempfile::tempdir().unwrap();
    fs::write(source.path().join("a.xlsx"), b"x").unwrap();

    let files = sheetstack::scan_folder(source.path()).unwrap();
    let job = MergeJob::new(source.path().to_path_buf(), files);
    let (event_tx, event_rx) = mpsc::channel();
    let (_answer_tx, answer_rx) = mpsc::channel();

    let mut orchestrator = Orchestrator::new();
    orchestrator
        .start(
            job,
            sh_strategy("exit 9", temp.path().to_path_buf()),
            event_tx,
            answer_rx,
        )
        .unwrap();
    orchestrator.join();

    let events: Vec<UiEvent> = event_rx.try_iter().collect();
    // The triggering message is logged immediately before the terminal event.
    let last_two: Vec<&UiEvent> = events.iter().rev().take(2).collect();
    assert_eq!(last_two[0], &UiEvent::Done(MergeStatus::Error));
    assert!(
        matches!(last_two[1], UiEvent::Log(msg) if msg.starts_with("[ERROR]")),
        "{events:?}"
    );
}
