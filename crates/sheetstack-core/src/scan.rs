//! Folder scanning
//!
//! Enumerates a folder into the ordered [`SourceFile`] list a merge run
//! operates on. The scan is shallow (no recursion) and recomputed fresh on
//! every call; scanning an unchanged folder twice yields the same list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Recognized workbook extensions (compared case-insensitively).
pub const SPREADSHEET_EXTS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb"];

/// Excel prefixes its lock artifacts with these two characters.
const LOCK_FILE_PREFIX: &str = "~$";

/// One candidate workbook found in the source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or scan-relative) path to the workbook.
    pub path: PathBuf,
    /// File name used for display, sorting and progress events.
    pub name: String,
    /// Size in bytes at scan time.
    pub size: u64,
}

/// Whether a directory entry name/extension qualifies as a source workbook.
///
/// Directories are excluded by the caller via metadata; this checks only
/// the lock-artifact prefix and the extension set.
fn is_spreadsheet_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with(LOCK_FILE_PREFIX) {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_lowercase();
            SPREADSHEET_EXTS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Scan `folder` for workbooks, sorted case-insensitively by file name.
pub fn scan_folder(folder: &Path) -> io::Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() || !is_spreadsheet_name(&path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        files.push(SourceFile {
            path,
            name,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.xlsx");
        touch(dir.path(), "A.xls");
        touch(dir.path(), "c.XLSM");
        touch(dir.path(), "~$b.xlsx"); // lock artifact
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "noext");
        fs::create_dir(dir.path().join("sub.xlsx")).unwrap(); // directory

        let files = scan_folder(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A.xls", "b.xlsx", "c.XLSM"]);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one.xlsx");
        touch(dir.path(), "two.xlsb");

        let first = scan_folder(dir.path()).unwrap();
        let second = scan_folder(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scan_records_size() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.xlsx"), b"12345").unwrap();

        let files = scan_folder(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 5);
    }

    #[test]
    fn test_scan_empty_when_nothing_qualifies() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "~$locked.xls");
        touch(dir.path(), "readme.md");

        let files = scan_folder(dir.path()).unwrap();
        assert!(files.is_empty());
    }
}
