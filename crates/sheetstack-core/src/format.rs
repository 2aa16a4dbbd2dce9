//! Save formats and default filenames

use std::path::Path;

use chrono::Local;

// Excel XlFileFormat constants (kept as raw codes so the COM bridge stays
// free of enum version skew).
pub const XL_OPEN_XML_WORKBOOK: i32 = 51; // .xlsx
pub const XL_OPEN_XML_WORKBOOK_MACRO_ENABLED: i32 = 52; // .xlsm
pub const XL_EXCEL12: i32 = 50; // .xlsb
pub const XL_EXCEL8: i32 = 56; // .xls

/// Map a destination path's extension to its Excel file-format code.
/// Unknown or missing extensions default to the modern `.xlsx` container.
pub fn file_format_for_path(path: &Path) -> i32 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("xlsx") => XL_OPEN_XML_WORKBOOK,
        Some("xlsm") => XL_OPEN_XML_WORKBOOK_MACRO_ENABLED,
        Some("xlsb") => XL_EXCEL12,
        Some("xls") => XL_EXCEL8,
        _ => XL_OPEN_XML_WORKBOOK,
    }
}

/// Default output name for a merge of `folder`:
/// `merged_<folderBaseName>_<YYYYMMDD_HHMMSS>.xlsx`.
pub fn default_merge_filename(folder: &Path) -> String {
    let base = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    format!("merged_{base}_{ts}.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_codes() {
        assert_eq!(file_format_for_path(Path::new("out.xlsx")), 51);
        assert_eq!(file_format_for_path(Path::new("out.XLSM")), 52);
        assert_eq!(file_format_for_path(Path::new("out.xlsb")), 50);
        assert_eq!(file_format_for_path(Path::new("out.xls")), 56);
        assert_eq!(file_format_for_path(Path::new("out.ods")), 51);
        assert_eq!(file_format_for_path(Path::new("out")), 51);
    }

    #[test]
    fn test_default_filename_shape() {
        let name = default_merge_filename(Path::new("/data/reports"));
        assert!(name.starts_with("merged_reports_"), "{name}");
        assert!(name.ends_with(".xlsx"));
        // merged_reports_YYYYMMDD_HHMMSS.xlsx
        let stem = name.trim_start_matches("merged_reports_").trim_end_matches(".xlsx");
        assert_eq!(stem.len(), 15);
    }
}
