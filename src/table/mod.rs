pub mod reader;
pub mod workbook;
pub mod writer;

pub use reader::{read_rows, read_rows_from_path};
pub use workbook::{read_sheet, write_report_to_workbook};
pub use writer::{render_report, write_report, write_report_to_path};

use crate::error::TableError;
use crate::models::{ReconcileReport, Row};
use std::path::Path;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// 按扩展名判断是否为工作簿, 其余一律按 CSV 处理
pub fn is_workbook(path: &Path) -> bool {
    extension(path).is_some_and(|e| WORKBOOK_EXTENSIONS.contains(&e.as_str()))
}

/// 读取输入表: 工作簿读 `sheet` 页, CSV 忽略 `sheet`
pub fn read_table(path: &Path, sheet: &str) -> Result<Vec<Row>, TableError> {
    if is_workbook(path) {
        read_sheet(path, sheet)
    } else {
        read_rows_from_path(path)
    }
}

/// 写出差异表: `.xlsx` 写入 `sheet` 页, 其他工作簿格式不支持写出, 其余写 CSV
pub fn write_table(report: &ReconcileReport, path: &Path, sheet: &str) -> Result<(), TableError> {
    match extension(path).as_deref() {
        Some("xlsx") => write_report_to_workbook(report, path, sheet),
        _ if is_workbook(path) => Err(TableError::UnsupportedOutput {
            path: path.display().to_string(),
        }),
        _ => write_report_to_path(report, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert!(is_workbook(Path::new("recon.xlsx")));
        assert!(is_workbook(Path::new("RECON.XLS")));
        assert!(is_workbook(Path::new("data/recon.ods")));
        assert!(!is_workbook(Path::new("contract.csv")));
        assert!(!is_workbook(Path::new("contract")));
    }

    #[test]
    fn legacy_workbook_output_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xls");
        let err = write_table(&ReconcileReport::default(), &path, "Discrepancies").unwrap_err();
        assert!(matches!(err, TableError::UnsupportedOutput { .. }));
        assert!(!err.is_data_error());
        assert!(!path.exists());
    }
}
