use crate::error::TableError;
use crate::models::{ReconcileReport, ReportRow};
use std::fs;
use std::io::Write;
use std::path::Path;

pub(crate) const HEADERS: [&str; 7] = [
    "Contract Description",
    "Invoice Description",
    "Contract PartNumber",
    "Invoice PartNumber",
    "Contract Quantity",
    "Invoice Quantity",
    "Fuzzy Score",
];

/// 写出差异表: 表头 + 差异行 + 汇总行
pub fn write_report<W: Write>(report: &ReconcileReport, output: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(output);
    for row in report.to_rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// 先写同目录临时文件再改名, 失败时不留下半成品
pub fn write_report_to_path(report: &ReconcileReport, path: &Path) -> Result<(), TableError> {
    replace_file(path, |tmp_path| {
        let file = fs::File::create(tmp_path).map_err(|source| TableError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        write_report(report, file).map_err(|e| TableError::csv(path, e))
    })?;

    tracing::info!(
        "差异表已写入 {}: {} 条差异",
        path.display(),
        report.discrepancies.len()
    );
    Ok(())
}

/// 由 `write` 写出 `path` 旁的临时文件, 成功后改名覆盖 `path`; 任一步失败都删除临时文件
pub(crate) fn replace_file<F>(path: &Path, write: F) -> Result<(), TableError>
where
    F: FnOnce(&Path) -> Result<(), TableError>,
{
    let tmp_path = path.with_extension("tmp");
    let result = write(&tmp_path).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })
    });
    if result.is_err() {
        // 尽力清理
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// 对齐的文本表格, 用于日志输出
pub fn render_report(report: &ReconcileReport) -> String {
    let rows: Vec<[String; 7]> = report.to_rows().into_iter().map(cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, HEADERS.iter().copied(), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn cells(row: ReportRow) -> [String; 7] {
    [
        row.contract_description,
        row.invoice_description,
        row.contract_part_number,
        row.invoice_part_number,
        row.contract_quantity,
        row.invoice_quantity,
        row.fuzzy_score,
    ]
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 7]) {
    let line: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::service::reconcile;

    fn sample() -> ReconcileReport {
        reconcile(
            &[Record::new("Widget A", "100", 5)],
            &[Record::new("Widget A", "100", 7)],
        )
    }

    #[test]
    fn csv_has_header_rows_and_totals() {
        let mut buf = Vec::new();
        write_report(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADERS.join(","));
        assert_eq!(lines[1], "Widget A,Widget A,100,100,5,7,1");
        assert_eq!(lines[2], ",,,Total:,5,7,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_report_still_writes_totals() {
        let mut buf = Vec::new();
        write_report(&ReconcileReport::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some(",,,Total:,0,0,"));
    }

    #[test]
    fn rendered_table_lists_every_row() {
        let text = render_report(&sample());
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().starts_with("Contract Description"));
        assert!(text.contains("Total:"));
    }

    #[test]
    fn written_file_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discrepancies.csv");
        std::fs::write(&path, "old").unwrap();
        write_report_to_path(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Contract Description"));
        assert!(!dir.path().join("discrepancies.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // 目标是非空目录, 改名必然失败
        let path = dir.path().join("discrepancies.csv");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let err = write_report_to_path(&sample(), &path).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(!err.is_data_error());
        assert!(!dir.path().join("discrepancies.tmp").exists());
        assert!(path.join("keep").exists());
    }
}
