use super::reader::{build_row, column_names};
use super::writer::{replace_file, HEADERS};
use crate::error::TableError;
use crate::models::{FieldValue, ReconcileReport, Row, TotalsEntry};
use bigdecimal::{BigDecimal, ToPrimitive};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

type Source = Sheets<Cursor<Vec<u8>>>;

// 先整体读入内存, 文件系统错误与格式错误分开报告
fn open(path: &Path) -> Result<Source, TableError> {
    let bytes = fs::read(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|source| TableError::Workbook {
        path: path.display().to_string(),
        source,
    })
}

fn sheet_range(workbook: &mut Source, path: &Path, sheet: &str) -> Result<Range<Data>, TableError> {
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(TableError::MissingSheet {
            path: path.display().to_string(),
            sheet: sheet.to_string(),
        });
    }
    workbook
        .worksheet_range(sheet)
        .map_err(|source| TableError::Workbook {
            path: path.display().to_string(),
            source,
        })
}

/// 读取工作表: 首行为表头, 其余每行按列名映射; 整行为空的行跳过
///
/// 表头规则与 CSV 相同 (空列名忽略, 重复列名报错)。数字单元格保持为数字。
pub fn read_sheet(path: &Path, sheet: &str) -> Result<Vec<Row>, TableError> {
    let mut workbook = open(path)?;
    let range = sheet_range(&mut workbook, path, sheet)?;

    let mut lines = range.rows();
    let columns = match lines.next() {
        Some(header) => column_names(
            path,
            header.iter().map(|cell| cell_value(cell).as_text().into_owned()),
        )?,
        None => Vec::new(),
    };

    let rows: Vec<Row> = lines
        .filter(|cells| cells.iter().any(|cell| !cell_value(cell).is_empty()))
        .map(|cells| build_row(&columns, cells.iter().map(cell_value)))
        .collect();

    tracing::info!("读取 {} [{}]: {} 行", path.display(), sheet, rows.len());
    Ok(rows)
}

fn cell_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Empty => FieldValue::Empty,
        Data::String(s) if s.is_empty() => FieldValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::Text(s.clone()),
        Data::Int(n) => FieldValue::from(*n),
        Data::Float(n) => number(*n),
        // 日期按序列号参与比较
        Data::DateTime(dt) => number(dt.as_f64()),
        Data::Bool(b) => FieldValue::from(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => FieldValue::Text(format!("#{:?}", e)),
    }
}

// 整数值的浮点数按整数处理 (5.0 -> 5)
fn number(n: f64) -> FieldValue {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return FieldValue::from(n as i64);
    }
    BigDecimal::from_str(&n.to_string())
        .map(FieldValue::Number)
        .unwrap_or_else(|_| FieldValue::Text(n.to_string()))
}

/// 把差异表写入工作簿的 `sheet` 页
///
/// 目标文件已存在时保留其余工作表 (仅保留单元格值, 不含格式和公式),
/// 同名工作表原位替换; 不存在时新建工作簿。
pub fn write_report_to_workbook(
    report: &ReconcileReport,
    path: &Path,
    sheet: &str,
) -> Result<(), TableError> {
    let write_err = |source| TableError::WorkbookWrite {
        path: path.display().to_string(),
        source,
    };

    let mut book = Workbook::new();
    let mut placed = false;
    if path.is_file() {
        let mut existing = open(path)?;
        for name in existing.sheet_names() {
            if name == sheet {
                write_report_sheet(&mut book, report, sheet).map_err(write_err)?;
                placed = true;
            } else {
                let range = existing
                    .worksheet_range(&name)
                    .map_err(|source| TableError::Workbook {
                        path: path.display().to_string(),
                        source,
                    })?;
                copy_sheet(&mut book, &name, &range).map_err(write_err)?;
            }
        }
    }
    if !placed {
        write_report_sheet(&mut book, report, sheet).map_err(write_err)?;
    }

    replace_file(path, |tmp_path| book.save(tmp_path).map_err(write_err))?;

    tracing::info!(
        "差异表已写入 {} [{}]: {} 条差异",
        path.display(),
        sheet,
        report.discrepancies.len()
    );
    Ok(())
}

fn write_report_sheet(
    book: &mut Workbook,
    report: &ReconcileReport,
    name: &str,
) -> Result<(), XlsxError> {
    let worksheet = book.add_worksheet().set_name(name)?;
    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string(0, col, header)?;
    }

    let mut row = 1u32;
    for entry in &report.discrepancies {
        write_field(worksheet, row, 0, &entry.contract_description)?;
        write_field(worksheet, row, 1, &entry.invoice_description)?;
        write_field(worksheet, row, 2, &entry.contract_part_number)?;
        write_field(worksheet, row, 3, &entry.invoice_part_number)?;
        write_decimal(worksheet, row, 4, &entry.contract_quantity)?;
        write_decimal(worksheet, row, 5, &entry.invoice_quantity)?;
        worksheet.write_number(row, 6, entry.fuzzy_score)?;
        row += 1;
    }

    worksheet.write_string(row, 3, TotalsEntry::MARKER)?;
    write_decimal(worksheet, row, 4, &report.totals.contract_quantity)?;
    write_decimal(worksheet, row, 5, &report.totals.invoice_quantity)?;
    Ok(())
}

fn write_field(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &FieldValue,
) -> Result<(), XlsxError> {
    match value {
        FieldValue::Text(s) => worksheet.write_string(row, col, s).map(|_| ()),
        FieldValue::Number(n) => write_decimal(worksheet, row, col, n),
        FieldValue::Empty => Ok(()),
    }
}

fn write_decimal(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &BigDecimal,
) -> Result<(), XlsxError> {
    match value.to_f64() {
        Some(n) => worksheet.write_number(row, col, n).map(|_| ()),
        None => worksheet.write_string(row, col, value.to_string()).map(|_| ()),
    }
}

fn copy_sheet(book: &mut Workbook, name: &str, range: &Range<Data>) -> Result<(), XlsxError> {
    let worksheet = book.add_worksheet().set_name(name)?;
    let (top, left) = range.start().unwrap_or((0, 0));
    for (r, c, cell) in range.used_cells() {
        let row = u32::try_from(top as usize + r).map_err(|_| XlsxError::RowColumnLimitError)?;
        let col = u16::try_from(left as usize + c).map_err(|_| XlsxError::RowColumnLimitError)?;
        match cell {
            Data::Empty => {}
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                worksheet.write_string(row, col, s)?;
            }
            Data::Float(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            Data::Int(n) => {
                worksheet.write_number(row, col, *n as f64)?;
            }
            Data::DateTime(dt) => {
                worksheet.write_number(row, col, dt.as_f64())?;
            }
            Data::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            Data::Error(e) => {
                worksheet.write_string(row, col, format!("#{:?}", e))?;
            }
        }
    }
    Ok(())
}
