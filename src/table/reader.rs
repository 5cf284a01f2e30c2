use crate::error::TableError;
use crate::models::{FieldValue, Row};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 校验表头: 空列名的列忽略 (None), 重复列名报错
pub(crate) fn column_names(
    path: &Path,
    headers: impl IntoIterator<Item = String>,
) -> Result<Vec<Option<String>>, TableError> {
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .map(|name| {
            if name.is_empty() {
                return Ok(None);
            }
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateColumn {
                    path: path.display().to_string(),
                    column: name,
                });
            }
            Ok(Some(name))
        })
        .collect()
}

/// 按表头组装一行
pub(crate) fn build_row(columns: &[Option<String>], cells: impl IntoIterator<Item = FieldValue>) -> Row {
    columns
        .iter()
        .zip(cells)
        .filter_map(|(name, value)| name.as_ref().map(|n| (n.clone(), value)))
        .collect()
}

/// 读取带表头的 CSV, 每行按列名映射; 空单元格为 Empty, 其余一律为文本
///
/// `path` 仅用于错误信息。
pub fn read_rows<R: Read>(input: R, path: &Path) -> Result<Vec<Row>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers = reader.headers().map_err(|e| TableError::csv(path, e))?;
    let columns = column_names(path, headers.iter().map(str::to_string))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TableError::csv(path, e))?;
        let cells = record.iter().map(|cell| {
            if cell.is_empty() {
                FieldValue::Empty
            } else {
                FieldValue::Text(cell.to_string())
            }
        });
        rows.push(build_row(&columns, cells));
    }

    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<Row>, TableError> {
    let file = File::open(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = read_rows(file, path)?;
    tracing::info!("读取 {}: {} 行", path.display(), rows.len());
    Ok(rows)
}
