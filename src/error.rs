use crate::models::RecordSource;
use thiserror::Error;

/// 对账错误 (全部为 fail-fast, 不返回部分结果)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// 记录缺少必填字段
    #[error("{table} record #{index}: missing required field '{field}'")]
    Schema {
        table: RecordSource,
        index: usize,
        field: &'static str,
    },

    /// 字段无法转换为比较所需的类型 (如数量不是数字)
    #[error("{table} record #{index}: field '{field}' cannot be converted: '{value}'")]
    TypeConversion {
        table: RecordSource,
        index: usize,
        field: &'static str,
        value: String,
    },

    /// 输入表缺失 (空表合法, 缺失不合法)
    #[error("{table} table is missing")]
    Input { table: RecordSource },

    /// 调用方中止
    #[error("reconciliation cancelled after {processed} contract record(s)")]
    Cancelled { processed: usize },
}

impl ReconcileError {
    /// 是否由输入数据引起 (API 映射为 400)
    pub fn is_data_error(&self) -> bool {
        !matches!(self, Self::Cancelled { .. })
    }
}

/// 表格读写错误
#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// 工作簿读取失败
    #[error("workbook error in '{path}': {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },

    /// 工作簿写出失败
    #[error("cannot write workbook '{path}': {source}")]
    WorkbookWrite {
        path: String,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// 只能写出 .xlsx 工作簿
    #[error("'{path}': only .xlsx workbooks can be written")]
    UnsupportedOutput { path: String },

    #[error("'{path}': sheet '{sheet}' not found")]
    MissingSheet { path: String, sheet: String },

    /// 表头重复, 后一列会覆盖前一列
    #[error("'{path}': duplicate column '{column}'")]
    DuplicateColumn { path: String, column: String },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl TableError {
    /// CSV 解析错误包装 IO 失败时归为 Io
    pub fn csv(path: &std::path::Path, source: csv::Error) -> Self {
        let path = path.display().to_string();
        match source.kind() {
            csv::ErrorKind::Io(e) => Self::Io {
                path,
                source: std::io::Error::new(e.kind(), e.to_string()),
            },
            _ => Self::Csv { path, source },
        }
    }

    /// 是否由输入数据引起 (API 映射为 400); 文件系统失败不算
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::Reconcile(e) => e.is_data_error(),
            Self::Csv { source, .. } => !source.is_io_error(),
            Self::Workbook { source, .. } => !matches!(source, calamine::Error::Io(_)),
            Self::MissingSheet { .. } | Self::DuplicateColumn { .. } => true,
            Self::Io { .. } | Self::WorkbookWrite { .. } | Self::UnsupportedOutput { .. } => false,
        }
    }
}
