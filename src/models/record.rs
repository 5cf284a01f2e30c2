use crate::error::ReconcileError;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub const DESCRIPTION: &str = "Description";
pub const PART_NUMBER: &str = "PartNumber";
pub const QUANTITY: &str = "Quantity";

/// 单元格值 (文本 / 数字 / 空)
///
/// JSON 中字符串始终保持为文本, 不会被重新识别为数字 (料号 "007" 不会变成 7)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(BigDecimal),
    Empty,
}

impl FieldValue {
    /// 比较用的文本形式, 数字使用十进制表示 (保留小数位)
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Empty => Cow::Borrowed(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(BigDecimal::from(n))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(BigDecimal::from(n))
    }
}

impl From<BigDecimal> for FieldValue {
    fn from(n: BigDecimal) -> Self {
        Self::Number(n)
    }
}

/// 未类型化的输入行 (列名 -> 单元格, 保持列顺序)
pub type Row = IndexMap<String, FieldValue>;

/// 记录来源表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordSource {
    Contract,
    Invoice,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract => f.write_str("Contract"),
            Self::Invoice => f.write_str("Invoice"),
        }
    }
}

/// 合同/发票记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub description: FieldValue,
    pub part_number: FieldValue,
    pub quantity: BigDecimal,
}

impl Record {
    pub fn new(
        description: impl Into<FieldValue>,
        part_number: impl Into<FieldValue>,
        quantity: impl Into<BigDecimal>,
    ) -> Self {
        Self {
            description: description.into(),
            part_number: part_number.into(),
            quantity: quantity.into(),
        }
    }

    /// 从输入行构建记录, 缺列或空值报 Schema 错误, 数量无法解析报 TypeConversion 错误
    pub fn from_row(row: &Row, table: RecordSource, index: usize) -> Result<Self, ReconcileError> {
        let required = |field: &'static str| {
            row.get(field)
                .filter(|v| !v.is_empty())
                .ok_or(ReconcileError::Schema { table, index, field })
        };

        let description = required(DESCRIPTION)?.clone();
        let part_number = required(PART_NUMBER)?.clone();
        let quantity = match required(QUANTITY)? {
            FieldValue::Number(n) => n.clone(),
            other => {
                let text = other.as_text();
                BigDecimal::from_str(text.trim()).map_err(|_| ReconcileError::TypeConversion {
                    table,
                    index,
                    field: QUANTITY,
                    value: text.to_string(),
                })?
            }
        };

        Ok(Self {
            description,
            part_number,
            quantity,
        })
    }
}
