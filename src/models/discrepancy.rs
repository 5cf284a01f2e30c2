use super::record::{FieldValue, Record};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// 差异明细 (一对候选合同/发票记录)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscrepancyEntry {
    pub contract_description: FieldValue,
    pub invoice_description: FieldValue,
    pub contract_part_number: FieldValue,
    pub invoice_part_number: FieldValue,
    pub contract_quantity: BigDecimal,
    pub invoice_quantity: BigDecimal,
    /// 描述相似度与料号相似度的平均值
    pub fuzzy_score: f64,
}

impl DiscrepancyEntry {
    pub fn new(contract: &Record, invoice: &Record, fuzzy_score: f64) -> Self {
        Self {
            contract_description: contract.description.clone(),
            invoice_description: invoice.description.clone(),
            contract_part_number: contract.part_number.clone(),
            invoice_part_number: invoice.part_number.clone(),
            contract_quantity: contract.quantity.clone(),
            invoice_quantity: invoice.quantity.clone(),
            fuzzy_score,
        }
    }
}

/// 汇总行: 所有差异明细的数量合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TotalsEntry {
    pub contract_quantity: BigDecimal,
    pub invoice_quantity: BigDecimal,
}

impl TotalsEntry {
    pub const MARKER: &'static str = "Total:";

    pub fn from_entries(entries: &[DiscrepancyEntry]) -> Self {
        let mut contract_quantity = BigDecimal::zero();
        let mut invoice_quantity = BigDecimal::zero();
        for e in entries {
            contract_quantity += &e.contract_quantity;
            invoice_quantity += &e.invoice_quantity;
        }
        Self {
            contract_quantity,
            invoice_quantity,
        }
    }
}

impl Default for TotalsEntry {
    fn default() -> Self {
        Self {
            contract_quantity: BigDecimal::zero(),
            invoice_quantity: BigDecimal::zero(),
        }
    }
}

/// 对账结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReconcileReport {
    pub discrepancies: Vec<DiscrepancyEntry>,
    pub totals: TotalsEntry,
}

impl ReconcileReport {
    pub fn new(discrepancies: Vec<DiscrepancyEntry>) -> Self {
        let totals = TotalsEntry::from_entries(&discrepancies);
        Self {
            discrepancies,
            totals,
        }
    }

    /// 展开为输出表: 差异行 + 末尾汇总行
    pub fn to_rows(&self) -> Vec<ReportRow> {
        let mut rows: Vec<ReportRow> = self.discrepancies.iter().map(ReportRow::from).collect();
        rows.push(ReportRow::from(&self.totals));
        rows
    }
}

/// 输出表的一行 (全部为文本, 列名与列顺序固定)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Contract Description")]
    pub contract_description: String,
    #[serde(rename = "Invoice Description")]
    pub invoice_description: String,
    #[serde(rename = "Contract PartNumber")]
    pub contract_part_number: String,
    #[serde(rename = "Invoice PartNumber")]
    pub invoice_part_number: String,
    #[serde(rename = "Contract Quantity")]
    pub contract_quantity: String,
    #[serde(rename = "Invoice Quantity")]
    pub invoice_quantity: String,
    #[serde(rename = "Fuzzy Score")]
    pub fuzzy_score: String,
}

impl From<&DiscrepancyEntry> for ReportRow {
    fn from(e: &DiscrepancyEntry) -> Self {
        Self {
            contract_description: e.contract_description.to_string(),
            invoice_description: e.invoice_description.to_string(),
            contract_part_number: e.contract_part_number.to_string(),
            invoice_part_number: e.invoice_part_number.to_string(),
            contract_quantity: e.contract_quantity.to_string(),
            invoice_quantity: e.invoice_quantity.to_string(),
            fuzzy_score: e.fuzzy_score.to_string(),
        }
    }
}

impl From<&TotalsEntry> for ReportRow {
    fn from(t: &TotalsEntry) -> Self {
        Self {
            contract_description: String::new(),
            invoice_description: String::new(),
            contract_part_number: String::new(),
            invoice_part_number: TotalsEntry::MARKER.to_string(),
            contract_quantity: t.contract_quantity.to_string(),
            invoice_quantity: t.invoice_quantity.to_string(),
            fuzzy_score: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cq: i64, iq: i64) -> DiscrepancyEntry {
        DiscrepancyEntry::new(
            &Record::new("Widget A", "100", cq),
            &Record::new("Widget A", "100", iq),
            1.0,
        )
    }

    #[test]
    fn totals_sum_both_quantity_columns() {
        let totals = TotalsEntry::from_entries(&[entry(5, 7), entry(2, 1)]);
        assert_eq!(totals.contract_quantity, BigDecimal::from(7));
        assert_eq!(totals.invoice_quantity, BigDecimal::from(8));
    }

    #[test]
    fn totals_of_nothing_are_zero() {
        assert_eq!(TotalsEntry::from_entries(&[]), TotalsEntry::default());
        assert_eq!(TotalsEntry::default().contract_quantity, BigDecimal::zero());
    }

    #[test]
    fn report_rows_end_with_totals_line() {
        let report = ReconcileReport::new(vec![entry(5, 7)]);
        let rows = report.to_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].contract_quantity, "5");
        assert_eq!(rows[0].fuzzy_score, "1");

        let total = &rows[1];
        assert_eq!(total.invoice_part_number, "Total:");
        assert_eq!(total.contract_quantity, "5");
        assert_eq!(total.invoice_quantity, "7");
        assert!(total.contract_description.is_empty());
        assert!(total.fuzzy_score.is_empty());
    }

    #[test]
    fn entry_serializes_with_field_names() {
        let json = serde_json::to_value(entry(5, 7)).unwrap();
        assert_eq!(json["ContractDescription"], "Widget A");
        assert_eq!(json["FuzzyScore"], 1.0);
    }
}
