use super::similarity::fuzzy_score;
use crate::error::ReconcileError;
use crate::models::{DiscrepancyEntry, ReconcileReport, Record, RecordSource, Row};
use std::ops::ControlFlow;

/// 候选门槛: 描述或料号相似度需严格大于该值
pub const CANDIDATE_THRESHOLD: f64 = 0.9;
/// 完全一致
pub const EXACT_SCORE: f64 = 1.0;

/// 进度 (外层合同记录)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// 单对记录的判定: 返回 Some 表示该对是候选且存在差异
pub fn compare_pair(contract: &Record, invoice: &Record) -> Option<DiscrepancyEntry> {
    let description_score = fuzzy_score(&contract.description, &invoice.description);
    let part_number_score = fuzzy_score(&contract.part_number, &invoice.part_number);

    if !(description_score > CANDIDATE_THRESHOLD || part_number_score > CANDIDATE_THRESHOLD) {
        return None;
    }

    let discrepant = contract.quantity != invoice.quantity
        || part_number_score < EXACT_SCORE
        || description_score < EXACT_SCORE;
    if !discrepant {
        return None;
    }

    tracing::debug!(
        "差异: {} / {} desc={:.4} part={:.4} qty {} vs {}",
        contract.part_number,
        invoice.part_number,
        description_score,
        part_number_score,
        contract.quantity,
        invoice.quantity
    );

    Some(DiscrepancyEntry::new(
        contract,
        invoice,
        (description_score + part_number_score) / 2.0,
    ))
}

/// 全量两两比较 (外层合同, 内层发票), 输出顺序即比较顺序
pub fn reconcile(contracts: &[Record], invoices: &[Record]) -> ReconcileReport {
    let discrepancies = contracts
        .iter()
        .flat_map(|c| invoices.iter().filter_map(move |i| compare_pair(c, i)))
        .collect();
    ReconcileReport::new(discrepancies)
}

/// 同 [`reconcile`], 每处理一条合同记录前调用 `hook`; 返回 Break 时中止, 不返回部分结果
pub fn reconcile_with<F>(
    contracts: &[Record],
    invoices: &[Record],
    mut hook: F,
) -> Result<ReconcileReport, ReconcileError>
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    let total = contracts.len();
    let mut discrepancies = Vec::new();

    for (processed, contract) in contracts.iter().enumerate() {
        if hook(Progress { processed, total }).is_break() {
            return Err(ReconcileError::Cancelled { processed });
        }
        discrepancies.extend(invoices.iter().filter_map(|i| compare_pair(contract, i)));
    }

    if hook(Progress {
        processed: total,
        total,
    })
    .is_break()
    {
        return Err(ReconcileError::Cancelled { processed: total });
    }

    Ok(ReconcileReport::new(discrepancies))
}

/// 校验整张输入表, 遇到第一条坏记录即失败
pub fn records_from_rows(
    rows: Option<&[Row]>,
    table: RecordSource,
) -> Result<Vec<Record>, ReconcileError> {
    let rows = rows.ok_or(ReconcileError::Input { table })?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| Record::from_row(row, table, index))
        .collect()
}

/// 从未类型化的行对账: 先校验合同表, 再校验发票表, 最后比较
pub fn reconcile_rows(
    contracts: Option<&[Row]>,
    invoices: Option<&[Row]>,
) -> Result<ReconcileReport, ReconcileError> {
    let contracts = records_from_rows(contracts, RecordSource::Contract)?;
    let invoices = records_from_rows(invoices, RecordSource::Invoice)?;
    Ok(reconcile(&contracts, &invoices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, TotalsEntry};
    use bigdecimal::{BigDecimal, Zero};

    fn rec(desc: &str, part: &str, qty: i64) -> Record {
        Record::new(desc, part, qty)
    }

    #[test]
    fn exact_match_with_equal_quantity_is_dropped() {
        let report = reconcile(&[rec("Widget A", "100", 5)], &[rec("Widget A", "100", 5)]);
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.totals, TotalsEntry::default());
    }

    #[test]
    fn quantity_mismatch_is_reported() {
        let report = reconcile(&[rec("Widget A", "100", 5)], &[rec("Widget A", "100", 7)]);
        assert_eq!(report.discrepancies.len(), 1);
        let e = &report.discrepancies[0];
        assert_eq!(e.fuzzy_score, 1.0);
        assert_eq!(e.contract_quantity, BigDecimal::from(5));
        assert_eq!(e.invoice_quantity, BigDecimal::from(7));
        assert_eq!(report.totals.contract_quantity, BigDecimal::from(5));
        assert_eq!(report.totals.invoice_quantity, BigDecimal::from(7));
    }

    #[test]
    fn dissimilar_pair_is_not_a_candidate() {
        let report = reconcile(&[rec("Bolt", "X1", 1)], &[rec("Nut", "Y9", 1)]);
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.totals.contract_quantity, BigDecimal::zero());
        assert_eq!(report.totals.invoice_quantity, BigDecimal::zero());
    }

    #[test]
    fn candidates_are_not_deduplicated() {
        let contracts = [rec("Widget A", "100", 5), rec("Widget A", "100-B", 3)];
        let invoices = [rec("Widget A", "100", 4)];
        let report = reconcile(&contracts, &invoices);
        assert_eq!(report.discrepancies.len(), 2);
        assert_eq!(report.totals.contract_quantity, BigDecimal::from(8));
        assert_eq!(report.totals.invoice_quantity, BigDecimal::from(8));
    }

    #[test]
    fn part_number_alone_can_make_a_candidate() {
        // 描述相似度 0.875, 料号完全一致
        let e = compare_pair(&rec("Widget A", "100", 5), &rec("Widget B", "100", 5)).unwrap();
        assert!((e.fuzzy_score - (0.875 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn text_difference_with_equal_quantity_is_reported() {
        let e = compare_pair(
            &rec("Hex Bolt M8 x 40mm", "HB-8", 10),
            &rec("Hex Bolt M8 x 45mm", "HB-8", 10),
        );
        assert!(e.is_some());
    }

    #[test]
    fn threshold_is_strict() {
        // "Widget A" / "Widget B" = 0.875, "100" / "101" = 0.667
        assert!(compare_pair(&rec("Widget A", "100", 1), &rec("Widget B", "101", 2)).is_none());
    }

    #[test]
    fn numeric_and_text_part_numbers_compare_as_text() {
        let c = Record::new("Widget A", 100, 5);
        let i = Record::new("Widget A", "100", 5);
        assert!(compare_pair(&c, &i).is_none());
    }

    #[test]
    fn output_groups_invoices_under_each_contract() {
        let contracts = [rec("Widget A", "100", 1), rec("Gadget Z", "900", 1)];
        let invoices = [
            rec("Gadget Z", "900", 2),
            rec("Widget A", "100", 2),
            rec("Widget A", "100", 3),
        ];
        let report = reconcile(&contracts, &invoices);
        let pairs: Vec<(String, BigDecimal)> = report
            .discrepancies
            .iter()
            .map(|e| (e.contract_part_number.to_string(), e.invoice_quantity.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("100".to_string(), BigDecimal::from(2)),
                ("100".to_string(), BigDecimal::from(3)),
                ("900".to_string(), BigDecimal::from(2)),
            ]
        );
    }

    #[test]
    fn hook_sees_every_contract_and_the_end() {
        let contracts = [rec("Widget A", "100", 5), rec("Bolt", "X1", 1)];
        let invoices = [rec("Widget A", "100", 7)];
        let mut seen = Vec::new();
        let report = reconcile_with(&contracts, &invoices, |p| {
            seen.push(p.processed);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(report, reconcile(&contracts, &invoices));
    }

    #[test]
    fn hook_can_cancel() {
        let contracts = [rec("Widget A", "100", 5), rec("Bolt", "X1", 1)];
        let err = reconcile_with(&contracts, &[], |p| {
            if p.processed == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap_err();
        assert_eq!(err, ReconcileError::Cancelled { processed: 1 });
    }

    #[test]
    fn missing_table_is_an_input_error() {
        let empty: &[Row] = &[];
        let err = reconcile_rows(Some(empty), None).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::Input {
                table: RecordSource::Invoice
            }
        );
    }

    #[test]
    fn empty_tables_are_valid() {
        let empty: &[Row] = &[];
        let report = reconcile_rows(Some(empty), Some(empty)).unwrap();
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.totals, TotalsEntry::default());
    }

    #[test]
    fn bad_row_aborts_whole_reconciliation() {
        let good: Row = [
            ("Description".to_string(), FieldValue::from("Widget A")),
            ("PartNumber".to_string(), FieldValue::from("100")),
            ("Quantity".to_string(), FieldValue::from(5)),
        ]
        .into_iter()
        .collect();
        let mut bad = good.clone();
        bad.shift_remove("Description");

        let contracts = vec![good.clone()];
        let invoices = vec![good, bad];
        let err = reconcile_rows(Some(contracts.as_slice()), Some(invoices.as_slice())).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::Schema {
                table: RecordSource::Invoice,
                index: 1,
                field: "Description",
            }
        );
    }
}
