use super::reconciler::{reconcile_with, records_from_rows, Progress};
use crate::config::{FilesConfig, JobConfig};
use crate::error::{ReconcileError, TableError};
use crate::models::{ReconcileReport, Record, RecordSource, Row};
use crate::table;
use std::ops::ControlFlow;

/// 对账服务: 记录进度日志, 并负责按配置路径读写文件
pub struct ReconcileService {
    files: FilesConfig,
    progress_interval: usize,
}

impl ReconcileService {
    pub fn new(files: FilesConfig, job: &JobConfig) -> Self {
        Self {
            files,
            progress_interval: job.progress_interval.max(1),
        }
    }

    pub fn files(&self) -> &FilesConfig {
        &self.files
    }

    /// 对账入口 (已类型化记录)
    pub fn reconcile(
        &self,
        contracts: &[Record],
        invoices: &[Record],
    ) -> Result<ReconcileReport, ReconcileError> {
        tracing::info!(
            "开始对账: {} 条合同, {} 条发票, {} 对待比较",
            contracts.len(),
            invoices.len(),
            pairs_to_compare(contracts.len(), invoices.len())
        );

        let interval = self.progress_interval;
        let report = reconcile_with(contracts, invoices, |p: Progress| {
            // 进度日志 (每 interval 条或第一条)
            if p.processed < p.total && (p.processed == 0 || p.processed % interval == 0) {
                tracing::info!("合同进度: {}/{}", p.processed, p.total);
            }
            ControlFlow::Continue(())
        })?;

        tracing::info!(
            "对账完成: {} 条差异, 合同数量合计 {}, 发票数量合计 {}",
            report.discrepancies.len(),
            report.totals.contract_quantity,
            report.totals.invoice_quantity
        );
        Ok(report)
    }

    /// 对账入口 (未类型化行), 任一表缺失或记录有误则整体失败
    pub fn reconcile_rows(
        &self,
        contracts: Option<&[Row]>,
        invoices: Option<&[Row]>,
    ) -> Result<ReconcileReport, ReconcileError> {
        let result = records_from_rows(contracts, RecordSource::Contract).and_then(|c| {
            records_from_rows(invoices, RecordSource::Invoice).map(|i| (c, i))
        });
        let (contracts, invoices) = match result {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!("输入校验失败: {}", e);
                return Err(e);
            }
        };
        self.reconcile(&contracts, &invoices)
    }

    /// 文件任务: 读合同表与发票表, 对账, 写差异表; 出错时不写任何输出
    ///
    /// 三个路径可以是同一个工作簿, 差异表写入其 `output_sheet` 页。
    pub fn reconcile_files(&self) -> Result<ReconcileReport, TableError> {
        let files = &self.files;
        let contract_rows = table::read_table(&files.contract_path, &files.contract_sheet)?;
        let invoice_rows = table::read_table(&files.invoice_path, &files.invoice_sheet)?;

        let report =
            self.reconcile_rows(Some(contract_rows.as_slice()), Some(invoice_rows.as_slice()))?;

        table::write_table(&report, &files.output_path, &files.output_sheet)?;
        tracing::info!("\n{}", table::render_report(&report));
        tracing::info!(
            "Discrepancies saved to '{}'",
            self.files.output_path.display()
        );
        Ok(report)
    }
}

fn pairs_to_compare(contracts: usize, invoices: usize) -> usize {
    contracts.saturating_mul(invoices)
}
