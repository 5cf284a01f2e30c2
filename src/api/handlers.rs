use crate::models::{DiscrepancyEntry, Row, TotalsEntry};
use crate::service::ReconcileService;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 合同表与发票表 (缺失任一表视为输入错误)
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub contracts: Option<Vec<Row>>,
    pub invoices: Option<Vec<Row>>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancies: Option<Vec<DiscrepancyEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<TotalsEntry>,
}

/// 文件任务响应体
#[derive(Debug, Serialize)]
pub struct FileJobResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancy_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<TotalsEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

fn error_status(data_error: bool) -> StatusCode {
    if data_error {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// 对账接口: 请求体内直接携带两张表
pub async fn reconcile(
    State(service): State<Arc<ReconcileService>>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    let task = tokio::task::spawn_blocking(move || {
        service.reconcile_rows(req.contracts.as_deref(), req.invoices.as_deref())
    });

    match task.await {
        Ok(Ok(report)) => {
            let response = ReconcileResponse {
                success: true,
                message: format!("Found {} discrepancies", report.discrepancies.len()),
                discrepancies: Some(report.discrepancies),
                totals: Some(report.totals),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => {
            let response = ReconcileResponse {
                success: false,
                message: format!("Error: {}", e),
                discrepancies: None,
                totals: None,
            };
            (error_status(e.is_data_error()), Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("对账任务异常: {}", e);
            let response = ReconcileResponse {
                success: false,
                message: format!("Error: {}", e),
                discrepancies: None,
                totals: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// 文件任务接口: 按配置路径读写
pub async fn reconcile_files(State(service): State<Arc<ReconcileService>>) -> Response {
    let output_path = service.files().output_path.display().to_string();
    let task = tokio::task::spawn_blocking(move || service.reconcile_files());

    let failure = |status: StatusCode, message: String| {
        let response = FileJobResponse {
            success: false,
            message,
            discrepancy_count: None,
            totals: None,
            output_path: None,
        };
        (status, Json(response)).into_response()
    };

    match task.await {
        Ok(Ok(report)) => {
            let response = FileJobResponse {
                success: true,
                message: format!(
                    "Discrepancies saved to '{}': {} rows",
                    output_path,
                    report.discrepancies.len()
                ),
                discrepancy_count: Some(report.discrepancies.len()),
                totals: Some(report.totals),
                output_path: Some(output_path),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("文件任务失败: {}", e);
            failure(error_status(e.is_data_error()), format!("Error: {}", e))
        }
        Err(e) => {
            tracing::error!("文件任务异常: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}
