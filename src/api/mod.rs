pub mod handlers;

pub use handlers::*;

use crate::service::ReconcileService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// 构建路由
pub fn router(service: Arc<ReconcileService>) -> Router {
    let reconcile_routes = Router::new()
        .route("/api/reconcile", post(handlers::reconcile))
        .route("/api/reconcile/files", post(handlers::reconcile_files))
        .with_state(service);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(reconcile_routes)
}
