pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod table;

pub use config::AppConfig;
pub use error::{ReconcileError, TableError};
pub use service::{reconcile, reconcile_rows, ReconcileService};
