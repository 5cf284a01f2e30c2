pub mod discrepancy;
pub mod record;

pub use discrepancy::{DiscrepancyEntry, ReconcileReport, ReportRow, TotalsEntry};
pub use record::{FieldValue, Record, RecordSource, Row, DESCRIPTION, PART_NUMBER, QUANTITY};
