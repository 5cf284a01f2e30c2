pub mod job;
pub mod reconciler;
pub mod similarity;

pub use job::ReconcileService;
pub use reconciler::{
    compare_pair, reconcile, reconcile_rows, reconcile_with, records_from_rows, Progress,
    CANDIDATE_THRESHOLD, EXACT_SCORE,
};
pub use similarity::{fuzzy_score, similarity_ratio};
