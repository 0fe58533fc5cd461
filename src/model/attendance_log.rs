use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row per accepted punch. Timestamps are stored in UTC.
/// Rows are immutable once written; ordering by `timestamp` within an
/// employee is the only property the aggregator relies on.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceLog {
    pub id: u64,
    pub employee_id: u64,
    pub timestamp: NaiveDateTime,
    pub log_type: String,
    pub similarity_score: f64,
    pub confidence_score: f64,
    pub created_at: NaiveDateTime,
}
