//! Measurement log data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Cell;

/// One stored measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub log_id: i64,
    pub watch_id: i64,
    pub cycle: i64,
    pub timedate: DateTime<Utc>,
    pub measure: f64,
}

/// Input for logging a new measurement.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub watch_id: i64,
    pub cycle: i64,
    pub timedate: DateTime<Utc>,
    pub measure: f64,
}

/// Raw `(log_id, timedate, measure)` rows of one watch cycle, ordered by time.
/// Timestamps are left as the stored text for the frame to parse.
#[derive(Debug, Clone)]
pub struct LogTable {
    pub columns: [&'static str; 3],
    pub rows: Vec<Vec<Cell>>,
}

impl LogTable {
    pub const COLUMNS: [&'static str; 3] = ["log_id", "timedate", "measure"];

    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self {
            columns: Self::COLUMNS,
            rows,
        }
    }
}
