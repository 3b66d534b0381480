//! Watch data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked subject owned by one user. Names are unique per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub watch_id: i64,
    pub user_id: i64,
    pub name: String,
    pub date_of_creation: DateTime<Utc>,
}

/// A watch together with what has been logged under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchInfo {
    pub watch: Watch,
    pub cycles: Vec<i64>,
    pub total_measures: i64,
}
