//! Response bodies returned by the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::LogRow;
use crate::security::AuthBundle;

/// Attached to every authenticated response so clients see the refreshed expiry.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user_name: String,
    pub token: String,
    pub expiration_date: DateTime<Utc>,
}

impl From<&AuthBundle> for AuthResponse {
    fn from(bundle: &AuthBundle) -> Self {
        Self {
            user_name: bundle.user.user_name.clone(),
            token: bundle.token.token.clone(),
            expiration_date: bundle.token.expiration,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreationResponse {
    pub user_name: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expiration_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedInResponse {
    pub auth: AuthResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogOutResponse {
    pub user: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchElementResponse {
    pub name: String,
    pub date_of_creation: DateTime<Utc>,
    pub cycles: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchListResponse {
    pub auth: AuthResponse,
    pub watches: Vec<WatchElementResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchInfoResponse {
    pub auth: AuthResponse,
    pub name: String,
    pub date_of_creation: DateTime<Utc>,
    pub cycles: Vec<i64>,
    pub total_measures: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchEditResponse {
    pub auth: AuthResponse,
    pub name: String,
    pub date_of_creation: DateTime<Utc>,
}

/// One frame row. `log_id` is null for interpolated rows, `difference` on the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogResponse {
    pub log_id: Option<i64>,
    pub time: DateTime<Utc>,
    pub measure: f64,
    pub difference: Option<f64>,
}

impl From<LogRow> for LogResponse {
    fn from(row: LogRow) -> Self {
        Self {
            log_id: row.record.log_id,
            time: row.record.time,
            measure: row.record.measure,
            difference: row.derived.difference,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogListResponse {
    pub auth: AuthResponse,
    pub logs: Vec<LogResponse>,
}

/// All three figures are null when the cycle holds no measurements.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub auth: AuthResponse,
    pub average: Option<f64>,
    pub deviation: Option<f64>,
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogAddedResponse {
    pub auth: AuthResponse,
    pub log_id: i64,
    pub time: DateTime<Utc>,
    pub measure: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleResponse {
    pub auth: AuthResponse,
    pub watch_name: String,
    pub cycle: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleDeletedResponse {
    pub auth: AuthResponse,
    pub watch_name: String,
    pub cycle: i64,
    pub deleted: usize,
}
