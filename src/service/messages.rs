//! Request bodies accepted by the API.

use serde::Deserialize;

/// `/register` and `/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentialsMessage {
    pub user_name: String,
    pub password: String,
}

/// `/watch/add`, `/watch/delete`, `/watch/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct EditWatchMessage {
    pub name: String,
}

/// `/cycle/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecifyWatchMessage {
    pub watch_name: String,
}

/// `/logs/list`, `/logs/stats`, `/cycle/delete`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecifyWatchDataMessage {
    pub watch_name: String,
    pub cycle: i64,
}

/// `/logs/delete`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecifyLogDataMessage {
    pub log_id: i64,
}

/// `/logs/add`. `datetime` defaults to the time of the request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMeasurementMessage {
    pub watch_name: String,
    pub cycle: i64,
    #[serde(default)]
    pub datetime: Option<String>,
    pub measure: f64,
}
