//! Operations behind each API endpoint.

pub mod messages;
pub mod responses;

use anyhow::Context;
use log::{info, warn};

use crate::{
    analysis::{FillConfig, LinearInterpolation, StatsError, WatchLogFrame},
    db::{helpers::storage_now, Database, NewLogEntry, Watch},
    error::{ServiceError, ServiceResult},
    security::{AuthBundle, Authenticator},
    settings::ServiceSettings,
};
use messages::{
    CreateMeasurementMessage, EditWatchMessage, SpecifyLogDataMessage, SpecifyWatchDataMessage,
    SpecifyWatchMessage, UserCredentialsMessage,
};
use responses::{
    AuthResponse, CycleDeletedResponse, CycleResponse, LogAddedResponse, LogListResponse,
    LogOutResponse, LogResponse, LoggedInResponse, StatsResponse, TokenResponse,
    UserCreationResponse, WatchEditResponse, WatchElementResponse, WatchInfoResponse,
    WatchListResponse,
};

/// Measurements are kept to two decimal places.
fn round_measure(measure: f64) -> f64 {
    (measure * 100.0).round() / 100.0
}

fn check_cycle(cycle: i64) -> ServiceResult<()> {
    if cycle < 1 {
        return Err(ServiceError::bad_request(format!(
            "Cycle must be a positive number, got {cycle}."
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WatchService {
    db: Database,
    auth: Authenticator,
}

impl WatchService {
    pub fn new(db: Database, settings: &ServiceSettings) -> Self {
        let auth = Authenticator::new(db.clone(), settings);
        Self { db, auth }
    }

    pub async fn authenticate(&self, token: &str) -> ServiceResult<AuthBundle> {
        self.auth.authenticate(token).await
    }

    pub async fn register(
        &self,
        request: UserCredentialsMessage,
    ) -> ServiceResult<UserCreationResponse> {
        let user = self
            .auth
            .register(&request.user_name, &request.password)
            .await?;
        info!("Registered user {}", user.user_name);
        Ok(UserCreationResponse {
            user_name: user.user_name,
            creation_date: user.date_of_creation,
        })
    }

    pub async fn login(&self, request: UserCredentialsMessage) -> ServiceResult<TokenResponse> {
        let (_, token) = self
            .auth
            .login(&request.user_name, &request.password)
            .await?;
        Ok(TokenResponse {
            token: token.token,
            expiration_date: token.expiration,
        })
    }

    pub fn refresh(&self, auth: &AuthBundle) -> LoggedInResponse {
        LoggedInResponse {
            auth: AuthResponse::from(auth),
        }
    }

    /// Delete the caller's account together with everything it owns.
    pub async fn terminate(&self, auth: AuthBundle) -> ServiceResult<LogOutResponse> {
        self.db.delete_user(auth.user.user_id).await?;
        info!("Deleted user {}", auth.user.user_name);
        Ok(LogOutResponse {
            user: auth.user.user_name,
            token: auth.token.token,
        })
    }

    pub async fn list_watches(&self, auth: &AuthBundle) -> ServiceResult<WatchListResponse> {
        let watches = self.db.get_watches(auth.user.user_id).await?;
        let mut out = Vec::with_capacity(watches.len());
        for watch in watches {
            let cycles = self.db.get_cycles(watch.watch_id).await?;
            out.push(WatchElementResponse {
                name: watch.name,
                date_of_creation: watch.date_of_creation,
                cycles,
            });
        }
        Ok(WatchListResponse {
            auth: AuthResponse::from(auth),
            watches: out,
        })
    }

    pub async fn watch_info(
        &self,
        auth: &AuthBundle,
        request: EditWatchMessage,
    ) -> ServiceResult<WatchInfoResponse> {
        let watch = self.watch_by_name(auth, &request.name).await?;
        let info = self.db.get_watch_info(&watch).await?;
        Ok(WatchInfoResponse {
            auth: AuthResponse::from(auth),
            name: info.watch.name,
            date_of_creation: info.watch.date_of_creation,
            cycles: info.cycles,
            total_measures: info.total_measures,
        })
    }

    pub async fn add_watch(
        &self,
        auth: &AuthBundle,
        request: EditWatchMessage,
    ) -> ServiceResult<WatchEditResponse> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::bad_request("Watch name must not be empty."));
        }
        let watch = self
            .db
            .create_watch(auth.user.user_id, name.to_string(), storage_now())
            .await?
            .ok_or_else(|| ServiceError::bad_request(format!("Watch '{name}' already exists.")))?;
        Ok(WatchEditResponse {
            auth: AuthResponse::from(auth),
            name: watch.name,
            date_of_creation: watch.date_of_creation,
        })
    }

    pub async fn delete_watch(
        &self,
        auth: &AuthBundle,
        request: EditWatchMessage,
    ) -> ServiceResult<WatchEditResponse> {
        let watch = self.watch_by_name(auth, &request.name).await?;
        self.db.delete_watch(watch.watch_id).await?;
        info!("User {} deleted watch {}", auth.user.user_name, watch.name);
        Ok(WatchEditResponse {
            auth: AuthResponse::from(auth),
            name: watch.name,
            date_of_creation: watch.date_of_creation,
        })
    }

    /// Raw logs of a cycle with the change from the previous measurement.
    pub async fn list_logs(
        &self,
        auth: &AuthBundle,
        request: SpecifyWatchDataMessage,
    ) -> ServiceResult<LogListResponse> {
        let watch = self.watch_by_name(auth, &request.watch_name).await?;
        let frame = self
            .load_frame(watch.watch_id, request.cycle)
            .await?
            .get_log_with_dif();
        Ok(LogListResponse {
            auth: AuthResponse::from(auth),
            logs: frame.into_rows().into_iter().map(LogResponse::from).collect(),
        })
    }

    /// Statistics over the cycle after filling missing days. Cycles whose
    /// gaps exceed the fill budget are summarised from the raw logs.
    pub async fn stats(
        &self,
        auth: &AuthBundle,
        request: SpecifyWatchDataMessage,
    ) -> ServiceResult<StatsResponse> {
        let watch = self.watch_by_name(auth, &request.watch_name).await?;
        let raw = self.load_frame(watch.watch_id, request.cycle).await?;
        let config = FillConfig::default();
        let missing = raw.missing_units(config.unit);
        if missing > config.max_synthetic_rows {
            warn!(
                "Skipping gap fill for watch {} cycle {}: {missing} rows missing",
                watch.watch_id, request.cycle
            );
        }
        let frame = raw.fill_with(&LinearInterpolation, &config);

        let (average, deviation, delta) = match frame.summary() {
            Ok(stats) => (
                Some(stats.average),
                Some(stats.standard_deviation),
                Some(stats.delta),
            ),
            Err(StatsError::EmptySeries) => (None, None, None),
        };

        Ok(StatsResponse {
            auth: AuthResponse::from(auth),
            average,
            deviation,
            delta,
        })
    }

    pub async fn add_log(
        &self,
        auth: &AuthBundle,
        request: CreateMeasurementMessage,
    ) -> ServiceResult<LogAddedResponse> {
        check_cycle(request.cycle)?;
        if !request.measure.is_finite() {
            return Err(ServiceError::bad_request("Measure must be a finite number."));
        }
        let timedate = match request.datetime.as_deref() {
            Some(raw) => crate::analysis::frame::parse_timestamp(raw).ok_or_else(|| {
                ServiceError::bad_request(format!("Cannot parse datetime '{raw}'."))
            })?,
            None => storage_now(),
        };

        let watch = self.watch_by_name(auth, &request.watch_name).await?;
        let log = self
            .db
            .insert_log(NewLogEntry {
                watch_id: watch.watch_id,
                cycle: request.cycle,
                timedate,
                measure: round_measure(request.measure),
            })
            .await?;

        Ok(LogAddedResponse {
            auth: AuthResponse::from(auth),
            log_id: log.log_id,
            time: log.timedate,
            measure: log.measure,
        })
    }

    pub async fn delete_log(
        &self,
        auth: &AuthBundle,
        request: SpecifyLogDataMessage,
    ) -> ServiceResult<LoggedInResponse> {
        let log = self
            .db
            .get_log_for_user(request.log_id, auth.user.user_id)
            .await?
            .ok_or_else(|| {
                ServiceError::bad_request(format!("Log with id {} does not exist.", request.log_id))
            })?;
        self.db.delete_log(log.log_id).await?;
        Ok(self.refresh(auth))
    }

    /// The cycle number the next tracking period should log under.
    pub async fn new_cycle(
        &self,
        auth: &AuthBundle,
        request: SpecifyWatchMessage,
    ) -> ServiceResult<CycleResponse> {
        let watch = self.watch_by_name(auth, &request.watch_name).await?;
        let cycle = self.db.next_cycle(watch.watch_id).await?;
        Ok(CycleResponse {
            auth: AuthResponse::from(auth),
            watch_name: watch.name,
            cycle,
        })
    }

    pub async fn delete_cycle(
        &self,
        auth: &AuthBundle,
        request: SpecifyWatchDataMessage,
    ) -> ServiceResult<CycleDeletedResponse> {
        let watch = self.watch_by_name(auth, &request.watch_name).await?;
        let deleted = self.db.delete_cycle(watch.watch_id, request.cycle).await?;
        Ok(CycleDeletedResponse {
            auth: AuthResponse::from(auth),
            watch_name: watch.name,
            cycle: request.cycle,
            deleted,
        })
    }

    async fn watch_by_name(&self, auth: &AuthBundle, name: &str) -> ServiceResult<Watch> {
        self.db
            .get_watch_by_name(auth.user.user_id, name.trim())
            .await?
            .ok_or_else(|| ServiceError::bad_request(format!("Watch '{name}' not found.")))
    }

    async fn load_frame(&self, watch_id: i64, cycle: i64) -> ServiceResult<WatchLogFrame> {
        let table = self.db.get_log_table(watch_id, cycle).await?;
        let frame = WatchLogFrame::from_table(&table.columns, table.rows)
            .with_context(|| format!("stored logs of watch {watch_id} cycle {cycle} are malformed"))?;
        Ok(frame)
    }
}
