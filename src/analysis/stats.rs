use serde::Serialize;
use thiserror::Error;

use crate::analysis::frame::WatchLogFrame;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// Mean and deviation divide by the row count.
    #[error("statistics are undefined for an empty series")]
    EmptySeries,
}

/// Aggregates over a frame's values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStats {
    pub average: f64,
    pub standard_deviation: f64,
    pub delta: f64,
}

impl WatchLogFrame {
    pub fn average(&self) -> Result<f64, StatsError> {
        if self.is_empty() {
            return Err(StatsError::EmptySeries);
        }
        Ok(self.values().sum::<f64>() / self.len() as f64)
    }

    /// Sample standard deviation (N - 1 denominator). A single value has no
    /// spread and yields 0.0.
    pub fn standard_deviation(&self) -> Result<f64, StatsError> {
        let average = self.average()?;
        if self.len() < 2 {
            return Ok(0.0);
        }
        let squares: f64 = self.values().map(|value| (value - average).powi(2)).sum();
        Ok((squares / (self.len() - 1) as f64).sqrt())
    }

    /// Last value minus first value.
    pub fn delta(&self) -> Result<f64, StatsError> {
        match (self.rows().first(), self.rows().last()) {
            (Some(first), Some(last)) => Ok(last.record.measure - first.record.measure),
            _ => Err(StatsError::EmptySeries),
        }
    }

    pub fn summary(&self) -> Result<FrameStats, StatsError> {
        Ok(FrameStats {
            average: self.average()?,
            standard_deviation: self.standard_deviation()?,
            delta: self.delta()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frame::MeasurementRecord;
    use crate::analysis::interpolation::LinearInterpolation;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn series(values: &[(i64, f64)]) -> WatchLogFrame {
        let origin = Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap();
        WatchLogFrame::from_records(values.iter().enumerate().map(|(id, &(days, value))| {
            MeasurementRecord::new(id as i64 + 1, origin + TimeDelta::days(days), value)
        }))
    }

    #[test]
    fn summary_of_regular_series() {
        let stats = series(&[(0, 10.0), (1, 20.0), (2, 30.0), (3, 40.0)])
            .summary()
            .unwrap();
        assert_eq!(stats.average, 25.0);
        assert_eq!(stats.delta, 30.0);
        assert!((stats.standard_deviation - 12.909944).abs() < 1e-6);
    }

    #[test]
    fn summary_runs_over_filled_series() {
        let filled = series(&[(0, 10.0), (3, 40.0)]).fill(&LinearInterpolation);
        let stats = filled.summary().unwrap();
        assert_eq!(filled.len(), 4);
        assert_eq!(stats.average, 25.0);
        assert_eq!(stats.delta, 30.0);
        assert!((stats.standard_deviation - 12.909944).abs() < 1e-6);
    }

    #[test]
    fn empty_series_reports_no_data() {
        let empty = WatchLogFrame::default();
        assert_eq!(empty.average(), Err(StatsError::EmptySeries));
        assert_eq!(empty.standard_deviation(), Err(StatsError::EmptySeries));
        assert_eq!(empty.delta(), Err(StatsError::EmptySeries));
        assert_eq!(empty.summary(), Err(StatsError::EmptySeries));
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = series(&[(0, 71.4)]).summary().unwrap();
        assert_eq!(stats.average, 71.4);
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.delta, 0.0);
    }

    #[test]
    fn delta_can_be_negative() {
        assert_eq!(series(&[(0, 80.0), (1, 79.5), (2, 78.0)]).delta(), Ok(-2.0));
    }
}
