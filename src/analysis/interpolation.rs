use chrono::{DateTime, Utc};

use crate::analysis::frame::MeasurementRecord;

/// Strategy for estimating a measurement between two known ones.
pub trait Interpolation {
    /// Estimate the value at `at`, where `before.time < at < after.time`.
    fn estimate(&self, before: &MeasurementRecord, after: &MeasurementRecord, at: DateTime<Utc>)
        -> f64;

    /// Build the surrogate record placed at `at`. Surrogates carry no log id.
    fn synthesize(
        &self,
        before: &MeasurementRecord,
        after: &MeasurementRecord,
        at: DateTime<Utc>,
    ) -> MeasurementRecord {
        MeasurementRecord::synthetic(at, self.estimate(before, after, at))
    }
}

/// Straight line between the two bracketing measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolation;

impl Interpolation for LinearInterpolation {
    fn estimate(
        &self,
        before: &MeasurementRecord,
        after: &MeasurementRecord,
        at: DateTime<Utc>,
    ) -> f64 {
        let span_ms = (after.time - before.time).num_milliseconds();
        if span_ms == 0 {
            return before.measure;
        }
        let elapsed_ms = (at - before.time).num_milliseconds();
        before.measure + (after.measure - before.measure) * elapsed_ms as f64 / span_ms as f64
    }
}
