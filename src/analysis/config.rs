use chrono::{DateTime, TimeDelta, Utc};

/// Sampling unit a regular series is expected to have one value per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapUnit {
    #[default]
    Day,
    Hour,
}

impl GapUnit {
    fn seconds(self) -> i64 {
        match self {
            GapUnit::Day => 86_400,
            GapUnit::Hour => 3_600,
        }
    }

    pub fn step(self) -> TimeDelta {
        TimeDelta::seconds(self.seconds())
    }

    /// Number of UTC unit boundaries crossed going from `start` to `end`.
    /// Two readings on the same calendar day are 0 units apart, readings on
    /// consecutive days are 1 unit apart regardless of time of day.
    pub fn units_between(self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        let size = self.seconds();
        end.timestamp().div_euclid(size) - start.timestamp().div_euclid(size)
    }
}

/// Upper bound on interpolated rows in one fill, about 270 years of days.
pub const DEFAULT_MAX_SYNTHETIC_ROWS: u64 = 100_000;

/// Configuration for gap filling.
#[derive(Debug, Clone)]
pub struct FillConfig {
    pub unit: GapUnit,
    /// A fill that would add more rows than this leaves the frame unfilled.
    pub max_synthetic_rows: u64,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            unit: GapUnit::default(),
            max_synthetic_rows: DEFAULT_MAX_SYNTHETIC_ROWS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn day_units_count_calendar_boundaries() {
        assert_eq!(GapUnit::Day.units_between(at(1, 8), at(1, 20)), 0);
        assert_eq!(GapUnit::Day.units_between(at(1, 23), at(2, 1)), 1);
        assert_eq!(GapUnit::Day.units_between(at(1, 8), at(4, 8)), 3);
    }

    #[test]
    fn hour_units_count_hour_boundaries() {
        assert_eq!(GapUnit::Hour.units_between(at(1, 8), at(1, 11)), 3);
        assert_eq!(GapUnit::Hour.step(), TimeDelta::hours(1));
    }
}
