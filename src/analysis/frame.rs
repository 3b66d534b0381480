//! Watch log frame.
//!
//! An in-memory, time-ordered table of the measurements logged for one watch
//! and one cycle. Frames are built once per request and never persisted;
//! every transformation returns a new frame and leaves its input untouched.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::config::{FillConfig, GapUnit};
use crate::analysis::interpolation::Interpolation;

/// Column names accepted for the timestamp column of a table.
pub const TIMESTAMP_COLUMNS: [&str; 4] = ["datetime", "timedate", "time", "timestamp"];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Years that survive an RFC 3339 round trip through storage and sort
/// correctly as text.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// One logged observation. `log_id` is `None` for interpolated rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub log_id: Option<i64>,
    pub time: DateTime<Utc>,
    pub measure: f64,
}

impl MeasurementRecord {
    pub fn new(log_id: i64, time: DateTime<Utc>, measure: f64) -> Self {
        Self {
            log_id: Some(log_id),
            time,
            measure,
        }
    }

    pub fn synthetic(time: DateTime<Utc>, measure: f64) -> Self {
        Self {
            log_id: None,
            time,
            measure,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.log_id.is_none()
    }
}

/// Values computed from neighbouring rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    /// Change from the previous row. Absent on the first row.
    pub difference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub record: MeasurementRecord,
    pub derived: DerivedFields,
}

impl From<MeasurementRecord> for LogRow {
    fn from(record: MeasurementRecord) -> Self {
        Self {
            record,
            derived: DerivedFields::default(),
        }
    }
}

/// A raw table cell handed to [`WatchLogFrame::from_table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    fn kind(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Integer(_) => "integer",
            Cell::Real(_) => "real",
            Cell::Text(_) => "text",
            Cell::Timestamp(_) => "timestamp",
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Timestamp(value)
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Cell::Null, Cell::Integer)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataFormatError {
    #[error("missing column `{0}`")]
    MissingColumn(&'static str),
    #[error("unexpected column `{0}`")]
    UnexpectedColumn(String),
    #[error("column `{0}` declared more than once")]
    DuplicateColumn(String),
    #[error("row {row}: expected {expected} cells, found {found}")]
    Arity {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}: cannot parse timestamp `{value}`")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: column `{column}` cannot hold a {found} value")]
    CellType {
        row: usize,
        column: &'static str,
        found: &'static str,
    },
}

/// Positions of the three required columns within a row.
struct ColumnLayout {
    log_id: usize,
    time: usize,
    measure: usize,
    width: usize,
}

impl ColumnLayout {
    fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Self, DataFormatError> {
        let mut log_id = None;
        let mut time = None;
        let mut measure = None;

        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let slot = match name {
                "log_id" => &mut log_id,
                "measure" => &mut measure,
                other if TIMESTAMP_COLUMNS.contains(&other) => &mut time,
                other => return Err(DataFormatError::UnexpectedColumn(other.to_string())),
            };
            if slot.replace(index).is_some() {
                return Err(DataFormatError::DuplicateColumn(name.to_string()));
            }
        }

        Ok(Self {
            log_id: log_id.ok_or(DataFormatError::MissingColumn("log_id"))?,
            time: time.ok_or(DataFormatError::MissingColumn("datetime"))?,
            measure: measure.ok_or(DataFormatError::MissingColumn("measure"))?,
            width: names.len(),
        })
    }

    fn record(&self, row: usize, cells: &[Cell]) -> Result<MeasurementRecord, DataFormatError> {
        if cells.len() != self.width {
            return Err(DataFormatError::Arity {
                row,
                expected: self.width,
                found: cells.len(),
            });
        }

        let log_id = match &cells[self.log_id] {
            Cell::Integer(id) => Some(*id),
            Cell::Null => None,
            other => {
                return Err(DataFormatError::CellType {
                    row,
                    column: "log_id",
                    found: other.kind(),
                })
            }
        };

        let time = match &cells[self.time] {
            Cell::Timestamp(time) => *time,
            Cell::Text(raw) => parse_timestamp(raw).ok_or_else(|| DataFormatError::Timestamp {
                row,
                value: raw.clone(),
            })?,
            other => {
                return Err(DataFormatError::CellType {
                    row,
                    column: "datetime",
                    found: other.kind(),
                })
            }
        };

        let measure = match &cells[self.measure] {
            Cell::Real(value) => *value,
            Cell::Integer(value) => *value as f64,
            other => {
                return Err(DataFormatError::CellType {
                    row,
                    column: "measure",
                    found: other.kind(),
                })
            }
        };

        Ok(MeasurementRecord {
            log_id,
            time,
            measure,
        })
    }
}

/// Parse RFC 3339, or a naive date/datetime taken to be UTC. Years outside
/// `0000..=9999` are rejected.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_any_timestamp(raw.trim()).filter(|time| STORABLE_YEARS.contains(&time.year()))
}

fn parse_any_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchLogFrame {
    rows: Vec<LogRow>,
}

impl WatchLogFrame {
    /// Build a frame from a flat table of `(log_id, timestamp, measure)` rows.
    ///
    /// Rows keep their input order. Callers hand over rows already sorted by
    /// time; the frame does not re-sort them.
    pub fn from_table<S: AsRef<str>>(
        column_names: &[S],
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, DataFormatError> {
        let layout = ColumnLayout::resolve(column_names)?;
        let rows = rows
            .iter()
            .enumerate()
            .map(|(index, cells)| layout.record(index, cells).map(LogRow::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = MeasurementRecord>,
    {
        Self {
            rows: records.into_iter().map(LogRow::from).collect(),
        }
    }

    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LogRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.record.measure)
    }

    /// Copy of the frame with `difference` set on every row after the first.
    pub fn get_log_with_dif(&self) -> Self {
        let mut previous: Option<f64> = None;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let current = row.record.measure;
                let mut row = row.clone();
                row.derived.difference = previous.map(|prior| current - prior);
                previous = Some(current);
                row
            })
            .collect();
        Self { rows }
    }

    /// Insert one estimated row per missing day between neighbouring rows.
    pub fn fill<I>(&self, strategy: &I) -> Self
    where
        I: Interpolation + ?Sized,
    {
        self.fill_with(strategy, &FillConfig::default())
    }

    /// Like [`WatchLogFrame::fill`] with an explicit unit and row budget.
    ///
    /// When the gaps add up to more than `config.max_synthetic_rows` missing
    /// units, no row is synthesized and the frame comes back unchanged.
    pub fn fill_with<I>(&self, strategy: &I, config: &FillConfig) -> Self
    where
        I: Interpolation + ?Sized,
    {
        // A slope needs two points.
        if self.rows.len() < 2 {
            return self.clone();
        }

        let missing_total = self.missing_units(config.unit);
        if missing_total > config.max_synthetic_rows {
            return self.clone();
        }

        let step = config.unit.step();
        let mut rows = Vec::with_capacity(self.rows.len() + missing_total as usize);
        for pair in self.rows.windows(2) {
            let (before, after) = (&pair[0].record, &pair[1].record);
            rows.push(pair[0].clone());

            let mut at = before.time;
            for _ in 1..config.unit.units_between(before.time, after.time) {
                at += step;
                rows.push(LogRow::from(strategy.synthesize(before, after, at)));
            }
        }
        if let Some(last) = self.rows.last() {
            rows.push(last.clone());
        }

        Self { rows }
    }

    /// Number of rows a fill in `unit` would synthesize.
    pub fn missing_units(&self, unit: GapUnit) -> u64 {
        self.rows
            .windows(2)
            .map(|pair| {
                let gap = unit.units_between(pair[0].record.time, pair[1].record.time);
                u64::try_from(gap - 1).unwrap_or(0)
            })
            .fold(0, u64::saturating_add)
    }
}
