pub mod config;
pub mod frame;
pub mod interpolation;
pub mod stats;

pub use config::{FillConfig, GapUnit};
pub use frame::{
    Cell, DataFormatError, DerivedFields, LogRow, MeasurementRecord, WatchLogFrame,
};
pub use interpolation::{Interpolation, LinearInterpolation};
pub use stats::{FrameStats, StatsError};
