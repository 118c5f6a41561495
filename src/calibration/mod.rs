//! Stage-2 (environment) calibration: records, persistence, strategies.

pub mod record;
pub mod store;
pub mod strategy;

pub use record::{CalibrationMethod, CalibrationRecord, ReferencePoint};
pub use store::{CalibrationStore, StoreError};
pub use strategy::{
    CalibrationError, CalibrationStrategy, LandmarkCalibration, TwoPointCalibration,
    VisualMapCalibration,
};
