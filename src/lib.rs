//! Two-stage heading calibration and runtime yaw service.
//!
//! Stage 1 is the inertial sensor's own self-calibration, monitored by
//! [`hardware_calibration`]. Stage 2 is a venue-specific angular offset
//! (mounting angle, magnetic declination, local interference) produced
//! offline by one of three operator-guided [`calibration`] strategies and
//! applied at runtime by [`service::OrientationService`], which publishes a
//! calibrated yaw the control loop can read without ever stalling.

pub mod angles;
pub mod calibration;
pub mod config;
pub mod corrector;
pub mod hardware_calibration;
pub mod service;
pub mod source;

pub use calibration::{
    CalibrationMethod, CalibrationRecord, CalibrationStore, CalibrationStrategy, ReferencePoint,
};
pub use config::{AppConfig, ConfigError, SourceKind};
pub use corrector::YawCorrector;
pub use hardware_calibration::{HardwareCalibrationMonitor, HardwareCalibrationState};
pub use service::{CalibratedOrientation, OrientationHandle, OrientationService, ServiceState};
pub use source::{OrientationSource, RawOrientationSample};
