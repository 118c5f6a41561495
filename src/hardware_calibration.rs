//! Stage-1 (hardware) calibration monitoring.
//!
//! The BNO055-class sensor self-calibrates gyro drift, accelerometer offset
//! and magnetometer interference, and reports a 0..=3 level per channel.
//! This module turns that status into a go/no-go judgement plus a
//! human-readable label used only for observability.

use serde::Serialize;

use crate::source::CalibrationStatus;

/// Required level for the system fusion channel.
pub const FULL_SYS_LEVEL: u8 = 3;
/// Required level for the gyroscope channel.
pub const FULL_GYRO_LEVEL: u8 = 3;
/// Required level for the accelerometer channel.
pub const FULL_ACCEL_LEVEL: u8 = 3;
/// Required level for the magnetometer channel. Deliberately lower: the
/// magnetometer rarely saturates to 3 away from a figure-eight wave, and
/// level 2 is sufficient for heading work.
pub const FULL_MAG_LEVEL: u8 = 2;

/// Derived view of the sensor's internal calibration; recomputed per sample.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct HardwareCalibrationState {
    pub status: CalibrationStatus,
    pub is_fully_calibrated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CalibrationQuality {
    pub fn label(&self) -> &'static str {
        match self {
            CalibrationQuality::Excellent => "Excellent",
            CalibrationQuality::Good => "Good",
            CalibrationQuality::Fair => "Fair",
            CalibrationQuality::Poor => "Poor",
        }
    }
}

/// Pure, stateless judge of the sensor's internal calibration readiness.
pub struct HardwareCalibrationMonitor;

impl HardwareCalibrationMonitor {
    pub fn evaluate(status: CalibrationStatus) -> HardwareCalibrationState {
        let is_fully_calibrated = status.sys >= FULL_SYS_LEVEL
            && status.gyro >= FULL_GYRO_LEVEL
            && status.accel >= FULL_ACCEL_LEVEL
            && status.mag >= FULL_MAG_LEVEL;
        HardwareCalibrationState {
            status,
            is_fully_calibrated,
        }
    }

    /// Qualitative label for logs and the operator. Never used for control
    /// decisions.
    pub fn quality(status: CalibrationStatus) -> CalibrationQuality {
        if status.sys == 3 && status.gyro == 3 && status.accel == 3 && status.mag == 3 {
            CalibrationQuality::Excellent
        } else if Self::evaluate(status).is_fully_calibrated {
            CalibrationQuality::Good
        } else if status.sys >= 2 && status.gyro >= 2 {
            CalibrationQuality::Fair
        } else {
            CalibrationQuality::Poor
        }
    }

    /// One-line status for periodic log output.
    pub fn format_status(status: CalibrationStatus) -> String {
        format!(
            "S{} G{} A{} M{} ({})",
            status.sys,
            status.gyro,
            status.accel,
            status.mag,
            Self::quality(status).label()
        )
    }
}
