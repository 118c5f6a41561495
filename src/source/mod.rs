//! Orientation sources: the seam between the runtime service and whatever
//! produces raw inertial samples (real BNO055-class sensor or a simulator).

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod hardware;
pub mod simulated;

pub use hardware::{HardwareOrientationSource, SensorBus};
pub use simulated::{FailureInjector, SimulatedOrientationSource};

/// Per-channel self-calibration level reported by the sensor, each 0..=3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationStatus {
    pub sys: u8,
    pub gyro: u8,
    pub accel: u8,
    pub mag: u8,
}

impl CalibrationStatus {
    pub fn new(sys: u8, gyro: u8, accel: u8, mag: u8) -> Self {
        Self {
            sys: sys.min(3),
            gyro: gyro.min(3),
            accel: accel.min(3),
            mag: mag.min(3),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    /// Heading in degrees, canonical range [0, 360).
    pub yaw: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One raw sensor reading. Immutable once produced; the service owns each
/// sample for exactly one poll cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawOrientationSample {
    /// Monotonic seconds.
    pub timestamp: f64,
    /// Degrees.
    pub euler: EulerAngles,
    /// Full attitude for consumers that need more than yaw.
    pub quaternion: Option<Quaternion>,
    /// m/s².
    pub accel: Vector3,
    /// deg/s.
    pub gyro: Vector3,
    pub calibration_status: CalibrationStatus,
    /// °C.
    pub temperature: f64,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("sensor bus open failed: {0}")]
    Bus(String),
    #[error("sensor did not respond to identification")]
    NoResponse,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("sensor read timed out")]
    Timeout,
    #[error("sensor bus fault: {0}")]
    Bus(String),
    #[error("sample out of range: {0}")]
    OutOfRange(String),
    #[error("source not connected")]
    NotConnected,
    #[error("injected failure")]
    Injected,
}

/// Abstraction over a live or simulated inertial sensor.
///
/// `read()` may block up to the transport's bounded timeout; exceeding it is
/// a `ReadError`, never a hang. Both implementations honor the same timing
/// and value-range contracts so the service is agnostic to which is active.
pub trait OrientationSource: Send {
    fn connect(&mut self) -> Result<(), ConnectError>;
    fn read(&mut self) -> Result<RawOrientationSample, ReadError>;
    fn hardware_calibration_status(&mut self) -> CalibrationStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_clamps_to_sensor_range() {
        let s = CalibrationStatus::new(7, 3, 2, 9);
        assert_eq!(s.sys, 3);
        assert_eq!(s.gyro, 3);
        assert_eq!(s.accel, 2);
        assert_eq!(s.mag, 3);
    }
}
