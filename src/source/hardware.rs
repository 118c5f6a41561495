//! Real-sensor source: a thin assembly layer over an externally owned bus.
//!
//! The serial/I2C transport for the physical IMU lives outside this crate;
//! it plugs in through [`SensorBus`]. This layer only assembles samples,
//! validates ranges, and maps bus faults into the service error taxonomy.

use log::debug;

use super::{
    CalibrationStatus, ConnectError, EulerAngles, OrientationSource, Quaternion,
    RawOrientationSample, ReadError, Vector3,
};
use crate::angles::normalize_deg;

/// Transport contract owned by the external driver collaborator.
///
/// Implementations must bound every call with their own timeout; a call that
/// exceeds it returns `Err`, never blocks indefinitely.
pub trait SensorBus: Send {
    fn open(&mut self) -> Result<(), String>;
    /// Monotonic seconds.
    fn timestamp(&mut self) -> f64;
    /// (roll, pitch, yaw) in degrees. `None` components mean a dropped frame.
    fn euler(&mut self) -> Result<Option<(f64, f64, f64)>, String>;
    fn quaternion(&mut self) -> Result<Option<(f64, f64, f64, f64)>, String>;
    /// m/s².
    fn acceleration(&mut self) -> Result<(f64, f64, f64), String>;
    /// deg/s.
    fn gyro(&mut self) -> Result<(f64, f64, f64), String>;
    /// (sys, gyro, accel, mag), each 0..=3.
    fn calibration_status(&mut self) -> Result<(u8, u8, u8, u8), String>;
    /// °C.
    fn temperature(&mut self) -> Result<f64, String>;
}

pub struct HardwareOrientationSource<B: SensorBus> {
    bus: B,
    connected: bool,
}

impl<B: SensorBus> HardwareOrientationSource<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            connected: false,
        }
    }
}

impl<B: SensorBus> OrientationSource for HardwareOrientationSource<B> {
    fn connect(&mut self) -> Result<(), ConnectError> {
        self.bus.open().map_err(ConnectError::Bus)?;
        // A sensor that cannot report its calibration status is not talking
        self.bus
            .calibration_status()
            .map_err(|_| ConnectError::NoResponse)?;
        self.connected = true;
        debug!("hardware orientation source connected");
        Ok(())
    }

    fn read(&mut self) -> Result<RawOrientationSample, ReadError> {
        if !self.connected {
            return Err(ReadError::NotConnected);
        }

        let timestamp = self.bus.timestamp();
        let (roll, pitch, yaw) = self
            .bus
            .euler()
            .map_err(ReadError::Bus)?
            .ok_or_else(|| ReadError::OutOfRange("dropped euler frame".into()))?;

        if !yaw.is_finite() || !roll.is_finite() || !pitch.is_finite() {
            return Err(ReadError::OutOfRange(format!(
                "non-finite euler ({roll}, {pitch}, {yaw})"
            )));
        }

        let quaternion = self
            .bus
            .quaternion()
            .map_err(ReadError::Bus)?
            .map(|(w, x, y, z)| Quaternion { w, x, y, z });

        let (ax, ay, az) = self.bus.acceleration().map_err(ReadError::Bus)?;
        let (gx, gy, gz) = self.bus.gyro().map_err(ReadError::Bus)?;
        let (sys, gyr, acc, mag) = self.bus.calibration_status().map_err(ReadError::Bus)?;
        let temperature = self.bus.temperature().map_err(ReadError::Bus)?;

        Ok(RawOrientationSample {
            timestamp,
            euler: EulerAngles {
                roll,
                pitch,
                yaw: normalize_deg(yaw),
            },
            quaternion,
            accel: Vector3 {
                x: ax,
                y: ay,
                z: az,
            },
            gyro: Vector3 {
                x: gx,
                y: gy,
                z: gz,
            },
            calibration_status: CalibrationStatus::new(sys, gyr, acc, mag),
            temperature,
        })
    }

    fn hardware_calibration_status(&mut self) -> CalibrationStatus {
        match self.bus.calibration_status() {
            Ok((sys, gyro, accel, mag)) => CalibrationStatus::new(sys, gyro, accel, mag),
            Err(_) => CalibrationStatus::new(0, 0, 0, 0),
        }
    }
}
