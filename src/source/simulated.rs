//! Simulated orientation source for development without hardware.
//!
//! Produces slowly varying, sine-shaped samples and a calibration status
//! that improves over successive reads, imitating a freshly powered BNO055
//! settling into its self-calibration.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::{
    CalibrationStatus, ConnectError, EulerAngles, OrientationSource, Quaternion,
    RawOrientationSample, ReadError, Vector3,
};
use crate::angles::normalize_deg;

/// Reads needed before a channel gains one calibration level.
const READS_PER_CALIB_LEVEL: u64 = 20;
/// The magnetometer settles slower than the inertial channels.
const MAG_READS_PER_LEVEL: u64 = 35;

/// Cloneable hook that makes the paired source fail its next N reads, even
/// after the source has been moved into a running service.
#[derive(Clone)]
pub struct FailureInjector {
    pending: Arc<AtomicU32>,
}

impl FailureInjector {
    pub fn inject(&self, n: u32) {
        self.pending.store(n, Ordering::SeqCst);
    }
}

pub struct SimulatedOrientationSource {
    connected: bool,
    started: Instant,
    reads: u64,
    base_yaw: f64,
    fail_next_reads: Arc<AtomicU32>,
}

impl SimulatedOrientationSource {
    pub fn new() -> Self {
        Self {
            connected: false,
            started: Instant::now(),
            reads: 0,
            base_yaw: 90.0,
            fail_next_reads: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Start the synthetic drift from a given heading.
    pub fn with_base_yaw(base_yaw: f64) -> Self {
        Self {
            base_yaw: normalize_deg(base_yaw),
            ..Self::new()
        }
    }

    /// Make the next `n` reads fail, then recover.
    pub fn inject_read_failures(&mut self, n: u32) {
        self.fail_next_reads.store(n, Ordering::SeqCst);
    }

    pub fn failure_injector(&self) -> FailureInjector {
        FailureInjector {
            pending: Arc::clone(&self.fail_next_reads),
        }
    }

    fn synthetic_status(&self) -> CalibrationStatus {
        let level = |per: u64| -> u8 { (self.reads / per).min(3) as u8 };
        CalibrationStatus::new(
            level(READS_PER_CALIB_LEVEL),
            level(READS_PER_CALIB_LEVEL),
            level(READS_PER_CALIB_LEVEL / 2),
            level(MAG_READS_PER_LEVEL),
        )
    }
}

impl Default for SimulatedOrientationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationSource for SimulatedOrientationSource {
    fn connect(&mut self) -> Result<(), ConnectError> {
        self.connected = true;
        self.started = Instant::now();
        Ok(())
    }

    fn read(&mut self) -> Result<RawOrientationSample, ReadError> {
        if !self.connected {
            return Err(ReadError::NotConnected);
        }
        if self.fail_next_reads.load(Ordering::SeqCst) > 0 {
            self.fail_next_reads.fetch_sub(1, Ordering::SeqCst);
            return Err(ReadError::Injected);
        }

        self.reads += 1;
        let t = self.started.elapsed().as_secs_f64();

        // Slow wander: a few degrees of sway plus a gentle steady turn
        let yaw = normalize_deg(self.base_yaw + 3.0 * (t * 0.2 * 2.0 * PI).sin() + 0.5 * t);
        let roll = 0.8 * (t * 0.7).sin();
        let pitch = 0.5 * (t * 0.4).cos();

        let half_yaw = (yaw.to_radians()) / 2.0;

        Ok(RawOrientationSample {
            timestamp: t,
            euler: EulerAngles { roll, pitch, yaw },
            quaternion: Some(Quaternion {
                w: half_yaw.cos(),
                x: 0.0,
                y: 0.0,
                z: half_yaw.sin(),
            }),
            accel: Vector3 {
                x: 0.2 * (t * 2.0 * PI).sin(),
                y: 0.1 * (t * 2.0 * PI).cos(),
                z: 9.81,
            },
            gyro: Vector3 {
                x: 0.0,
                y: 0.0,
                z: 0.5 + 0.3 * (t * 0.5).sin(),
            },
            calibration_status: self.synthetic_status(),
            temperature: 26.5 + 0.01 * t,
        })
    }

    fn hardware_calibration_status(&mut self) -> CalibrationStatus {
        self.synthetic_status()
    }
}
