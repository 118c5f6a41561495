//! Runtime orientation service.
//!
//! Single writer: the service loop polls the source at a fixed cadence,
//! judges hardware calibration, applies the active Stage-2 correction, and
//! publishes the latest calibrated orientation. Consumers hold a cheap
//! [`OrientationHandle`] with latest-value-wins semantics; no sample history
//! is kept. Calibration selection happens once at startup; a record that
//! changes on disk afterwards takes effect only after a service restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::calibration::{CalibrationMethod, CalibrationRecord, CalibrationStore};
use crate::config::AppConfig;
use crate::corrector::YawCorrector;
use crate::hardware_calibration::{CalibrationQuality, HardwareCalibrationMonitor};
use crate::source::{ConnectError, OrientationSource};

/// Delay between bounded connect attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);
/// A sample older than this many nominal intervals is stale.
const STALE_INTERVAL_FACTOR: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Disconnected,
    Connecting,
    Running,
    Degraded,
    Stopped,
}

/// Output of one poll cycle; recomputed every cycle, never persisted.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CalibratedOrientation {
    /// Monotonic seconds, from the producing sample.
    pub timestamp: f64,
    /// Degrees, [0, 360), Stage-2 correction applied.
    pub yaw: f64,
    pub roll: f64,
    pub pitch: f64,
    pub is_hardware_calibrated: bool,
    pub correction_applied: Option<CalibrationMethod>,
}

/// Runtime query surface exposed to the control loop.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OrientationStatus {
    pub state: ServiceState,
    pub is_hardware_calibrated: bool,
    pub active_correction: Option<CalibrationMethod>,
    pub is_stale: bool,
}

struct Shared {
    latest: Option<CalibratedOrientation>,
    state: ServiceState,
    active_correction: Option<CalibrationMethod>,
    last_good: Option<Instant>,
}

/// Read-only view of the service; clone freely, including into the control
/// loop. Always answers, even when the sensor is down.
#[derive(Clone)]
pub struct OrientationHandle {
    shared: Arc<Mutex<Shared>>,
    stale_after: Duration,
}

impl OrientationHandle {
    /// Latest calibrated yaw in degrees, [0, 360). Before the first sample
    /// (or under persistent failure) this is the last good value, or 0.0 if
    /// none ever arrived; the control loop never sees an error.
    pub fn get_calibrated_yaw(&self) -> f64 {
        let shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.latest.map(|o| o.yaw).unwrap_or(0.0)
    }

    pub fn status(&self) -> OrientationStatus {
        let shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        let is_stale = match shared.last_good {
            Some(at) => at.elapsed() > self.stale_after,
            None => true,
        };
        OrientationStatus {
            state: shared.state,
            is_hardware_calibrated: shared.latest.map(|o| o.is_hardware_calibrated).unwrap_or(false),
            active_correction: shared.active_correction,
            is_stale,
        }
    }

    /// Full latest output, if any cycle has completed yet.
    pub fn snapshot(&self) -> Option<CalibratedOrientation> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner()).latest
    }
}

/// Cooperative shutdown: the loop checks the flag once per cycle.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

pub struct OrientationService {
    source: Box<dyn OrientationSource>,
    store: CalibrationStore,
    sample_interval: Duration,
    connect_retries: u32,
    read_failure_threshold: u32,
    shared: Arc<Mutex<Shared>>,
    stop: Arc<AtomicBool>,
}

impl OrientationService {
    pub fn new(source: Box<dyn OrientationSource>, store: CalibrationStore, config: &AppConfig) -> Self {
        Self {
            source,
            store,
            sample_interval: config.sample_interval(),
            connect_retries: config.connect_retries,
            read_failure_threshold: config.read_failure_threshold,
            shared: Arc::new(Mutex::new(Shared {
                latest: None,
                state: ServiceState::Disconnected,
                active_correction: None,
                last_good: None,
            })),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> OrientationHandle {
        OrientationHandle {
            shared: Arc::clone(&self.shared),
            stale_after: self.sample_interval * STALE_INTERVAL_FACTOR,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    fn set_state(&self, state: ServiceState) {
        self.shared.lock().unwrap_or_else(|e| e.into_inner()).state = state;
    }

    /// Bounded connect attempts; failure after the last retry is fatal to
    /// the caller, the control loop never starts on a dead sensor.
    async fn connect(&mut self) -> Result<(), ConnectError> {
        self.set_state(ServiceState::Connecting);
        let attempts = self.connect_retries.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.source.connect() {
                Ok(()) => {
                    info!("orientation source connected (attempt {attempt}/{attempts})");
                    return Ok(());
                }
                Err(e) => {
                    warn!("connect attempt {attempt}/{attempts} failed: {e}");
                    last_err = Some(e);
                    if attempt < attempts {
                        sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        }
        self.set_state(ServiceState::Stopped);
        Err(last_err.expect("at least one connect attempt was made"))
    }

    /// Connect, select the Stage-2 record, then poll until stopped.
    pub async fn run(mut self) -> Result<(), ConnectError> {
        self.connect().await?;

        // Startup-only file I/O; the polling cycle below never touches disk
        let record: Option<CalibrationRecord> = self.store.load_best();
        if record.is_none() {
            warn!(
                "no course calibration record in {}; running uncorrected (offset 0)",
                self.store.dir().display()
            );
        }
        {
            let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
            shared.active_correction = record.as_ref().map(|r| r.method);
            shared.state = ServiceState::Running;
        }

        let mut ticker = interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stale_after = self.sample_interval * STALE_INTERVAL_FACTOR;

        let mut consecutive_failures: u32 = 0;
        let mut last_quality: Option<CalibrationQuality> = None;

        loop {
            ticker.tick().await;

            if self.stop.load(Ordering::SeqCst) {
                info!("stop requested, shutting down orientation service");
                self.set_state(ServiceState::Stopped);
                break;
            }

            match self.source.read() {
                Ok(sample) => {
                    let hw = HardwareCalibrationMonitor::evaluate(sample.calibration_status);
                    let quality = HardwareCalibrationMonitor::quality(sample.calibration_status);
                    if last_quality != Some(quality) {
                        info!(
                            "hardware calibration {}",
                            HardwareCalibrationMonitor::format_status(sample.calibration_status)
                        );
                        last_quality = Some(quality);
                    }

                    let yaw = YawCorrector::apply(sample.euler.yaw, record.as_ref());
                    let output = CalibratedOrientation {
                        timestamp: sample.timestamp,
                        yaw,
                        roll: sample.euler.roll,
                        pitch: sample.euler.pitch,
                        is_hardware_calibrated: hw.is_fully_calibrated,
                        correction_applied: record.as_ref().map(|r| r.method),
                    };

                    let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
                    if shared.state == ServiceState::Degraded {
                        info!(
                            "sensor recovered after {} consecutive read failures",
                            consecutive_failures
                        );
                    }
                    shared.latest = Some(output);
                    shared.last_good = Some(Instant::now());
                    shared.state = ServiceState::Running;
                    consecutive_failures = 0;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    debug!("read failure {consecutive_failures}: {e}");
                    let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
                    // Degrade on either trigger: too many consecutive
                    // failures, or the published sample has gone stale
                    let output_stale = shared
                        .last_good
                        .is_some_and(|at| at.elapsed() > stale_after);
                    if consecutive_failures > self.read_failure_threshold || output_stale {
                        if shared.state == ServiceState::Running {
                            error!(
                                "degrading after {} consecutive read failures \
                                 (threshold {}, output stale: {}); \
                                 last good yaw stays published",
                                consecutive_failures, self.read_failure_threshold, output_stale
                            );
                        }
                        shared.state = ServiceState::Degraded;
                    }
                }
            }
        }

        Ok(())
    }
}
