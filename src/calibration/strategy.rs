//! The three interchangeable environment-correction procedures.
//!
//! Each strategy takes operator-supplied reference points (pairs of measured
//! raw yaw and true target bearing, degrees) and fits a single additive
//! offset such that `normalize(measured + offset) ≈ target` for every pair.
//! All differencing is shortest-arc; naive subtraction near the wraparound
//! would fabricate a >180° error.

use log::info;
use thiserror::Error;

use crate::angles::{angular_distance_deg, circular_mean_deg, normalize_deg, shortest_arc_deg};

use super::record::{CalibrationMethod, CalibrationRecord, ReferencePoint};

/// Minimum shortest-arc separation between the two measured yaws of a
/// two-point run. Near-duplicate points make the fit numerically unstable.
pub const MIN_TWO_POINT_SEPARATION_DEG: f64 = 30.0;

/// Maximum acceptable residual for landmark/visual fits. A larger residual
/// means the operator's reference picks contradict each other.
pub const MAX_RESIDUAL_TOLERANCE_DEG: f64 = 5.0;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("need at least {required} reference points, got {got}")]
    NotEnoughPoints { required: usize, got: usize },
    #[error(
        "measured yaws are only {separation_deg:.1} deg apart \
         (minimum {MIN_TWO_POINT_SEPARATION_DEG} deg); rotate the vehicle further"
    )]
    InsufficientSeparation { separation_deg: f64 },
    #[error(
        "reference points disagree: max residual {max_residual_deg:.2} deg \
         exceeds tolerance {MAX_RESIDUAL_TOLERANCE_DEG} deg; redo the measurement"
    )]
    LowAgreement { max_residual_deg: f64 },
}

/// Shared contract over the three procedures.
pub trait CalibrationStrategy {
    fn method(&self) -> CalibrationMethod;

    /// Fit one offset from the given points. No record is written on error.
    fn compute(&self, points: &[ReferencePoint]) -> Result<CalibrationRecord, CalibrationError>;
}

/// Per-point offset candidates, shortest-arc.
fn point_offsets(points: &[ReferencePoint]) -> Vec<f64> {
    points
        .iter()
        .map(|p| shortest_arc_deg(p.measured_raw_yaw, p.target_bearing))
        .collect()
}

/// Largest deviation of any point from the fitted offset.
fn max_residual_deg(points: &[ReferencePoint], offset: f64) -> f64 {
    points
        .iter()
        .map(|p| angular_distance_deg(normalize_deg(p.measured_raw_yaw + offset), p.target_bearing))
        .fold(0.0, f64::max)
}

/// Canonical procedure: measure, rotate the vehicle 180° in place, measure
/// again. Exactly two points.
pub struct TwoPointCalibration;

impl CalibrationStrategy for TwoPointCalibration {
    fn method(&self) -> CalibrationMethod {
        CalibrationMethod::TwoPoint
    }

    fn compute(&self, points: &[ReferencePoint]) -> Result<CalibrationRecord, CalibrationError> {
        if points.len() != 2 {
            return Err(CalibrationError::NotEnoughPoints {
                required: 2,
                got: points.len(),
            });
        }

        let separation =
            angular_distance_deg(points[0].measured_raw_yaw, points[1].measured_raw_yaw);
        if separation < MIN_TWO_POINT_SEPARATION_DEG {
            return Err(CalibrationError::InsufficientSeparation {
                separation_deg: separation,
            });
        }

        let offset = circular_mean_deg(&point_offsets(points));
        let residual = max_residual_deg(points, offset);
        info!(
            "two-point fit: offset {:+.2} deg, residual {:.2} deg (nominal band +/-{} deg)",
            offset,
            residual,
            self.method().nominal_precision_deg()
        );

        Ok(CalibrationRecord::new(
            self.method(),
            offset,
            residual,
            points.to_vec(),
        ))
    }
}

/// Fit against two or more operator-entered landmark bearings. Rejects
/// contradictory picks instead of averaging them away.
pub struct LandmarkCalibration;

/// Shared numeric core of the landmark and visual-map fits.
fn fit_landmarks(
    method: CalibrationMethod,
    points: &[ReferencePoint],
) -> Result<CalibrationRecord, CalibrationError> {
    if points.len() < 2 {
        return Err(CalibrationError::NotEnoughPoints {
            required: 2,
            got: points.len(),
        });
    }

    let offset = circular_mean_deg(&point_offsets(points));
    let residual = max_residual_deg(points, offset);
    if residual > MAX_RESIDUAL_TOLERANCE_DEG {
        return Err(CalibrationError::LowAgreement {
            max_residual_deg: residual,
        });
    }

    info!(
        "{} fit: {} points, offset {:+.2} deg, residual {:.2} deg (nominal band +/-{} deg)",
        method.label(),
        points.len(),
        offset,
        residual,
        method.nominal_precision_deg()
    );

    Ok(CalibrationRecord::new(
        method,
        offset,
        residual,
        points.to_vec(),
    ))
}

impl CalibrationStrategy for LandmarkCalibration {
    fn method(&self) -> CalibrationMethod {
        CalibrationMethod::Landmark
    }

    fn compute(&self, points: &[ReferencePoint]) -> Result<CalibrationRecord, CalibrationError> {
        fit_landmarks(self.method(), points)
    }
}

/// Identical numeric core to [`LandmarkCalibration`]; target bearings come
/// from a map-to-world transform owned by the mapping collaborator, so this
/// strategy only ever sees already-resolved bearings.
pub struct VisualMapCalibration;

impl VisualMapCalibration {
    /// Bearing of the ray from one course-map point to another, degrees in
    /// [0, 360) with 0 = +x axis. Convenience for callers that hold world
    /// coordinates rather than bearings.
    pub fn bearing_between(from: (f64, f64), to: (f64, f64)) -> f64 {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        normalize_deg(dy.atan2(dx).to_degrees())
    }
}

impl CalibrationStrategy for VisualMapCalibration {
    fn method(&self) -> CalibrationMethod {
        CalibrationMethod::VisualMap
    }

    fn compute(&self, points: &[ReferencePoint]) -> Result<CalibrationRecord, CalibrationError> {
        fit_landmarks(self.method(), points)
    }
}
