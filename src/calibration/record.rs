//! Persisted representation of one environment-correction result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which offline procedure produced a record. Order here is documentation
/// only; the store's priority list is authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    VisualMap,
    Landmark,
    TwoPoint,
}

impl CalibrationMethod {
    /// Record file name; naming communicates priority to the store.
    pub fn file_name(&self) -> &'static str {
        match self {
            CalibrationMethod::VisualMap => "imu_visual_calib.json",
            CalibrationMethod::Landmark => "imu_landmark_calib.json",
            CalibrationMethod::TwoPoint => "imu_2point_calib.json",
        }
    }

    /// Nominal accuracy band claimed by the method, degrees. Shown to the
    /// operator for diagnostics; never used for method selection.
    pub fn nominal_precision_deg(&self) -> f64 {
        match self {
            CalibrationMethod::VisualMap => 0.5,
            CalibrationMethod::Landmark => 1.0,
            CalibrationMethod::TwoPoint => 2.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CalibrationMethod::VisualMap => "visual_map",
            CalibrationMethod::Landmark => "landmark",
            CalibrationMethod::TwoPoint => "two_point",
        }
    }
}

/// One operator-supplied reference: where the vehicle was pointed, what the
/// sensor said, and what the true bearing was.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub description: String,
    /// Degrees, [0, 360).
    pub measured_raw_yaw: f64,
    /// Degrees, [0, 360).
    pub target_bearing: f64,
}

/// A Stage-2 correction: a single best-fit additive offset plus provenance.
/// Written once by a calibration run, read many times by the runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub method: CalibrationMethod,
    /// Signed; `corrected = normalize(raw + offset_degrees)`.
    pub offset_degrees: f64,
    /// Maximum absolute fit residual, degrees.
    pub precision_estimate_degrees: f64,
    pub created_at: DateTime<Utc>,
    /// Ordered, length >= 2.
    pub reference_points: Vec<ReferencePoint>,
}

impl CalibrationRecord {
    pub fn new(
        method: CalibrationMethod,
        offset_degrees: f64,
        precision_estimate_degrees: f64,
        reference_points: Vec<ReferencePoint>,
    ) -> Self {
        Self {
            method,
            offset_degrees,
            precision_estimate_degrees,
            created_at: Utc::now(),
            reference_points,
        }
    }

    /// Schema conformance beyond what serde enforces.
    pub fn is_valid(&self) -> bool {
        self.offset_degrees.is_finite()
            && self.offset_degrees > -180.0
            && self.offset_degrees <= 180.0
            && self.precision_estimate_degrees.is_finite()
            && self.precision_estimate_degrees >= 0.0
            && self.reference_points.len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<ReferencePoint> {
        vec![
            ReferencePoint {
                description: "start gate".into(),
                measured_raw_yaw: 12.0,
                target_bearing: 0.0,
            },
            ReferencePoint {
                description: "far pylon".into(),
                measured_raw_yaw: 192.0,
                target_bearing: 180.0,
            },
        ]
    }

    #[test]
    fn test_method_serializes_to_wire_names() {
        let json = serde_json::to_string(&CalibrationMethod::VisualMap).unwrap();
        assert_eq!(json, "\"visual_map\"");
        let json = serde_json::to_string(&CalibrationMethod::TwoPoint).unwrap();
        assert_eq!(json, "\"two_point\"");
    }

    #[test]
    fn test_json_round_trip() {
        let rec = CalibrationRecord::new(CalibrationMethod::Landmark, -12.0, 0.3, points());
        let json = serde_json::to_string_pretty(&rec).unwrap();
        let back: CalibrationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, CalibrationMethod::Landmark);
        assert_eq!(back.offset_degrees, rec.offset_degrees);
        assert_eq!(back.created_at, rec.created_at);
        assert_eq!(back.reference_points.len(), 2);
    }

    #[test]
    fn test_created_at_is_iso8601() {
        let rec = CalibrationRecord::new(CalibrationMethod::TwoPoint, 1.0, 0.1, points());
        let json = serde_json::to_value(&rec).unwrap();
        let ts = json["created_at"].as_str().unwrap();
        assert!(ts.contains('T'), "expected ISO-8601 timestamp, got {ts}");
    }

    #[test]
    fn test_validity_checks() {
        let ok = CalibrationRecord::new(CalibrationMethod::TwoPoint, 10.0, 0.5, points());
        assert!(ok.is_valid());

        let mut bad = ok.clone();
        bad.offset_degrees = f64::NAN;
        assert!(!bad.is_valid());

        let mut bad = ok.clone();
        bad.reference_points.truncate(1);
        assert!(!bad.is_valid());

        let mut bad = ok;
        bad.offset_degrees = 250.0;
        assert!(!bad.is_valid());
    }
}
