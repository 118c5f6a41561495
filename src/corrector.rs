//! Stage-2 offset application.

use crate::angles::normalize_deg;
use crate::calibration::CalibrationRecord;

/// Applies a course-correction offset to raw yaw readings.
///
/// Total function: with no record loaded it degrades to normalization only,
/// so the control loop always gets a yaw in `[0, 360)`.
pub struct YawCorrector;

impl YawCorrector {
    pub fn apply(raw_yaw: f64, record: Option<&CalibrationRecord>) -> f64 {
        match record {
            Some(rec) => normalize_deg(raw_yaw + rec.offset_degrees),
            None => normalize_deg(raw_yaw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationMethod, CalibrationRecord, ReferencePoint};
    use approx::assert_relative_eq;

    fn record_with_offset(offset: f64) -> CalibrationRecord {
        CalibrationRecord::new(
            CalibrationMethod::TwoPoint,
            offset,
            0.5,
            vec![
                ReferencePoint {
                    description: "a".into(),
                    measured_raw_yaw: 10.0,
                    target_bearing: 0.0,
                },
                ReferencePoint {
                    description: "b".into(),
                    measured_raw_yaw: 190.0,
                    target_bearing: 180.0,
                },
            ],
        )
    }

    #[test]
    fn test_apply_without_record_is_normalization() {
        assert_relative_eq!(YawCorrector::apply(370.0, None), 10.0);
        assert_relative_eq!(YawCorrector::apply(-90.0, None), 270.0);
        assert_relative_eq!(YawCorrector::apply(42.0, None), 42.0);
    }

    #[test]
    fn test_apply_wraps_around_zero() {
        let rec = record_with_offset(-10.0);
        assert_relative_eq!(YawCorrector::apply(5.0, Some(&rec)), 355.0);
        let rec = record_with_offset(20.0);
        assert_relative_eq!(YawCorrector::apply(350.0, Some(&rec)), 10.0);
    }

    #[test]
    fn test_apply_round_trip() {
        // apply(apply(raw, offset), -offset) == raw (mod 360)
        for offset in [-179.0, -90.0, -0.5, 0.0, 0.5, 90.0, 180.0] {
            for raw in [0.0, 45.0, 180.0, 359.5] {
                let fwd = YawCorrector::apply(raw, Some(&record_with_offset(offset)));
                assert!((0.0..360.0).contains(&fwd));
                let back = YawCorrector::apply(fwd, Some(&record_with_offset(-offset)));
                let diff = crate::angles::angular_distance_deg(back, raw);
                assert!(diff < 1e-9, "offset={offset} raw={raw} diff={diff}");
            }
        }
    }
}
