//! Calibration record persistence and priority selection.
//!
//! One JSON file per method inside the calibration directory. File naming
//! communicates priority: a visual-map record outranks a landmark record,
//! which outranks a two-point record, regardless of recency. At most one
//! record is active per run; the first valid candidate wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use super::record::{CalibrationMethod, CalibrationRecord};

/// Lookup order, highest priority first.
pub const PRIORITY_ORDER: [CalibrationMethod; 3] = [
    CalibrationMethod::VisualMap,
    CalibrationMethod::Landmark,
    CalibrationMethod::TwoPoint,
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("calibration file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("calibration file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("record fails schema checks (offset/points out of range)")]
    SchemaViolation,
    #[error("record method {found:?} does not match file for {expected:?}")]
    MethodMismatch {
        expected: CalibrationMethod,
        found: CalibrationMethod,
    },
}

pub struct CalibrationStore {
    dir: PathBuf,
}

impl CalibrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, method: CalibrationMethod) -> PathBuf {
        self.dir.join(method.file_name())
    }

    /// Load one method's record, verifying schema and method/file agreement.
    pub fn load(&self, method: CalibrationMethod) -> Result<CalibrationRecord, StoreError> {
        let text = fs::read_to_string(self.path_for(method))?;
        let record: CalibrationRecord = serde_json::from_str(&text)?;
        if record.method != method {
            return Err(StoreError::MethodMismatch {
                expected: method,
                found: record.method,
            });
        }
        if !record.is_valid() {
            return Err(StoreError::SchemaViolation);
        }
        Ok(record)
    }

    /// Walk the priority list; first valid record wins. A malformed or
    /// unreadable candidate is skipped with a warning and the next source is
    /// tried. `None` means the runtime proceeds uncorrected.
    pub fn load_best(&self) -> Option<CalibrationRecord> {
        for method in PRIORITY_ORDER {
            match self.load(method) {
                Ok(record) => {
                    info!(
                        "course calibration loaded: {} (offset {:+.2} deg, precision +/-{:.2} deg, {})",
                        method.label(),
                        record.offset_degrees,
                        record.precision_estimate_degrees,
                        record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    );
                    return Some(record);
                }
                Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(
                        "skipping {} calibration candidate: {}",
                        method.label(),
                        e
                    );
                    continue;
                }
            }
        }
        None
    }

    /// Persist a record under its own method-specific name. Writes to a
    /// temporary file first so a failed run leaves no partial record behind.
    pub fn save(&self, record: &CalibrationRecord) -> Result<PathBuf, StoreError> {
        if !record.is_valid() {
            return Err(StoreError::SchemaViolation);
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(record.method);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        info!(
            "saved {} calibration record to {}",
            record.method.label(),
            path.display()
        );
        Ok(path)
    }

    /// Explicit operator removal of one method's record.
    pub fn delete(&self, method: CalibrationMethod) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(method)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::record::ReferencePoint;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_store() -> CalibrationStore {
        let dir = std::env::temp_dir().join(format!(
            "heading_tracker_store_{}_{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&dir).unwrap();
        CalibrationStore::new(dir)
    }

    fn record(method: CalibrationMethod, offset: f64) -> CalibrationRecord {
        CalibrationRecord::new(
            method,
            offset,
            0.4,
            vec![
                ReferencePoint {
                    description: "p1".into(),
                    measured_raw_yaw: 10.0,
                    target_bearing: 0.0,
                },
                ReferencePoint {
                    description: "p2".into(),
                    measured_raw_yaw: 190.0,
                    target_bearing: 180.0,
                },
            ],
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = temp_store();
        store.save(&record(CalibrationMethod::Landmark, -10.0)).unwrap();
        let back = store.load(CalibrationMethod::Landmark).unwrap();
        assert_eq!(back.method, CalibrationMethod::Landmark);
        assert_eq!(back.offset_degrees, -10.0);
    }

    #[test]
    fn test_priority_landmark_beats_two_point() {
        let store = temp_store();
        store.save(&record(CalibrationMethod::TwoPoint, 5.0)).unwrap();
        store.save(&record(CalibrationMethod::Landmark, -10.0)).unwrap();
        let best = store.load_best().unwrap();
        assert_eq!(best.method, CalibrationMethod::Landmark);
    }

    #[test]
    fn test_priority_visual_beats_all() {
        let store = temp_store();
        store.save(&record(CalibrationMethod::TwoPoint, 5.0)).unwrap();
        store.save(&record(CalibrationMethod::Landmark, -10.0)).unwrap();
        store.save(&record(CalibrationMethod::VisualMap, 2.0)).unwrap();
        let best = store.load_best().unwrap();
        assert_eq!(best.method, CalibrationMethod::VisualMap);
    }

    #[test]
    fn test_empty_store_yields_none() {
        let store = temp_store();
        assert!(store.load_best().is_none());
    }

    #[test]
    fn test_malformed_candidate_is_skipped() {
        let store = temp_store();
        fs::write(
            store.path_for(CalibrationMethod::VisualMap),
            "{ not json at all",
        )
        .unwrap();
        store.save(&record(CalibrationMethod::TwoPoint, 5.0)).unwrap();
        let best = store.load_best().unwrap();
        assert_eq!(best.method, CalibrationMethod::TwoPoint);
    }

    #[test]
    fn test_method_file_mismatch_is_rejected() {
        let store = temp_store();
        // landmark payload written under the visual-map file name
        let rec = record(CalibrationMethod::Landmark, 1.0);
        let json = serde_json::to_string(&rec).unwrap();
        fs::write(store.path_for(CalibrationMethod::VisualMap), json).unwrap();
        assert!(matches!(
            store.load(CalibrationMethod::VisualMap),
            Err(StoreError::MethodMismatch { .. })
        ));
        // load_best falls through to nothing
        assert!(store.load_best().is_none());
    }

    #[test]
    fn test_save_overwrites_only_own_method() {
        let store = temp_store();
        store.save(&record(CalibrationMethod::Landmark, -10.0)).unwrap();
        store.save(&record(CalibrationMethod::Landmark, -12.0)).unwrap();
        store.save(&record(CalibrationMethod::TwoPoint, 3.0)).unwrap();
        assert_eq!(
            store.load(CalibrationMethod::Landmark).unwrap().offset_degrees,
            -12.0
        );
        assert_eq!(
            store.load(CalibrationMethod::TwoPoint).unwrap().offset_degrees,
            3.0
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = temp_store();
        store.save(&record(CalibrationMethod::TwoPoint, 3.0)).unwrap();
        store.delete(CalibrationMethod::TwoPoint).unwrap();
        store.delete(CalibrationMethod::TwoPoint).unwrap();
        assert!(store.load_best().is_none());
    }
}
