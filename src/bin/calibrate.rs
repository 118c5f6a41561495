//! Offline operator calibration procedure.
//!
//! Run once per venue, before the race, with the runtime service stopped.
//! Each invocation computes one record from the supplied reference points
//! and writes exactly one method-specific file on success; a failed fit
//! leaves the store untouched. Calibration changes require a service
//! restart to take effect.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use heading_tracker_rs::calibration::{
    CalibrationMethod, CalibrationStore, CalibrationStrategy, LandmarkCalibration,
    ReferencePoint, TwoPointCalibration, VisualMapCalibration,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    /// Two measurements with a 180-degree rotation in between
    TwoPoint,
    /// Two or more known landmark bearings
    Landmark,
    /// Bearings resolved from course-map points
    VisualMap,
}

impl Method {
    fn record_method(self) -> CalibrationMethod {
        match self {
            Method::TwoPoint => CalibrationMethod::TwoPoint,
            Method::Landmark => CalibrationMethod::Landmark,
            Method::VisualMap => CalibrationMethod::VisualMap,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "calibrate")]
#[command(about = "Compute and persist a course-correction record", long_about = None)]
struct Args {
    /// Calibration strategy to run
    #[arg(long, value_enum)]
    method: Method,

    /// Reference point as "description:measured_raw_yaw:target_bearing"
    /// (degrees, repeat per point)
    #[arg(long = "point", value_name = "DESC:MEASURED:TARGET")]
    points: Vec<String>,

    /// Directory to write the record file into
    #[arg(long, default_value = ".")]
    dir: String,

    /// Remove the selected method's stored record instead of computing one
    #[arg(long, conflicts_with = "points")]
    delete: bool,
}

fn parse_point(raw: &str) -> Result<ReferencePoint> {
    let mut parts = raw.rsplitn(3, ':');
    // rsplitn keeps colons inside the description intact
    let target = parts
        .next()
        .context("missing target bearing")?
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad target bearing in '{raw}'"))?;
    let measured = parts
        .next()
        .context("missing measured yaw")?
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad measured yaw in '{raw}'"))?;
    let description = parts
        .next()
        .context("missing description")?
        .trim()
        .to_string();
    if description.is_empty() {
        bail!("empty description in '{raw}'");
    }
    if !(0.0..360.0).contains(&measured) || !(0.0..360.0).contains(&target) {
        bail!("angles in '{raw}' must be in [0, 360)");
    }
    Ok(ReferencePoint {
        description,
        measured_raw_yaw: measured,
        target_bearing: target,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.delete {
        let method = args.method.record_method();
        CalibrationStore::new(&args.dir).delete(method)?;
        println!("Removed {} record (if present)", method.label());
        return Ok(());
    }
    if args.points.is_empty() {
        bail!("at least one --point is required (or pass --delete)");
    }

    let points = args
        .points
        .iter()
        .map(|p| parse_point(p))
        .collect::<Result<Vec<_>>>()?;

    let strategy: Box<dyn CalibrationStrategy> = match args.method {
        Method::TwoPoint => Box::new(TwoPointCalibration),
        Method::Landmark => Box::new(LandmarkCalibration),
        Method::VisualMap => Box::new(VisualMapCalibration),
    };

    let record = strategy
        .compute(&points)
        .context("calibration fit failed; no record was written")?;

    println!("Method:    {}", record.method.label());
    println!("Offset:    {:+.2} deg", record.offset_degrees);
    println!(
        "Residual:  {:.2} deg (nominal band +/-{} deg)",
        record.precision_estimate_degrees,
        record.method.nominal_precision_deg()
    );
    for p in &record.reference_points {
        println!(
            "  {} -> measured {:.2} deg, target {:.2} deg",
            p.description, p.measured_raw_yaw, p.target_bearing
        );
    }

    let store = CalibrationStore::new(&args.dir);
    let path = store.save(&record)?;
    info!("record written to {}", path.display());
    println!("Saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let p = parse_point("start gate:12.5:0").unwrap();
        assert_eq!(p.description, "start gate");
        assert_eq!(p.measured_raw_yaw, 12.5);
        assert_eq!(p.target_bearing, 0.0);
    }

    #[test]
    fn test_parse_point_description_keeps_colons() {
        let p = parse_point("gate: north face:100:90").unwrap();
        assert_eq!(p.description, "gate: north face");
        assert_eq!(p.measured_raw_yaw, 100.0);
    }

    #[test]
    fn test_delete_needs_no_points() {
        let args = Args::try_parse_from(["calibrate", "--method", "landmark", "--delete"]).unwrap();
        assert!(args.delete);
        assert!(args.points.is_empty());
        assert_eq!(args.method.record_method(), CalibrationMethod::Landmark);

        // Deleting and supplying points at the same time is contradictory
        assert!(Args::try_parse_from([
            "calibrate",
            "--method",
            "landmark",
            "--delete",
            "--point",
            "gate:10:0",
        ])
        .is_err());
    }

    #[test]
    fn test_parse_point_rejects_bad_input() {
        assert!(parse_point("only-a-description").is_err());
        assert!(parse_point("desc:abc:0").is_err());
        assert!(parse_point("desc:400:0").is_err());
        assert!(parse_point(":10:0").is_err());
    }
}
