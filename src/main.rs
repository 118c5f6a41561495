use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use tokio::time::{sleep, Duration};

use heading_tracker_rs::calibration::CalibrationStore;
use heading_tracker_rs::config::{AppConfig, SourceKind};
use heading_tracker_rs::service::{OrientationService, ServiceState};
use heading_tracker_rs::source::SimulatedOrientationSource;

#[derive(Parser, Debug)]
#[command(name = "heading_tracker")]
#[command(about = "Calibrated heading service for the vehicle control loop", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Configuration file path
    #[arg(long, default_value = "config.json")]
    config: String,

    /// Override the configured source (simulated, hardware)
    #[arg(long)]
    source: Option<String>,

    /// Override the configured calibration record directory
    #[arg(long)]
    calibration_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(source) = &args.source {
        config.source = match source.as_str() {
            "hardware" => SourceKind::Hardware,
            "simulated" => SourceKind::Simulated,
            other => anyhow::bail!("unknown source '{other}' (expected simulated or hardware)"),
        };
    }
    if let Some(dir) = &args.calibration_dir {
        config.calibration_dir = dir.clone();
    }

    info!(
        "heading tracker starting: {:.0} Hz, source {:?}, calibration dir {}",
        config.sample_rate_hz, config.source, config.calibration_dir
    );

    // The physical bus driver is wired in by the platform integration; this
    // binary runs the simulator when it is absent, like the PC/mock mode of
    // the original vehicle stack.
    let source = match config.source {
        SourceKind::Simulated => SimulatedOrientationSource::new(),
        SourceKind::Hardware => {
            warn!("hardware transport not linked into this binary, falling back to simulated source");
            SimulatedOrientationSource::new()
        }
    };

    let store = CalibrationStore::new(&config.calibration_dir);
    let service = OrientationService::new(Box::new(source), store, &config);
    let handle = service.handle();
    let stop = service.stop_handle();

    let service_task = tokio::spawn(service.run());

    let shutdown = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received");
                stop.stop();
            }
        })
    };

    let started = tokio::time::Instant::now();
    loop {
        sleep(Duration::from_secs(2)).await;

        let status = handle.status();
        if status.state == ServiceState::Stopped {
            break;
        }
        if let Some(snapshot) = handle.snapshot() {
            info!(
                "yaw {:6.2} deg | state {:?}{} | hw calibrated: {} | correction: {}",
                snapshot.yaw,
                status.state,
                if status.is_stale { " (stale)" } else { "" },
                status.is_hardware_calibrated,
                status
                    .active_correction
                    .map(|m| m.label())
                    .unwrap_or("none"),
            );
        }

        if args.duration > 0 && started.elapsed() >= Duration::from_secs(args.duration) {
            info!("duration reached, stopping");
            stop.stop();
        }
    }

    service_task.await??;
    shutdown.abort();

    let final_status = handle.status();
    info!(
        "heading tracker stopped (state {:?}, last yaw {:.2} deg)",
        final_status.state,
        handle.get_calibrated_yaw()
    );
    Ok(())
}
