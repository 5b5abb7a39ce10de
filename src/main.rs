//! Greenhouse Camera Manager CLI
//!
//! Command-line interface for exercising the camera manager on the rig:
//! list the catalog, grab a still, or pipe an MJPEG multipart stream to
//! stdout. Built without the `camera` feature this is a demonstration
//! using mock camera input.

use clap::{Parser, Subcommand};
use greenhouse_cam::{CameraManager, CameraRole, Resolution, RigConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "greenhouse-cam", version, about = "Greenhouse rig camera manager")]
struct Cli {
    /// TOML config with per-role device/resolution overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the static camera catalog.
    List,
    /// Capture a single still image.
    Capture {
        /// Camera role (usb, rpi, 2k, 4k).
        role: CameraRole,
        /// Output path; defaults to <role>_<timestamp>.jpg in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Capture resolution, e.g. 2560x1440; defaults to the role's still resolution.
        #[arg(short, long)]
        resolution: Option<Resolution>,
    },
    /// Write MJPEG multipart chunks to stdout until Ctrl-C.
    Stream {
        /// Camera role (usb, rpi, 2k, 4k).
        role: CameraRole,
        /// Stop after this many frames instead of waiting for Ctrl-C.
        #[arg(short = 'n', long)]
        frames: Option<u64>,
    },
}

fn main() {
    // Logs go to stderr; stdout carries stream bytes.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Greenhouse Camera Manager v{}", greenhouse_cam::VERSION);

    let config = match &cli.config {
        Some(path) => match RigConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => RigConfig::default(),
    };

    let mut manager = build_manager(config);

    match cli.command {
        Command::List => {
            for (role, descriptor) in manager.list_available_cameras() {
                println!(
                    "{role}: {} ({} on {}, max {}, {})",
                    descriptor.name,
                    descriptor.kind,
                    descriptor.device,
                    descriptor.max_resolution,
                    descriptor.status
                );
            }
        }
        Command::Capture {
            role,
            output,
            resolution,
        } => {
            let output = output.unwrap_or_else(|| default_still_path(role));
            match manager.capture_still(role, output, resolution) {
                Some(path) => println!("{}", path.display()),
                None => {
                    eprintln!("Still capture failed; see log output");
                    std::process::exit(1);
                }
            }
        }
        Command::Stream { role, frames } => {
            let running = Arc::new(AtomicBool::new(true));
            {
                let running = Arc::clone(&running);
                if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
                    warn!(error = %e, "could not install Ctrl-C handler");
                }
            }

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut produced = 0u64;

            for chunk in manager.stream(role) {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if out.write_all(&chunk).is_err() {
                    // Consumer went away; stop pulling.
                    break;
                }
                produced += 1;
                if frames.is_some_and(|n| produced >= n) {
                    break;
                }
            }

            // The stream does not auto-release the handle.
            manager.stop(role);
            info!(frames = produced, "stream finished");
        }
    }
}

#[cfg(feature = "camera")]
fn build_manager(config: RigConfig) -> CameraManager {
    CameraManager::with_config(greenhouse_cam::capture::NokhwaFactory::new(), config)
}

#[cfg(not(feature = "camera"))]
fn build_manager(config: RigConfig) -> CameraManager {
    info!("Built without the camera feature; this is a demonstration using mock camera input");
    CameraManager::with_config(greenhouse_cam::MockFactory::new(), config)
}

fn default_still_path(role: CameraRole) -> PathBuf {
    PathBuf::from(format!(
        "{role}_{}.jpg",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    ))
}
