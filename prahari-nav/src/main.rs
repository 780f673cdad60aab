//! PrahariNav - Patrol controller for a Go1-class walking robot
//!
//! Walks the robot through an unmapped area on short-range sensing alone:
//! raw ranging samples are smoothed into per-direction occupancy, occupancy
//! feeds a local grid, and a patrol state machine moves the robot one cell
//! at a time while watching for a waving person to greet.
//!
//! ## Threads
//!
//! - **Ingest thread** (~100Hz wakeup): drains the sensor bus, smooths
//!   ranging samples, publishes estimates and detection flags
//! - **Patrol thread**: owns the grid and the motion link, runs the state
//!   machine one step per iteration

mod config;
mod error;
mod filter;
mod grid;
mod patrol;
mod shared;
mod threads;

use config::PrahariConfig;
use error::Result;
use shared::SharedState;
use threads::spawn_threads;

use setu_io::MotionClient;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prahari_nav=info".parse().unwrap()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config = if args.len() > 1 && !args[1].starts_with("--") {
        // Load config from file
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        PrahariConfig::load(config_path)?
    } else {
        // Check for --robot argument
        let robot_ip = args
            .iter()
            .position(|a| a == "--robot")
            .and_then(|i| args.get(i + 1))
            .cloned();

        let mut config = if Path::new("prahari.toml").exists() {
            info!("Loading configuration from prahari.toml");
            PrahariConfig::load(Path::new("prahari.toml"))?
        } else {
            info!("Using default configuration");
            PrahariConfig::default()
        };

        // Override robot IP if provided
        if let Some(ip) = robot_ip {
            info!("Using robot IP: {}", ip);
            config.connection.robot_ip = ip;
        }

        config
    };

    info!("PrahariNav v{}", env!("CARGO_PKG_VERSION"));
    info!("Connecting to motion daemon at {}", config.motion_address());

    let timeout = Duration::from_millis(config.connection.timeout_ms);
    let motion = MotionClient::connect_timeout(&config.motion_address(), timeout)
        .map_err(error::PrahariError::Link)?;

    let firmware = motion.firmware();
    info!(
        "Robot: {} sn={} hw={} sw={}",
        firmware.product.as_deref().unwrap_or("unknown"),
        firmware.serial.as_deref().unwrap_or("-"),
        firmware.hardware_version.as_deref().unwrap_or("-"),
        firmware.software_version.as_deref().unwrap_or("-"),
    );

    // Initialize shared state
    let shared = Arc::new(SharedState::new());

    // SIGINT/SIGTERM request a graceful stop
    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term))
        .map_err(setu_io::Error::from)?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term))
        .map_err(setu_io::Error::from)?;

    // Spawn worker threads
    info!("Starting patrol...");
    let handles = spawn_threads(config, Arc::clone(&shared), motion)?;

    // Main thread: monitor and wait for completion
    let check_interval = Duration::from_millis(500);

    loop {
        std::thread::sleep(check_interval);

        if term.load(Ordering::Relaxed) {
            info!("Termination signal received");
            break;
        }

        if shared.is_stopped() {
            match shared.stop_reason() {
                Some(reason) => warn!("Patrol stopped: {}", reason),
                None => info!("Patrol stopped"),
            }
            break;
        }

        if handles.ingest.is_finished() || handles.patrol.is_finished() {
            warn!("A worker thread exited unexpectedly");
            break;
        }
    }

    // Signal shutdown to both threads
    shared.signal_shutdown();

    info!("Waiting for threads to finish...");
    if let Err(e) = handles.ingest.join() {
        error!("Ingest thread panicked: {:?}", e);
    }
    if let Err(e) = handles.patrol.join() {
        error!("Patrol thread panicked: {:?}", e);
    }

    info!("PrahariNav finished");
    Ok(())
}
