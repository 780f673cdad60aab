//! Worker threads for PrahariNav.
//!
//! Two threads split the work:
//! - Ingest thread: drains the sensor bus, smooths ranging samples,
//!   publishes per-direction estimates and the detection flags
//! - Patrol thread: owns the grid and the motion link, runs the state
//!   machine one step per iteration

mod ingest;
mod patrol;

pub use ingest::IngestThread;
pub use patrol::PatrolThread;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use setu_io::MotionClient;

use crate::config::PrahariConfig;
use crate::error::Result;
use crate::shared::SharedState;

/// Thread handles for the running service.
pub struct ThreadHandles {
    pub ingest: JoinHandle<()>,
    pub patrol: JoinHandle<()>,
}

/// Spawn both worker threads.
pub fn spawn_threads(
    config: PrahariConfig,
    shared: Arc<SharedState>,
    motion: MotionClient,
) -> Result<ThreadHandles> {
    let ingest_config = config.clone();
    let ingest_shared = Arc::clone(&shared);
    let patrol_shared = Arc::clone(&shared);

    let ingest = thread::Builder::new()
        .name("ingest".into())
        .spawn(move || {
            let mut ingest_thread = IngestThread::new(ingest_config, ingest_shared);
            if let Err(e) = ingest_thread.run() {
                tracing::error!("Ingest thread error: {}", e);
            }
        })
        .expect("Failed to spawn ingest thread");

    let patrol = thread::Builder::new()
        .name("patrol".into())
        .spawn(move || {
            let mut patrol_thread = PatrolThread::new(config, patrol_shared, motion);
            patrol_thread.run();
        })
        .expect("Failed to spawn patrol thread");

    Ok(ThreadHandles { ingest, patrol })
}
