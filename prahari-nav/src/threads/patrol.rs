//! Patrol thread: the control loop around the state machine.
//!
//! Owns the occupancy grid and the motion client exclusively. One
//! iteration: read the estimate snapshot and detection flags, run a
//! controller step, sleep the pause the controller asked for. Shutdown is
//! observed at the top of each iteration, so an in-flight step always
//! completes before the loop winds down.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use setu_io::MotionClient;

use crate::config::PrahariConfig;
use crate::grid::Direction;
use crate::patrol::{PatrolController, StepPause};
use crate::shared::SharedState;

/// Patrol thread state and logic.
pub struct PatrolThread {
    config: PrahariConfig,
    shared: Arc<SharedState>,
    controller: PatrolController<MotionClient>,
    last_status_time: Instant,
    status_interval: Duration,
}

impl PatrolThread {
    pub fn new(config: PrahariConfig, shared: Arc<SharedState>, motion: MotionClient) -> Self {
        let controller = PatrolController::new(motion, config.grid.size, config.motion.clone());
        Self {
            config,
            shared,
            controller,
            last_status_time: Instant::now(),
            status_interval: Duration::from_secs(3),
        }
    }

    /// Run the patrol loop until shutdown or a dead link.
    pub fn run(&mut self) {
        tracing::info!("Patrol thread started");

        loop {
            if self.shared.should_shutdown() {
                tracing::info!("Patrol thread shutting down");
                break;
            }

            let classifications = self.shared.classifications();
            let detection = self.shared.detection();

            match self.controller.step(&classifications, detection) {
                Ok(StepPause::Dwell) => {
                    std::thread::sleep(Duration::from_secs(self.config.motion.dwell_secs));
                }
                Ok(StepPause::MoveGap) => {
                    std::thread::sleep(Duration::from_millis(self.config.motion.pause_ms));
                }
                Err(e) => {
                    // The link is gone; a final halt could not reach the
                    // robot anyway
                    tracing::error!("Motion link lost: {}", e);
                    self.shared
                        .mark_stopped(Some(format!("motion link lost: {}", e)));
                    return;
                }
            }

            if self.last_status_time.elapsed() >= self.status_interval {
                self.log_status();
                self.last_status_time = Instant::now();
            }
        }

        self.controller.stop();
        self.shared.mark_stopped(None);
        tracing::info!("Patrol thread exited");
    }

    fn log_status(&self) {
        let distances = self.shared.distances();
        let (x, y) = self.controller.grid().position();

        tracing::info!(
            "Patrolling: state={:?}, cell=({}, {}), range=[F {:.1} B {:.1} L {:.1} R {:.1}], frames={}",
            self.controller.state(),
            x,
            y,
            distances[Direction::Front],
            distances[Direction::Back],
            distances[Direction::Left],
            distances[Direction::Right],
            self.shared.frame_count.load(Ordering::Relaxed),
        );
    }
}
