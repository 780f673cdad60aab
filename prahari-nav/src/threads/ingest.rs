//! Ingest thread: sensor-bus draining and estimate publishing.
//!
//! The single-writer side of the shared snapshot. Every ranging frame runs
//! through the filter and republishes the four (distance, classification)
//! pairs; detection frames flip the person/waving flags. The occupancy grid
//! is never touched from here.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use setu_io::bus::{BusMessage, BusReceiver, RangingFrame};

use crate::config::PrahariConfig;
use crate::error::Result;
use crate::filter::RangeFilter;
use crate::grid::Direction;
use crate::shared::{Detection, SharedState};

/// Cap on datagrams drained per wakeup
const MAX_MESSAGES_PER_ITERATION: usize = 50;

/// Ingest thread state and logic.
pub struct IngestThread {
    config: PrahariConfig,
    shared: Arc<SharedState>,
    filter: RangeFilter,
}

impl IngestThread {
    pub fn new(config: PrahariConfig, shared: Arc<SharedState>) -> Self {
        let filter = RangeFilter::new(config.sensing.near_threshold);
        Self {
            config,
            shared,
            filter,
        }
    }

    /// Run the ingest loop until shutdown.
    pub fn run(&mut self) -> Result<()> {
        let port = self.config.connection.bus_port;
        let mut receiver = match BusReceiver::bind(port) {
            Ok(receiver) => receiver,
            Err(e) => {
                self.shared
                    .mark_stopped(Some(format!("bus bind on port {} failed: {}", port, e)));
                return Err(e.into());
            }
        };

        tracing::info!("Ingest thread listening on UDP port {}", port);

        loop {
            if self.shared.should_shutdown() {
                tracing::info!("Ingest thread shutting down");
                break;
            }

            if !self.drain(&mut receiver) {
                break;
            }

            // Wake ~100 times a second; frames arrive slower than that
            std::thread::sleep(Duration::from_millis(10));
        }

        Ok(())
    }

    /// Drain all queued datagrams. Returns false when the socket is dead.
    fn drain(&mut self, receiver: &mut BusReceiver) -> bool {
        for _ in 0..MAX_MESSAGES_PER_ITERATION {
            match receiver.recv() {
                Ok(Some(BusMessage::Ultrasonic(frame))) => self.apply_ranging(&frame),
                Ok(Some(BusMessage::Detection(frame))) => {
                    self.shared.set_detection(Detection {
                        person: frame.person_detected,
                        waving: frame.waving_detected,
                    });
                }
                Ok(None) => break,
                // A malformed datagram is dropped; the windows stay intact
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Dropping bus datagram: {}", e);
                }
                Err(e) => {
                    tracing::error!("Bus receive error: {}", e);
                    self.shared
                        .mark_stopped(Some(format!("bus receive failed: {}", e)));
                    return false;
                }
            }
        }
        true
    }

    /// Push one ranging frame through the filter and publish the estimates.
    fn apply_ranging(&mut self, frame: &RangingFrame) {
        for dir in Direction::ALL {
            let raw = match dir {
                Direction::Front => frame.front,
                Direction::Back => frame.back,
                Direction::Left => frame.left,
                Direction::Right => frame.right,
            };

            self.filter.ingest(dir, raw);
            if let Some((distance, class)) = self.filter.estimate(dir) {
                self.shared.set_estimate(dir, distance, class);
            }
        }

        self.shared.frame_count.fetch_add(1, Ordering::Relaxed);
    }
}
