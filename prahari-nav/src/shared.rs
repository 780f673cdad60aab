//! Shared state between the ingest path and the patrol loop.
//!
//! The two threads share exactly three things: the per-direction estimates,
//! the detection booleans and the control flags. The occupancy grid and the
//! motion link are owned by the patrol thread alone and never appear here.
//!
//! Each estimate packs its (distance, classification) pair into one atomic
//! word, so the patrol loop can never observe a distance paired with a
//! classification computed from a different ingest event.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::grid::{CellState, Direction, DirectionMap};

/// (distance, classification) pair packed into an AtomicU64.
///
/// Distance f32 bits occupy the low word, the classification discriminant
/// sits above it.
#[derive(Debug)]
pub struct AtomicEstimate(AtomicU64);

impl AtomicEstimate {
    pub fn new(distance: f32, class: CellState) -> Self {
        Self(AtomicU64::new(pack(distance, class)))
    }

    pub fn store(&self, distance: f32, class: CellState, order: Ordering) {
        self.0.store(pack(distance, class), order);
    }

    pub fn load(&self, order: Ordering) -> (f32, CellState) {
        unpack(self.0.load(order))
    }
}

fn pack(distance: f32, class: CellState) -> u64 {
    let class_bits: u64 = match class {
        CellState::Unknown => 0,
        CellState::Free => 1,
        CellState::Occupied => 2,
    };
    (class_bits << 32) | u64::from(distance.to_bits())
}

fn unpack(word: u64) -> (f32, CellState) {
    let distance = f32::from_bits(word as u32);
    let class = match word >> 32 {
        1 => CellState::Free,
        2 => CellState::Occupied,
        _ => CellState::Unknown,
    };
    (distance, class)
}

/// Detection snapshot polled by the patrol loop, once per iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Detection {
    pub person: bool,
    pub waving: bool,
}

/// State shared between the ingest thread and the patrol thread.
#[derive(Debug)]
pub struct SharedState {
    /// Latest per-direction (distance, classification) pairs
    estimates: DirectionMap<AtomicEstimate>,

    person_detected: AtomicBool,
    waving_detected: AtomicBool,

    /// Set when the service should wind down
    shutdown: AtomicBool,

    /// Set once the patrol has terminated, cleanly or not
    stopped: AtomicBool,

    /// Reason for a fatal stop, if any
    stop_reason: RwLock<Option<String>>,

    /// Ranging frames ingested, for status reporting
    pub frame_count: AtomicU32,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            estimates: DirectionMap::from_fn(|_| AtomicEstimate::new(0.0, CellState::Unknown)),
            person_detected: AtomicBool::new(false),
            waving_detected: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            stop_reason: RwLock::new(None),
            frame_count: AtomicU32::new(0),
        }
    }

    /// Publish one direction's estimate (ingest thread only).
    pub fn set_estimate(&self, dir: Direction, distance: f32, class: CellState) {
        self.estimates[dir].store(distance, class, Ordering::Release);
    }

    /// Latest estimate for one direction.
    pub fn estimate(&self, dir: Direction) -> (f32, CellState) {
        self.estimates[dir].load(Ordering::Acquire)
    }

    /// Snapshot of the four classifications, for the grid update.
    pub fn classifications(&self) -> DirectionMap<CellState> {
        DirectionMap::from_fn(|dir| self.estimate(dir).1)
    }

    /// Snapshot of the four distances, for status logs.
    pub fn distances(&self) -> DirectionMap<f32> {
        DirectionMap::from_fn(|dir| self.estimate(dir).0)
    }

    /// Update the detection flags (ingest thread only).
    pub fn set_detection(&self, detection: Detection) {
        self.person_detected
            .store(detection.person, Ordering::Release);
        self.waving_detected
            .store(detection.waving, Ordering::Release);
    }

    pub fn detection(&self) -> Detection {
        Detection {
            person: self.person_detected.load(Ordering::Acquire),
            waving: self.waving_detected.load(Ordering::Acquire),
        }
    }

    /// Request a graceful stop; observed at the top of each loop.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Record that the patrol has terminated, with a reason when fatal.
    pub fn mark_stopped(&self, reason: Option<String>) {
        if let Some(reason) = reason {
            *self.stop_reason.write() = Some(reason);
        }
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn stop_reason(&self) -> Option<String> {
        self.stop_reason.read().clone()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
