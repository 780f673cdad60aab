//! Smoothing and classification of raw ranging samples
//!
//! Short-range ultrasonic readings are noisy, especially near obstacles.
//! Each direction keeps a fixed ring of recent samples and reports the
//! rolling mean, re-clamped to the sensing range and rounded to 0.1m.
//! Clamping on ingest bounds the influence of spurious readings: a dropout
//! reports 0 and a far wall saturates past the 2m ceiling, and neither may
//! drag the mean outside the sensing range.

use crate::grid::{CellState, Direction, DirectionMap};

/// Samples kept per direction
pub const WINDOW_CAPACITY: usize = 15;

/// Upper sensing limit (meters); readings saturate here
pub const SENSING_CEILING: f32 = 2.0;

/// Default distance below which a direction counts as blocked
pub const DEFAULT_NEAR_THRESHOLD: f32 = 0.6;

/// Fixed-capacity ring of recent samples, oldest overwritten once full.
#[derive(Clone, Debug)]
struct SampleWindow {
    samples: [f32; WINDOW_CAPACITY],
    len: usize,
    next: usize,
}

impl SampleWindow {
    const fn new() -> Self {
        Self {
            samples: [0.0; WINDOW_CAPACITY],
            len: 0,
            next: 0,
        }
    }

    fn push(&mut self, value: f32) {
        self.samples[self.next] = value;
        self.next = (self.next + 1) % WINDOW_CAPACITY;
        if self.len < WINDOW_CAPACITY {
            self.len += 1;
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn mean(&self) -> Option<f32> {
        if self.len == 0 {
            return None;
        }
        let sum: f32 = self.samples[..self.len].iter().sum();
        Some(sum / self.len as f32)
    }
}

/// Per-direction smoothing filter.
#[derive(Clone, Debug)]
pub struct RangeFilter {
    windows: DirectionMap<SampleWindow>,
    near_threshold: f32,
}

impl RangeFilter {
    pub fn new(near_threshold: f32) -> Self {
        Self {
            windows: DirectionMap::from_fn(|_| SampleWindow::new()),
            near_threshold,
        }
    }

    /// Record one raw reading for a direction.
    ///
    /// The raw value is clamped to [0, ceiling] before entering the window.
    pub fn ingest(&mut self, dir: Direction, raw: f32) {
        self.windows[dir].push(raw.clamp(0.0, SENSING_CEILING));
    }

    /// Current distance estimate and classification for a direction.
    ///
    /// None until at least one sample has arrived; callers treat absence as
    /// (0.0, Unknown).
    pub fn estimate(&self, dir: Direction) -> Option<(f32, CellState)> {
        let mean = self.windows[dir].mean()?;
        let distance = round_tenth(mean.clamp(0.0, SENSING_CEILING));
        Some((distance, self.classify(distance)))
    }

    /// Classification rule over a rounded estimate.
    ///
    /// At the ceiling the sensor saw nothing; at exactly 0.0 it has not
    /// produced a usable reading. Both mean "no information".
    pub fn classify(&self, distance: f32) -> CellState {
        if distance >= SENSING_CEILING || distance == 0.0 {
            CellState::Unknown
        } else if distance < self.near_threshold {
            CellState::Occupied
        } else {
            CellState::Free
        }
    }
}

/// Round to one decimal place (0.1m resolution).
fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
