use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::types::{NormalizedPoint, ScreenPoint};

// =========================================================================
// Calibration Layout (grid of normalized targets)
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationLayout {
    pub start: f32,
    pub stop: f32,
    pub step: f32,
    /// Number of target transitions required before calibration is complete.
    pub max_points: usize,
    pub shuffle_seed: Option<u64>,
}

impl Default for CalibrationLayout {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: 1.1,
            step: 0.2,
            max_points: 25,
            shuffle_seed: None,
        }
    }
}

impl CalibrationLayout {
    /// Number of axis values, computed without building the axis.
    pub fn axis_len(&self) -> usize {
        if !(self.step > 0.0) || !self.start.is_finite() || !self.stop.is_finite() {
            return 0;
        }
        let step = self.step as f64;
        // Tolerance so that e.g. 0.1 + 3 * 0.3 does not sneak under 1.0.
        let span = self.stop as f64 - step * 1e-6 - self.start as f64;
        if span <= 0.0 {
            return 0;
        }
        // Saturates for absurdly small steps.
        (span / step).ceil() as usize
    }

    /// Grid size, or None if it does not fit in usize.
    pub fn grid_len(&self) -> Option<usize> {
        let n = self.axis_len();
        n.checked_mul(n)
    }

    /// Axis values `start, start + step, ...` strictly below `stop`.
    pub fn axis(&self) -> Vec<f32> {
        let start = self.start as f64;
        let step = self.step as f64;
        (0..self.axis_len()).map(|k| (start + k as f64 * step) as f32).collect()
    }

    /// Row-major grid: y varies slowest, x fastest.
    pub fn grid_points(&self) -> Vec<NormalizedPoint> {
        let axis = self.axis();
        let mut points = Vec::with_capacity(axis.len() * axis.len());
        for &y in &axis {
            for &x in &axis {
                points.push(NormalizedPoint::new(x, y));
            }
        }
        points
    }
}

// =========================================================================
// Calibration Map (shuffled once per session)
// =========================================================================

#[derive(Debug, Clone)]
pub struct CalibrationMap {
    points: Vec<NormalizedPoint>,
    total: usize,
}

impl CalibrationMap {
    pub fn generate(layout: &CalibrationLayout) -> Self {
        let mut points = layout.grid_points();
        match layout.shuffle_seed {
            Some(seed) => points.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => points.shuffle(&mut rand::thread_rng()),
        }
        let total = points.len().min(layout.max_points);
        info!("Calibration map: {} points, {} targets required", points.len(), total);
        Self { points, total }
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

// =========================================================================
// Calibration-Index Tracker
// =========================================================================

/// Counts transitions between consecutive calibration targets.
///
/// The estimator keeps returning the same target while the user fixates on
/// it, so only a change of point advances the index.
#[derive(Debug, Clone)]
pub struct CalibrationTracker {
    index: usize,
    total: usize,
    complete: bool,
    previous: ScreenPoint,
}

impl CalibrationTracker {
    pub fn new(total: usize) -> Self {
        Self {
            index: 0,
            total,
            complete: total == 0,
            previous: ScreenPoint::default(),
        }
    }

    pub fn observe(&mut self, point: ScreenPoint) -> bool {
        if point == self.previous {
            return false;
        }
        self.index += 1;
        self.previous = point;
        debug!("Calibration target {}/{} at ({:.0}, {:.0})", self.index, self.total, point.x, point.y);
        if !self.complete && self.index >= self.total {
            self.complete = true;
            info!("Calibration targets exhausted ({}/{})", self.index, self.total);
        }
        true
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
