use serde::Serialize;

use crate::types::FaceRegions;

pub const NOMINAL_FPS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Eyes,
    Nose,
    Mouth,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Eyes, Region::Nose, Region::Mouth];

    pub fn name(&self) -> &'static str {
        match self {
            Region::Eyes => "eyes",
            Region::Nose => "nose",
            Region::Mouth => "mouth",
        }
    }

    fn flagged(&self, face: &FaceRegions) -> bool {
        match self {
            Region::Eyes => face.eyes,
            Region::Nose => face.nose,
            Region::Mouth => face.mouth,
        }
    }
}

/// Seconds of dwell per region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DwellTotals {
    pub eyes: f64,
    pub nose: f64,
    pub mouth: f64,
}

impl DwellTotals {
    pub fn get(&self, region: Region) -> f64 {
        match region {
            Region::Eyes => self.eyes,
            Region::Nose => self.nose,
            Region::Mouth => self.mouth,
        }
    }

    pub fn sum(&self) -> f64 {
        self.eyes + self.nose + self.mouth
    }
}

/// Accumulates dwell time at a fixed increment per flagged frame.
///
/// The increment is the nominal frame interval, not measured wall time, so
/// totals drift when the real frame rate differs from the target.
#[derive(Debug, Clone)]
pub struct DwellAccumulator {
    totals: DwellTotals,
    frame_interval: f64,
}

impl Default for DwellAccumulator {
    fn default() -> Self {
        Self::with_fps(NOMINAL_FPS)
    }
}

impl DwellAccumulator {
    pub fn with_fps(fps: u32) -> Self {
        Self {
            totals: DwellTotals::default(),
            frame_interval: 1.0 / fps.max(1) as f64,
        }
    }

    pub fn record(&mut self, face: &FaceRegions) {
        for region in Region::ALL {
            if region.flagged(face) {
                match region {
                    Region::Eyes => self.totals.eyes += self.frame_interval,
                    Region::Nose => self.totals.nose += self.frame_interval,
                    Region::Mouth => self.totals.mouth += self.frame_interval,
                }
            }
        }
    }

    pub fn totals(&self) -> DwellTotals {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(eyes: bool, nose: bool, mouth: bool) -> FaceRegions {
        FaceRegions { eyes, nose, mouth, landmarks: None }
    }

    #[test]
    fn test_increment_per_flagged_region() {
        let mut acc = DwellAccumulator::default();
        acc.record(&face(true, false, true));
        let t = acc.totals();
        assert_eq!(t.eyes, 1.0 / 60.0);
        assert_eq!(t.nose, 0.0);
        assert_eq!(t.mouth, 1.0 / 60.0);
    }

    #[test]
    fn test_totals_monotonic() {
        let mut acc = DwellAccumulator::default();
        let pattern = [face(true, false, false), face(false, false, false), face(true, true, true)];
        let mut prev = acc.totals();
        for i in 0..90 {
            acc.record(&pattern[i % 3]);
            let now = acc.totals();
            for region in Region::ALL {
                let delta = now.get(region) - prev.get(region);
                assert!(delta == 0.0 || (delta - 1.0 / 60.0).abs() < 1e-12, "{} jumped by {}", region.name(), delta);
            }
            prev = now;
        }
        assert!((acc.totals().eyes - 60.0 / 60.0).abs() < 1e-9);
        assert!((acc.totals().nose - 30.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_rate() {
        let mut acc = DwellAccumulator::with_fps(30);
        acc.record(&face(false, true, false));
        assert_eq!(acc.totals().nose, 1.0 / 30.0);
        assert_eq!(acc.totals().sum(), 1.0 / 30.0);
    }
}
