use std::collections::HashMap;

use image::imageops::{self, FilterType};
use log::{debug, info};
use thiserror::Error;

use crate::dwell::NOMINAL_FPS;
use crate::types::{CalibrationEvent, FaceRegions, GazeEvent, NormalizedPoint, Rect, RgbFrame, ScreenPoint};

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("no calibration map uploaded for context '{0}'")]
    UnknownContext(String),
    #[error("calibration map for context '{0}' is empty")]
    EmptyCalibrationMap(String),
}

pub type StepResult = Result<(Option<GazeEvent>, Option<CalibrationEvent>), EstimatorError>;

/// Gaze and calibration estimator consumed once per frame.
pub trait GazeEstimator {
    fn upload_calibration_map(&mut self, points: &[NormalizedPoint], context: &str);
    fn set_fixation(&mut self, seconds: f32);
    fn set_classical_impact(&mut self, impact: u32);
    fn step(&mut self, frame: &RgbFrame, calibrating: bool, width: u32, height: u32, context: &str) -> StepResult;
    fn which_algorithm(&self, context: &str) -> String;
}

// =========================================================================
// Face layout used to classify simulated gaze over the stimulus
// =========================================================================

#[derive(Debug, Clone, Copy)]
pub struct FaceLayout {
    pub eyes: Rect,
    pub nose: Rect,
    pub mouth: Rect,
}

impl Default for FaceLayout {
    fn default() -> Self {
        // Normalized screen space, roughly a frontal portrait.
        Self {
            eyes: Rect::new(0.25, 0.28, 0.50, 0.16),
            nose: Rect::new(0.40, 0.44, 0.20, 0.16),
            mouth: Rect::new(0.33, 0.62, 0.34, 0.12),
        }
    }
}

impl FaceLayout {
    pub fn classify(&self, point: ScreenPoint, width: u32, height: u32) -> FaceRegions {
        let nx = point.x / width.max(1) as f32;
        let ny = point.y / height.max(1) as f32;
        let centre = |r: &Rect| {
            let (cx, cy) = r.center();
            ScreenPoint::new(cx * width as f32, cy * height as f32)
        };
        FaceRegions {
            eyes: self.eyes.contains(nx, ny),
            nose: self.nose.contains(nx, ny),
            mouth: self.mouth.contains(nx, ny),
            landmarks: Some(vec![centre(&self.eyes), centre(&self.nose), centre(&self.mouth)]),
        }
    }
}

// =========================================================================
// Simulated Estimator
// Walks the uploaded calibration map and sweeps a synthetic gaze point.
// =========================================================================

#[derive(Debug, Default)]
struct ContextState {
    map: Vec<NormalizedPoint>,
    cursor: usize,
    frames_on_target: u32,
    frame_count: u64,
}

pub struct SimulatedEstimator {
    contexts: HashMap<String, ContextState>,
    fixation_secs: f32,
    classical_impact: u32,
    fps: u32,
    layout: FaceLayout,
    preview_size: (u32, u32),
}

impl SimulatedEstimator {
    pub fn new(fps: u32) -> Self {
        Self {
            contexts: HashMap::new(),
            fixation_secs: 1.0,
            classical_impact: 0,
            fps: fps.max(1),
            layout: FaceLayout::default(),
            preview_size: (320, 240),
        }
    }

    pub fn classical_impact(&self) -> u32 {
        self.classical_impact
    }

    /// Frames a calibration target is held before moving to the next one.
    pub fn frames_per_target(&self) -> u32 {
        ((self.fixation_secs * self.fps as f32).ceil() as u32).max(1)
    }

    fn gaze_point(frame_count: u64, width: u32, height: u32) -> ScreenPoint {
        let t = frame_count as f32 * 0.05;
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        ScreenPoint::new(cx + t.cos() * width as f32 * 0.3, cy + t.sin() * height as f32 * 0.3)
    }
}

impl Default for SimulatedEstimator {
    fn default() -> Self {
        Self::new(NOMINAL_FPS)
    }
}

impl GazeEstimator for SimulatedEstimator {
    fn upload_calibration_map(&mut self, points: &[NormalizedPoint], context: &str) {
        info!("Uploaded {} calibration points to context '{}'", points.len(), context);
        self.contexts.insert(
            context.to_string(),
            ContextState {
                map: points.to_vec(),
                ..Default::default()
            },
        );
    }

    fn set_fixation(&mut self, seconds: f32) {
        self.fixation_secs = seconds.max(0.0);
    }

    fn set_classical_impact(&mut self, impact: u32) {
        self.classical_impact = impact;
    }

    fn step(&mut self, frame: &RgbFrame, calibrating: bool, width: u32, height: u32, context: &str) -> StepResult {
        let hold = self.frames_per_target();
        let state = self
            .contexts
            .get_mut(context)
            .ok_or_else(|| EstimatorError::UnknownContext(context.to_string()))?;

        state.frame_count += 1;
        let point = Self::gaze_point(state.frame_count, width, height);

        let calibration = if calibrating {
            if state.map.is_empty() {
                return Err(EstimatorError::EmptyCalibrationMap(context.to_string()));
            }
            let target = state.map[state.cursor % state.map.len()].to_screen(width, height);
            state.frames_on_target += 1;
            if state.frames_on_target >= hold {
                state.frames_on_target = 0;
                state.cursor += 1;
                debug!("Context '{}' advancing to target {}", context, state.cursor);
            }
            Some(CalibrationEvent { point: target })
        } else {
            None
        };

        let face = if calibrating { None } else { Some(self.layout.classify(point, width, height)) };

        let (pw, ph) = self.preview_size;
        let sub_frame = if frame.width() > 0 && frame.height() > 0 {
            Some(imageops::resize(frame, pw, ph, FilterType::Nearest))
        } else {
            None
        };

        Ok((Some(GazeEvent { point, sub_frame, face }), calibration))
    }

    fn which_algorithm(&self, _context: &str) -> String {
        "Ridge".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> RgbFrame {
        RgbFrame::new(64, 48)
    }

    #[test]
    fn test_unknown_context_is_error() {
        let mut est = SimulatedEstimator::default();
        let res = est.step(&frame(), true, 100, 100, "missing");
        assert!(matches!(res, Err(EstimatorError::UnknownContext(_))));
    }

    #[test]
    fn test_empty_map_while_calibrating_is_error() {
        let mut est = SimulatedEstimator::default();
        est.upload_calibration_map(&[], "ctx");
        let res = est.step(&frame(), true, 100, 100, "ctx");
        assert!(matches!(res, Err(EstimatorError::EmptyCalibrationMap(_))));
    }

    #[test]
    fn test_holds_each_target_for_fixation() {
        let mut est = SimulatedEstimator::new(4);
        est.set_fixation(0.5);
        assert_eq!(est.frames_per_target(), 2);
        let map = [NormalizedPoint::new(0.5, 0.5), NormalizedPoint::new(1.0, 0.0)];
        est.upload_calibration_map(&map, "ctx");

        let mut targets = Vec::new();
        for _ in 0..5 {
            let (_, cal) = est.step(&frame(), true, 200, 100, "ctx").unwrap();
            targets.push(cal.unwrap().point);
        }
        let a = ScreenPoint::new(100.0, 50.0);
        let b = ScreenPoint::new(200.0, 0.0);
        assert_eq!(targets, vec![a, a, b, b, a]);
    }

    #[test]
    fn test_face_only_after_calibration() {
        let mut est = SimulatedEstimator::default();
        est.upload_calibration_map(&[NormalizedPoint::new(0.2, 0.2)], "ctx");
        let (gaze, cal) = est.step(&frame(), true, 100, 100, "ctx").unwrap();
        assert!(cal.is_some());
        assert!(gaze.unwrap().face.is_none());

        let (gaze, cal) = est.step(&frame(), false, 100, 100, "ctx").unwrap();
        assert!(cal.is_none());
        let face = gaze.unwrap().face.unwrap();
        assert_eq!(face.landmarks.map(|l| l.len()), Some(3));
    }

    #[test]
    fn test_contexts_are_independent() {
        let mut est = SimulatedEstimator::new(1);
        est.set_fixation(1.0);
        est.upload_calibration_map(&[NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(1.0, 1.0)], "a");
        est.upload_calibration_map(&[NormalizedPoint::new(0.5, 0.5)], "b");
        let (_, a1) = est.step(&frame(), true, 10, 10, "a").unwrap();
        let (_, b1) = est.step(&frame(), true, 10, 10, "b").unwrap();
        let (_, a2) = est.step(&frame(), true, 10, 10, "a").unwrap();
        assert_eq!(a1.unwrap().point, ScreenPoint::new(0.0, 0.0));
        assert_eq!(b1.unwrap().point, ScreenPoint::new(5.0, 5.0));
        assert_eq!(a2.unwrap().point, ScreenPoint::new(10.0, 10.0));
    }

    #[test]
    fn test_layout_classification() {
        let layout = FaceLayout::default();
        let eyes = layout.classify(ScreenPoint::new(50.0, 35.0), 100, 100);
        assert!(eyes.eyes && !eyes.nose && !eyes.mouth);
        let mouth = layout.classify(ScreenPoint::new(50.0, 68.0), 100, 100);
        assert!(mouth.mouth && !mouth.eyes);
        let none = layout.classify(ScreenPoint::new(5.0, 5.0), 100, 100);
        assert!(!none.eyes && !none.nose && !none.mouth);
    }

    #[test]
    fn test_classical_impact_is_stored() {
        let mut est = SimulatedEstimator::default();
        est.set_classical_impact(2);
        assert_eq!(est.classical_impact(), 2);
        assert_eq!(est.which_algorithm("any"), "Ridge");
    }

    #[test]
    fn test_sub_frame_preview() {
        let mut est = SimulatedEstimator::default();
        est.upload_calibration_map(&[NormalizedPoint::new(0.2, 0.2)], "ctx");
        let (gaze, _) = est.step(&frame(), false, 100, 100, "ctx").unwrap();
        let sub = gaze.unwrap().sub_frame.unwrap();
        assert_eq!(sub.dimensions(), (320, 240));
    }
}
