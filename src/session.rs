use std::time::{Duration, Instant};

use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

use crate::calibration::CalibrationTracker;
use crate::camera::FrameSource;
use crate::dwell::{DwellAccumulator, DwellTotals};
use crate::estimator::GazeEstimator;
use crate::output::SessionView;
use crate::types::{CalibrationEvent, GazeEvent, RgbFrame};

// =========================================================================
// Clock
// =========================================================================

/// Elapsed time since the session started.
pub trait Clock {
    fn elapsed(&mut self) -> Duration;
}

pub struct SteadyClock {
    start: Instant,
}

impl SteadyClock {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for SteadyClock {
    fn elapsed(&mut self) -> Duration {
        self.start.elapsed()
    }
}

/// Advances by a fixed step on every read.
pub struct FixedStepClock {
    now: Duration,
    step: Duration,
}

impl FixedStepClock {
    pub fn new(step: Duration) -> Self {
        Self { now: Duration::ZERO, step }
    }

    pub fn per_frame(fps: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / fps.max(1) as f64))
    }
}

impl Clock for FixedStepClock {
    fn elapsed(&mut self) -> Duration {
        self.now += self.step;
        self.now
    }
}

// =========================================================================
// Controller (Calibrating -> Stimulus -> Done)
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Calibrating,
    Stimulus { started_at: Duration },
    Done,
}

pub struct SessionController {
    tracker: CalibrationTracker,
    dwell: DwellAccumulator,
    stimulus_duration: Duration,
    phase: Phase,
}

impl SessionController {
    pub fn new(total_targets: usize, stimulus_duration: Duration, fps: u32) -> Self {
        Self {
            tracker: CalibrationTracker::new(total_targets),
            dwell: DwellAccumulator::with_fps(fps),
            stimulus_duration,
            phase: Phase::Calibrating,
        }
    }

    /// Flag passed to the estimator for the upcoming frame.
    pub fn is_calibrating(&self) -> bool {
        !self.tracker.is_complete()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn tracker(&self) -> &CalibrationTracker {
        &self.tracker
    }

    pub fn totals(&self) -> DwellTotals {
        self.dwell.totals()
    }

    pub fn on_frame(&mut self, gaze: Option<&GazeEvent>, calibration: Option<&CalibrationEvent>, now: Duration) -> Phase {
        if self.phase == Phase::Calibrating {
            if !self.tracker.is_complete() {
                if let Some(cal) = calibration {
                    self.tracker.observe(cal.point);
                }
                return self.phase;
            }
            info!("Calibration done. Starting stimulus presentation...");
            self.phase = Phase::Stimulus { started_at: now };
        }

        if let Phase::Stimulus { started_at } = self.phase {
            if let Some(face) = gaze.and_then(|g| g.face.as_ref()) {
                self.dwell.record(face);
            }
            if now.saturating_sub(started_at) > self.stimulus_duration {
                info!("Stimulus presentation finished.");
                self.phase = Phase::Done;
            }
        }

        self.phase
    }
}

// =========================================================================
// Runner
// =========================================================================

/// Everything the view needs to draw one frame.
pub struct FrameView<'a> {
    pub phase: Phase,
    pub frame: &'a RgbFrame,
    pub gaze: Option<&'a GazeEvent>,
    pub calibration: Option<&'a CalibrationEvent>,
    pub progress: (usize, usize),
    pub algorithm: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionEnd {
    Completed,
    Quit,
    SourceFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub end: SessionEnd,
    pub totals: DwellTotals,
    pub calibration: (usize, usize),
    pub frames: u64,
}

pub struct SessionOptions {
    pub context: String,
    pub width: u32,
    pub height: u32,
    pub max_consecutive_frame_failures: u32,
}

pub fn run_session<S, E, V, C>(
    controller: &mut SessionController,
    source: &mut S,
    estimator: &mut E,
    view: &mut V,
    clock: &mut C,
    options: &SessionOptions,
) -> Result<SessionSummary>
where
    S: FrameSource + ?Sized,
    E: GazeEstimator + ?Sized,
    V: SessionView + ?Sized,
    C: Clock + ?Sized,
{
    let mut frames = 0u64;
    let mut failures = 0u32;

    let end = loop {
        if view.quit_requested() {
            info!("Quit requested");
            break SessionEnd::Quit;
        }

        let frame = match source.read() {
            Ok(frame) => {
                failures = 0;
                frame
            }
            Err(e) => {
                failures += 1;
                warn!("Failed to capture frame ({} in a row): {:#}", failures, e);
                if failures >= options.max_consecutive_frame_failures {
                    break SessionEnd::SourceFailed;
                }
                continue;
            }
        };

        let calibrating = controller.is_calibrating();
        let (gaze, calibration) =
            estimator.step(&frame, calibrating, options.width, options.height, &options.context)?;
        let now = clock.elapsed();
        let phase = controller.on_frame(gaze.as_ref(), calibration.as_ref(), now);
        frames += 1;

        let algorithm = estimator.which_algorithm(&options.context);
        let tracker = controller.tracker();
        view.present(&FrameView {
            phase,
            frame: &frame,
            gaze: gaze.as_ref(),
            calibration: if calibrating { calibration.as_ref() } else { None },
            progress: (tracker.index(), tracker.total()),
            algorithm: &algorithm,
        })?;

        if controller.is_done() {
            break SessionEnd::Completed;
        }
    };

    let tracker = controller.tracker();
    Ok(SessionSummary {
        end,
        totals: controller.totals(),
        calibration: (tracker.index(), tracker.total()),
        frames,
    })
}
