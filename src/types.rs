use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};

pub type RgbFrame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// A point in normalized screen space, both axes in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_screen(self, width: u32, height: u32) -> ScreenPoint {
        ScreenPoint {
            x: self.x * width as f32,
            y: self.y * height as f32,
        }
    }
}

/// A point in pixel coordinates. Equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Per-frame face result: which regions are currently attended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceRegions {
    pub eyes: bool,
    pub nose: bool,
    pub mouth: bool,
    pub landmarks: Option<Vec<ScreenPoint>>,
}

#[derive(Debug, Clone)]
pub struct GazeEvent {
    pub point: ScreenPoint,
    pub sub_frame: Option<RgbFrame>,
    pub face: Option<FaceRegions>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationEvent {
    pub point: ScreenPoint,
}
