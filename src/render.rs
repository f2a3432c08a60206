use anyhow::Result;
use image::imageops::{self, FilterType};
use log::warn;
use std::path::Path;

use crate::config::UiConfig;
use crate::font;
use crate::output::{SessionView, WindowOutput};
use crate::session::{FrameView, Phase};
use crate::ttf::FontRenderer;
use crate::types::RgbFrame;

pub type Color = (u8, u8, u8);

pub const RED: Color = (255, 0, 100);
pub const BLUE: Color = (100, 0, 255);
pub const GREEN: Color = (0, 255, 0);
pub const WHITE: Color = (255, 255, 255);
pub const BLACK: Color = (0, 0, 0);
pub const BLANK: Color = (30, 30, 30);

/// Camera preview edge when the estimator supplies no sub-frame.
const PREVIEW_SIZE: u32 = 400;

const INSTRUCTION: &str = "First we're calibrating the system...";
const INSTRUCTION_Y: usize = 10;

// =========================================================================
// Canvas (RGB8 frame buffer)
// =========================================================================

pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 3],
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        Some((self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]))
    }

    pub fn fill(&mut self, color: Color) {
        for px in self.pixels.chunks_mut(3) {
            px[0] = color.0;
            px[1] = color.1;
            px[2] = color.2;
        }
    }

    fn put(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        self.pixels[idx] = color.0;
        self.pixels[idx + 1] = color.1;
        self.pixels[idx + 2] = color.2;
    }

    /// Copies `image` with its top-left corner at (x, y), clipped to the canvas.
    pub fn blit(&mut self, image: &RgbFrame, x: usize, y: usize) {
        for (ix, iy, p) in image.enumerate_pixels() {
            self.put((x + ix as usize) as i64, (y + iy as usize) as i64, (p[0], p[1], p[2]));
        }
    }

    pub fn draw_circle(&mut self, cx: f32, cy: f32, radius: u32, color: Color) {
        let (mx, my) = (cx.round() as i64, cy.round() as i64);
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.put(mx + dx, my + dy, color);
                }
            }
        }
    }
}

// =========================================================================
// Text (TrueType with bitmap fallback)
// =========================================================================

pub enum TextRenderer {
    TrueType(FontRenderer),
    Bitmap { scale: usize },
}

impl TextRenderer {
    pub fn load(family: &str, bitmap_scale: usize) -> Self {
        match FontRenderer::try_load(family) {
            Some(fr) => TextRenderer::TrueType(fr),
            None => TextRenderer::Bitmap { scale: bitmap_scale.max(1) },
        }
    }

    /// Bitmap scale grows with the requested point size relative to 30pt.
    fn bitmap_scale(scale: usize, size_pt: u32) -> usize {
        (scale * size_pt as usize / 30).max(1)
    }

    pub fn draw(&self, canvas: &mut Canvas, x: usize, y: usize, text: &str, color: Color, size_pt: u32) {
        let (w, h) = (canvas.width, canvas.height);
        match self {
            TextRenderer::TrueType(fr) => fr.draw_text(&mut canvas.pixels, w, h, x, y, text, color, size_pt as f32),
            TextRenderer::Bitmap { scale } => {
                font::draw_text_line(&mut canvas.pixels, w, h, x, y, text, color, Self::bitmap_scale(*scale, size_pt))
            }
        }
    }

    pub fn measure_width(&self, text: &str, size_pt: u32) -> usize {
        match self {
            TextRenderer::TrueType(fr) => fr.measure_width(text, size_pt as f32),
            TextRenderer::Bitmap { scale } => font::measure_text_width(text, Self::bitmap_scale(*scale, size_pt)),
        }
    }

    pub fn line_height(&self, size_pt: u32) -> usize {
        match self {
            TextRenderer::TrueType(fr) => fr.measure_height(size_pt as f32),
            TextRenderer::Bitmap { scale } => font::line_height(Self::bitmap_scale(*scale, size_pt)),
        }
    }
}

// =========================================================================
// Scene rendering
// =========================================================================

pub fn load_stimulus(path: &Path, width: u32, height: u32) -> Option<RgbFrame> {
    if !path.exists() {
        warn!("Stimulus image not found at {}. Showing blank screen after calibration.", path.display());
        return None;
    }
    match image::open(path) {
        Ok(img) => Some(imageops::resize(&img.to_rgb8(), width, height, FilterType::Triangle)),
        Err(e) => {
            warn!("Could not decode stimulus {}: {}. Showing blank screen after calibration.", path.display(), e);
            None
        }
    }
}

pub struct SceneRenderer {
    canvas: Canvas,
    text: TextRenderer,
    stimulus: Option<RgbFrame>,
    title_size_pt: u32,
    label_size_pt: u32,
    target_radius: u32,
    landmark_radius: u32,
    show_gaze_cursor: bool,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32, ui: &UiConfig, text: TextRenderer, stimulus: Option<RgbFrame>) -> Self {
        Self {
            canvas: Canvas::new(width as usize, height as usize),
            text,
            stimulus,
            title_size_pt: ui.title_size_pt,
            label_size_pt: ui.label_size_pt,
            target_radius: ui.target_radius,
            landmark_radius: ui.landmark_radius,
            show_gaze_cursor: ui.show_gaze_cursor,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn render(&mut self, view: &FrameView) {
        self.canvas.fill(BLACK);
        match view.gaze.and_then(|g| g.sub_frame.as_ref()) {
            Some(sub) => self.canvas.blit(sub, 0, 0),
            None if view.frame.width() > 0 && view.frame.height() > 0 => {
                let preview = imageops::resize(view.frame, PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Nearest);
                self.canvas.blit(&preview, 0, 0);
            }
            None => {}
        }

        match view.phase {
            Phase::Calibrating => self.render_calibration(view),
            Phase::Stimulus { .. } | Phase::Done => self.render_stimulus(view),
        }

        let algo = format!("Algorithm: {}", view.algorithm);
        let y = self.canvas.height.saturating_sub(40);
        self.text.draw(&mut self.canvas, 10, y, &algo, WHITE, self.label_size_pt);
    }

    fn render_calibration(&mut self, view: &FrameView) {
        if let Some(cal) = view.calibration {
            self.canvas.draw_circle(cal.point.x, cal.point.y, self.target_radius, BLUE);
        }
        let y = self.draw_centered(INSTRUCTION, INSTRUCTION_Y, self.label_size_pt);
        let (index, total) = view.progress;
        let progress = format!("Calibration: {}/{}", index, total);
        self.draw_centered(&progress, y + 10, self.title_size_pt);
    }

    /// Draws one horizontally centred line and returns the y just below it.
    fn draw_centered(&mut self, text: &str, y: usize, size_pt: u32) -> usize {
        let text_w = self.text.measure_width(text, size_pt);
        let x = (self.canvas.width / 2).saturating_sub(text_w / 2);
        self.text.draw(&mut self.canvas, x, y, text, WHITE, size_pt);
        y + self.text.line_height(size_pt)
    }

    fn render_stimulus(&mut self, view: &FrameView) {
        match &self.stimulus {
            Some(img) => self.canvas.blit(img, 0, 0),
            None => self.canvas.fill(BLANK),
        }

        let Some(gaze) = view.gaze else {
            return;
        };
        if let Some(landmarks) = gaze.face.as_ref().and_then(|f| f.landmarks.as_ref()) {
            for p in landmarks {
                self.canvas.draw_circle(p.x, p.y, self.landmark_radius, GREEN);
            }
        }
        if self.show_gaze_cursor {
            let color = if view.algorithm == "Ridge" { RED } else { BLUE };
            self.canvas.draw_circle(gaze.point.x, gaze.point.y, 50, color);
            let (x, y) = (gaze.point.x.max(0.0) as usize, gaze.point.y.max(0.0) as usize);
            self.text.draw(&mut self.canvas, x, y, view.algorithm, WHITE, self.label_size_pt);
        }
    }
}

// =========================================================================
// Session display (window + renderer, owned for the session lifetime)
// =========================================================================

pub struct SessionDisplay {
    window: WindowOutput,
    renderer: SceneRenderer,
}

impl SessionDisplay {
    pub fn open(title: &str, width: u32, height: u32, fps: u32, ui: &UiConfig, stimulus_path: &Path) -> Result<Self> {
        let window = WindowOutput::new(title, width as usize, height as usize, fps)?;
        let text = TextRenderer::load(&ui.font_family, ui.bitmap_scale);
        let stimulus = load_stimulus(stimulus_path, width, height);
        Ok(Self {
            window,
            renderer: SceneRenderer::new(width, height, ui, text, stimulus),
        })
    }
}

impl SessionView for SessionDisplay {
    fn quit_requested(&mut self) -> bool {
        !self.window.is_open() || self.window.ctrl_q_down()
    }

    fn present(&mut self, frame: &FrameView) -> Result<()> {
        self.renderer.render(frame);
        self.window.update(self.renderer.canvas().pixels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CalibrationEvent, FaceRegions, GazeEvent, ScreenPoint};
    use std::time::Duration;

    fn renderer(stimulus: Option<RgbFrame>) -> SceneRenderer {
        let ui = UiConfig::default();
        SceneRenderer::new(200, 120, &ui, TextRenderer::Bitmap { scale: 1 }, stimulus)
    }

    #[test]
    fn test_circle_is_clipped() {
        let mut canvas = Canvas::new(10, 10);
        canvas.draw_circle(0.0, 0.0, 3, GREEN);
        assert_eq!(canvas.pixel(0, 0), Some(GREEN));
        assert_eq!(canvas.pixel(3, 0), Some(GREEN));
        assert_eq!(canvas.pixel(3, 3), Some(BLACK));
    }

    #[test]
    fn test_calibration_target_drawn() {
        let frame = RgbFrame::new(4, 4);
        let cal = CalibrationEvent { point: ScreenPoint::new(100.0, 80.0) };
        let mut r = renderer(None);
        r.render(&FrameView {
            phase: Phase::Calibrating,
            frame: &frame,
            gaze: None,
            calibration: Some(&cal),
            progress: (3, 25),
            algorithm: "Ridge",
        });
        assert_eq!(r.canvas().pixel(100, 80), Some(BLUE));
        assert_eq!(r.canvas().pixel(199, 119), Some(BLACK));
    }

    fn has_white_row(canvas: &Canvas, rows: std::ops::Range<usize>) -> bool {
        rows.flat_map(|y| (0..canvas.width).map(move |x| (x, y)))
            .any(|(x, y)| canvas.pixel(x, y) == Some(WHITE))
    }

    #[test]
    fn test_instruction_shown_only_while_calibrating() {
        let frame = RgbFrame::new(4, 4);
        let mut r = renderer(None);
        let top = INSTRUCTION_Y..INSTRUCTION_Y + r.text.line_height(r.label_size_pt);
        r.render(&FrameView {
            phase: Phase::Calibrating,
            frame: &frame,
            gaze: None,
            calibration: None,
            progress: (0, 25),
            algorithm: "Ridge",
        });
        assert!(has_white_row(r.canvas(), top.clone()));

        r.render(&FrameView {
            phase: Phase::Stimulus { started_at: Duration::ZERO },
            frame: &frame,
            gaze: None,
            calibration: None,
            progress: (25, 25),
            algorithm: "Ridge",
        });
        assert!(!has_white_row(r.canvas(), top));
    }

    #[test]
    fn test_missing_stimulus_uses_blank_fill() {
        let frame = RgbFrame::new(4, 4);
        let gaze = GazeEvent {
            point: ScreenPoint::new(5.0, 5.0),
            sub_frame: None,
            face: Some(FaceRegions {
                landmarks: Some(vec![ScreenPoint::new(150.0, 60.0)]),
                ..Default::default()
            }),
        };
        let mut r = renderer(None);
        r.render(&FrameView {
            phase: Phase::Stimulus { started_at: Duration::ZERO },
            frame: &frame,
            gaze: Some(&gaze),
            calibration: None,
            progress: (25, 25),
            algorithm: "Ridge",
        });
        assert_eq!(r.canvas().pixel(199, 0), Some(BLANK));
        assert_eq!(r.canvas().pixel(150, 60), Some(GREEN));
    }

    #[test]
    fn test_stimulus_image_covers_screen() {
        let frame = RgbFrame::new(4, 4);
        let stim = RgbFrame::from_pixel(200, 120, image::Rgb([9, 8, 7]));
        let mut r = renderer(Some(stim));
        r.render(&FrameView {
            phase: Phase::Stimulus { started_at: Duration::ZERO },
            frame: &frame,
            gaze: None,
            calibration: None,
            progress: (25, 25),
            algorithm: "Ridge",
        });
        assert_eq!(r.canvas().pixel(100, 10), Some((9, 8, 7)));
    }

    #[test]
    fn test_missing_stimulus_file() {
        assert!(load_stimulus(Path::new("/nonexistent/face_1.jpg"), 10, 10).is_none());
    }
}
