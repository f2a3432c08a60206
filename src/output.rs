use anyhow::Result;
use std::time::Duration;

use crate::session::{FrameView, Phase};

/// Sink for rendered session frames, polled for quit once per frame.
pub trait SessionView {
    fn quit_requested(&mut self) -> bool;
    fn present(&mut self, frame: &FrameView) -> Result<()>;
}

/// Draws nothing. Records what it was shown.
#[derive(Debug, Default)]
pub struct HeadlessView {
    pub presented: u64,
    pub last_phase: Option<Phase>,
    pub last_progress: (usize, usize),
}

impl SessionView for HeadlessView {
    fn quit_requested(&mut self) -> bool {
        false
    }

    fn present(&mut self, frame: &FrameView) -> Result<()> {
        self.presented += 1;
        self.last_phase = Some(frame.phase);
        self.last_progress = frame.progress;
        Ok(())
    }
}

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize, fps: u32) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                borderless: true,
                topmost: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to create window: {}", e))?;

        window.limit_update_rate(Some(Duration::from_micros(1_000_000 / fps.max(1) as u64)));

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Ctrl+Q, matching the keyboard shortcut of the calibration demos.
    pub fn ctrl_q_down(&self) -> bool {
        let ctrl = self.window.is_key_down(minifb::Key::LeftCtrl) || self.window.is_key_down(minifb::Key::RightCtrl);
        ctrl && self.window.is_key_down(minifb::Key::Q)
    }

    pub fn update(&mut self, rgb: &[u8]) -> Result<()> {
        // rgb is RGB8, window wants 0RGB u32
        if self.buffer.len() != self.width * self.height {
            self.buffer.resize(self.width * self.height, 0);
        }

        for (i, chunk) in rgb.chunks(3).enumerate() {
            if i >= self.buffer.len() {
                break;
            }
            let r = chunk[0] as u32;
            let g = chunk[1] as u32;
            let b = chunk[2] as u32;
            self.buffer[i] = (r << 16) | (g << 8) | b;
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))
    }
}
