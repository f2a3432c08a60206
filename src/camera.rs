use anyhow::{anyhow, Context, Result};
use colored::*;
use image::{imageops, Rgb};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};

use crate::types::RgbFrame;

/// Supplies RGB frames to the session loop.
pub trait FrameSource {
    fn read(&mut self) -> Result<RgbFrame>;
}

pub struct CameraSource {
    camera: Camera,
    mirror: bool,
}

impl CameraSource {
    pub fn new(index: usize, mirror: bool) -> Result<Self> {
        let cam_index = CameraIndex::Index(index as u32);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(cam_index, requested).context("Failed to create camera instance")?;

        camera.open_stream().map_err(|e| anyhow!(e)).context("Failed to open camera stream")?;

        println!("{}", format!("Opened camera: {}", camera.info().human_name()).green());
        println!("Format: {}", camera.camera_format());

        Ok(Self { camera, mirror })
    }
}

impl FrameSource for CameraSource {
    fn read(&mut self) -> Result<RgbFrame> {
        let frame = self.camera.frame().map_err(|e| anyhow!(e)).context("Failed to get frame")?;
        // Decoding to RgbFormat already yields RGB order regardless of the device format.
        let mut decoded = frame.decode_image::<RgbFormat>().map_err(|e| anyhow!(e)).context("Failed to decode frame")?;
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut decoded);
        }
        Ok(decoded)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

pub fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(ApiBackend::Auto)?;
    println!("Available Cameras:");
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}

/// Generated frames for running without a camera.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    tick: u32,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, tick: 0 }
    }
}

impl FrameSource for SyntheticSource {
    fn read(&mut self) -> Result<RgbFrame> {
        self.tick = self.tick.wrapping_add(1);
        let shift = (self.tick % 256) as u8;
        let (w, h) = (self.width.max(1), self.height.max(1));
        Ok(RgbFrame::from_fn(w, h, |x, y| {
            Rgb([
                ((x * 255 / w) as u8).wrapping_add(shift),
                (y * 255 / h) as u8,
                128,
            ])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frames_change() {
        let mut src = SyntheticSource::new(8, 4);
        let a = src.read().unwrap();
        let b = src.read().unwrap();
        assert_eq!(a.dimensions(), (8, 4));
        assert_ne!(a.get_pixel(0, 0), b.get_pixel(0, 0));
    }
}
