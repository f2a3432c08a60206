use anyhow::{bail, Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calibration::CalibrationLayout;

/// Largest calibration grid a layout may expand to.
pub const MAX_GRID_POINTS: usize = 10_000;
/// One day.
pub const MAX_STIMULUS_SECS: f32 = 86_400.0;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub calibration: CalibrationLayout,
    pub screen: ScreenConfig,
    pub ui: UiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Estimator state partition label.
    pub context: String,
    pub stimulus_secs: f32,
    pub target_fps: u32,
    pub fixation_secs: f32,
    pub classical_impact: u32,
    pub max_consecutive_frame_failures: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub font_family: String,
    pub title_size_pt: u32,
    pub label_size_pt: u32,
    /// Pixel scale of the bitmap fallback font.
    pub bitmap_scale: usize,
    pub target_radius: u32,
    pub landmark_radius: u32,
    pub show_gaze_cursor: bool,
    pub stimulus_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context: "my_context".to_string(),
            stimulus_secs: 15.0,
            target_fps: 60,
            fixation_secs: 1.0,
            classical_impact: 2,
            max_consecutive_frame_failures: 30,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
            mirror: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            title_size_pt: 48,
            label_size_pt: 30,
            bitmap_scale: 4,
            target_radius: 15,
            landmark_radius: 20,
            show_gaze_cursor: false,
            stimulus_path: "face_1.jpg".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "gaze_results.db".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            // Missing fields fall back to Default through #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    println!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    println!("{}", format!("Error parsing config: {}. Loading defaults.", e).yellow());
                    Self::default()
                }
            }
        } else {
            println!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        // Write back so new fields show up in the file
        config.save_to(path)?;

        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content).with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.calibration.step > 0.0) {
            bail!("calibration.step must be positive, got {}", self.calibration.step);
        }
        let grid = &self.calibration;
        if !grid.start.is_finite() || !grid.stop.is_finite() {
            bail!("calibration.start and calibration.stop must be finite");
        }
        match grid.grid_len() {
            Some(n) if n <= MAX_GRID_POINTS => {}
            _ => bail!(
                "calibration grid of {}x{} points exceeds {} (step {} too small)",
                grid.axis_len(),
                grid.axis_len(),
                MAX_GRID_POINTS,
                grid.step
            ),
        }
        if self.session.target_fps == 0 {
            bail!("session.target_fps must be at least 1");
        }
        if !(0.0..=MAX_STIMULUS_SECS).contains(&self.session.stimulus_secs) {
            bail!(
                "session.stimulus_secs must be between 0 and {}, got {}",
                MAX_STIMULUS_SECS,
                self.session.stimulus_secs
            );
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            bail!("screen size must be non-zero, got {}x{}", self.screen.width, self.screen.height);
        }
        if self.session.max_consecutive_frame_failures == 0 {
            bail!("session.max_consecutive_frame_failures must be at least 1");
        }
        Ok(())
    }

    pub fn stimulus_duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f32(self.session.stimulus_secs)
            .with_context(|| format!("Invalid session.stimulus_secs {}", self.session.stimulus_secs))
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.db_path)
    }
}
