use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera Index (default 0)
    #[arg(short, long, default_value_t = 0)]
    pub cam_index: u32,

    /// List available cameras
    #[arg(long)]
    pub list: bool,

    /// Configuration file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Use generated frames instead of a camera
    #[arg(long)]
    pub synthetic: bool,

    /// Run without opening a window
    #[arg(long)]
    pub headless: bool,

    /// Results database (overrides storage.db_path)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Stimulus image (overrides ui.stimulus_path)
    #[arg(long)]
    pub stimulus: Option<PathBuf>,

    /// Seed for the calibration map shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}
