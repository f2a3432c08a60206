use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::*;
use log::info;

use gaze_dwell::args::Args;
use gaze_dwell::calibration::CalibrationMap;
use gaze_dwell::camera::{self, CameraSource, FrameSource, SyntheticSource};
use gaze_dwell::config::AppConfig;
use gaze_dwell::dwell::Region;
use gaze_dwell::estimator::{GazeEstimator, SimulatedEstimator};
use gaze_dwell::output::{HeadlessView, SessionView};
use gaze_dwell::render::SessionDisplay;
use gaze_dwell::session::{run_session, SessionController, SessionEnd, SessionOptions, SteadyClock};
use gaze_dwell::store;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list {
        return camera::list_cameras();
    }

    // 0. Load Config
    let mut config = AppConfig::load_from(&args.config)?;
    if let Some(seed) = args.seed {
        config.calibration.shuffle_seed = Some(seed);
    }
    config.validate()?;

    let width = config.screen.width;
    let height = config.screen.height;
    let fps = config.session.target_fps;
    let context = config.session.context.clone();

    // 1. Frame source
    let mut source: Box<dyn FrameSource> = if args.synthetic {
        println!("{}", "Using synthetic frames".yellow());
        Box::new(SyntheticSource::new(640, 480))
    } else {
        Box::new(CameraSource::new(args.cam_index as usize, config.screen.mirror)?)
    };

    // 2. Estimator + calibration map
    let map = CalibrationMap::generate(&config.calibration);
    let mut estimator = SimulatedEstimator::new(fps);
    estimator.upload_calibration_map(map.points(), &context);
    estimator.set_classical_impact(config.session.classical_impact);
    estimator.set_fixation(config.session.fixation_secs);
    info!(
        "Estimator '{}' ready (classical impact {})",
        estimator.which_algorithm(&context),
        estimator.classical_impact()
    );

    // 3. Display
    let stimulus_path = args.stimulus.clone().unwrap_or_else(|| PathBuf::from(&config.ui.stimulus_path));
    let mut view: Box<dyn SessionView> = if args.headless {
        Box::new(HeadlessView::default())
    } else {
        Box::new(SessionDisplay::open(
            "EyeTracking Calibration and Gaze Tracking",
            width,
            height,
            fps,
            &config.ui,
            &stimulus_path,
        )?)
    };

    // 4. Loop
    let mut controller = SessionController::new(
        map.total(),
        config.stimulus_duration()?,
        fps,
    );
    let options = SessionOptions {
        context,
        width,
        height,
        max_consecutive_frame_failures: config.session.max_consecutive_frame_failures,
    };
    let mut clock = SteadyClock::start();
    println!("Starting session. Press Ctrl+Q to quit.");
    let summary = run_session(&mut controller, source.as_mut(), &mut estimator, view.as_mut(), &mut clock, &options)?;
    drop(view);

    match summary.end {
        SessionEnd::Completed => println!("{}", "Session complete.".green()),
        SessionEnd::Quit => println!("{}", "Session ended early by user.".yellow()),
        SessionEnd::SourceFailed => println!("{}", "Failed to capture frames from camera.".red()),
    }

    // 5. Persist
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path());
    let record = store::save_gaze_data(&db_path, &summary.totals)?;
    info!("Session summary: {}", serde_json::to_string(&summary)?);
    println!("Gaze times (seconds), result #{}:", record.id);
    for region in Region::ALL {
        println!("  {:<6} {:.3}", region.name(), summary.totals.get(region));
    }
    println!(
        "Calibration {}/{} over {} frames",
        summary.calibration.0, summary.calibration.1, summary.frames
    );
    println!("{}", format!("Results saved to {}", db_path.display()).green());

    Ok(())
}
