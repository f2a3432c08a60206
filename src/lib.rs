pub mod args;
pub mod calibration;
pub mod camera;
pub mod config;
pub mod dwell;
pub mod estimator;
pub mod font;
pub mod output;
pub mod render;
pub mod session;
pub mod store;
pub mod ttf;
pub mod types;
