//! Simulated rover configuration
//!
//! Robot geometry (wheel radius, track, tile size) comes from the main
//! `[robot]` section; this section only covers the simulated world.
//!
//! ```toml
//! [simulation]
//! start_x = -5.0
//! start_y = -5.0
//! speed_factor = 25.0        # 0 = run as fast as possible
//! reflectance_noise_stddev = 0.01
//! objects = [{ x = 8.5, y = 3.4 }]
//! ```

use serde::{Deserialize, Serialize};

use crate::core::Waypoint;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// True start position in cm
    #[serde(default = "default_start")]
    pub start_x: f64,
    #[serde(default = "default_start")]
    pub start_y: f64,

    /// True start heading in degrees
    #[serde(default)]
    pub start_heading: f64,

    /// Simulated seconds advanced per sensor sample
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// Simulated seconds per wall-clock second (0 disables pacing)
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Noise seed (0 = random)
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Gyro noise standard deviation in degrees
    #[serde(default)]
    pub gyro_noise_stddev: f64,

    /// Reflectance noise standard deviation
    #[serde(default = "default_reflectance_noise")]
    pub reflectance_noise_stddev: f64,

    /// Reflectance of bare floor
    #[serde(default = "default_floor_intensity")]
    pub floor_intensity: f64,

    /// Reflectance of grid lines
    #[serde(default = "default_line_intensity")]
    pub line_intensity: f64,

    /// Grid line width in cm
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    /// Maximum object detection range in cm
    #[serde(default = "default_scanner_range")]
    pub scanner_range: f64,

    /// Half of the object detector field of view in degrees
    #[serde(default = "default_scanner_half_fov")]
    pub scanner_half_fov: f64,

    /// Objects placed in the arena, in tiles
    #[serde(default)]
    pub objects: Vec<Waypoint>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_x: default_start(),
            start_y: default_start(),
            start_heading: 0.0,
            time_step: default_time_step(),
            speed_factor: default_speed_factor(),
            random_seed: default_random_seed(),
            gyro_noise_stddev: 0.0,
            reflectance_noise_stddev: default_reflectance_noise(),
            floor_intensity: default_floor_intensity(),
            line_intensity: default_line_intensity(),
            line_width: default_line_width(),
            scanner_range: default_scanner_range(),
            scanner_half_fov: default_scanner_half_fov(),
            objects: Vec::new(),
        }
    }
}

fn default_start() -> f64 {
    -5.0
}
fn default_time_step() -> f64 {
    0.01
}
fn default_speed_factor() -> f64 {
    25.0
}
fn default_random_seed() -> u64 {
    42
}
fn default_reflectance_noise() -> f64 {
    0.01
}
fn default_floor_intensity() -> f64 {
    0.6
}
fn default_line_intensity() -> f64 {
    0.2
}
fn default_line_width() -> f64 {
    1.0
}
fn default_scanner_range() -> f64 {
    45.0
}
fn default_scanner_half_fov() -> f64 {
    30.0
}
