//! Configuration loading for KhojNav

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::{GridPoint, Waypoint, Zone};
use crate::devices::mock::SimulationConfig;
use crate::error::{KhojError, Result};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct KhojConfig {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
    #[serde(default)]
    pub mission: MissionConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Robot physical parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Wheel radius in cm (default: 2.05)
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f64,

    /// Distance between wheel contact points in cm (default: 9.5)
    #[serde(default = "default_track")]
    pub track: f64,

    /// Floor tile edge in cm (default: 30.48)
    #[serde(default = "default_tile_size")]
    pub tile_size: f64,

    /// Pose estimator period in milliseconds (default: 25)
    #[serde(default = "default_odometer_period")]
    pub odometer_period_ms: u64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            wheel_radius: default_wheel_radius(),
            track: default_track(),
            tile_size: default_tile_size(),
            odometer_period_ms: default_odometer_period(),
        }
    }
}

impl RobotConfig {
    pub fn odometer_period(&self) -> Duration {
        Duration::from_millis(self.odometer_period_ms)
    }
}

/// Motion controller parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NavigationConfig {
    /// Straight-line wheel speed in deg/s (default: 50)
    #[serde(default = "default_forward_speed")]
    pub forward_speed: f64,

    /// Turning wheel speed in deg/s (default: 100)
    #[serde(default = "default_rotate_speed")]
    pub rotate_speed: f64,

    /// Wheel acceleration in deg/s² (default: 3000)
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,

    /// Closed-loop turn speed ceiling (default: 80)
    #[serde(default = "default_turn_base_speed")]
    pub turn_base_speed: f64,

    /// Closed-loop turn slowdown gain (default: 25)
    #[serde(default = "default_turn_gain")]
    pub turn_gain: f64,

    /// Turn completion band in degrees (default: 1.0)
    #[serde(default = "default_turn_tolerance")]
    pub turn_tolerance: f64,

    /// Iteration ceiling for a single closed-loop turn
    #[serde(default = "default_max_turn_iterations")]
    pub max_turn_iterations: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            forward_speed: default_forward_speed(),
            rotate_speed: default_rotate_speed(),
            acceleration: default_acceleration(),
            turn_base_speed: default_turn_base_speed(),
            turn_gain: default_turn_gain(),
            turn_tolerance: default_turn_tolerance(),
            max_turn_iterations: default_max_turn_iterations(),
        }
    }
}

/// How a reflectance sample is judged to be a grid line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingRule {
    /// Reading falls below `crossing_threshold`
    #[default]
    Absolute,
    /// Reading drops by at least `differential_threshold` between samples
    Differential,
}

/// Arena corner the robot starts from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingCorner {
    #[default]
    LowerLeft,
    LowerRight,
    UpperRight,
    UpperLeft,
}

impl StartingCorner {
    /// Corner position in tiles for an arena of the given size
    pub fn position(self, arena: GridPoint) -> Waypoint {
        match self {
            StartingCorner::LowerLeft => Waypoint::new(0.0, 0.0),
            StartingCorner::LowerRight => Waypoint::new(arena.x as f64, 0.0),
            StartingCorner::UpperRight => Waypoint::new(arena.x as f64, arena.y as f64),
            StartingCorner::UpperLeft => Waypoint::new(0.0, arena.y as f64),
        }
    }
}

/// Grid-line relocalization parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocalizationConfig {
    /// Heading driven while approaching the reference intersection (default: 45)
    #[serde(default = "default_approach_heading")]
    pub approach_heading: f64,

    /// Approach stops when the reading falls below this (default: 0.41)
    #[serde(default = "default_approach_threshold")]
    pub approach_threshold: f64,

    /// Sweep line threshold for the absolute rule (default: 0.40)
    #[serde(default = "default_crossing_threshold")]
    pub crossing_threshold: f64,

    /// Sample-to-sample drop for the differential rule (default: 0.05)
    #[serde(default = "default_differential_threshold")]
    pub differential_threshold: f64,

    #[serde(default)]
    pub crossing_rule: CrossingRule,

    /// Distance backed off after the approach, in cm (default: 9)
    #[serde(default = "default_back_off")]
    pub back_off_distance: f64,

    /// Distance from wheel axis to the reflectance sensor, in cm (default: 6)
    #[serde(default = "default_sensor_offset")]
    pub sensor_offset: f64,

    /// Subtracted from the measured heading when re-seeding (default: 6)
    #[serde(default = "default_calibration_offset")]
    pub calibration_offset: f64,

    /// Final heading after relocalization (default: 90)
    #[serde(default = "default_reference_heading")]
    pub reference_heading: f64,

    /// Headings strictly inside (low, high) get an open-loop correction
    #[serde(default = "default_alignment_band")]
    pub alignment_band: (f64, f64),

    /// Wheel speed during the sweep in deg/s (default: 100)
    #[serde(default = "default_rotate_speed")]
    pub sweep_speed: f64,

    /// Sample ceiling for approach and sweep loops
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    #[serde(default)]
    pub starting_corner: StartingCorner,

    /// Arena size in tiles (default: 13 x 7)
    #[serde(default = "default_arena")]
    pub arena: GridPoint,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            approach_heading: default_approach_heading(),
            approach_threshold: default_approach_threshold(),
            crossing_threshold: default_crossing_threshold(),
            differential_threshold: default_differential_threshold(),
            crossing_rule: CrossingRule::default(),
            back_off_distance: default_back_off(),
            sensor_offset: default_sensor_offset(),
            calibration_offset: default_calibration_offset(),
            reference_heading: default_reference_heading(),
            alignment_band: default_alignment_band(),
            sweep_speed: default_rotate_speed(),
            max_samples: default_max_samples(),
            starting_corner: StartingCorner::default(),
            arena: default_arena(),
        }
    }
}

/// Search mission parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MissionConfig {
    /// Search rounds per run (default: 5)
    #[serde(default = "default_rounds")]
    pub rounds: usize,

    /// Fixed wait per tile scan in milliseconds (default: 3000)
    #[serde(default = "default_scan_duration")]
    pub scan_duration_ms: u64,

    /// Home tile
    #[serde(default)]
    pub home: Waypoint,

    /// Bridge (transit zone) rectangle
    #[serde(default = "default_transit_zone")]
    pub transit: Zone,

    /// Search zone rectangle
    #[serde(default = "default_search_zone")]
    pub search: Zone,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            scan_duration_ms: default_scan_duration(),
            home: Waypoint::default(),
            transit: default_transit_zone(),
            search: default_search_zone(),
        }
    }
}

impl MissionConfig {
    pub fn scan_duration(&self) -> Duration {
        Duration::from_millis(self.scan_duration_ms)
    }
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_wheel_radius() -> f64 {
    2.05
}
fn default_track() -> f64 {
    9.5
}
fn default_tile_size() -> f64 {
    30.48
}
fn default_odometer_period() -> u64 {
    25
}
fn default_forward_speed() -> f64 {
    50.0
}
fn default_rotate_speed() -> f64 {
    100.0
}
fn default_acceleration() -> f64 {
    3000.0
}
fn default_turn_base_speed() -> f64 {
    80.0
}
fn default_turn_gain() -> f64 {
    25.0
}
fn default_turn_tolerance() -> f64 {
    1.0
}
fn default_max_turn_iterations() -> usize {
    200_000
}

// Localization defaults
fn default_approach_heading() -> f64 {
    45.0
}
fn default_approach_threshold() -> f64 {
    0.41
}
fn default_crossing_threshold() -> f64 {
    0.40
}
fn default_differential_threshold() -> f64 {
    0.05
}
fn default_back_off() -> f64 {
    9.0
}
fn default_sensor_offset() -> f64 {
    6.0
}
fn default_calibration_offset() -> f64 {
    6.0
}
fn default_reference_heading() -> f64 {
    90.0
}
fn default_alignment_band() -> (f64, f64) {
    (10.0, 350.0)
}
fn default_max_samples() -> usize {
    200_000
}
fn default_arena() -> GridPoint {
    GridPoint::new(13, 7)
}

// Mission defaults
fn default_rounds() -> usize {
    5
}
fn default_scan_duration() -> u64 {
    3000
}
fn default_transit_zone() -> Zone {
    Zone {
        lower_left: GridPoint::new(4, 2),
        upper_right: GridPoint::new(6, 3),
    }
}
fn default_search_zone() -> Zone {
    Zone {
        lower_left: GridPoint::new(7, 2),
        upper_right: GridPoint::new(10, 4),
    }
}
fn default_log_level() -> String {
    "info".to_string()
}

impl KhojConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: KhojConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the controllers cannot work with
    pub fn validate(&self) -> Result<()> {
        let robot = &self.robot;
        if robot.wheel_radius <= 0.0 || robot.track <= 0.0 || robot.tile_size <= 0.0 {
            return Err(KhojError::Config(
                "wheel_radius, track and tile_size must be positive".to_string(),
            ));
        }
        if robot.odometer_period_ms == 0 {
            return Err(KhojError::Config(
                "odometer_period_ms must be non-zero".to_string(),
            ));
        }

        let nav = &self.navigation;
        for (name, value) in [
            ("forward_speed", nav.forward_speed),
            ("rotate_speed", nav.rotate_speed),
            ("turn_base_speed", nav.turn_base_speed),
            ("turn_tolerance", nav.turn_tolerance),
            ("sweep_speed", self.localization.sweep_speed),
        ] {
            if value <= 0.0 {
                return Err(KhojError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        // Turn speed bottoms out at base - gain just before completion
        if nav.turn_gain < 0.0 || nav.turn_gain >= nav.turn_base_speed {
            return Err(KhojError::Config(format!(
                "turn_gain must lie in [0, turn_base_speed), got {}",
                nav.turn_gain
            )));
        }
        if nav.max_turn_iterations == 0 || self.localization.max_samples == 0 {
            return Err(KhojError::Config(
                "max_turn_iterations and max_samples must be non-zero".to_string(),
            ));
        }

        let loc = &self.localization;
        for (name, value) in [
            ("approach_threshold", loc.approach_threshold),
            ("crossing_threshold", loc.crossing_threshold),
            ("differential_threshold", loc.differential_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(KhojError::Config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if loc.sensor_offset <= 0.0 {
            return Err(KhojError::Config(
                "sensor_offset must be positive".to_string(),
            ));
        }

        if self.mission.rounds == 0 {
            return Err(KhojError::Config("rounds must be at least 1".to_string()));
        }
        self.mission
            .transit
            .validate()
            .map_err(|e| KhojError::Config(format!("transit zone: {}", e)))?;
        self.mission
            .search
            .validate()
            .map_err(|e| KhojError::Config(format!("search zone: {}", e)))?;

        Ok(())
    }
}
