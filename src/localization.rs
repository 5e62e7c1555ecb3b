//! Grid-line relocalization with the downward reflectance sensor.
//!
//! The robot faces the reference intersection, drives until the sensor hits
//! a line, backs off, then spins clockwise in place. The sensor sits behind
//! the axle and sweeps a circle that crosses the two reference lines four
//! times. Crossings 0 and 2 lie on the line y = 0, crossings 1 and 3 on the
//! line x = 0, and half of each angular span gives the axle's offset from
//! that line:
//!
//! ```text
//! θx = c2 − c0          θy = c3 − c1
//! dX = −d·cos(θy / 2)   dY = −d·cos(θx / 2)
//! ```
//!
//! After re-seeding the pose, the robot drives to the intersection and turns
//! to the reference heading.

use std::sync::Arc;

use crate::config::{CrossingRule, LocalizationConfig};
use crate::core::{LineCrossing, Pose, Waypoint};
use crate::drivers::ReflectanceSensor;
use crate::error::{KhojError, Result};
use crate::navigation::Navigator;

/// Edge-triggered line detector.
///
/// Fires once when the sensor moves onto a line and re-arms only after the
/// reading has recovered to at least `threshold`. Under the differential
/// rule the reading must also fall by at least `drop` within one sample and
/// land below `threshold`, so floor noise alone never fires.
#[derive(Debug, Clone)]
pub struct CrossingDetector {
    rule: CrossingRule,
    threshold: f64,
    drop: f64,
    previous: Option<f64>,
    armed: bool,
}

impl CrossingDetector {
    pub fn new(rule: CrossingRule, threshold: f64, drop: f64) -> Self {
        Self {
            rule,
            threshold,
            drop,
            previous: None,
            armed: false,
        }
    }

    /// Feed one sample; true on a new crossing
    pub fn observe(&mut self, intensity: f64) -> bool {
        let previous = self.previous.replace(intensity);
        if intensity >= self.threshold {
            self.armed = true;
            return false;
        }
        if !self.armed {
            return false;
        }

        let fired = match self.rule {
            CrossingRule::Absolute => true,
            CrossingRule::Differential => {
                previous.is_some_and(|previous| previous - intensity >= self.drop)
            }
        };
        if fired {
            self.armed = false;
        }
        fired
    }
}

/// Clockwise angle swept from `from` to `to`, in [0, 360)
fn swept_angle(from: f64, to: f64) -> f64 {
    (to - from).rem_euclid(360.0)
}

/// Axle offset (dX, dY) from the reference intersection.
pub fn position_correction(crossings: &[LineCrossing; 4], sensor_offset: f64) -> (f64, f64) {
    let theta_x = swept_angle(crossings[0].heading, crossings[2].heading);
    let theta_y = swept_angle(crossings[1].heading, crossings[3].heading);

    let dx = -sensor_offset * (theta_y / 2.0).to_radians().cos();
    let dy = -sensor_offset * (theta_x / 2.0).to_radians().cos();
    (dx, dy)
}

/// Reject a correction that puts the axle outside the sensor circle.
///
/// Four genuine crossings always place the axle within `sensor_offset` of
/// the intersection; anything else means a spurious or missed crossing.
pub fn check_correction(dx: f64, dy: f64, sensor_offset: f64) -> Result<()> {
    if dx.hypot(dy) >= sensor_offset {
        tracing::error!(
            "Line correction ({:.2}, {:.2}) outside the {:.1} cm sensor circle",
            dx,
            dy,
            sensor_offset
        );
        return Err(KhojError::Localization(format!(
            "correction ({:.2}, {:.2}) exceeds sensor offset {:.1}",
            dx, dy, sensor_offset
        )));
    }
    Ok(())
}

/// Relocalizer driving a [`Navigator`].
pub struct LightLocalizer<'a> {
    navigator: &'a Navigator,
    sensor: Arc<dyn ReflectanceSensor>,
    config: LocalizationConfig,
}

impl<'a> LightLocalizer<'a> {
    pub fn new(
        navigator: &'a Navigator,
        sensor: Arc<dyn ReflectanceSensor>,
        config: LocalizationConfig,
    ) -> Self {
        Self {
            navigator,
            sensor,
            config,
        }
    }

    fn detector(&self) -> CrossingDetector {
        CrossingDetector::new(
            self.config.crossing_rule,
            self.config.crossing_threshold,
            self.config.differential_threshold,
        )
    }

    /// Run the full procedure; returns the pose written at the end.
    pub fn localize(&self) -> Result<Pose> {
        tracing::info!("Relocalization started ({:?} rule)", self.config.crossing_rule);

        self.approach()?;
        let crossings = self.sweep()?;

        let (dx, dy) = position_correction(&crossings, self.config.sensor_offset);
        check_correction(dx, dy, self.config.sensor_offset)?;
        let odometer = self.navigator.odometer();
        let heading = self.navigator.angle_correction()? - self.config.calibration_offset;
        odometer.set_pose(Pose::new(dx, dy, heading));
        tracing::info!(
            "Line correction: dX={:.2} dY={:.2} heading={:.1}",
            dx,
            dy,
            odometer.pose().heading
        );

        self.navigator.travel_to(0.0, 0.0)?;

        let heading = odometer.pose().heading;
        let (low, high) = self.config.alignment_band;
        if heading > low && heading < high {
            self.navigator
                .rotate_in_place(-heading, self.navigator.config().rotate_speed / 2.0)?;
        }
        self.navigator.turn_to(self.config.reference_heading)?;
        self.navigator.drive().stop()?;

        // The intersection is the starting corner of the arena
        let corner: Waypoint = self.config.starting_corner.position(self.config.arena);
        let tile = self.navigator.tile_size();
        odometer.set_position(corner.x * tile, corner.y * tile);

        let pose = odometer.pose();
        tracing::info!(
            "Relocalized at ({:.1}, {:.1}) heading {:.1}",
            pose.x,
            pose.y,
            pose.heading
        );
        Ok(pose)
    }

    /// Face the intersection, drive onto the first line, then back off.
    pub fn approach(&self) -> Result<()> {
        self.navigator.turn_to(self.config.approach_heading)?;

        let drive = self.navigator.drive();
        drive.set_speed(self.navigator.config().forward_speed)?;
        drive.forward()?;

        // The approach stops on the absolute falling edge whatever the sweep rule
        let mut detector = CrossingDetector::new(
            CrossingRule::Absolute,
            self.config.approach_threshold,
            self.config.differential_threshold,
        );
        let mut samples = 0;
        loop {
            if samples >= self.config.max_samples {
                drive.stop()?;
                return Err(KhojError::Liveness {
                    operation: "line approach",
                    iterations: samples,
                });
            }
            samples += 1;
            if detector.observe(self.sensor.intensity()?) {
                break;
            }
        }
        drive.stop()?;
        tracing::debug!("Approach hit a line after {} samples", samples);

        self.navigator.drive_straight(
            -self.config.back_off_distance,
            self.navigator.config().forward_speed,
        )
    }

    /// Spin clockwise until four crossings are recorded.
    pub fn sweep(&self) -> Result<[LineCrossing; 4]> {
        let drive = self.navigator.drive();
        drive.set_speed(self.config.sweep_speed)?;
        drive.spin_clockwise()?;

        let mut detector = self.detector();
        let mut crossings = [LineCrossing { heading: 0.0 }; 4];
        let mut found = 0;
        let mut samples = 0;

        while found < crossings.len() {
            if samples >= self.config.max_samples {
                drive.stop()?;
                return Err(KhojError::Liveness {
                    operation: "line sweep",
                    iterations: samples,
                });
            }
            samples += 1;

            if detector.observe(self.sensor.intensity()?) {
                let heading = self.navigator.angle_correction()?;
                tracing::debug!("Line crossing {} at {:.2} deg", found, heading);
                crossings[found] = LineCrossing { heading };
                found += 1;
            }
        }
        drive.stop()?;
        self.navigator.odometer().sync()?;

        Ok(crossings)
    }
}
