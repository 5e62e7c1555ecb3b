//! Motion controller: waypoint travel and gyro-closed turns.
//!
//! Targets are in tiles; the controller scales them by the tile size and
//! drives in physical units. Every gyro sample taken here re-seeds the
//! estimator heading, so the pose heading follows the gyro between cycles.

use std::sync::Arc;

use crate::config::NavigationConfig;
use crate::core::Pose;
use crate::drivers::{DriveBase, HeadingSensor};
use crate::error::{KhojError, Result};
use crate::odometry::PoseEstimator;
use crate::utils::{normalize_heading, wrap_delta};

/// Targets closer than this (cm) count as already reached
const ARRIVAL_EPSILON: f64 = 0.5;

/// Blocking motion commands used by the mission layer.
pub trait Motion {
    /// Current estimated pose (physical units)
    fn pose(&self) -> Pose;

    /// Drive straight to (x, y) in tiles
    fn travel_to(&self, x: f64, y: f64) -> Result<()>;

    /// Turn in place to an absolute heading in degrees
    fn turn_to(&self, heading: f64) -> Result<()>;
}

/// Shortest-direction turn decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Turn {
    Hold,
    /// Counterclockwise by the given degrees
    Left(f64),
    /// Clockwise by the given degrees
    Right(f64),
}

/// Pick the turn from `current` to `target` that never exceeds 180 degrees.
///
/// A difference of exactly 180 turns right.
pub fn plan_turn(current: f64, target: f64) -> Turn {
    let delta = wrap_delta(target - current);
    if delta > 0.0 {
        Turn::Right(delta)
    } else if delta < 0.0 {
        Turn::Left(-delta)
    } else {
        Turn::Hold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spin {
    Clockwise,
    Counterclockwise,
}

/// Motion controller over a drive base, a gyro and the pose estimator.
pub struct Navigator {
    drive: DriveBase,
    gyro: Arc<dyn HeadingSensor>,
    odometer: Arc<PoseEstimator>,
    config: NavigationConfig,
    tile_size: f64,
}

impl Navigator {
    pub fn new(
        drive: DriveBase,
        gyro: Arc<dyn HeadingSensor>,
        odometer: Arc<PoseEstimator>,
        config: NavigationConfig,
        tile_size: f64,
    ) -> Self {
        Self {
            drive,
            gyro,
            odometer,
            config,
            tile_size,
        }
    }

    pub fn drive(&self) -> &DriveBase {
        &self.drive
    }

    pub fn odometer(&self) -> &Arc<PoseEstimator> {
        &self.odometer
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Read the gyro, push its heading into the estimator and return it.
    ///
    /// Negative readings are shifted by +360 before normalization.
    pub fn angle_correction(&self) -> Result<f64> {
        let mut heading = self.gyro.heading()?;
        if heading < 0.0 {
            heading += 360.0;
        }
        let heading = normalize_heading(heading);
        self.odometer.set_heading(heading);
        Ok(heading)
    }

    /// Drive to (x, y) in tiles along a straight line.
    pub fn travel_to(&self, x: f64, y: f64) -> Result<()> {
        let target_x = x * self.tile_size;
        let target_y = y * self.tile_size;

        self.drive.stop()?;
        self.drive.set_acceleration(self.config.acceleration)?;

        let pose = self.odometer.pose();
        let dx = target_x - pose.x;
        let dy = target_y - pose.y;
        let distance = dx.hypot(dy);
        if distance < ARRIVAL_EPSILON {
            tracing::debug!("Already at ({:.2}, {:.2})", x, y);
            return Ok(());
        }

        // Heading convention: 0 along +Y, clockwise
        let heading = dx.atan2(dy).to_degrees();
        tracing::debug!(
            "Travel to ({:.2}, {:.2}) tiles: {:.1} cm at {:.1} deg",
            x,
            y,
            distance,
            normalize_heading(heading)
        );

        self.drive.set_speed(self.config.rotate_speed)?;
        self.turn_to(heading)?;

        self.drive_straight(distance, self.config.forward_speed)
    }

    /// Turn in place to an absolute heading
    pub fn turn_to(&self, heading: f64) -> Result<()> {
        let current = self.angle_correction()?;
        match plan_turn(current, normalize_heading(heading)) {
            Turn::Right(degrees) => self.turn_right(degrees),
            Turn::Left(degrees) => self.turn_left(degrees),
            Turn::Hold => Ok(()),
        }
    }

    /// Closed-loop clockwise turn. No-op within the turn tolerance.
    pub fn turn_right(&self, degrees: f64) -> Result<()> {
        self.closed_loop_turn(degrees, Spin::Clockwise)
    }

    /// Closed-loop counterclockwise turn. No-op within the turn tolerance.
    pub fn turn_left(&self, degrees: f64) -> Result<()> {
        self.closed_loop_turn(degrees, Spin::Counterclockwise)
    }

    /// Open-loop spin by `angle` degrees (clockwise positive) at `speed`
    pub fn rotate_in_place(&self, angle: f64, speed: f64) -> Result<()> {
        let rotation = self.odometer.geometry().rotation_for_turn(angle);
        self.drive.set_speed(speed)?;
        self.drive.rotate(rotation, -rotation)?;
        self.odometer.sync()
    }

    /// Drive `distance` cm along the current heading (negative backs up)
    pub fn drive_straight(&self, distance: f64, speed: f64) -> Result<()> {
        let rotation = self.odometer.geometry().rotation_for_distance(distance);
        self.drive.set_speed(speed)?;
        self.drive.rotate(rotation, rotation)?;
        self.odometer.sync()
    }

    fn closed_loop_turn(&self, degrees: f64, spin: Spin) -> Result<()> {
        let tolerance = self.config.turn_tolerance;
        if degrees <= tolerance {
            return Ok(());
        }

        let start = self.angle_correction()?;
        let mut current = start;
        let mut iterations = 0;

        loop {
            let swept = match spin {
                Spin::Clockwise => current - start,
                Spin::Counterclockwise => start - current,
            };
            // Second form catches the sweep after the 0/360 wrap
            let direct = (swept - degrees).abs();
            let wrapped = (-swept - (360.0 - degrees)).abs();
            if direct < tolerance || wrapped < tolerance {
                break;
            }

            if iterations >= self.config.max_turn_iterations {
                self.drive.stop()?;
                tracing::error!(
                    "Turn of {:.1} deg stuck at {:.1} deg after {} iterations",
                    degrees,
                    current,
                    iterations
                );
                return Err(KhojError::Liveness {
                    operation: "closed-loop turn",
                    iterations,
                });
            }
            iterations += 1;

            let remaining = direct.min(wrapped);
            let speed = self.config.turn_base_speed - self.config.turn_gain / (remaining + 1.0);
            self.drive.set_speed(speed)?;
            match spin {
                Spin::Clockwise => self.drive.spin_clockwise()?,
                Spin::Counterclockwise => self.drive.spin_counterclockwise()?,
            }

            current = self.angle_correction()?;
        }

        self.drive.stop()?;
        // Settle the estimator, then pin its heading to the gyro again
        self.odometer.sync()?;
        self.angle_correction()?;
        Ok(())
    }
}

impl Motion for Navigator {
    fn pose(&self) -> Pose {
        self.odometer.pose()
    }

    fn travel_to(&self, x: f64, y: f64) -> Result<()> {
        Navigator::travel_to(self, x, y)
    }

    fn turn_to(&self, heading: f64) -> Result<()> {
        Navigator::turn_to(self, heading)
    }
}
