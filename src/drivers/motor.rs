//! Wheel motor driver trait and the left/right drive pair

use std::sync::Arc;

use crate::core::WheelSample;
use crate::error::Result;

/// Single tacho-counting wheel motor.
///
/// Speeds and rotations are in degrees of wheel rotation. Methods take
/// `&self` so one motor can be shared by the estimator and the controller.
pub trait WheelMotor: Send + Sync {
    /// Set rotation speed in degrees per second (magnitude only)
    fn set_speed(&self, speed: f64) -> Result<()>;

    /// Set acceleration in degrees per second squared
    fn set_acceleration(&self, acceleration: f64) -> Result<()> {
        let _ = acceleration;
        Ok(())
    }

    /// Spin forward until told otherwise
    fn forward(&self) -> Result<()>;

    /// Spin backward until told otherwise
    fn backward(&self) -> Result<()>;

    /// Rotate by `angle` degrees of wheel rotation (negative rotates backward)
    ///
    /// When `blocking` is true, returns after the rotation completes.
    fn rotate_by(&self, angle: f64, blocking: bool) -> Result<()>;

    /// Stop the wheel. When `blocking` is true, returns once it has stopped.
    fn stop(&self, blocking: bool) -> Result<()>;

    /// Cumulative rotation count in degrees
    fn tacho_count(&self) -> Result<i32>;
}

/// Left and right wheel motors of a differential drive.
#[derive(Clone)]
pub struct DriveBase {
    pub left: Arc<dyn WheelMotor>,
    pub right: Arc<dyn WheelMotor>,
}

impl DriveBase {
    pub fn new(left: Arc<dyn WheelMotor>, right: Arc<dyn WheelMotor>) -> Self {
        Self { left, right }
    }

    /// Read both tacho counts
    pub fn sample(&self) -> Result<WheelSample> {
        let left = self.left.tacho_count()?;
        let right = self.right.tacho_count()?;
        Ok(WheelSample::new(left, right))
    }

    pub fn set_speed(&self, speed: f64) -> Result<()> {
        self.left.set_speed(speed)?;
        self.right.set_speed(speed)
    }

    pub fn set_acceleration(&self, acceleration: f64) -> Result<()> {
        self.left.set_acceleration(acceleration)?;
        self.right.set_acceleration(acceleration)
    }

    /// Spin in place clockwise (left forward, right backward)
    pub fn spin_clockwise(&self) -> Result<()> {
        self.left.forward()?;
        self.right.backward()
    }

    /// Spin in place counterclockwise (left backward, right forward)
    pub fn spin_counterclockwise(&self) -> Result<()> {
        self.left.backward()?;
        self.right.forward()
    }

    pub fn forward(&self) -> Result<()> {
        self.left.forward()?;
        self.right.forward()
    }

    /// Stop both wheels: left without waiting, right blocking, so both halt together.
    pub fn stop(&self) -> Result<()> {
        self.left.stop(false)?;
        self.right.stop(true)
    }

    /// Rotate both wheels together and wait for the right wheel to finish.
    pub fn rotate(&self, left: f64, right: f64) -> Result<()> {
        self.left.rotate_by(left, false)?;
        self.right.rotate_by(right, true)
    }
}
