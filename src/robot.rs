//! Robot context: devices, configuration and the single pose estimator.

use std::sync::Arc;

use crate::config::KhojConfig;
use crate::drivers::{DriveBase, HeadingSensor, ReflectanceSensor};
use crate::error::{KhojError, Result};
use crate::localization::LightLocalizer;
use crate::navigation::Navigator;
use crate::odometry::{EstimatorHandle, PoseEstimator, WheelGeometry};

/// Hardware the core controllers drive
#[derive(Clone)]
pub struct RobotDevices {
    pub drive: DriveBase,
    pub gyro: Arc<dyn HeadingSensor>,
    pub reflectance: Arc<dyn ReflectanceSensor>,
}

/// Owns the estimator lifecycle. The estimator is created at most once, by
/// [`Robot::start_odometer`], and is stopped when the robot is dropped.
pub struct Robot {
    config: KhojConfig,
    devices: RobotDevices,
    odometer: Option<Arc<PoseEstimator>>,
    task: Option<EstimatorHandle>,
}

impl Robot {
    pub fn new(config: KhojConfig, devices: RobotDevices) -> Self {
        Self {
            config,
            devices,
            odometer: None,
            task: None,
        }
    }

    pub fn config(&self) -> &KhojConfig {
        &self.config
    }

    /// Create the estimator at the origin pose and start its periodic task
    pub fn start_odometer(&mut self) -> Result<Arc<PoseEstimator>> {
        if self.odometer.is_some() {
            return Err(KhojError::AlreadyInitialized);
        }

        let odometer = Arc::new(PoseEstimator::new(
            self.devices.drive.clone(),
            WheelGeometry::from_config(&self.config.robot),
            self.config.robot.odometer_period(),
        ));
        odometer.rebase()?;
        self.task = Some(odometer.spawn()?);
        self.odometer = Some(Arc::clone(&odometer));
        Ok(odometer)
    }

    /// The running estimator
    pub fn odometer(&self) -> Result<Arc<PoseEstimator>> {
        self.odometer.clone().ok_or(KhojError::NotInitialized)
    }

    pub fn navigator(&self) -> Result<Navigator> {
        Ok(Navigator::new(
            self.devices.drive.clone(),
            Arc::clone(&self.devices.gyro),
            self.odometer()?,
            self.config.navigation.clone(),
            self.config.robot.tile_size,
        ))
    }

    pub fn localizer<'a>(&self, navigator: &'a Navigator) -> LightLocalizer<'a> {
        LightLocalizer::new(
            navigator,
            Arc::clone(&self.devices.reflectance),
            self.config.localization.clone(),
        )
    }

    /// Stop the estimator thread. The last pose stays readable.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop();
        }
    }
}

impl Drop for Robot {
    fn drop(&mut self) {
        self.shutdown();
    }
}
