//! Shared setup for tests against the simulated rover

#![allow(dead_code)]

use std::sync::Arc;

use khoj_nav::config::KhojConfig;
use khoj_nav::devices::mock::{SimWorld, SimulationConfig};
use khoj_nav::drivers::ReflectanceSensor;
use khoj_nav::odometry::{PoseEstimator, WheelGeometry};
use khoj_nav::utils::wrap_delta;
use khoj_nav::{Navigator, Pose};

pub struct SimRig {
    pub config: KhojConfig,
    pub world: Arc<SimWorld>,
    pub navigator: Navigator,
    pub reflectance: Arc<dyn ReflectanceSensor>,
}

/// Noise-free, unpaced simulation starting at the given true pose
pub fn sim_config(x: f64, y: f64, heading: f64) -> KhojConfig {
    KhojConfig {
        simulation: SimulationConfig {
            start_x: x,
            start_y: y,
            start_heading: heading,
            speed_factor: 0.0,
            reflectance_noise_stddev: 0.0,
            random_seed: 7,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Navigator over the simulated rover. The estimator is not spawned; every
/// completed motion updates it inline.
pub fn rig(config: KhojConfig) -> SimRig {
    let world = SimWorld::new(
        config.simulation.clone(),
        &config.robot,
        config.localization.sensor_offset,
    );
    let devices = world.devices();
    let odometer = Arc::new(PoseEstimator::new(
        devices.drive_base(),
        WheelGeometry::from_config(&config.robot),
        config.robot.odometer_period(),
    ));
    let navigator = Navigator::new(
        devices.drive_base(),
        devices.gyro.clone(),
        odometer,
        config.navigation.clone(),
        config.robot.tile_size,
    );

    SimRig {
        config,
        world,
        navigator,
        reflectance: devices.reflectance.clone(),
    }
}

/// Place the estimator at the true start pose
pub fn seed_true_pose(rig: &SimRig) {
    let sim = &rig.config.simulation;
    rig.navigator
        .odometer()
        .set_pose(Pose::new(sim.start_x, sim.start_y, sim.start_heading));
}

pub fn heading_error(a: f64, b: f64) -> f64 {
    wrap_delta(a - b).abs()
}
