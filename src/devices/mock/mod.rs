//! Simulated rover for hardware-free runs and tests
//!
//! A single [`SimWorld`] holds the ground-truth pose and both wheels. Every
//! gyro or reflectance sample advances the world by one `time_step`, and a
//! blocking wheel rotation steps the world until that wheel finishes. The
//! simulation therefore runs in sample time: a controller polling its sensors
//! sees the robot move exactly as fast as it asks.
//!
//! With `speed_factor > 0` each step also sleeps `time_step / speed_factor`
//! of wall-clock time so the periodic pose estimator can follow along.
//!
//! # Devices
//!
//! | Device | Contract | Model |
//! |--------|----------|-------|
//! | [`MockWheel`] | `WheelMotor` | speed-limited, exact finite rotations |
//! | [`MockGyro`] | `HeadingSensor` | true heading + Gaussian noise, signed output |
//! | [`MockReflectance`] | `ReflectanceSensor` | grid-line floor behind the axle |
//! | [`SimScanner`] | `ObjectScanner` | nearest placed object inside range and field of view |
//! | [`RecordingPeripherals`] | `MissionPeripherals` | records and logs each gesture |

mod config;
mod floor;
mod noise;
mod peripherals;
mod physics;

pub use config::SimulationConfig;
pub use floor::FloorModel;
pub use noise::NoiseGenerator;
pub use peripherals::{PeripheralEvent, RecordingPeripherals, SimScanner};
pub use physics::{PhysicsState, Side, WheelMode, WheelState};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RobotConfig;
use crate::core::{Pose, Waypoint};
use crate::drivers::{DriveBase, HeadingSensor, ReflectanceSensor, WheelMotor};
use crate::error::{KhojError, Result};
use crate::utils::wrap_delta;

struct SimState {
    physics: PhysicsState,
    gyro_zero: f64,
    noise: NoiseGenerator,
    /// Remaining objects, in cm
    objects: Vec<(f64, f64)>,
}

/// Shared ground truth behind all mock devices
pub struct SimWorld {
    config: SimulationConfig,
    floor: FloorModel,
    sensor_offset: f64,
    state: Mutex<SimState>,
}

impl SimWorld {
    /// Build a world for a robot with the given geometry.
    ///
    /// `sensor_offset` places the reflectance sensor that far behind the axle.
    pub fn new(config: SimulationConfig, robot: &RobotConfig, sensor_offset: f64) -> Arc<Self> {
        let physics = PhysicsState::new(
            config.start_x,
            config.start_y,
            config.start_heading,
            robot.wheel_radius,
            robot.track,
        );
        let floor = FloorModel::new(
            robot.tile_size,
            config.line_width,
            config.floor_intensity,
            config.line_intensity,
        );
        let objects = config
            .objects
            .iter()
            .map(|o| (o.x * robot.tile_size, o.y * robot.tile_size))
            .collect();
        let noise = NoiseGenerator::new(config.random_seed);

        Arc::new(Self {
            config,
            floor,
            sensor_offset,
            state: Mutex::new(SimState {
                physics,
                gyro_zero: 0.0,
                noise,
                objects,
            }),
        })
    }

    /// Create the wheel, gyro and reflectance devices bound to this world
    pub fn devices(self: &Arc<Self>) -> MockDevices {
        MockDevices {
            left: Arc::new(MockWheel {
                world: Arc::clone(self),
                side: Side::Left,
            }),
            right: Arc::new(MockWheel {
                world: Arc::clone(self),
                side: Side::Right,
            }),
            gyro: Arc::new(MockGyro {
                world: Arc::clone(self),
            }),
            reflectance: Arc::new(MockReflectance {
                world: Arc::clone(self),
            }),
        }
    }

    /// Ground-truth pose
    pub fn true_pose(&self) -> Pose {
        self.state.lock().physics.pose()
    }

    /// Advance one step, then inspect the state
    fn step_with<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        let out = {
            let mut state = self.state.lock();
            state.physics.step(self.config.time_step);
            f(&mut state)
        };
        self.pace();
        out
    }

    fn pace(&self) {
        if self.config.speed_factor > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(
                self.config.time_step / self.config.speed_factor,
            ));
        }
    }

    fn with_wheel<T>(&self, side: Side, f: impl FnOnce(&mut WheelState) -> T) -> T {
        let mut state = self.state.lock();
        f(state.physics.wheel(side))
    }

    /// Step until the given wheel has finished its rotation
    fn settle(&self, side: Side) -> Result<()> {
        let (remaining, speed) = {
            let mut state = self.state.lock();
            let wheel = state.physics.wheel(side);
            match wheel.mode {
                WheelMode::Rotating { remaining } => (remaining, wheel.speed),
                _ => return Ok(()),
            }
        };
        if speed <= 0.0 {
            return Err(KhojError::Device(format!(
                "{:?} wheel asked to rotate at zero speed",
                side
            )));
        }

        let limit = (remaining.abs() / (speed * self.config.time_step)).ceil() as usize + 2;
        for _ in 0..limit {
            let done = self.step_with(|s| !s.physics.wheel(side).is_rotating());
            if done {
                return Ok(());
            }
        }
        Err(KhojError::Device(format!(
            "{:?} wheel rotation did not finish",
            side
        )))
    }

    /// Remove and return the nearest object in the detector's view.
    ///
    /// Returns (bearing relative to the robot heading, distance in cm).
    pub fn detect_object(&self) -> Option<(f64, f64)> {
        let mut state = self.state.lock();
        let pose = state.physics.pose();

        let mut best: Option<(usize, f64, f64)> = None;
        for (i, &(ox, oy)) in state.objects.iter().enumerate() {
            let dx = ox - pose.x;
            let dy = oy - pose.y;
            let distance = dx.hypot(dy);
            let bearing = wrap_delta(dx.atan2(dy).to_degrees() - pose.heading);
            if distance > self.config.scanner_range || bearing.abs() > self.config.scanner_half_fov
            {
                continue;
            }
            if best.is_none_or(|(_, _, d)| distance < d) {
                best = Some((i, bearing, distance));
            }
        }

        best.map(|(i, bearing, distance)| {
            state.objects.remove(i);
            (bearing, distance)
        })
    }

    /// Objects not yet detected, in tiles
    pub fn remaining_objects(&self, tile_size: f64) -> Vec<Waypoint> {
        self.state
            .lock()
            .objects
            .iter()
            .map(|&(x, y)| Waypoint::new(x / tile_size, y / tile_size))
            .collect()
    }
}

/// Devices sharing one [`SimWorld`]
pub struct MockDevices {
    pub left: Arc<MockWheel>,
    pub right: Arc<MockWheel>,
    pub gyro: Arc<MockGyro>,
    pub reflectance: Arc<MockReflectance>,
}

impl MockDevices {
    pub fn drive_base(&self) -> DriveBase {
        DriveBase::new(self.left.clone(), self.right.clone())
    }
}

/// Simulated tacho motor
pub struct MockWheel {
    world: Arc<SimWorld>,
    side: Side,
}

impl WheelMotor for MockWheel {
    fn set_speed(&self, speed: f64) -> Result<()> {
        self.world.with_wheel(self.side, |w| w.speed = speed.abs());
        Ok(())
    }

    fn forward(&self) -> Result<()> {
        self.world
            .with_wheel(self.side, |w| w.mode = WheelMode::Forward);
        Ok(())
    }

    fn backward(&self) -> Result<()> {
        self.world
            .with_wheel(self.side, |w| w.mode = WheelMode::Backward);
        Ok(())
    }

    fn rotate_by(&self, angle: f64, blocking: bool) -> Result<()> {
        self.world.with_wheel(self.side, |w| {
            w.mode = WheelMode::Rotating { remaining: angle }
        });
        if blocking {
            self.world.settle(self.side)?;
        }
        Ok(())
    }

    fn stop(&self, _blocking: bool) -> Result<()> {
        self.world
            .with_wheel(self.side, |w| w.mode = WheelMode::Stopped);
        Ok(())
    }

    fn tacho_count(&self) -> Result<i32> {
        Ok(self.world.with_wheel(self.side, |w| w.tacho.round() as i32))
    }
}

/// Simulated gyro. Reads are signed and wrap at ±360.
pub struct MockGyro {
    world: Arc<SimWorld>,
}

impl HeadingSensor for MockGyro {
    fn heading(&self) -> Result<f64> {
        let stddev = self.world.config.gyro_noise_stddev;
        Ok(self.world.step_with(|s| {
            let raw = s.physics.heading() - s.gyro_zero + s.noise.gaussian(stddev);
            raw % 360.0
        }))
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.world.state.lock();
        state.gyro_zero = state.physics.heading();
        Ok(())
    }
}

/// Simulated downward reflectance sensor behind the axle
pub struct MockReflectance {
    world: Arc<SimWorld>,
}

impl ReflectanceSensor for MockReflectance {
    fn intensity(&self) -> Result<f64> {
        let world = &self.world;
        let stddev = world.config.reflectance_noise_stddev;
        Ok(world.step_with(|s| {
            let pose = s.physics.pose();
            let h = pose.heading.to_radians();
            let sx = pose.x - world.sensor_offset * h.sin();
            let sy = pose.y - world.sensor_offset * h.cos();
            let value = world.floor.intensity_at(sx, sy) + s.noise.gaussian(stddev);
            value.clamp(0.0, 1.0)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world(start: (f64, f64, f64)) -> Arc<SimWorld> {
        let config = SimulationConfig {
            start_x: start.0,
            start_y: start.1,
            start_heading: start.2,
            speed_factor: 0.0,
            reflectance_noise_stddev: 0.0,
            ..Default::default()
        };
        SimWorld::new(config, &RobotConfig::default(), 6.0)
    }

    #[test]
    fn test_blocking_rotation_drives_straight() {
        let world = world((0.0, 0.0, 0.0));
        let devices = world.devices();
        let drive = devices.drive_base();

        drive.set_speed(100.0).unwrap();
        // One full wheel turn = 2π·2.05 cm
        drive.rotate(360.0, 360.0).unwrap();

        let pose = world.true_pose();
        assert_relative_eq!(pose.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pose.y, 2.0 * std::f64::consts::PI * 2.05, epsilon = 1e-6);
        assert_eq!(devices.left.tacho_count().unwrap(), 360);
        assert_eq!(devices.right.tacho_count().unwrap(), 360);
    }

    #[test]
    fn test_gyro_reports_signed_heading() {
        let world = world((0.0, 0.0, 0.0));
        let devices = world.devices();
        let drive = devices.drive_base();

        drive.set_speed(100.0).unwrap();
        drive.rotate(-50.0, 50.0).unwrap();

        let heading = devices.gyro.heading().unwrap();
        assert!(heading < 0.0, "counterclockwise turn reads negative: {}", heading);

        devices.gyro.reset().unwrap();
        assert_relative_eq!(devices.gyro.heading().unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reflectance_sees_line_behind_axle() {
        // Axle at y = 6, sensor 6 cm behind lands on the y = 0 line
        let world = world((10.0, 6.0, 0.0));
        let devices = world.devices();
        assert_relative_eq!(devices.reflectance.intensity().unwrap(), 0.2);

        let world = self::world((10.0, 12.0, 0.0));
        let devices = world.devices();
        assert_relative_eq!(devices.reflectance.intensity().unwrap(), 0.6);
    }

    #[test]
    fn test_zero_speed_rotation_fails() {
        let world = world((0.0, 0.0, 0.0));
        let devices = world.devices();
        assert!(matches!(
            devices.left.rotate_by(90.0, true),
            Err(KhojError::Device(_))
        ));
    }

    #[test]
    fn test_detect_object_in_view() {
        let config = SimulationConfig {
            start_x: 0.0,
            start_y: 0.0,
            speed_factor: 0.0,
            objects: vec![Waypoint::new(0.5, 1.0), Waypoint::new(-1.0, 0.0)],
            ..Default::default()
        };
        let robot = RobotConfig::default();
        let world = SimWorld::new(config, &robot, 6.0);

        // (15.24, 30.48) is ~34 cm away at ~26.6 degrees
        let (bearing, distance) = world.detect_object().unwrap();
        assert_relative_eq!(bearing, 26.565, epsilon = 1e-3);
        assert_relative_eq!(distance, 34.078, epsilon = 1e-3);

        // The remaining object is behind the robot
        assert!(world.detect_object().is_none());
        assert_eq!(world.remaining_objects(robot.tile_size).len(), 1);
    }
}
