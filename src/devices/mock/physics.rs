//! Differential-drive kinematics for the simulated rover
//!
//! Wheels are advanced in fixed time steps; the body pose is integrated with
//! the midpoint heading of each step.

use std::f64::consts::PI;

use crate::core::Pose;

/// What a wheel is currently doing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelMode {
    Stopped,
    Forward,
    Backward,
    /// Finite rotation; `remaining` is signed wheel degrees
    Rotating { remaining: f64 },
}

/// Simulated wheel with a fractional tacho count
#[derive(Debug, Clone)]
pub struct WheelState {
    pub mode: WheelMode,
    /// Degrees per second, magnitude only
    pub speed: f64,
    /// Cumulative wheel rotation in degrees
    pub tacho: f64,
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            mode: WheelMode::Stopped,
            speed: 0.0,
            tacho: 0.0,
        }
    }
}

impl WheelState {
    /// Advance by `dt` seconds, returning degrees turned
    pub fn advance(&mut self, dt: f64) -> f64 {
        let step = self.speed * dt;
        let moved = match self.mode {
            WheelMode::Stopped => 0.0,
            WheelMode::Forward => step,
            WheelMode::Backward => -step,
            WheelMode::Rotating { remaining } => {
                if remaining.abs() <= step {
                    self.mode = WheelMode::Stopped;
                    remaining
                } else {
                    let moved = step.copysign(remaining);
                    self.mode = WheelMode::Rotating {
                        remaining: remaining - moved,
                    };
                    moved
                }
            }
        };
        self.tacho += moved;
        moved
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.mode, WheelMode::Rotating { .. })
    }
}

/// Which wheel of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left = 0,
    Right = 1,
}

/// Ground-truth body state
pub struct PhysicsState {
    x: f64,
    y: f64,
    /// Unbounded heading in degrees, clockwise positive
    heading: f64,
    pub wheels: [WheelState; 2],
    wheel_radius: f64,
    track: f64,
}

impl PhysicsState {
    pub fn new(x: f64, y: f64, heading: f64, wheel_radius: f64, track: f64) -> Self {
        Self {
            x,
            y,
            heading,
            wheels: [WheelState::default(), WheelState::default()],
            wheel_radius,
            track,
        }
    }

    pub fn wheel(&mut self, side: Side) -> &mut WheelState {
        &mut self.wheels[side as usize]
    }

    /// Unbounded heading, as a continuous gyro would integrate it
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.x, self.y, self.heading)
    }

    /// Advance both wheels and integrate the body motion
    pub fn step(&mut self, dt: f64) {
        let left_deg = self.wheels[Side::Left as usize].advance(dt);
        let right_deg = self.wheels[Side::Right as usize].advance(dt);

        let left = PI * self.wheel_radius * left_deg / 180.0;
        let right = PI * self.wheel_radius * right_deg / 180.0;
        let distance = 0.5 * (left + right);
        let dtheta = (left - right) / self.track;

        let mid = self.heading.to_radians() + 0.5 * dtheta;
        self.x += distance * mid.sin();
        self.y += distance * mid.cos();
        self.heading += dtheta.to_degrees();
    }
}
