//! Core data types for KhojNav

use serde::{Deserialize, Serialize};

use crate::error::{KhojError, Result};
use crate::utils::normalize_heading;

/// Robot pose in physical units.
///
/// `heading` is in degrees, 0 along +Y and increasing clockwise.
/// Every write path normalizes it to [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading: normalize_heading(heading),
        }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    /// Position expressed in tiles.
    pub fn to_tiles(&self, tile_size: f64) -> Waypoint {
        Waypoint::new(self.x / tile_size, self.y / tile_size)
    }
}

/// Cumulative wheel rotation counts, in degrees of wheel rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelSample {
    pub left: i32,
    pub right: i32,
}

impl WheelSample {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Per-wheel change since `previous`.
    pub fn delta(&self, previous: &WheelSample) -> (i32, i32) {
        (
            self.left.wrapping_sub(previous.left),
            self.right.wrapping_sub(previous.right),
        )
    }
}

/// Target position in tiles. Half tiles address tile centers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<GridPoint> for Waypoint {
    fn from(p: GridPoint) -> Self {
        Waypoint::new(p.x as f64, p.y as f64)
    }
}

/// Grid intersection in integer tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Heading at which a grid line was detected during a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineCrossing {
    pub heading: f64,
}

/// Axis-aligned rectangle of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub lower_left: GridPoint,
    pub upper_right: GridPoint,
}

impl Zone {
    pub fn new(lower_left: GridPoint, upper_right: GridPoint) -> Result<Self> {
        let zone = Self {
            lower_left,
            upper_right,
        };
        zone.validate()?;
        Ok(zone)
    }

    pub fn validate(&self) -> Result<()> {
        if self.upper_right.x < self.lower_left.x || self.upper_right.y < self.lower_left.y {
            return Err(KhojError::InvalidParameter(format!(
                "zone upper-right ({}, {}) lies below lower-left ({}, {})",
                self.upper_right.x, self.upper_right.y, self.lower_left.x, self.lower_left.y
            )));
        }
        Ok(())
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        self.upper_right.x - self.lower_left.x
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        self.upper_right.y - self.lower_left.y
    }

    pub fn lower_right(&self) -> GridPoint {
        GridPoint::new(self.upper_right.x, self.lower_left.y)
    }

    pub fn upper_left(&self) -> GridPoint {
        GridPoint::new(self.lower_left.x, self.upper_right.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_normalizes_heading() {
        let pose = Pose::new(1.0, 2.0, -90.0);
        assert_relative_eq!(pose.heading, 270.0);

        let pose = Pose::new(0.0, 0.0, 720.0);
        assert_relative_eq!(pose.heading, 0.0);
    }

    #[test]
    fn test_wheel_sample_delta() {
        let prev = WheelSample::new(100, -50);
        let cur = WheelSample::new(160, -20);
        assert_eq!(cur.delta(&prev), (60, 30));
    }

    #[test]
    fn test_zone_dimensions() {
        let zone = Zone::new(GridPoint::new(3, 2), GridPoint::new(6, 4)).unwrap();
        assert_eq!(zone.width(), 3);
        assert_eq!(zone.height(), 2);
        assert_eq!(zone.lower_right(), GridPoint::new(6, 2));
        assert_eq!(zone.upper_left(), GridPoint::new(3, 4));
    }

    #[test]
    fn test_zone_rejects_inverted_corners() {
        let result = Zone::new(GridPoint::new(5, 5), GridPoint::new(4, 6));
        assert!(matches!(result, Err(KhojError::InvalidParameter(_))));
    }
}
