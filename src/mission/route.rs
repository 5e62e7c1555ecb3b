//! Mission geometry in tile units: bridge plan, perimeter legs, retrieval.

use crate::core::{Waypoint, Zone};
use crate::mission::scan::Detection;

/// Search-zone perimeter leg, visited counterclockwise from the lower-left
/// corner. The robot scans along the leg, facing the next tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    South,
    East,
    North,
    West,
}

impl Leg {
    pub const ALL: [Leg; 4] = [Leg::South, Leg::East, Leg::North, Leg::West];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Heading faced while scanning on this leg
    pub fn scan_heading(self) -> f64 {
        match self {
            Leg::South => 90.0,
            Leg::East => 0.0,
            Leg::North => 270.0,
            Leg::West => 180.0,
        }
    }

    /// Tiles scanned on this leg, in visiting order.
    ///
    /// Each corner is scanned once, at the start of the leg leaving it.
    pub fn tiles(self, zone: &Zone) -> Vec<Waypoint> {
        let ll = zone.lower_left;
        let ur = zone.upper_right;
        let (w, h) = (zone.width(), zone.height());
        let point = |x: i32, y: i32| Waypoint::new(x as f64, y as f64);

        match self {
            Leg::South => (0..w).map(|i| point(ll.x + i, ll.y)).collect(),
            Leg::East => (0..h).map(|i| point(ur.x, ll.y + i)).collect(),
            Leg::North => (0..w).map(|i| point(ur.x - i, ur.y)).collect(),
            Leg::West => (0..h).map(|i| point(ll.x, ur.y - i)).collect(),
        }
    }

    /// Corner the leg starts from
    pub fn start_corner(self, zone: &Zone) -> Waypoint {
        match self {
            Leg::South => zone.lower_left.into(),
            Leg::East => zone.lower_right().into(),
            Leg::North => zone.upper_right.into(),
            Leg::West => zone.upper_left().into(),
        }
    }

    /// Corners back to the lower-left, starting with this leg's start corner
    pub fn return_route(self, zone: &Zone) -> Vec<Waypoint> {
        let ll: Waypoint = zone.lower_left.into();
        let lr: Waypoint = zone.lower_right().into();
        let ur: Waypoint = zone.upper_right.into();
        let ul: Waypoint = zone.upper_left().into();

        match self {
            Leg::South => vec![ll],
            Leg::East => vec![lr, ll],
            Leg::North => vec![ur, lr, ll],
            Leg::West => vec![ul, ll],
        }
    }
}

/// Object position in tiles from a scan at `origin` on `leg`.
///
/// The scanner bearing is relative to the leg's scan heading, and the
/// distance is converted from cm to tiles.
pub fn object_position(leg: Leg, origin: Waypoint, detection: Detection, tile_size: f64) -> Waypoint {
    let r = detection.distance / tile_size;
    let (sin, cos) = detection.bearing.to_radians().sin_cos();

    match leg {
        Leg::East => Waypoint::new(origin.x + r * sin, origin.y + r * cos),
        Leg::South => Waypoint::new(origin.x + r * cos, origin.y - r * sin),
        Leg::West => Waypoint::new(origin.x - r * sin, origin.y - r * cos),
        Leg::North => Waypoint::new(origin.x - r * cos, origin.y + r * sin),
    }
}

/// Waypoints used to cross the transit zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgePlan {
    /// Half a tile before the bridge, on the home side
    pub approach: Waypoint,
    /// Bridge entrance
    pub entrance: Waypoint,
    /// Half a tile past the far end
    pub far_bank: Waypoint,
}

impl BridgePlan {
    /// The bridge runs along the longer side of the transit zone.
    pub fn for_transit(zone: &Zone) -> Self {
        let ll = zone.lower_left;
        let (w, h) = (zone.width() as f64, zone.height() as f64);
        let (x, y) = (ll.x as f64, ll.y as f64);

        if h < w {
            Self {
                approach: Waypoint::new(x - 0.5, y + 0.5),
                entrance: Waypoint::new(x, y + 0.5),
                far_bank: Waypoint::new(x + w + 0.5, y + 0.5),
            }
        } else {
            Self {
                approach: Waypoint::new(x + 0.5, y - 0.5),
                entrance: Waypoint::new(x + 0.5, y),
                far_bank: Waypoint::new(x + 0.5, y + h + 0.5),
            }
        }
    }
}
