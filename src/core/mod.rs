//! Core types shared across components

pub mod types;

pub use types::{GridPoint, LineCrossing, Pose, Waypoint, WheelSample, Zone};
