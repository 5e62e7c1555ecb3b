//! Downward-facing reflectance sensor trait

use crate::error::Result;

/// Floor reflectance source. Grid lines read darker than the floor.
pub trait ReflectanceSensor: Send + Sync {
    /// Reflected intensity in [0, 1]
    fn intensity(&self) -> Result<f64>;
}
