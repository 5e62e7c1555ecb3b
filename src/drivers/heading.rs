//! Heading sensor (gyro) trait

use crate::error::Result;

/// Absolute heading source.
pub trait HeadingSensor: Send + Sync {
    /// Heading in degrees, clockwise positive.
    ///
    /// Readings may be signed and outside [0, 360); callers normalize.
    fn heading(&self) -> Result<f64>;

    /// Zero the sensor at the current orientation
    fn reset(&self) -> Result<()>;
}
