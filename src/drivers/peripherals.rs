//! Mission-side peripherals: payload arm, classifiers, annunciator, object scanner

use crate::error::Result;
use crate::mission::ScanStatus;

/// Payload handling, classification and the completion cue.
pub trait MissionPeripherals: Send + Sync {
    /// Close the payload arm before moving onto the bridge
    fn hold_payload(&self) -> Result<()>;

    /// Open the payload arm
    fn release_payload(&self) -> Result<()>;

    /// Run colour classification on the object in front of the robot
    fn classify_color(&self) -> Result<()>;

    /// Run weight classification on the object in front of the robot
    fn classify_weight(&self) -> Result<()>;

    /// Signal mission completion (audible cue on real hardware)
    fn completion_cue(&self) -> Result<()>;
}

/// Background object detector.
///
/// `scan` runs until `status.is_scanning()` turns false or it reports a
/// detection through [`ScanStatus::report`].
pub trait ObjectScanner: Send + Sync {
    fn scan(&self, status: &ScanStatus);
}
