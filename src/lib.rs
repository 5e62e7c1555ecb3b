//! KhojNav - Navigation and search missions for a differential-drive rover
//!
//! Four cooperating parts:
//!
//! - **Pose estimator** ([`odometry`]): periodic dead reckoning from wheel
//!   rotation counts into a shared pose
//! - **Motion controller** ([`navigation`]): straight-line waypoint travel and
//!   gyro-closed turns, re-seeding the pose heading from the gyro
//! - **Relocalizer** ([`localization`]): recovers position and heading from
//!   grid-line crossings seen by a downward reflectance sensor
//! - **Mission driver** ([`mission`]): bridge crossing, perimeter sweep of a
//!   search zone, retrieval and return home
//!
//! Hardware sits behind the traits in [`drivers`]; [`devices::mock`] provides
//! a simulated rover implementing all of them.

pub mod config;
pub mod core;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod localization;
pub mod mission;
pub mod navigation;
pub mod odometry;
pub mod robot;
pub mod utils;

// Re-export commonly used types
pub use config::KhojConfig;
pub use crate::core::{Pose, Waypoint, Zone};
pub use error::{KhojError, Result};
pub use localization::LightLocalizer;
pub use mission::{MapDriver, RoundOutcome};
pub use navigation::{Motion, Navigator};
pub use odometry::PoseEstimator;
pub use robot::{Robot, RobotDevices};
