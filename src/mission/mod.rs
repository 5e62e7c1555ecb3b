//! Search mission: bridge crossing, perimeter scan of the search zone,
//! retrieval and return home.

pub mod driver;
pub mod route;
pub mod scan;
pub mod state;

pub use driver::{MapDriver, RoundOutcome};
pub use route::{BridgePlan, Leg, object_position};
pub use scan::{Detection, ScanStatus};
pub use state::{MissionState, Stage};
