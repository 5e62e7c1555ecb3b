//! Device driver traits

pub mod heading;
pub mod motor;
pub mod peripherals;
pub mod reflectance;

pub use heading::HeadingSensor;
pub use motor::{DriveBase, WheelMotor};
pub use peripherals::{MissionPeripherals, ObjectScanner};
pub use reflectance::ReflectanceSensor;
