pub mod device;
pub mod frame;

pub use device::{display_devices, display_sensors, Device, Sensor};
pub use frame::{Observation, SensorFrame};
