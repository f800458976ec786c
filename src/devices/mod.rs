pub mod power_meter;

pub use power_meter::{PowerMeterDevice, PowerMeterSnapshot};
