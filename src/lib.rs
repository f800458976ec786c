//! Power-Meter Telemetry Poller
//!
//! Polls a single three-phase power meter over Modbus RTU on a fixed
//! cadence, decodes its input-register block into voltage/current
//! measurements, and publishes success and failure reports to an external
//! event sink on independent, runtime-adjustable intervals.

pub mod cli;
pub mod config;
pub mod devices;
pub mod modbus;
pub mod output;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, RemoteConfigHandler, ReportSchedule};
pub use devices::{PowerMeterDevice, PowerMeterSnapshot};
pub use modbus::{ModbusClient, ModbusClientTrait};
pub use output::{ConsoleSink, EventSink, FileSink, Reporter};
pub use services::PollService;
pub use utils::error::ModbusError;

pub const VERSION: &str = "0.1.0";
