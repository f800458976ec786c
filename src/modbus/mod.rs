pub mod client;
pub mod crc;
pub mod protocol;

pub use client::{ModbusClient, ModbusClientTrait};
pub use crc::crc16_modbus;
pub use protocol::{build_read_input_request, parse_read_response};
