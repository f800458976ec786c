use async_trait::async_trait;
use log::{error, info, trace};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::protocol::{build_read_input_request, parse_read_response};
use crate::config::settings::ParityConfig;
use crate::utils::error::ModbusError;

// Turnaround delay before collecting the response on the half-duplex bus
const RESPONSE_DELAY_MS: u64 = 50;

#[async_trait]
pub trait ModbusClientTrait: Send + Sync {
    async fn read_input_registers(
        &self,
        slave_id: u8,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError>;
}

pub struct ModbusClient {
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl ModbusClient {
    pub fn new(
        port_name: &str,
        baud_rate: u32,
        timeout_ms: u64,
        parity: &ParityConfig,
    ) -> Result<Self, ModbusError> {
        info!("🔌 Connecting to Modbus RTU port: {}", port_name);
        info!("⚙️  Configuration: {} baud, 8 data bits, 1 stop bit", baud_rate);

        let serial_parity = match parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        };

        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(timeout_ms))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serial_parity)
            .open()
            .map_err(|e| {
                error!("❌ Failed to open serial port {}: {}", port_name, e);
                ModbusError::ConnectionError(format!("Failed to open port: {}", e))
            })?;

        info!("✅ Modbus RTU connection established successfully");
        Ok(Self {
            port: Arc::new(Mutex::new(port)),
        })
    }

    fn map_io(err: std::io::Error, context: &str) -> ModbusError {
        if err.kind() == std::io::ErrorKind::TimedOut {
            ModbusError::Timeout
        } else {
            ModbusError::CommunicationError(format!("{}: {}", context, err))
        }
    }
}

#[async_trait]
impl ModbusClientTrait for ModbusClient {
    async fn read_input_registers(
        &self,
        slave_id: u8,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        let request = build_read_input_request(slave_id, start_addr, count);

        let result = {
            let mut port = self.port.lock().map_err(|_| ModbusError::LockError)?;

            // Driver-enable for the RS-485 transceiver: assert before the
            // request goes out, release once it has been flushed.
            port.write_request_to_send(true)
                .map_err(|e| ModbusError::CommunicationError(format!("RTS assert failed: {}", e)))?;

            let write_result = port
                .write_all(&request)
                .map_err(|e| Self::map_io(e, "Write failed"))
                .and_then(|_| port.flush().map_err(|e| Self::map_io(e, "Flush failed")));

            let rts_result = port
                .write_request_to_send(false)
                .map_err(|e| ModbusError::CommunicationError(format!("RTS release failed: {}", e)));
            write_result.and(rts_result)?;

            std::thread::sleep(Duration::from_millis(RESPONSE_DELAY_MS));

            // Header first: slave id, function code and the third byte,
            // which is either a byte count or an exception code.
            let mut frame = vec![0u8; 3];
            port.read_exact(&mut frame)
                .map_err(|e| Self::map_io(e, "Read failed"))?;

            let remaining = if frame[1] & 0x80 != 0 {
                2 // exception frame carries only the CRC after the code
            } else {
                frame[2] as usize + 2
            };
            let mut tail = vec![0u8; remaining];
            port.read_exact(&mut tail)
                .map_err(|e| Self::map_io(e, "Read failed"))?;
            frame.extend_from_slice(&tail);

            parse_read_response(slave_id, count, &frame)
        };

        match &result {
            Ok(words) => {
                if words.len() >= 2 {
                    let first = f32::from_bits(((words[0] as u32) << 16) | words[1] as u32);
                    trace!("📊 First channel raw: {:.3}", first);
                }
            }
            Err(e) => {
                info!("📵 Modbus read failed: error code {}", e.code());
            }
        }

        result
    }
}
