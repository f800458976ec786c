use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::devices::power_meter::{POWER_METER_REGISTER_COUNT, POWER_METER_START_REGISTER};
use crate::utils::error::ModbusError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Connection settings
    pub serial_port: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
    pub parity: ParityConfig,

    // Meter settings
    pub device_address: u8,
    pub start_register: u16,
    pub register_count: u16,

    // Polling and reporting cadence
    pub poll_interval_seconds: u64,
    pub success_report_frequency: u64,
    pub failure_report_frequency: u64,

    // Reporting settings: one channel carries both report kinds
    pub report_channel: String,
    pub file_output: Option<FileOutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutputConfig {
    pub enabled: bool,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParityConfig {
    None,
    Even,
    Odd,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyS0".to_string(),
            baud_rate: 9600,
            timeout_ms: 1000,
            parity: ParityConfig::None,

            device_address: 1,
            start_register: POWER_METER_START_REGISTER,
            register_count: POWER_METER_REGISTER_COUNT,

            poll_interval_seconds: 1,
            success_report_frequency: 30,
            failure_report_frequency: 30,

            report_channel: "powermeter/telemetry".to_string(),
            file_output: None,
        }
    }
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ModbusError> {
        let mut config = if let Some(path) = matches.get_one::<String>("config") {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        if let Some(port) = matches.get_one::<String>("port") {
            config.serial_port = port.clone();
        }
        if let Some(baud) = matches.get_one::<String>("baud") {
            config.baud_rate = baud
                .parse()
                .map_err(|_| ModbusError::ConfigError(format!("Invalid baud rate: {}", baud)))?;
        }
        if let Some(interval) = matches.get_one::<String>("interval") {
            config.poll_interval_seconds = interval.parse().map_err(|_| {
                ModbusError::ConfigError(format!("Invalid poll interval: {}", interval))
            })?;
        }
        if let Some(path) = matches.get_one::<String>("output-file") {
            config.file_output = Some(FileOutputConfig {
                enabled: true,
                path: path.clone(),
            });
        }

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModbusError> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ModbusError::ConfigError(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| ModbusError::ConfigError(format!("Invalid config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModbusError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ModbusError::ConfigError(format!("Failed to create dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ModbusError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&path, content).map_err(|e| {
            ModbusError::ConfigError(format!(
                "Failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}
