use thiserror::Error;

// Reserved codes for transport-level failures that have no Modbus exception
// code of their own. Exception codes 1..=11 are reported verbatim.
pub const CODE_TIMEOUT: u8 = 0xE0;
pub const CODE_CRC: u8 = 0xE1;
pub const CODE_INVALID_RESPONSE: u8 = 0xE2;
pub const CODE_IO: u8 = 0xE3;
pub const CODE_CONNECTION: u8 = 0xE4;
pub const CODE_OTHER: u8 = 0xFF;

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("CRC checksum mismatch")]
    CrcError,

    #[error("Invalid response from device")]
    InvalidResponse,

    #[error("Modbus exception response: code {0}")]
    Exception(u8),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Lock acquisition failed")]
    LockError,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ModbusError {
    /// Numeric code carried in failure reports. Exception codes pass
    /// through verbatim; transport-level failures map to reserved codes.
    pub fn code(&self) -> u8 {
        match self {
            ModbusError::Exception(code) => *code,
            ModbusError::Timeout => CODE_TIMEOUT,
            ModbusError::CrcError => CODE_CRC,
            ModbusError::InvalidResponse | ModbusError::InvalidData(_) => CODE_INVALID_RESPONSE,
            ModbusError::CommunicationError(_) | ModbusError::LockError => CODE_IO,
            ModbusError::ConnectionError(_) => CODE_CONNECTION,
            _ => CODE_OTHER,
        }
    }
}

impl From<serde_json::Error> for ModbusError {
    fn from(err: serde_json::Error) -> Self {
        ModbusError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        ModbusError::CommunicationError(format!("IO error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for ModbusError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ModbusError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_codes_pass_through_verbatim() {
        assert_eq!(ModbusError::Exception(2).code(), 2);
        assert_eq!(ModbusError::Exception(11).code(), 11);
    }

    #[test]
    fn transport_failures_use_reserved_codes() {
        assert_eq!(ModbusError::Timeout.code(), CODE_TIMEOUT);
        assert_eq!(ModbusError::CrcError.code(), CODE_CRC);
        assert_eq!(ModbusError::InvalidResponse.code(), CODE_INVALID_RESPONSE);
    }
}
