use async_trait::async_trait;
use log::{error, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::utils::error::ModbusError;

/// External event-publish collaborator. Reports are forwarded only while
/// the sink claims an active connection; a `false` return means the sink
/// accepted the call but dropped the payload.
#[async_trait]
pub trait EventSink: Send + Sync {
    fn is_connected(&self) -> bool;
    async fn publish(&self, channel: &str, payload: &str) -> Result<bool, ModbusError>;
    fn sink_type(&self) -> &str;
    fn destination(&self) -> &str;
}

pub struct ConsoleSink;

#[async_trait]
impl EventSink for ConsoleSink {
    fn is_connected(&self) -> bool {
        true
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<bool, ModbusError> {
        println!("[{}] {}", channel, payload);
        Ok(true)
    }

    fn sink_type(&self) -> &str {
        "console"
    }

    fn destination(&self) -> &str {
        "stdout"
    }
}

pub struct FileSink {
    file_path: String,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }
}

#[async_trait]
impl EventSink for FileSink {
    fn is_connected(&self) -> bool {
        true
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<bool, ModbusError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| {
                error!("❌ Failed to open file {}: {}", self.file_path, e);
                ModbusError::CommunicationError(format!("File open error: {}", e))
            })?;

        writeln!(file, "{} {}", channel, payload).map_err(|e| {
            error!("❌ Failed to write to file {}: {}", self.file_path, e);
            ModbusError::CommunicationError(format!("File write error: {}", e))
        })?;

        info!("✅ Report appended to file: {}", self.file_path);
        Ok(true)
    }

    fn sink_type(&self) -> &str {
        "file"
    }

    fn destination(&self) -> &str {
        &self.file_path
    }
}
