use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::runtime::ReportSchedule;
use crate::output::EventSink;
use crate::utils::error::ModbusError;

/// Configuration command delivered asynchronously by the external
/// collaborator, one report-cadence parameter per message. A missing value
/// reads the parameter back without changing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCommand {
    pub message_id: String,
    pub timestamp: String,
    pub parameter: ReportParameter,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportParameter {
    SuccessReportFrequency,
    FailureReportFrequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub message_id: String,
    pub parameter: ReportParameter,
    pub value: u64,
}

pub struct RemoteConfigHandler {
    schedule: Arc<ReportSchedule>,
    sink: Arc<dyn EventSink>,
    response_channel: String,
}

impl RemoteConfigHandler {
    pub fn new(
        schedule: Arc<ReportSchedule>,
        sink: Arc<dyn EventSink>,
        response_channel: String,
    ) -> Self {
        Self {
            schedule,
            sink,
            response_channel,
        }
    }

    /// Spawn the listener task. Runs until the command channel closes;
    /// malformed messages are logged and dropped, never fatal.
    pub fn start(&self, mut receiver: broadcast::Receiver<String>) {
        info!("🔧 Starting configuration command listener");

        let schedule = self.schedule.clone();
        let sink = self.sink.clone();
        let response_channel = self.response_channel.clone();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if let Err(e) =
                            Self::handle_message(&message, &schedule, &sink, &response_channel)
                                .await
                        {
                            error!("❌ Failed to handle configuration message: {}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("⚠️  Configuration listener lagged, skipped {} messages", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    async fn handle_message(
        message: &str,
        schedule: &Arc<ReportSchedule>,
        sink: &Arc<dyn EventSink>,
        response_channel: &str,
    ) -> Result<(), ModbusError> {
        let command: ConfigCommand = serde_json::from_str(message)
            .map_err(|e| ModbusError::InvalidData(format!("Invalid command format: {}", e)))?;

        info!(
            "📨 Configuration command {:?} (message {})",
            command.parameter, command.message_id
        );

        let value = Self::apply(schedule, &command);

        let response = ConfigResponse {
            message_id: command.message_id,
            parameter: command.parameter,
            value,
        };
        let response_json = serde_json::to_string(&response)?;

        if sink.is_connected() {
            sink.publish(response_channel, &response_json).await?;
            info!("📤 Sent configuration response");
        } else {
            info!("📵 Sink not connected, configuration response not published");
        }

        Ok(())
    }

    fn apply(schedule: &ReportSchedule, command: &ConfigCommand) -> u64 {
        let value = command.value.as_deref();
        match command.parameter {
            ReportParameter::SuccessReportFrequency => {
                schedule.set_success_report_frequency(value)
            }
            ReportParameter::FailureReportFrequency => {
                schedule.set_failure_report_frequency(value)
            }
        }
    }

    /// Helper for callers that need to produce a well-formed command
    /// message.
    pub fn create_command(parameter: ReportParameter, value: Option<&str>) -> Result<String, ModbusError> {
        let command = ConfigCommand {
            message_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            parameter,
            value: value.map(|v| v.to_string()),
        };
        Ok(serde_json::to_string(&command)?)
    }
}
