use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use super::sink::EventSink;
use crate::devices::PowerMeterSnapshot;

/// Serializes measurement and failure reports and hands them to the event
/// sink. Publishing is best-effort: every report is logged, but it only
/// leaves the process while the sink has an active connection, and a failed
/// publish never propagates to the poll loop.
pub struct Reporter {
    sink: Arc<dyn EventSink>,
    channel: String,
}

impl Reporter {
    pub fn new(sink: Arc<dyn EventSink>, channel: String) -> Self {
        Self { sink, channel }
    }

    pub fn success_payload(snapshot: &PowerMeterSnapshot) -> String {
        serde_json::json!({
            "Voltage_1": snapshot.voltage_1,
            "Voltage_2": snapshot.voltage_2,
            "Voltage_3": snapshot.voltage_3,
            "Current_1": snapshot.current_1,
            "Current_2": snapshot.current_2,
            "Current_3": snapshot.current_3,
            "Time": snapshot.timestamp.to_rfc3339(),
        })
        .to_string()
    }

    pub fn failure_payload(error_code: u8) -> String {
        serde_json::json!({
            "Warning": "Modbus Read Error",
            "ErrorCode": error_code,
            "Time": Utc::now().to_rfc3339(),
        })
        .to_string()
    }

    pub async fn report_success(&self, snapshot: &PowerMeterSnapshot) {
        let payload = Self::success_payload(snapshot);
        info!("📤 Measurement report: {}", payload);
        self.forward(&payload).await;
    }

    pub async fn report_failure(&self, error_code: u8) {
        let payload = Self::failure_payload(error_code);
        info!("📤 Failure report: {}", payload);
        self.forward(&payload).await;
    }

    async fn forward(&self, payload: &str) {
        if !self.sink.is_connected() {
            info!(
                "📵 {} sink not connected, report not published",
                self.sink.sink_type()
            );
            return;
        }

        match self.sink.publish(&self.channel, payload).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "⚠️  {} sink refused report on channel {}",
                    self.sink.sink_type(),
                    self.channel
                );
            }
            Err(e) => {
                warn!(
                    "⚠️  Failed to publish report via {} to {}: {:?}",
                    self.sink.sink_type(),
                    self.sink.destination(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::error::ModbusError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    pub(crate) struct RecordingSink {
        pub connected: bool,
        pub published: Mutex<Vec<(String, String)>>,
        pub fail_publish: bool,
    }

    impl RecordingSink {
        pub fn new(connected: bool) -> Self {
            Self {
                connected,
                published: Mutex::new(Vec::new()),
                fail_publish: false,
            }
        }

        pub fn publish_count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn publish(&self, channel: &str, payload: &str) -> Result<bool, ModbusError> {
            if self.fail_publish {
                return Err(ModbusError::CommunicationError("sink down".to_string()));
            }
            self.published
                .lock()
                .unwrap()
                .push((channel.to_string(), payload.to_string()));
            Ok(true)
        }

        fn sink_type(&self) -> &str {
            "recording"
        }

        fn destination(&self) -> &str {
            "memory"
        }
    }

    fn sample_snapshot() -> PowerMeterSnapshot {
        PowerMeterSnapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            voltage_1: 42.0,
            voltage_2: 229.5,
            voltage_3: 224.0,
            current_1: 5.0,
            current_2: 6.25,
            current_3: 7.0,
        }
    }

    #[test]
    fn test_success_payload_shape() {
        let payload = Reporter::success_payload(&sample_snapshot());
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["Voltage_1"], 42.0);
        assert_eq!(value["Current_2"], 6.25);
        assert_eq!(value["Time"], "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_failure_payload_shape() {
        let payload = Reporter::failure_payload(2);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["Warning"], "Modbus Read Error");
        assert_eq!(value["ErrorCode"], 2);
        assert!(value["Time"].is_string());
    }

    #[tokio::test]
    async fn test_connected_sink_receives_report() {
        let sink = Arc::new(RecordingSink::new(true));
        let reporter = Reporter::new(sink.clone(), "meters/telemetry".to_string());

        reporter.report_success(&sample_snapshot()).await;

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "meters/telemetry");
    }

    #[tokio::test]
    async fn test_disconnected_sink_is_not_invoked() {
        let sink = Arc::new(RecordingSink::new(false));
        let reporter = Reporter::new(sink.clone(), "meters/telemetry".to_string());

        reporter.report_success(&sample_snapshot()).await;
        reporter.report_failure(0xE0).await;

        assert_eq!(sink.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let mut failing = RecordingSink::new(true);
        failing.fail_publish = true;
        let reporter = Reporter::new(Arc::new(failing), "meters/telemetry".to_string());

        // Must not panic or propagate
        reporter.report_failure(0xE1).await;
    }
}
