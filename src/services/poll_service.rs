use log::{error, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::config::{Config, ReportSchedule};
use crate::devices::{PowerMeterDevice, PowerMeterSnapshot};
use crate::modbus::{ModbusClient, ModbusClientTrait};
use crate::output::{EventSink, Reporter};
use crate::utils::error::ModbusError;

/// The polling control loop: one transport read per tick, decode on
/// success, and two independent report timers with runtime-adjustable
/// cadences. All mutable state lives here; nothing is shared except the
/// `ReportSchedule` the configuration callers write to.
pub struct PollService {
    config: Config,
    schedule: Arc<ReportSchedule>,
    client: Arc<dyn ModbusClientTrait>,
    meter: PowerMeterDevice,
    reporter: Reporter,
    snapshot: Option<PowerMeterSnapshot>,
    last_error_code: Option<u8>,
    last_success_report: Option<Instant>,
    last_failure_report: Option<Instant>,
}

impl PollService {
    pub fn new(
        config: Config,
        schedule: Arc<ReportSchedule>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ModbusError> {
        let client = ModbusClient::new(
            &config.serial_port,
            config.baud_rate,
            config.timeout_ms,
            &config.parity,
        )?;
        Ok(Self::with_client(config, schedule, Arc::new(client), sink))
    }

    /// Wire the service onto an existing transport client. The public
    /// constructor goes through here; tests inject mock clients the same
    /// way.
    pub fn with_client(
        config: Config,
        schedule: Arc<ReportSchedule>,
        client: Arc<dyn ModbusClientTrait>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let meter = PowerMeterDevice::new(config.device_address);
        let reporter = Reporter::new(sink, config.report_channel.clone());

        Self {
            config,
            schedule,
            client,
            meter,
            reporter,
            snapshot: None,
            last_error_code: None,
            last_success_report: None,
            last_failure_report: None,
        }
    }

    pub fn latest_snapshot(&self) -> Option<&PowerMeterSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error_code(&self) -> Option<u8> {
        self.last_error_code
    }

    /// Run until ctrl-c. Each tick is bounded by the transport timeout;
    /// the loop itself never exits on a poll or publish failure.
    pub async fn run(&mut self) -> Result<(), ModbusError> {
        info!("🚀 Starting power meter polling");
        info!(
            "📡 Meter address {} | registers {}..{} | {} second poll interval",
            self.config.device_address,
            self.config.start_register,
            self.config.start_register + self.config.register_count,
            self.config.poll_interval_seconds
        );
        info!(
            "⏱️  Report cadence: success {}s, failure {}s",
            self.schedule.success_report_frequency(),
            self.schedule.failure_report_frequency()
        );

        let tick = Duration::from_secs(self.config.poll_interval_seconds.max(1));
        let mut ticker = interval(tick);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("🛑 Stopping power meter polling");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.poll_once(Instant::now()).await;
                }
            }
        }
    }

    /// One tick of the control loop. Separated from `run` so the cadence
    /// behavior can be driven with synthetic timestamps.
    pub async fn poll_once(&mut self, now: Instant) {
        let result = self
            .client
            .read_input_registers(
                self.config.device_address,
                self.config.start_register,
                self.config.register_count,
            )
            .await
            .and_then(|words| self.meter.decode(&words));

        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);

                let frequency = self.schedule.success_report_frequency();
                if Self::report_due(self.last_success_report, now, frequency) {
                    self.last_success_report = Some(now);
                    // Snapshot was just stored above
                    if let Some(snapshot) = &self.snapshot {
                        self.reporter.report_success(snapshot).await;
                    }
                }
            }
            Err(e) => {
                let code = e.code();
                self.last_error_code = Some(code);
                error!("❌ Poll failed: {} (code {})", e, code);

                let frequency = self.schedule.failure_report_frequency();
                if Self::report_due(self.last_failure_report, now, frequency) {
                    self.last_failure_report = Some(now);
                    self.reporter.report_failure(code).await;
                }
            }
        }
    }

    /// Fire-at-or-after comparison. A zero cadence is always due ("report
    /// every tick"); so is the first qualifying poll. Monotonic `Instant`
    /// arithmetic keeps the elapsed computation wraparound-safe.
    fn report_due(last: Option<Instant>, now: Instant, frequency_secs: u64) -> bool {
        if frequency_secs == 0 {
            return true;
        }
        match last {
            None => true,
            Some(last) => {
                now.saturating_duration_since(last) >= Duration::from_secs(frequency_secs)
            }
        }
    }
}
