use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_REPORT_FREQUENCY_SECS: u64 = 30;

/// Report cadences shared between the poll loop and asynchronous
/// configuration callers. Single-word atomics: a reader can never observe
/// a partially-updated value, and the loop re-reads them every tick.
///
/// A stored value of 0 means "report on every tick" (the due-check treats
/// zero as always due), never a division or a busy loop.
pub struct ReportSchedule {
    success_secs: AtomicU64,
    failure_secs: AtomicU64,
}

impl Default for ReportSchedule {
    fn default() -> Self {
        Self::with_frequencies(DEFAULT_REPORT_FREQUENCY_SECS, DEFAULT_REPORT_FREQUENCY_SECS)
    }
}

impl ReportSchedule {
    pub fn with_frequencies(success_secs: u64, failure_secs: u64) -> Self {
        Self {
            success_secs: AtomicU64::new(success_secs),
            failure_secs: AtomicU64::new(failure_secs),
        }
    }

    pub fn success_report_frequency(&self) -> u64 {
        self.success_secs.load(Ordering::Relaxed)
    }

    pub fn failure_report_frequency(&self) -> u64 {
        self.failure_secs.load(Ordering::Relaxed)
    }

    /// Setter entry point for the success cadence, callable from any task.
    /// `None` or blank input is a pure read; non-numeric input keeps the
    /// previous value. Returns the value in effect afterwards.
    pub fn set_success_report_frequency(&self, value: Option<&str>) -> u64 {
        Self::apply("success", &self.success_secs, value)
    }

    /// Setter entry point for the failure cadence, same contract as the
    /// success setter.
    pub fn set_failure_report_frequency(&self, value: Option<&str>) -> u64 {
        Self::apply("failure", &self.failure_secs, value)
    }

    fn apply(kind: &str, slot: &AtomicU64, value: Option<&str>) -> u64 {
        let raw = match value {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => return slot.load(Ordering::Relaxed),
        };

        match raw.parse::<u64>() {
            Ok(secs) => {
                slot.store(secs, Ordering::Relaxed);
                info!("🔧 {} report frequency set to {} seconds", kind, secs);
                secs
            }
            Err(_) => {
                let current = slot.load(Ordering::Relaxed);
                warn!(
                    "⚠️  Ignoring non-numeric {} report frequency '{}', keeping {}",
                    kind, raw, current
                );
                current
            }
        }
    }
}
