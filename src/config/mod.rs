pub mod remote;
pub mod runtime;
pub mod settings;

pub use remote::{ConfigCommand, ConfigResponse, RemoteConfigHandler, ReportParameter};
pub use runtime::{ReportSchedule, DEFAULT_REPORT_FREQUENCY_SECS};
pub use settings::{Config, FileOutputConfig, ParityConfig};
