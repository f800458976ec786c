pub mod reporter;
pub mod sink;

pub use reporter::Reporter;
pub use sink::{ConsoleSink, EventSink, FileSink};
