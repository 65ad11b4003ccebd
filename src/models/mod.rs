// Data models shared by the pipeline, the price sources and the report
// These modules hold plain data, independent of where it came from or how it is shown

pub mod summary_record;
pub mod timeseries;

// Re-export key types for convenience
pub use summary_record::{RECORD_HEADER, SummaryRecord};
pub use timeseries::PriceSeries;
