// Price loading, caching, and record persistence
pub mod pre_main_async;
pub mod record_csv;
pub mod timeseries;

// Re-export commonly used types
pub use pre_main_async::fetch_price_series;
pub use record_csv::{load_records, save_records};
pub use timeseries::serde_version::write_price_series_async;
