//! Configuration module for the market-entropy application.

pub mod analysis;
pub mod binance;

mod debug; // Private because of the public re-export. Forces files to use crate::config::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

pub mod finnhub;
pub mod persistence;

// Re-export commonly used items
pub use analysis::{
    ANALYSIS, ClassifierPolicy, EntropyEstimatorKind, PipelineConfig, PriceField,
    VolatilityEstimatorKind,
};
pub use binance::BINANCE;
pub use finnhub::FINNHUB;
pub use persistence::{PERSISTENCE, price_cache_filename};
