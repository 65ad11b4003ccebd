//! File persistence and serialization configuration

use crate::domain::InstrumentInterval;

pub struct PriceCacheSettings {
    /// Directory path for storing cached price data
    pub directory: &'static str,
    /// Base filename for cache files (without extension)
    pub filename_without_ext: &'static str,
    /// Current version of the cache serialization format
    pub version: f64,
    /// Maximum age of a cache file before it is ignored (seconds)
    pub acceptable_age_secs: i64,
}

pub struct OutputSettings {
    /// Default location of the summary record CSV
    pub records_csv: &'static str,
    /// Default location of the chart-data JSON export
    pub chart_json: &'static str,
}

pub struct PersistenceConfig {
    pub cache: PriceCacheSettings,
    pub output: OutputSettings,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    cache: PriceCacheSettings {
        directory: "price_data",
        filename_without_ext: "prices",
        version: 1.0,
        // 24 hours (60 * 60 * 24)
        acceptable_age_secs: 86_400,
    },
    output: OutputSettings {
        records_csv: "entropy_analysis.csv",
        chart_json: "entropy_chart_data.json",
    },
};

/// Generate source-specific cache filename
/// Example: "prices_binance_BTCUSDT_1m_v1.bin"
pub fn price_cache_filename(source: &str, instrument: &InstrumentInterval) -> String {
    format!(
        "{}_{}_{}_{}_v{}.bin",
        PERSISTENCE.cache.filename_without_ext,
        source,
        instrument.name(),
        instrument.interval_label(),
        PERSISTENCE.cache.version
    )
}
