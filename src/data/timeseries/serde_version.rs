#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::domain::InstrumentInterval;
use crate::models::PriceSeries;
use crate::utils::time_utils::how_many_seconds_ago;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::data::timeseries::bnapi_version::BINANCE_SIGNATURE;
use crate::data::timeseries::finnhub_version::FINNHUB_SIGNATURE;
use crate::data::timeseries::{CreatePriceSeries, cache_file::CacheFile};

pub const LOCAL_CACHE_SIGNATURE: &str = "Local Cache";

/// Cache key for series that are worth caching (API fetches only)
pub fn cache_source_key(signature: &str) -> Option<&'static str> {
    match signature {
        BINANCE_SIGNATURE => Some("binance"),
        FINNHUB_SIGNATURE => Some("finnhub"),
        _ => None,
    }
}

pub fn check_local_data_validity(
    source_key: &str,
    instrument: &InstrumentInterval,
    recency_required_secs: i64,
    version_required: f64,
) -> Result<()> {
    let full_path = CacheFile::default_cache_path(source_key, instrument);

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_serde {
        log::info!("Checking validity of local cache at {:?}...", full_path);
    }
    let cache = CacheFile::load_from_path(&full_path)?;

    // Check version
    if cache.version != version_required {
        bail!(
            "Cache version mismatch: file v{} vs required v{}",
            cache.version,
            version_required
        );
    }

    // Check source matches
    if cache.source_key != source_key {
        bail!(
            "Cache source mismatch: file came from {}, expected {}",
            cache.source_key,
            source_key
        );
    }

    // Check instrument matches
    if cache.data.instrument != *instrument {
        bail!(
            "Cache instrument mismatch: file holds {}, expected {}",
            cache.data.instrument,
            instrument
        );
    }

    // Check recency
    let seconds_ago = how_many_seconds_ago(cache.timestamp_ms);
    if seconds_ago > recency_required_secs {
        bail!(
            "Cache too old: created {} seconds ago (limit: {} seconds)",
            seconds_ago,
            recency_required_secs
        );
    }

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_serde {
        log::info!(
            "✅ Cache valid: v{}, {}s old (limit {}s), {} prices of {}",
            cache.version,
            seconds_ago,
            recency_required_secs,
            cache.data.len(),
            cache.data.instrument
        );
    }

    Ok(())
}

/// Write an API-fetched series to the binary cache file.
/// Series from any other source are skipped.
pub fn write_price_series_locally(signature: &str, series: &PriceSeries) -> Result<()> {
    let Some(source_key) = cache_source_key(signature) else {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_serde {
            log::info!("Skipping cache write (data came from {})", signature);
        }
        return Ok(());
    };

    let full_path = CacheFile::default_cache_path(source_key, &series.instrument);

    #[cfg(debug_assertions)]
    let start_time = DEBUG_FLAGS.print_serde.then(|| {
        log::info!("Writing cache to disk: {:?}...", full_path);
        std::time::Instant::now()
    });

    let cache = CacheFile::new(
        source_key,
        series.clone(),
        crate::config::PERSISTENCE.cache.version,
    );
    cache.save_to_path(&full_path)?;

    #[cfg(debug_assertions)]
    if let Some(start) = start_time {
        let file_size = std::fs::metadata(&full_path)?.len();
        log::info!(
            "✅ Cache written: {:?} ({:.1} KB in {:.2}s)",
            full_path,
            file_size as f64 / 1024.0,
            start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Async wrapper for write_price_series_locally
pub async fn write_price_series_async(signature: &'static str, series: PriceSeries) -> Result<()> {
    tokio::task::spawn_blocking(move || write_price_series_locally(signature, &series))
        .await
        .context("Cache write task panicked")?
}

pub struct LocalCache {
    pub source_key: &'static str,
    pub instrument: InstrumentInterval,
}

#[async_trait]
impl CreatePriceSeries for LocalCache {
    fn signature(&self) -> &'static str {
        LOCAL_CACHE_SIGNATURE
    }

    async fn create_price_series(&self) -> Result<PriceSeries> {
        let full_path = CacheFile::default_cache_path(self.source_key, &self.instrument);

        #[cfg(debug_assertions)]
        let start_time = DEBUG_FLAGS.print_serde.then(|| {
            log::info!("Reading cache from: {:?}...", full_path);
            std::time::Instant::now()
        });

        let cache = tokio::task::spawn_blocking(move || CacheFile::load_from_path(&full_path))
            .await
            .context("Deserialization task panicked")?
            .context("Failed to load cache file")?;

        #[cfg(debug_assertions)]
        if let Some(start) = start_time {
            log::info!(
                "✅ Cache loaded: {} prices in {:.2}s",
                cache.data.len(),
                start.elapsed().as_secs_f64()
            );
        }

        Ok(cache.data)
    }
}
