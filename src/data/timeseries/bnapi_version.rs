pub mod bn_kline;
pub mod raw_ohlcv;

use anyhow::Result;
use async_trait::async_trait;
use bn_kline::AllValidKlines4Instrument;
use tokio::time::Instant;

use crate::data::timeseries::CreatePriceSeries;
use crate::domain::InstrumentInterval;
use crate::models::PriceSeries;
use crate::utils::TimeUtils;
use crate::utils::time_utils::{self, now_timestamp_ms};
pub use raw_ohlcv::PriceSeriesTemp;

pub const BINANCE_SIGNATURE: &str = "Binance API";

/// Spot klines for one symbol over the trailing `lookback_hours`.
pub struct BinanceKlines {
    pub instrument: InstrumentInterval,
    pub lookback_hours: i64,
}

#[async_trait]
impl CreatePriceSeries for BinanceKlines {
    fn signature(&self) -> &'static str {
        BINANCE_SIGNATURE
    }

    async fn create_price_series(&self) -> Result<PriceSeries> {
        let start_time = Instant::now();
        let end_ms = now_timestamp_ms();
        let start_ms = end_ms - self.lookback_hours * TimeUtils::MS_IN_H;

        let series = price_series_load(self.instrument.clone(), start_ms, end_ms).await?;

        log::info!(
            "{} (started on {}, ended on {}) with {} klines and {:.2}% gaps",
            series.instrument,
            series
                .first_timestamp_ms()
                .map(time_utils::epoch_ms_to_utc)
                .unwrap_or_default(),
            series
                .last_timestamp_ms()
                .map(time_utils::epoch_ms_to_utc)
                .unwrap_or_default(),
            series.len(),
            series.pct_gaps,
        );
        log::info!("Binance load finished in: {:?}", start_time.elapsed());

        Ok(series)
    }
}

pub async fn price_series_load(
    instrument: InstrumentInterval,
    start_ms: i64,
    end_ms: i64,
) -> Result<PriceSeries> {
    let klines: AllValidKlines4Instrument = bn_kline::load_klines(instrument, start_ms, end_ms).await?;
    let temp = PriceSeriesTemp::try_from(klines)?;
    Ok(temp.into())
}
