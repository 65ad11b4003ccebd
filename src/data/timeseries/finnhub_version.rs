use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::FINNHUB;
use crate::data::timeseries::CreatePriceSeries;
use crate::domain::InstrumentInterval;
use crate::models::PriceSeries;
use crate::utils::TimeUtils;
use crate::utils::time_utils::now_timestamp_ms;

pub const FINNHUB_SIGNATURE: &str = "Finnhub API";

/// Body of `GET /api/v1/stock/candle`. Arrays are absent when `s` is "no_data".
#[derive(Debug, Deserialize)]
pub struct CandleResponse {
    pub s: String,
    #[serde(default)]
    pub t: Vec<i64>,
    #[serde(default)]
    pub o: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    #[serde(default)]
    pub l: Vec<f64>,
    #[serde(default)]
    pub c: Vec<f64>,
}

/// Finnhub resolution codes ("1", "5", "60", "D", ...) in milliseconds
pub fn resolution_to_ms(resolution: &str) -> Option<i64> {
    let ms = match resolution {
        "1" => TimeUtils::MS_IN_MIN,
        "5" => TimeUtils::MS_IN_5_MIN,
        "15" => TimeUtils::MS_IN_15_MIN,
        "30" => TimeUtils::MS_IN_30_MIN,
        "60" => TimeUtils::MS_IN_H,
        "D" => TimeUtils::MS_IN_D,
        "W" => TimeUtils::MS_IN_W,
        "M" => TimeUtils::MS_IN_1_M,
        _ => return None,
    };
    Some(ms)
}

/// Stock candles for one ticker over the trailing `lookback_hours`.
pub struct FinnhubCandles {
    pub instrument: InstrumentInterval,
    pub resolution: String,
    pub lookback_hours: i64,
    pub token: String,
}

impl FinnhubCandles {
    pub fn new(symbol: &str, resolution: &str, lookback_hours: i64, token: String) -> Result<Self> {
        let interval_ms = resolution_to_ms(resolution)
            .ok_or_else(|| anyhow!("Unsupported Finnhub resolution: {}", resolution))?;
        Ok(Self {
            instrument: InstrumentInterval::new(symbol, interval_ms),
            resolution: resolution.to_string(),
            lookback_hours,
            token,
        })
    }
}

#[async_trait]
impl CreatePriceSeries for FinnhubCandles {
    fn signature(&self) -> &'static str {
        FINNHUB_SIGNATURE
    }

    async fn create_price_series(&self) -> Result<PriceSeries> {
        if self.token.trim().is_empty() {
            bail!("No Finnhub API token supplied (use --finnhub-token)");
        }

        let to_secs = now_timestamp_ms() / TimeUtils::MS_IN_S;
        let from_secs = to_secs - self.lookback_hours * 60 * 60;
        let (from, to) = (from_secs.to_string(), to_secs.to_string());
        let url = format!("{}{}", FINNHUB.base_url, FINNHUB.candle_path);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(FINNHUB.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(&url)
            .query(&[
                ("symbol", self.instrument.name()),
                ("resolution", self.resolution.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.token.as_str()),
            ])
            .send()
            .await
            .context(format!("Finnhub request failed for {}", self.instrument))?
            .error_for_status()
            .context(format!("Finnhub returned an error status for {}", self.instrument))?;

        let body: CandleResponse = response
            .json()
            .await
            .context(format!("Failed to decode Finnhub candles for {}", self.instrument))?;

        candles_to_series(self.instrument.clone(), body)
    }
}

pub fn candles_to_series(instrument: InstrumentInterval, body: CandleResponse) -> Result<PriceSeries> {
    if body.s != "ok" {
        bail!("Finnhub candle status for {} was {:?}", instrument, body.s);
    }
    let timestamps_ms = body.t.iter().map(|secs| secs * TimeUtils::MS_IN_S).collect();
    let series = PriceSeries::from_columns(instrument, timestamps_ms, body.o, body.h, body.l, body.c)?;
    log::info!(
        "Fetched {} candles for {} from Finnhub",
        series.len(),
        series.instrument
    );
    Ok(series)
}
