// Std library crates
use std::collections::HashSet;
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;

// External crates
use anyhow::{Result, anyhow, bail};
use binance_sdk::common::models::Interval as binance_interval;
use binance_sdk::config::ConfigurationRestApi;
use binance_sdk::models::RestApiRateLimit;
use binance_sdk::spot::{
    SpotRestApi,
    rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
};
use binance_sdk::{errors, errors::ConnectorError as connection_error};
use chrono::Utc;
use tokio::time::{Duration, sleep};

// Local crates
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::config::binance::{BINANCE, BinanceApiConfig};
use crate::domain::InstrumentInterval;
use crate::utils::TimeUtils;

pub trait IntervalToMs {
    fn to_ms(&self) -> i64;
}

impl IntervalToMs for KlinesIntervalEnum {
    fn to_ms(&self) -> i64 {
        match self {
            KlinesIntervalEnum::Interval1s => TimeUtils::MS_IN_S,
            KlinesIntervalEnum::Interval1m => TimeUtils::MS_IN_MIN,
            KlinesIntervalEnum::Interval3m => TimeUtils::MS_IN_3_MIN,
            KlinesIntervalEnum::Interval5m => TimeUtils::MS_IN_5_MIN,
            KlinesIntervalEnum::Interval15m => TimeUtils::MS_IN_15_MIN,
            KlinesIntervalEnum::Interval30m => TimeUtils::MS_IN_30_MIN,
            KlinesIntervalEnum::Interval1h => TimeUtils::MS_IN_H,
            KlinesIntervalEnum::Interval2h => TimeUtils::MS_IN_2_H,
            KlinesIntervalEnum::Interval4h => TimeUtils::MS_IN_4_H,
            KlinesIntervalEnum::Interval6h => TimeUtils::MS_IN_6_H,
            KlinesIntervalEnum::Interval8h => TimeUtils::MS_IN_8_H,
            KlinesIntervalEnum::Interval12h => TimeUtils::MS_IN_12_H,
            KlinesIntervalEnum::Interval1d => TimeUtils::MS_IN_D,
            KlinesIntervalEnum::Interval3d => TimeUtils::MS_IN_3_D,
            KlinesIntervalEnum::Interval1w => TimeUtils::MS_IN_W,
            KlinesIntervalEnum::Interval1M => TimeUtils::MS_IN_1_M,
        }
    }
}

// "MS -> Enum" returns Result instead of panicking on an interval Binance does not serve.
pub fn try_interval_from_ms(ms: i64) -> Result<KlinesIntervalEnum, String> {
    match ms {
        TimeUtils::MS_IN_S => Ok(KlinesIntervalEnum::Interval1s),
        TimeUtils::MS_IN_MIN => Ok(KlinesIntervalEnum::Interval1m),
        TimeUtils::MS_IN_3_MIN => Ok(KlinesIntervalEnum::Interval3m),
        TimeUtils::MS_IN_5_MIN => Ok(KlinesIntervalEnum::Interval5m),
        TimeUtils::MS_IN_15_MIN => Ok(KlinesIntervalEnum::Interval15m),
        TimeUtils::MS_IN_30_MIN => Ok(KlinesIntervalEnum::Interval30m),
        TimeUtils::MS_IN_H => Ok(KlinesIntervalEnum::Interval1h),
        TimeUtils::MS_IN_2_H => Ok(KlinesIntervalEnum::Interval2h),
        TimeUtils::MS_IN_4_H => Ok(KlinesIntervalEnum::Interval4h),
        TimeUtils::MS_IN_6_H => Ok(KlinesIntervalEnum::Interval6h),
        TimeUtils::MS_IN_8_H => Ok(KlinesIntervalEnum::Interval8h),
        TimeUtils::MS_IN_12_H => Ok(KlinesIntervalEnum::Interval12h),
        TimeUtils::MS_IN_D => Ok(KlinesIntervalEnum::Interval1d),
        TimeUtils::MS_IN_3_D => Ok(KlinesIntervalEnum::Interval3d),
        TimeUtils::MS_IN_W => Ok(KlinesIntervalEnum::Interval1w),
        TimeUtils::MS_IN_1_M => Ok(KlinesIntervalEnum::Interval1M),
        _ => Err(format!("Unsupported interval: {}ms", ms)),
    }
}

#[derive(Debug)]
pub struct AllValidKlines4Instrument {
    // An instrument (e.g. "SOLUSDT" @ 1m), plus the klines fetched for it, oldest first
    pub klines: Vec<BNKline>,
    pub instrument: InstrumentInterval,
}

impl AllValidKlines4Instrument {
    pub fn new(klines: Vec<BNKline>, instrument: InstrumentInterval) -> Self {
        AllValidKlines4Instrument {
            instrument,
            klines,
        }
    }

    pub fn first_timestamp_ms(&self) -> Option<i64> {
        self.klines.first().map(|k| k.open_timestamp_ms)
    }

    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.klines.last().map(|k| k.open_timestamp_ms)
    }
}

#[derive(Debug, PartialOrd, PartialEq)]
pub struct BNKline {
    pub open_timestamp_ms: i64, // only necessary field. All others are optional
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: Option<f64>,
}

#[derive(Debug)]
pub enum BNKlineError {
    InvalidLength,
    InvalidType(String),
    ConnectionFailed(String),
}

impl fmt::Display for BNKlineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BNKlineError::InvalidLength => write!(f, "Invalid length"),
            BNKlineError::InvalidType(string) => write!(f, "Invalid type: {}", string),
            BNKlineError::ConnectionFailed(msg) => {
                write!(f, "Binance API connection failed: {}.", msg)
            }
        }
    }
}

impl Error for BNKlineError {}

/// Some(f64) only for the String variant holding a parseable number; None otherwise.
fn convert_kline_item_inner_enum_string_to_float(kline: Option<KlinesItemInner>) -> Option<f64> {
    kline.and_then(|inner| {
        if let KlinesItemInner::String(s) = inner {
            s.parse::<f64>().ok()
        } else {
            None
        }
    })
}

impl TryFrom<Vec<KlinesItemInner>> for BNKline {
    type Error = BNKlineError;

    fn try_from(vec_inner_klines: Vec<KlinesItemInner>) -> Result<Self, Self::Error> {
        let mut items = vec_inner_klines.into_iter();
        let open_timestamp_ms = match items.next().ok_or(BNKlineError::InvalidLength)? {
            KlinesItemInner::Integer(a) => a,
            _ => return Err(BNKlineError::InvalidType("open_time".to_string())),
        };

        // Unparseable prices become None and are forward-filled later
        let open_price = convert_kline_item_inner_enum_string_to_float(items.next());
        let high_price = convert_kline_item_inner_enum_string_to_float(items.next());
        let low_price = convert_kline_item_inner_enum_string_to_float(items.next());
        let close_price = convert_kline_item_inner_enum_string_to_float(items.next());

        Ok(BNKline {
            open_timestamp_ms,
            open_price,
            high_price,
            low_price,
            close_price,
        })
    }
}

fn convert_klines(data: Vec<Vec<KlinesItemInner>>) -> Result<Vec<BNKline>, BNKlineError> {
    data.into_iter().map(Vec::try_into).collect()
}

async fn configure_binance_client() -> Result<RestApi, anyhow::Error> {
    let config = BinanceApiConfig::default();
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()?;
    // Create the Spot REST API client
    let rest_client = SpotRestApi::production(rest_conf);
    Ok(rest_client)
}

async fn handle_rate_limits(
    rate_limits: &Option<Vec<RestApiRateLimit>>,
    instrument: &InstrumentInterval,
    page: u32,
) -> Result<(), anyhow::Error> {
    let Some(value) = rate_limits else {
        return Ok(());
    };
    for rate_limit in value {
        if rate_limit.interval_num == 1 && rate_limit.interval == binance_interval::Minute {
            let current_weight = rate_limit.count;
            let required_headroom = BINANCE
                .limits
                .weight_limit_minute
                .saturating_sub(BINANCE.limits.kline_call_weight);
            #[cfg(debug_assertions)]
            if DEBUG_FLAGS.print_rate_limits && page.is_multiple_of(BINANCE.debug_print_interval) {
                log::info!(
                    "{} Binance min-weight: {} (headroom: {})",
                    instrument,
                    current_weight,
                    required_headroom
                );
            }
            #[cfg(not(debug_assertions))]
            let _ = page;
            if current_weight > required_headroom {
                // Sleep until the start of the next minute, when the weight window resets
                let secs_into_min = Utc::now().timestamp().rem_euclid(60) as u64;
                let sleep_duration = Duration::from_secs(60 - secs_into_min);
                log::warn!(
                    "⚠️ {} Current weight ({}) > required headroom ({}); sleeping {:?}",
                    instrument,
                    current_weight,
                    required_headroom,
                    sleep_duration
                );
                sleep(sleep_duration).await;
            }
        }
    }
    Ok(())
}

async fn fetch_binance_klines_with_limits(
    rest_client: &RestApi,
    params: KlinesParams,
    instrument: &InstrumentInterval,
) -> Result<(Option<Vec<RestApiRateLimit>>, Vec<Vec<KlinesItemInner>>), anyhow::Error> {
    match rest_client.klines(params).await {
        Ok(r) => {
            // Take the rate_limits from the response, then get the inner data
            let rate_limits = r.rate_limits.clone();
            let data = r.data().await?;
            Ok((rate_limits, data))
        }
        Err(e) => {
            if let Some(conn_err) = e.downcast_ref::<errors::ConnectorError>() {
                match conn_err {
                    connection_error::ConnectorClientError(msg) => {
                        log::error!(
                            "{} Client error: Check your request parameters. {}",
                            instrument,
                            msg
                        );
                    }
                    connection_error::TooManyRequestsError(msg) => {
                        log::error!("{} Rate limit exceeded. {}", instrument, msg);
                    }
                    connection_error::RateLimitBanError(msg) => {
                        log::error!(
                            "{} IP address banned due to excessive rate limits. {}",
                            instrument,
                            msg
                        );
                    }
                    errors::ConnectorError::ServerError { msg, status_code } => {
                        log::error!(
                            "{} Server error: {} (status code: {:?})",
                            instrument,
                            msg,
                            status_code
                        );
                    }
                    errors::ConnectorError::NetworkError(msg) => {
                        log::error!(
                            "{} Network error: Check your internet connection. {}",
                            instrument,
                            msg
                        );
                    }
                    connection_error::BadRequestError(msg) => {
                        log::error!(
                            "{} Bad request: Verify the symbol and interval. {}",
                            instrument,
                            msg
                        );
                    }
                    other => {
                        log::error!("{} Unexpected connector error: {:?}", instrument, other);
                    }
                }
                Err(
                    anyhow::Error::new(BNKlineError::ConnectionFailed(conn_err.to_string()))
                        .context(format!("Binance API call failed for {}", instrument)),
                )
            } else {
                Err(
                    anyhow::Error::new(BNKlineError::ConnectionFailed(e.to_string())).context(
                        format!("Unexpected error during API call for {}", instrument),
                    ),
                )
            }
        }
    }
}

/// Append a page of klines, dropping anything at or before what we already hold.
/// Returns the open time the next page should start from, or None once the page came back short.
fn append_page(
    page_klines: Vec<BNKline>,
    limit_klines_returned: i32,
    all_klines: &mut Vec<BNKline>,
    interval_ms: i64,
) -> Option<i64> {
    let page_len = page_klines.len();
    let last_held = all_klines.last().map(|k| k.open_timestamp_ms);
    all_klines.extend(
        page_klines
            .into_iter()
            .filter(|k| last_held.is_none_or(|held| k.open_timestamp_ms > held)),
    );

    if page_len < limit_klines_returned as usize {
        return None;
    }
    all_klines
        .last()
        .map(|k| k.open_timestamp_ms + interval_ms)
}

/// Klines for one instrument with open times in `[start_ms, end_ms]`, oldest first.
pub async fn load_klines(
    instrument: InstrumentInterval,
    start_ms: i64,
    end_ms: i64,
) -> Result<AllValidKlines4Instrument, anyhow::Error> {
    let rest_client = configure_binance_client().await?;
    let interval = try_interval_from_ms(instrument.interval_ms).map_err(|e| anyhow!(e))?;
    let limit_klines_returned = BINANCE.limits.klines_limit;

    let mut all_klines: Vec<BNKline> = Vec::new();
    let mut cursor = Some(start_ms);
    let mut page: u32 = 0;

    while let Some(page_start) = cursor {
        if page_start > end_ms {
            break;
        }
        if page >= BINANCE.limits.max_pages {
            log::warn!(
                "⚠️ {} Stopped after {} pages; series ends before the requested end time",
                instrument,
                page
            );
            break;
        }

        let params = KlinesParams::builder(instrument.name().to_string(), interval.clone())
            .limit(limit_klines_returned)
            .start_time(Some(page_start))
            .end_time(Some(end_ms))
            .build()?;

        let (rate_limits, new_klines) =
            fetch_binance_klines_with_limits(&rest_client, params, &instrument).await?;
        handle_rate_limits(&rate_limits, &instrument, page).await?;

        let page_klines = convert_klines(new_klines).map_err(|e| {
            anyhow::Error::new(e).context(format!("{} convert_klines failed", instrument))
        })?;
        cursor = append_page(
            page_klines,
            limit_klines_returned,
            &mut all_klines,
            instrument.interval_ms,
        );
        page += 1;
    }

    if all_klines.is_empty() {
        bail!("{}: Binance returned no klines for the requested range", instrument);
    }
    if has_duplicate_kline_open_time(&all_klines) {
        bail!("{}: duplicate kline open times in Binance data", instrument);
    }

    log::info!(
        "{} Fetched {} klines from Binance in {} page(s)",
        instrument,
        all_klines.len(),
        page
    );
    Ok(AllValidKlines4Instrument::new(all_klines, instrument))
}

fn has_duplicate_kline_open_time(klines: &[BNKline]) -> bool {
    let mut seen_ids = HashSet::new();
    klines.iter().any(|kline| !seen_ids.insert(kline.open_timestamp_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kline(open_timestamp_ms: i64, close: f64) -> BNKline {
        BNKline {
            open_timestamp_ms,
            open_price: Some(close),
            high_price: Some(close),
            low_price: Some(close),
            close_price: Some(close),
        }
    }

    #[test]
    fn test_interval_round_trip() {
        for ms in [TimeUtils::MS_IN_MIN, TimeUtils::MS_IN_H, TimeUtils::MS_IN_D] {
            let interval = try_interval_from_ms(ms).unwrap();
            assert_eq!(interval.to_ms(), ms);
        }
        assert!(try_interval_from_ms(7).is_err());
    }

    #[test]
    fn test_full_page_continues_after_last_kline() {
        let mut all = Vec::new();
        let page = vec![kline(0, 1.0), kline(60_000, 2.0)];
        let next = append_page(page, 2, &mut all, 60_000);
        assert_eq!(next, Some(120_000));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_short_page_ends_pagination_and_overlap_is_dropped() {
        let mut all = vec![kline(0, 1.0), kline(60_000, 2.0)];
        // Page starts with a kline we already hold
        let page = vec![kline(60_000, 2.0), kline(120_000, 3.0)];
        let next = append_page(page, 1000, &mut all, 60_000);
        assert_eq!(next, None);
        assert_eq!(all.len(), 3);
        assert!(!has_duplicate_kline_open_time(&all));
    }

    #[test]
    fn test_duplicate_detection() {
        let klines = vec![kline(0, 1.0), kline(0, 1.0)];
        assert!(has_duplicate_kline_open_time(&klines));
    }
}
