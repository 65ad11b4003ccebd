//! Finnhub stock candle endpoint configuration.

pub struct FinnhubConfig {
    pub base_url: &'static str,
    pub candle_path: &'static str,
    pub timeout_ms: u64,
    /// Default ticker when --symbol is not given
    pub symbol: &'static str,
    /// Candle resolution in Finnhub notation ("1" = one minute)
    pub resolution: &'static str,
    pub lookback_hours: i64,
}

pub const FINNHUB: FinnhubConfig = FinnhubConfig {
    base_url: "https://finnhub.io",
    candle_path: "/api/v1/stock/candle",
    timeout_ms: 30_000,
    symbol: "SPY",
    resolution: "1",
    lookback_hours: 48,
};
