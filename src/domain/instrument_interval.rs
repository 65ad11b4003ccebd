use serde::{Deserialize, Serialize};

use crate::utils::TimeUtils;

#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct InstrumentInterval {
    pub name: String,
    pub interval_ms: i64,
}

impl InstrumentInterval {
    pub fn new(name: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            name: name.into().trim().to_uppercase(),
            interval_ms,
        }
    }

    // Finds the trading quote at the end of a crypto pair name and returns it.
    // Returns None for plain tickers such as "SPY".
    pub fn get_quote(text: &str) -> Option<&str> {
        static PAIR_QUOTES: &[&str] = &["USDT", "USDC", "FDUSD", "BTC", "ETH"];
        PAIR_QUOTES
            .iter()
            .find(|&&ext| text.ends_with(ext) && text.len() > ext.len())
            .copied()
    }

    pub fn get_base(text: &str) -> Option<&str> {
        let quote = Self::get_quote(text)?;
        text.strip_suffix(quote)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binance-style shorthand such as `1m` or `1h`
    pub fn interval_label(&self) -> &'static str {
        TimeUtils::interval_to_string(self.interval_ms)
    }
}

impl std::fmt::Display for InstrumentInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (Self::get_base(&self.name), Self::get_quote(&self.name)) {
            (Some(base), Some(quote)) => write!(
                f,
                "{} ({}/{}) @ {}",
                self.name,
                base,
                quote,
                self.interval_label()
            ),
            _ => write!(f, "{} @ {}", self.name, self.interval_label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_and_ticker_display() {
        let pair = InstrumentInterval::new("btcusdt", TimeUtils::MS_IN_MIN);
        assert_eq!(pair.name(), "BTCUSDT");
        assert_eq!(pair.to_string(), "BTCUSDT (BTC/USDT) @ 1m");

        let ticker = InstrumentInterval::new("SPY", TimeUtils::MS_IN_MIN);
        assert_eq!(InstrumentInterval::get_quote("SPY"), None);
        assert_eq!(ticker.to_string(), "SPY @ 1m");
    }
}
