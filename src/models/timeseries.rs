use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::PriceField;
use crate::data::timeseries::bnapi_version::PriceSeriesTemp;
use crate::domain::{InstrumentInterval, PricePoint};

// ============================================================================
// PriceSeries: time-ordered prices for one instrument
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub instrument: InstrumentInterval,
    pub timestamps_ms: Vec<i64>,

    // Prices
    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
    pub close_prices: Vec<f64>,

    // Stats (percentage of grid slots that had to be forward-filled)
    pub pct_gaps: f64,
}

macro_rules! convert_price_field {
    ($old_struct:expr, $field:ident) => {
        // Every slot has been forward-filled by now, so flatten keeps all of them
        $old_struct.$field.into_iter().flatten().collect()
    };
}

impl From<PriceSeriesTemp> for PriceSeries {
    fn from(old_struct: PriceSeriesTemp) -> Self {
        let timestamps_ms = (0..old_struct.close_prices.len() as i64)
            .map(|i| old_struct.first_timestamp_ms + i * old_struct.instrument.interval_ms)
            .collect();
        PriceSeries {
            timestamps_ms,
            open_prices: convert_price_field!(old_struct, open_prices),
            high_prices: convert_price_field!(old_struct, high_prices),
            low_prices: convert_price_field!(old_struct, low_prices),
            close_prices: convert_price_field!(old_struct, close_prices),
            instrument: old_struct.instrument,
            pct_gaps: old_struct.pct_gaps.unwrap_or(0.0),
        }
    }
}

impl PriceSeries {
    /// Series where only one price column is known; it is copied into all four.
    pub fn from_single_field(
        instrument: InstrumentInterval,
        timestamps_ms: Vec<i64>,
        prices: Vec<f64>,
    ) -> Result<Self> {
        Self::from_columns(
            instrument,
            timestamps_ms,
            prices.clone(),
            prices.clone(),
            prices.clone(),
            prices,
        )
    }

    pub fn from_columns(
        instrument: InstrumentInterval,
        timestamps_ms: Vec<i64>,
        open_prices: Vec<f64>,
        high_prices: Vec<f64>,
        low_prices: Vec<f64>,
        close_prices: Vec<f64>,
    ) -> Result<Self> {
        let n = timestamps_ms.len();
        if [
            open_prices.len(),
            high_prices.len(),
            low_prices.len(),
            close_prices.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            bail!(
                "{}: price columns have different lengths ({} timestamps, {} open, {} high, {} low, {} close)",
                instrument,
                n,
                open_prices.len(),
                high_prices.len(),
                low_prices.len(),
                close_prices.len()
            );
        }
        if timestamps_ms.windows(2).any(|w| w[1] < w[0]) {
            bail!("{}: timestamps are not in time order", instrument);
        }
        Ok(PriceSeries {
            instrument,
            timestamps_ms,
            open_prices,
            high_prices,
            low_prices,
            close_prices,
            pct_gaps: 0.0,
        })
    }

    pub fn len(&self) -> usize {
        self.close_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close_prices.is_empty()
    }

    pub fn first_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.first().copied()
    }

    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.last().copied()
    }

    pub fn prices(&self, field: PriceField) -> &[f64] {
        match field {
            PriceField::Open => &self.open_prices,
            PriceField::High => &self.high_prices,
            PriceField::Low => &self.low_prices,
            PriceField::Close => &self.close_prices,
        }
    }

    /// One price column paired with its timestamps, in time order
    pub fn price_points(&self, field: PriceField) -> Vec<PricePoint> {
        self.timestamps_ms
            .iter()
            .zip(self.prices(field))
            .map(|(&timestamp_ms, &price)| PricePoint::new(timestamp_ms, price))
            .collect()
    }
}
