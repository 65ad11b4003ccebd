use std::fmt;

use crate::data::timeseries::bnapi_version::AllValidKlines4Instrument;
use crate::domain::InstrumentInterval;
use crate::utils::{maths_utils, vec_utils};

// MAX_PCT_MISSING_KLINES_ALLOWED is a delimiter. Below it, missing klines are simply forward-filled.
// Above it, everything up to and including the last gap is cut off, leaving a shorter but gap-free series.
const MAX_PCT_MISSING_KLINES_ALLOWED: f64 = 10.;

/// Klines laid out on a regular time grid, one slot per interval. Missing klines are None.
pub struct PriceSeriesTemp {
    pub instrument: InstrumentInterval,
    pub first_timestamp_ms: i64, // when this series starts (expressed as epoch offset)

    pub open_prices: Vec<Option<f64>>,
    pub high_prices: Vec<Option<f64>>,
    pub low_prices: Vec<Option<f64>>,
    pub close_prices: Vec<Option<f64>>,

    // Stats
    pub pct_gaps: Option<f64>,
}

#[derive(Debug)]
pub enum KlinesPreparationError {
    NoKlines {
        instrument: InstrumentInterval,
    },
    OffGrid {
        instrument: InstrumentInterval,
        timestamp_ms: i64,
    },
}

impl std::error::Error for KlinesPreparationError {}
impl fmt::Display for KlinesPreparationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KlinesPreparationError::NoKlines { instrument } => {
                write!(f, "{} has no klines to prepare", instrument)
            }
            KlinesPreparationError::OffGrid {
                instrument,
                timestamp_ms,
            } => write!(
                f,
                "{} has a kline at {} that is not on its {} grid",
                instrument,
                timestamp_ms,
                instrument.interval_label()
            ),
        }
    }
}

impl TryFrom<AllValidKlines4Instrument> for PriceSeriesTemp {
    type Error = KlinesPreparationError;

    fn try_from(klines: AllValidKlines4Instrument) -> Result<Self, Self::Error> {
        let (Some(first_ms), Some(last_ms)) = (klines.first_timestamp_ms(), klines.last_timestamp_ms())
        else {
            return Err(KlinesPreparationError::NoKlines {
                instrument: klines.instrument,
            });
        };
        let interval_ms = klines.instrument.interval_ms;

        if let Some(off_grid) = klines
            .klines
            .iter()
            .find(|k| (k.open_timestamp_ms - first_ms) % interval_ms != 0)
        {
            return Err(KlinesPreparationError::OffGrid {
                timestamp_ms: off_grid.open_timestamp_ms,
                instrument: klines.instrument,
            });
        }

        let number_klines_needed = maths_utils::intervals(first_ms, last_ms, interval_ms) as usize;
        let mut time_series = PriceSeriesTemp {
            instrument: klines.instrument.clone(),
            first_timestamp_ms: first_ms,
            open_prices: vec![None; number_klines_needed],
            high_prices: vec![None; number_klines_needed],
            low_prices: vec![None; number_klines_needed],
            close_prices: vec![None; number_klines_needed],
            pct_gaps: None,
        };

        // Map source klines onto their grid slots
        for source_kline in klines.klines {
            let kline_index =
                maths_utils::index_into_range(first_ms, source_kline.open_timestamp_ms, interval_ms)
                    as usize;
            time_series.open_prices[kline_index] = source_kline.open_price;
            time_series.high_prices[kline_index] = source_kline.high_price;
            time_series.low_prices[kline_index] = source_kline.low_price;
            time_series.close_prices[kline_index] = source_kline.close_price;
        }

        // Too many gaps: cut off everything up to the last gap
        let close_price_none_pct = vec_utils::count_pct_none_elements(&time_series.close_prices);
        time_series.pct_gaps = Some(close_price_none_pct);
        if close_price_none_pct > MAX_PCT_MISSING_KLINES_ALLOWED {
            let cut = vec_utils::find_last_none_index(&time_series.close_prices);
            log::warn!(
                "⚠️ {} has {:.2}% gaps (limit {:.2}%); keeping only the {} klines after the last gap",
                time_series.instrument,
                close_price_none_pct,
                MAX_PCT_MISSING_KLINES_ALLOWED,
                time_series.close_prices.len() - cut
            );
            time_series.open_prices.drain(..cut);
            time_series.high_prices.drain(..cut);
            time_series.low_prices.drain(..cut);
            time_series.close_prices.drain(..cut);
            time_series.first_timestamp_ms += cut as i64 * interval_ms;
            time_series.pct_gaps = None;
        }

        // Forward fill whatever gaps remain. The first slot always holds a kline, so the
        // default only matters for a field Binance left unparseable in that first kline.
        let default_price = f64::NAN;
        let mut kline_gaps: Vec<u32> = Vec::new();
        for column in [
            &mut time_series.open_prices,
            &mut time_series.high_prices,
            &mut time_series.low_prices,
            &mut time_series.close_prices,
        ] {
            if vec_utils::has_any_none_elements(column) {
                kline_gaps.push(vec_utils::fill_forward_mut(column, default_price));
            }
        }

        if !vec_utils::are_all_elements_same(&kline_gaps) {
            log::warn!(
                "⚠️ {} Kline gaps differ between price fields (some klines are only partly parseable): {:?}",
                time_series.instrument,
                kline_gaps
            );
        }

        Ok(time_series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::timeseries::bnapi_version::bn_kline::BNKline;
    use crate::utils::TimeUtils;

    const MIN: i64 = TimeUtils::MS_IN_MIN;

    fn kline(slot: i64, close: f64) -> BNKline {
        BNKline {
            open_timestamp_ms: slot * MIN,
            open_price: Some(close),
            high_price: Some(close + 1.0),
            low_price: Some(close - 1.0),
            close_price: Some(close),
        }
    }

    fn klines(slots: &[(i64, f64)]) -> AllValidKlines4Instrument {
        AllValidKlines4Instrument::new(
            slots.iter().map(|&(slot, close)| kline(slot, close)).collect(),
            InstrumentInterval::new("BTCUSDT", MIN),
        )
    }

    #[test]
    fn test_small_gap_is_forward_filled() {
        // 20 slots with slot 5 missing: 5% gaps, under the limit
        let slots: Vec<(i64, f64)> = (0..20)
            .filter(|&s| s != 5)
            .map(|s| (s, 100.0 + s as f64))
            .collect();
        let temp = PriceSeriesTemp::try_from(klines(&slots)).unwrap();

        assert_eq!(temp.close_prices.len(), 20);
        assert_eq!(temp.close_prices[5], Some(104.0), "filled from slot 4");
        assert!(!vec_utils::has_any_none_elements(&temp.close_prices));
        assert_eq!(temp.pct_gaps, Some(5.0));
        assert_eq!(temp.first_timestamp_ms, 0);
    }

    #[test]
    fn test_large_gaps_are_cut_off() {
        // Slots 0..4 and 8..10 present, 4..8 missing: 4 of 10 slots missing
        let slots: Vec<(i64, f64)> = (0..4).chain(8..10).map(|s| (s, s as f64)).collect();
        let temp = PriceSeriesTemp::try_from(klines(&slots)).unwrap();

        assert_eq!(temp.close_prices, vec![Some(8.0), Some(9.0)]);
        assert_eq!(temp.first_timestamp_ms, 8 * MIN);
        assert_eq!(temp.pct_gaps, None);
    }

    #[test]
    fn test_empty_and_off_grid_rejected() {
        assert!(PriceSeriesTemp::try_from(klines(&[])).is_err());

        let mut off_grid = klines(&[(0, 1.0), (1, 2.0)]);
        off_grid.klines[1].open_timestamp_ms += 7;
        assert!(matches!(
            PriceSeriesTemp::try_from(off_grid),
            Err(KlinesPreparationError::OffGrid { .. })
        ));
    }
}
