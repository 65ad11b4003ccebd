use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use csv::{Reader, StringRecord};

use crate::data::timeseries::CreatePriceSeries;
use crate::domain::InstrumentInterval;
use crate::models::PriceSeries;
use crate::utils::time_utils::parse_timestamp_ms;

pub const CSV_SIGNATURE: &str = "CSV File";

/// Prices from a local CSV file with a header row.
///
/// The price column is `Price` or `Close` (any case). `Timestamp`, `Open`, `High` and `Low`
/// are optional; without timestamps, rows are spaced one interval apart from 0.
pub struct CsvPrices {
    pub path: PathBuf,
    pub instrument: InstrumentInterval,
}

#[async_trait]
impl CreatePriceSeries for CsvPrices {
    fn signature(&self) -> &'static str {
        CSV_SIGNATURE
    }

    async fn create_price_series(&self) -> Result<PriceSeries> {
        let path = self.path.clone();
        let instrument = self.instrument.clone();
        let series = tokio::task::spawn_blocking(move || {
            let file = File::open(&path).context(format!("Failed to open price CSV: {:?}", path))?;
            parse_price_csv(file, instrument).context(format!("Failed to read price CSV: {:?}", path))
        })
        .await
        .context("CSV read task panicked")??;

        log::info!(
            "Loaded {} prices for {} from {:?}",
            series.len(),
            series.instrument,
            self.path
        );
        Ok(series)
    }
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|name| h.trim().eq_ignore_ascii_case(name)))
}

fn parse_price(record: &StringRecord, column: usize, row: usize, name: &str) -> Result<f64> {
    let text = record
        .get(column)
        .ok_or_else(|| anyhow!("row {}: missing {} column", row, name))?;
    text.trim()
        .parse::<f64>()
        .context(format!("row {}: {} value {:?} is not a number", row, name, text))
}

pub fn parse_price_csv<R: Read>(reader: R, instrument: InstrumentInterval) -> Result<PriceSeries> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let price_col = find_column(&headers, &["price", "close"])
        .ok_or_else(|| anyhow!("no Price or Close column in header {:?}", headers))?;
    let timestamp_col = find_column(&headers, &["timestamp", "time", "date"]);
    let open_col = find_column(&headers, &["open"]);
    let high_col = find_column(&headers, &["high"]);
    let low_col = find_column(&headers, &["low"]);

    let mut timestamps_ms = Vec::new();
    let mut open_prices = Vec::new();
    let mut high_prices = Vec::new();
    let mut low_prices = Vec::new();
    let mut close_prices = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let price = parse_price(&record, price_col, row, "price")?;

        let timestamp_ms = match timestamp_col {
            Some(col) => {
                let text = record.get(col).unwrap_or_default();
                parse_timestamp_ms(text)
                    .ok_or_else(|| anyhow!("row {}: unrecognised timestamp {:?}", row, text))?
            }
            None => row as i64 * instrument.interval_ms,
        };

        let optional = |col: Option<usize>, name: &str| -> Result<f64> {
            match col {
                Some(col) => parse_price(&record, col, row, name),
                None => Ok(price),
            }
        };
        open_prices.push(optional(open_col, "open")?);
        high_prices.push(optional(high_col, "high")?);
        low_prices.push(optional(low_col, "low")?);
        close_prices.push(price);
        timestamps_ms.push(timestamp_ms);
    }

    if close_prices.is_empty() {
        bail!("price CSV has a header but no rows");
    }

    PriceSeries::from_columns(
        instrument,
        timestamps_ms,
        open_prices,
        high_prices,
        low_prices,
        close_prices,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriceField;
    use crate::utils::TimeUtils;

    fn instrument() -> InstrumentInterval {
        InstrumentInterval::new("SPY", TimeUtils::MS_IN_MIN)
    }

    #[test]
    fn test_price_only_file() {
        let data = "Price\n10\n10.5\n9.75\n";
        let series = parse_price_csv(data.as_bytes(), instrument()).unwrap();
        assert_eq!(series.prices(PriceField::Close), &[10.0, 10.5, 9.75]);
        assert_eq!(series.prices(PriceField::High), &[10.0, 10.5, 9.75]);
        assert_eq!(series.timestamps_ms, vec![0, 60_000, 120_000]);
    }

    #[test]
    fn test_full_ohlc_file_with_timestamps() {
        let data = "timestamp,open,HIGH,low,Close\n\
                    2023-11-14 22:13:20,1,3,0.5,2\n\
                    1700000060,2,4,1.5,3\n";
        let series = parse_price_csv(data.as_bytes(), instrument()).unwrap();
        assert_eq!(series.timestamps_ms, vec![1_700_000_000_000, 1_700_000_060_000]);
        assert_eq!(series.prices(PriceField::Open), &[1.0, 2.0]);
        assert_eq!(series.prices(PriceField::High), &[3.0, 4.0]);
        assert_eq!(series.prices(PriceField::Low), &[0.5, 1.5]);
        assert_eq!(series.prices(PriceField::Close), &[2.0, 3.0]);
    }

    #[test]
    fn test_bad_files_rejected() {
        assert!(parse_price_csv("Volume\n1\n".as_bytes(), instrument()).is_err());
        assert!(parse_price_csv("Price\n".as_bytes(), instrument()).is_err());
        assert!(parse_price_csv("Price\nabc\n".as_bytes(), instrument()).is_err());
    }
}
