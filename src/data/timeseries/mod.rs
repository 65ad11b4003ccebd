pub mod bnapi_version;
pub mod cache_file;
pub mod csv_version;
pub mod finnhub_version;
pub mod serde_version;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::models::PriceSeries;

#[async_trait]
pub trait CreatePriceSeries {
    // Either create a price series OR return an anyhow::error
    async fn create_price_series(&self) -> Result<PriceSeries>;

    /// A unique identifier for this implementation (so that afterwards we know which one we used).
    fn signature(&self) -> &'static str;
}

/// Try each provider in order and keep the first series that loads.
pub async fn get_price_series_async(
    implementations: &[Box<dyn CreatePriceSeries>],
) -> Result<(PriceSeries, &'static str)> {
    for imp in implementations {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_provider_chain {
            log::info!("Trying price source: {}", imp.signature());
        }
        match imp.create_price_series().await {
            Ok(data) => {
                let signature = imp.signature();
                return Ok((data, signature));
            }
            Err(e) => {
                log::warn!("⚠️ {} failed: {:#}", imp.signature(), e);
                // Continue to the next implementation
            }
        }
    }
    Err(anyhow!("All price sources failed to create data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InstrumentInterval;
    use crate::utils::TimeUtils;
    use anyhow::bail;

    struct Failing;
    struct Fixed;

    #[async_trait]
    impl CreatePriceSeries for Failing {
        async fn create_price_series(&self) -> Result<PriceSeries> {
            bail!("no data here")
        }
        fn signature(&self) -> &'static str {
            "Failing"
        }
    }

    #[async_trait]
    impl CreatePriceSeries for Fixed {
        async fn create_price_series(&self) -> Result<PriceSeries> {
            PriceSeries::from_single_field(
                InstrumentInterval::new("SPY", TimeUtils::MS_IN_MIN),
                vec![0, 60_000],
                vec![1.0, 2.0],
            )
        }
        fn signature(&self) -> &'static str {
            "Fixed"
        }
    }

    #[tokio::test]
    async fn test_first_successful_provider_wins() {
        let providers: Vec<Box<dyn CreatePriceSeries>> = vec![Box::new(Failing), Box::new(Fixed)];
        let (series, signature) = get_price_series_async(&providers).await.unwrap();
        assert_eq!(signature, "Fixed");
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_all_failing_is_an_error() {
        let providers: Vec<Box<dyn CreatePriceSeries>> = vec![Box::new(Failing)];
        assert!(get_price_series_async(&providers).await.is_err());
    }
}
