use serde::{Deserialize, Serialize};

/// One time-ordered observation handed to the pipeline.
/// Ordering in a `Vec<PricePoint>` is ordering in time; nothing re-sorts it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        PricePoint {
            timestamp_ms,
            price,
        }
    }
}

/// Strip timestamps, keeping order.
pub fn price_values(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.price).collect()
}
