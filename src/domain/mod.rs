// Domain types and value objects
pub mod condition;
pub mod instrument_interval;
pub mod price_point;
pub mod symbol;

// Re-export commonly used types
pub use condition::MarketCondition;
pub use instrument_interval::InstrumentInterval;
pub use price_point::PricePoint;
pub use symbol::Symbol;
