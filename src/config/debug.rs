//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet.

pub struct DebugFlags {
    /// Emit one line per window (offset, entropy, volatility, label) during a pipeline run.
    pub print_window_details: bool,
    /// Emit detailed serialization/deserialization logs (cache, record CSV, chart data).
    pub print_serde: bool,
    /// Emit which price provider was tried, in what order, and why it failed.
    pub print_provider_chain: bool,
    /// Emit per-request Binance rate-limit weights.
    pub print_rate_limits: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_window_details: false,
    print_serde: false,
    print_provider_chain: true,
    print_rate_limits: false,
};
