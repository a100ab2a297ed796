//! PortLab Core — domain records and the pure numeric building blocks.
//!
//! This crate holds everything the analyses are composed from:
//! - Domain records (trades, daily returns, trading systems, market regimes)
//! - Equity curve and drawdown builder
//! - Descriptive statistics, percentile tails and histograms
//! - Risk unit estimation and R-multiples
//! - Deterministic RNG hierarchy for reproducible resampling

pub mod domain;
pub mod equity;
pub mod risk;
pub mod rng;
pub mod stats;

pub use equity::EquityCurve;
pub use risk::{r_multiples, risk_unit, RiskError};
pub use rng::RngHierarchy;
pub use stats::{trunc2d, Distribution, Histogram};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: records crossing the job boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::DailyReturn>();
        require_sync::<domain::DailyReturn>();
        require_send::<domain::TradingSystem>();
        require_sync::<domain::TradingSystem>();
        require_send::<domain::RegimeMap>();
        require_sync::<domain::RegimeMap>();
        require_send::<EquityCurve>();
        require_sync::<EquityCurve>();
        require_send::<Distribution>();
        require_sync::<Distribution>();
        require_send::<RngHierarchy>();
        require_sync::<RngHierarchy>();
    }
}
