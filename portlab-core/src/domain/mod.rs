//! Domain records consumed by the analytics engine.

pub mod regime;
pub mod trade;
pub mod trading_system;

pub use regime::{
    Direction, DirectionSelector, Regime, RegimeDay, RegimeMap, Volatility, VolatilitySelector,
};
pub use trade::{non_zero_daily_returns, to_int_date, DailyReturn, Trade, TradeFilter, TradeType};
pub use trading_system::{local_date, TimezoneError, TradingSystem, EXCHANGE_TIMEZONE};
