//! Simulation request parameters and their bounds.

use chrono::{DateTime, Duration, Utc};
use portlab_core::domain::Trade;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_DAYS_BACK: u32 = 20_000;
pub const MAX_RUNS: u32 = 50_000;
pub const MAX_WIDTH: u32 = 4_000;
pub const MAX_HEIGHT: u32 = 3_000;
pub const MIN_INITIAL_CAPITAL: f64 = 1.0;
pub const MIN_RUIN_PERCENTAGE: u32 = 5;
pub const MAX_RUIN_PERCENTAGE: u32 = 95;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("days back {0} exceeds {MAX_DAYS_BACK}")]
    DaysBack(u32),
    #[error("runs {0} exceeds {MAX_RUNS}")]
    Runs(u32),
    #[error("width {0} exceeds {MAX_WIDTH}")]
    Width(u32),
    #[error("height {0} exceeds {MAX_HEIGHT}")]
    Height(u32),
    #[error("initial capital {0} is below {MIN_INITIAL_CAPITAL}")]
    InitialCapital(f64),
    #[error("ruin percentage {0} is outside {MIN_RUIN_PERCENTAGE}..={MAX_RUIN_PERCENTAGE}")]
    RuinPercentage(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Lookback window in days; 0 keeps the full history.
    pub days_back: u32,
    pub runs: u32,
    /// Chart size in pixels.
    pub width: u32,
    pub height: u32,
    pub initial_capital: f64,
    pub ruin_percentage: u32,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            days_back: 0,
            runs: 1000,
            width: 800,
            height: 500,
            initial_capital: 10_000.0,
            ruin_percentage: 50,
        }
    }
}

impl SimulationRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.days_back > MAX_DAYS_BACK {
            return Err(RequestError::DaysBack(self.days_back));
        }
        if self.runs > MAX_RUNS {
            return Err(RequestError::Runs(self.runs));
        }
        if self.width > MAX_WIDTH {
            return Err(RequestError::Width(self.width));
        }
        if self.height > MAX_HEIGHT {
            return Err(RequestError::Height(self.height));
        }
        if self.initial_capital.is_nan() || self.initial_capital < MIN_INITIAL_CAPITAL {
            return Err(RequestError::InitialCapital(self.initial_capital));
        }
        if !(MIN_RUIN_PERCENTAGE..=MAX_RUIN_PERCENTAGE).contains(&self.ruin_percentage) {
            return Err(RequestError::RuinPercentage(self.ruin_percentage));
        }
        Ok(())
    }

    /// Trades whose exit falls inside the lookback window ending at `now`.
    pub fn select_trades(&self, trades: Vec<Trade>, now: DateTime<Utc>) -> Vec<Trade> {
        if self.days_back == 0 {
            return trades;
        }
        let from = now - Duration::days(i64::from(self.days_back));
        trades.into_iter().filter(|t| t.exit_date >= from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use portlab_core::domain::TradeType;

    #[test]
    fn default_request_is_valid() {
        assert_eq!(SimulationRequest::default().validate(), Ok(()));
    }

    #[test]
    fn each_bound_is_checked() {
        let base = SimulationRequest::default();
        let cases = [
            (SimulationRequest { days_back: 20_001, ..base.clone() }, RequestError::DaysBack(20_001)),
            (SimulationRequest { runs: 50_001, ..base.clone() }, RequestError::Runs(50_001)),
            (SimulationRequest { width: 4_001, ..base.clone() }, RequestError::Width(4_001)),
            (SimulationRequest { height: 3_001, ..base.clone() }, RequestError::Height(3_001)),
            (SimulationRequest { initial_capital: 0.5, ..base.clone() }, RequestError::InitialCapital(0.5)),
            (SimulationRequest { ruin_percentage: 4, ..base.clone() }, RequestError::RuinPercentage(4)),
            (SimulationRequest { ruin_percentage: 96, ..base.clone() }, RequestError::RuinPercentage(96)),
        ];
        for (request, expected) in cases {
            assert_eq!(request.validate(), Err(expected));
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let request = SimulationRequest {
            days_back: MAX_DAYS_BACK,
            runs: MAX_RUNS,
            width: MAX_WIDTH,
            height: MAX_HEIGHT,
            initial_capital: MIN_INITIAL_CAPITAL,
            ruin_percentage: MAX_RUIN_PERCENTAGE,
        };
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn lookback_filters_by_exit_date() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let trade = |days_ago: i64| Trade {
            entry_date: now - Duration::days(days_ago + 1),
            exit_date: now - Duration::days(days_ago),
            gross_profit: 1.0,
            trade_type: TradeType::Long,
        };
        let trades = vec![trade(40), trade(20), trade(5)];

        let request = SimulationRequest { days_back: 30, ..SimulationRequest::default() };
        assert_eq!(request.select_trades(trades.clone(), now).len(), 2);

        let everything = SimulationRequest::default();
        assert_eq!(everything.select_trades(trades, now).len(), 3);
    }
}
