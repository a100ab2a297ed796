//! Calendar-year aggregates.

use portlab_core::domain::Trade;
use portlab_core::equity::{average_trade, build_equity, max_drawdown, winning_percentage};
use portlab_core::trunc2d;
use serde::{Deserialize, Serialize};

use super::TotalLongShort;

/// Figures for one calendar year of exits.
///
/// Built incrementally with [`add_trade`](Self::add_trade); the derived
/// figures are only meaningful after [`consolidate`](Self::consolidate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualAggregate {
    pub year: i32,
    pub trades: TotalLongShort<usize>,
    pub gross_profit: TotalLongShort<f64>,
    pub net_profit: TotalLongShort<f64>,
    pub gross_average_trade: f64,
    pub net_average_trade: f64,
    pub gross_max_drawdown: f64,
    pub net_max_drawdown: f64,
    pub gross_winning_percentage: f64,
    pub net_winning_percentage: f64,

    #[serde(skip)]
    gross_profits: Vec<f64>,
    #[serde(skip)]
    net_profits: Vec<f64>,
}

impl AnnualAggregate {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    pub fn add_trade(&mut self, trade: &Trade, cost_per_operation: f64) {
        let gross = trade.gross_profit;
        let net = trade.net_profit(cost_per_operation);
        let long = trade.is_long();

        self.trades.add(long, 1);
        self.gross_profit.add(long, gross);
        self.net_profit.add(long, net);
        self.gross_profits.push(gross);
        self.net_profits.push(net);
    }

    /// Close the year: derive averages, drawdowns and winning percentages.
    pub fn consolidate(&mut self) {
        let count = self.trades.total;
        self.gross_average_trade = average_trade(self.gross_profit.total, count);
        self.net_average_trade = average_trade(self.net_profit.total, count);
        self.gross_max_drawdown = trunc2d(max_drawdown(&build_equity(&self.gross_profits)));
        self.net_max_drawdown = trunc2d(max_drawdown(&build_equity(&self.net_profits)));
        self.gross_winning_percentage = winning_percentage(&self.gross_profits);
        self.net_winning_percentage = winning_percentage(&self.net_profits);
        self.gross_profit = self.gross_profit.truncated();
        self.net_profit = self.net_profit.truncated();
        self.gross_profits = Vec::new();
        self.net_profits = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use portlab_core::domain::TradeType;

    fn trade(day: u32, gross_profit: f64, trade_type: TradeType) -> Trade {
        Trade {
            entry_date: Utc.with_ymd_and_hms(2023, 3, day, 14, 0, 0).unwrap(),
            exit_date: Utc.with_ymd_and_hms(2023, 3, day, 20, 0, 0).unwrap(),
            gross_profit,
            trade_type,
        }
    }

    #[test]
    fn consolidates_one_year() {
        let mut agg = AnnualAggregate::new(2023);
        agg.add_trade(&trade(1, 100.0, TradeType::Long), 5.0);
        agg.add_trade(&trade(2, -40.0, TradeType::Short), 5.0);
        agg.add_trade(&trade(3, 10.0, TradeType::Long), 5.0);
        agg.consolidate();

        assert_eq!(agg.trades, TotalLongShort { total: 3, long: 2, short: 1 });
        assert_eq!(agg.gross_profit.total, 70.0);
        assert_eq!(agg.gross_profit.long, 110.0);
        assert_eq!(agg.net_profit.total, 40.0);
        assert_eq!(agg.net_profit.short, -50.0);
        assert_eq!(agg.gross_average_trade, 23.33);
        assert_eq!(agg.gross_max_drawdown, -40.0);
        assert_eq!(agg.net_max_drawdown, -50.0);
        assert_eq!(agg.gross_winning_percentage, 66.66);
    }

    #[test]
    fn empty_year_reports_zeroes() {
        let mut agg = AnnualAggregate::new(2020);
        agg.consolidate();
        assert_eq!(agg.gross_average_trade, 0.0);
        assert_eq!(agg.gross_max_drawdown, 0.0);
        assert_eq!(agg.net_winning_percentage, 0.0);
    }
}
