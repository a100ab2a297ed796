//! Equity and drawdown builders.
//!
//! Equity is the running sum of a profit sequence. Drawdown is measured
//! against a running peak that starts at 0: at a new high (or a tie) the
//! drawdown resets to exactly 0, otherwise it is `equity - peak`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Trade, TradeFilter};
use crate::stats::trunc2d;

/// Equity and drawdown of one profit sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquityCurve {
    pub equity: Vec<f64>,
    pub drawdown: Vec<f64>,
    /// Most negative drawdown seen, 0 for an empty or never-losing curve.
    pub max_drawdown: f64,
}

impl EquityCurve {
    pub fn from_profits(profits: &[f64]) -> Self {
        let equity = build_equity(profits);
        let (drawdown, max_drawdown) = build_drawdown(&equity);
        Self {
            equity,
            drawdown,
            max_drawdown,
        }
    }

    /// Final equity value, 0 when empty.
    pub fn total(&self) -> f64 {
        self.equity.last().copied().unwrap_or(0.0)
    }
}

pub fn build_equity(profits: &[f64]) -> Vec<f64> {
    profits
        .iter()
        .scan(0.0, |acc, p| {
            *acc += p;
            Some(*acc)
        })
        .collect()
}

/// Drawdown series plus the maximum (most negative) drawdown.
pub fn build_drawdown(equity: &[f64]) -> (Vec<f64>, f64) {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    let mut drawdown = Vec::with_capacity(equity.len());

    for &value in equity {
        let dd = if value >= peak {
            peak = value;
            0.0
        } else {
            value - peak
        };
        drawdown.push(dd);
        if dd < max_dd {
            max_dd = dd;
        }
    }

    (drawdown, max_dd)
}

/// Max drawdown only, without materializing the drawdown series.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &value in equity {
        if value >= peak {
            peak = value;
        } else if value - peak < max_dd {
            max_dd = value - peak;
        }
    }
    max_dd
}

/// Exit times and gross profits of the trades in a partition, in trade order.
pub fn gross_profits(trades: &[Trade], filter: TradeFilter) -> (Vec<DateTime<Utc>>, Vec<f64>) {
    trades
        .iter()
        .filter(|t| filter.matches(t.trade_type))
        .map(|t| (t.exit_date, t.gross_profit))
        .unzip()
}

pub fn net_profits(gross: &[f64], cost_per_operation: f64) -> Vec<f64> {
    gross.iter().map(|g| g - 2.0 * cost_per_operation).collect()
}

/// Share of winners among non-zero trades, as a percentage with two decimals.
///
/// Computed in integer arithmetic (`pos * 10000 / tot`) so the result floors.
pub fn winning_percentage(profits: &[f64]) -> f64 {
    let (total, winners) = profits
        .iter()
        .filter(|&&p| p != 0.0)
        .fold((0u64, 0u64), |(tot, pos), &p| (tot + 1, pos + u64::from(p > 0.0)));
    if total == 0 {
        return 0.0;
    }
    (winners * 10_000 / total) as f64 / 100.0
}

/// Average trade, truncated. 0 when there are no trades.
pub fn average_trade(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    trunc2d(total / count as f64)
}
