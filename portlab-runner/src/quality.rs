//! Quality analysis: SQN and drawdown per market regime.
//!
//! Every trade is tagged with the regime of its entry day, then R-multiples are
//! aggregated on a direction × volatility grid. Row 5 and column 4 hold the
//! "All" marginals; cell `[5][4]` aggregates every classified trade. Trades on
//! unclassified days contribute to no cell.

use portlab_core::domain::{
    local_date, Direction, DirectionSelector, Regime, RegimeMap, Trade, TradeFilter, TradingSystem,
    Volatility, VolatilitySelector,
};
use portlab_core::equity::{build_equity, max_drawdown};
use portlab_core::stats::{mean_and_sample_std_dev, sqn};
use portlab_core::{risk_unit, trunc2d};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;

/// Five directions plus the "All" row.
pub const GRID_ROWS: usize = 6;
/// Four volatility buckets plus the "All" column.
pub const GRID_COLS: usize = 5;

const SQN_CAP: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub trades: usize,
    /// Share of the whole history, in percent.
    pub trades_perc: f64,
    pub sqn: f64,
    /// SQN with the sample size capped at 100.
    pub sqn100: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityGrid {
    pub cells: [[QualityMetrics; GRID_COLS]; GRID_ROWS],
}

impl QualityGrid {
    pub fn get(&self, direction: DirectionSelector, volatility: VolatilitySelector) -> Option<&QualityMetrics> {
        let row = row_index(direction)?;
        let col = col_index(volatility)?;
        Some(&self.cells[row][col])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub trading_system: TradingSystem,
    pub risk: f64,
    pub all_gross: QualityGrid,
    pub long_gross: QualityGrid,
    pub short_gross: QualityGrid,
    pub all_net: QualityGrid,
    pub long_net: QualityGrid,
    pub short_net: QualityGrid,
}

impl QualityReport {
    pub fn grid(&self, filter: TradeFilter, net: bool) -> &QualityGrid {
        match (filter, net) {
            (TradeFilter::All, false) => &self.all_gross,
            (TradeFilter::Long, false) => &self.long_gross,
            (TradeFilter::Short, false) => &self.short_gross,
            (TradeFilter::All, true) => &self.all_net,
            (TradeFilter::Long, true) => &self.long_net,
            (TradeFilter::Short, true) => &self.short_net,
        }
    }
}

/// Build the six quality grids. Fails when the history has no losing trade.
pub fn analyze_quality(
    system: &TradingSystem,
    trades: &[Trade],
    regimes: &RegimeMap,
) -> Result<QualityReport, AnalysisError> {
    let risk = risk_unit(trades)?;
    let tz = system.resolve_timezone(None)?;

    let tagged: Vec<(&Trade, Regime)> = trades
        .iter()
        .map(|t| (t, regimes.lookup(local_date(&t.entry_date, tz))))
        .collect();

    let unclassified = tagged
        .iter()
        .filter(|(_, r)| r.direction == Direction::Unclassified || r.volatility == Volatility::Unclassified)
        .count();
    debug!(ts_id = system.id, trades = trades.len(), unclassified, risk, "quality analysis");

    let grid = |filter: TradeFilter, cost: f64| build_grid(&tagged, trades.len(), filter, risk, cost);
    let cost = system.cost_per_operation;

    Ok(QualityReport {
        trading_system: system.clone(),
        risk,
        all_gross: grid(TradeFilter::All, 0.0),
        long_gross: grid(TradeFilter::Long, 0.0),
        short_gross: grid(TradeFilter::Short, 0.0),
        all_net: grid(TradeFilter::All, cost),
        long_net: grid(TradeFilter::Long, cost),
        short_net: grid(TradeFilter::Short, cost),
    })
}

fn selectors() -> impl Iterator<Item = (DirectionSelector, VolatilitySelector)> {
    let directions = Direction::CLASSIFIED
        .into_iter()
        .map(DirectionSelector::Only)
        .chain(std::iter::once(DirectionSelector::All));
    directions.flat_map(|d| {
        Volatility::CLASSIFIED
            .into_iter()
            .map(VolatilitySelector::Only)
            .chain(std::iter::once(VolatilitySelector::All))
            .map(move |v| (d, v))
    })
}

fn build_grid(
    tagged: &[(&Trade, Regime)],
    total_trades: usize,
    filter: TradeFilter,
    risk: f64,
    cost_per_operation: f64,
) -> QualityGrid {
    let mut grid = QualityGrid::default();

    for (direction, volatility) in selectors() {
        let r_multiples: Vec<f64> = tagged
            .iter()
            .filter(|(t, regime)| {
                filter.matches(t.trade_type)
                    && direction.matches(regime.direction)
                    && volatility.matches(regime.volatility)
            })
            .map(|(t, _)| t.net_profit(cost_per_operation) / risk)
            .collect();

        if let (Some(row), Some(col)) = (row_index(direction), col_index(volatility)) {
            grid.cells[row][col] = cell_metrics(&r_multiples, total_trades);
        }
    }
    grid
}

fn cell_metrics(r_multiples: &[f64], total_trades: usize) -> QualityMetrics {
    let trades = r_multiples.len();
    if trades == 0 {
        return QualityMetrics::default();
    }

    let (mean, std_dev) = mean_and_sample_std_dev(r_multiples);
    QualityMetrics {
        trades,
        trades_perc: trunc2d(100.0 * trades as f64 / total_trades as f64),
        sqn: trunc2d(sqn(mean, std_dev, trades)),
        sqn100: trunc2d(sqn(mean, std_dev, trades.min(SQN_CAP))),
        max_drawdown: trunc2d(max_drawdown(&build_equity(r_multiples))),
    }
}

fn row_index(selector: DirectionSelector) -> Option<usize> {
    match selector {
        DirectionSelector::Only(d) => d.index(),
        DirectionSelector::All => Some(GRID_ROWS - 1),
    }
}

fn col_index(selector: VolatilitySelector) -> Option<usize> {
    match selector {
        VolatilitySelector::Only(v) => v.index(),
        VolatilitySelector::All => Some(GRID_COLS - 1),
    }
}
