//! Performance analysis: equity curves, profit summaries, calendar aggregates,
//! rolling buckets and distributions for a trade history.
//!
//! Trades must be supplied in date order. The analysis is a pure function of
//! its inputs apart from the timezone lookup.

mod annual;
mod rolling;

use std::ops::AddAssign;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use portlab_core::domain::{
    local_date, non_zero_daily_returns, to_int_date, DailyReturn, Trade, TradeFilter, TradingSystem,
};
use portlab_core::equity::{average_trade, gross_profits, net_profits, winning_percentage};
use portlab_core::stats::DAILY_ANNUALIZATION;
use portlab_core::{trunc2d, Distribution, EquityCurve};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AnalysisError;

pub use annual::AnnualAggregate;
pub use rolling::{Rolling, RollingInfo, YoYRolling, DAYS_PER_WEEK, MONTHS_PER_YEAR};

/// A figure split by trade side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalLongShort<T> {
    pub total: T,
    pub long: T,
    pub short: T,
}

impl<T: Copy + AddAssign> TotalLongShort<T> {
    /// Add to the total and to the matching side.
    pub fn add(&mut self, long: bool, value: T) {
        self.total += value;
        if long {
            self.long += value;
        } else {
            self.short += value;
        }
    }
}

impl<T> TotalLongShort<T> {
    pub fn get(&self, filter: TradeFilter) -> &T {
        match filter {
            TradeFilter::All => &self.total,
            TradeFilter::Long => &self.long,
            TradeFilter::Short => &self.short,
        }
    }

    pub fn get_mut(&mut self, filter: TradeFilter) -> &mut T {
        match filter {
            TradeFilter::All => &mut self.total,
            TradeFilter::Long => &mut self.long,
            TradeFilter::Short => &mut self.short,
        }
    }
}

impl TotalLongShort<f64> {
    pub fn truncated(self) -> Self {
        Self {
            total: trunc2d(self.total),
            long: trunc2d(self.long),
            short: trunc2d(self.short),
        }
    }
}

/// Chartable series for one trade partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equities {
    /// Exit time of each trade.
    pub time: Vec<DateTime<Utc>>,
    pub gross_equity: Vec<f64>,
    pub net_equity: Vec<f64>,
    pub gross_drawdown: Vec<f64>,
    pub net_drawdown: Vec<f64>,
    pub trades: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    pub profit: TotalLongShort<f64>,
    pub average_trade: TotalLongShort<f64>,
    pub max_drawdown: TotalLongShort<f64>,
    pub winning_percentage: TotalLongShort<f64>,
}

/// Calendar bounds of the history, as `YYYYMMDD` exit dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralInfo {
    pub from_date: Option<u32>,
    pub to_date: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributions {
    /// Non-zero daily returns.
    pub daily: Option<Distribution>,
    pub annual_sharpe_ratio: f64,
    pub annual_standard_dev: f64,
    pub trades_all_gross: Option<Distribution>,
    pub trades_all_net: Option<Distribution>,
    pub trades_long_gross: Option<Distribution>,
    pub trades_long_net: Option<Distribution>,
    pub trades_short_gross: Option<Distribution>,
    pub trades_short_net: Option<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub trading_system: TradingSystem,
    /// IANA name of the timezone the calendar figures were computed in.
    pub timezone: String,
    pub general: GeneralInfo,
    pub gross: ProfitSummary,
    pub net: ProfitSummary,
    pub all_equities: Equities,
    pub long_equities: Equities,
    pub short_equities: Equities,
    pub annual: Vec<AnnualAggregate>,
    pub distributions: Distributions,
    pub rolling: Rolling,
}

/// Both profit views of a single partition.
struct Partition {
    equities: Equities,
    gross_profits: Vec<f64>,
    net_profits: Vec<f64>,
    gross_curve_max_dd: f64,
    net_curve_max_dd: f64,
}

impl Partition {
    fn build(trades: &[Trade], filter: TradeFilter, cost_per_operation: f64) -> Self {
        let (time, gross) = gross_profits(trades, filter);
        let net = net_profits(&gross, cost_per_operation);
        let gross_curve = EquityCurve::from_profits(&gross);
        let net_curve = EquityCurve::from_profits(&net);

        Self {
            equities: Equities {
                trades: time.len(),
                time,
                gross_equity: gross_curve.equity,
                net_equity: net_curve.equity,
                gross_drawdown: gross_curve.drawdown,
                net_drawdown: net_curve.drawdown,
            },
            gross_profits: gross,
            net_profits: net,
            gross_curve_max_dd: gross_curve.max_drawdown,
            net_curve_max_dd: net_curve.max_drawdown,
        }
    }

    fn record(&self, filter: TradeFilter, gross: &mut ProfitSummary, net: &mut ProfitSummary) {
        let count = self.equities.trades;
        let gross_total = self.equities.gross_equity.last().copied().unwrap_or(0.0);
        let net_total = self.equities.net_equity.last().copied().unwrap_or(0.0);

        *gross.profit.get_mut(filter) = trunc2d(gross_total);
        *gross.average_trade.get_mut(filter) = average_trade(gross_total, count);
        *gross.max_drawdown.get_mut(filter) = trunc2d(self.gross_curve_max_dd);
        *gross.winning_percentage.get_mut(filter) = winning_percentage(&self.gross_profits);

        *net.profit.get_mut(filter) = trunc2d(net_total);
        *net.average_trade.get_mut(filter) = average_trade(net_total, count);
        *net.max_drawdown.get_mut(filter) = trunc2d(self.net_curve_max_dd);
        *net.winning_percentage.get_mut(filter) = winning_percentage(&self.net_profits);
    }
}

/// Analyse a trade history.
///
/// `timezone` selects the calendar used for annual and rolling buckets; `None`
/// or `"exchange"` use the trading system's own timezone.
pub fn analyze_performance(
    system: &TradingSystem,
    trades: &[Trade],
    daily_returns: &[DailyReturn],
    timezone: Option<&str>,
) -> Result<PerformanceReport, AnalysisError> {
    let tz = system.resolve_timezone(timezone)?;
    let cost = system.cost_per_operation;

    if !trades.windows(2).all(|w| w[0].exit_date <= w[1].exit_date) {
        warn!(ts_id = system.id, "trades are not in exit-date order");
    }

    let all = Partition::build(trades, TradeFilter::All, cost);
    let long = Partition::build(trades, TradeFilter::Long, cost);
    let short = Partition::build(trades, TradeFilter::Short, cost);

    let mut gross = ProfitSummary::default();
    let mut net = ProfitSummary::default();
    all.record(TradeFilter::All, &mut gross, &mut net);
    long.record(TradeFilter::Long, &mut gross, &mut net);
    short.record(TradeFilter::Short, &mut gross, &mut net);

    let distributions = distributions(daily_returns, &all, &long, &short);
    let annual = annual_aggregates(trades, tz, cost);

    let mut rolling = Rolling::default();
    for trade in trades {
        rolling.add_trade(trade, tz, cost);
    }
    rolling.finish();

    debug!(
        ts_id = system.id,
        trades = trades.len(),
        years = annual.len(),
        timezone = tz.name(),
        "performance analysis complete"
    );

    Ok(PerformanceReport {
        trading_system: system.clone(),
        timezone: tz.name().to_string(),
        general: general_info(trades, tz),
        gross,
        net,
        all_equities: all.equities,
        long_equities: long.equities,
        short_equities: short.equities,
        annual,
        distributions,
        rolling,
    })
}

/// One record per exit year, closed when the year advances.
fn annual_aggregates(trades: &[Trade], tz: Tz, cost_per_operation: f64) -> Vec<AnnualAggregate> {
    let mut list: Vec<AnnualAggregate> = Vec::new();

    for trade in trades {
        let year = trade.exit_date.with_timezone(&tz).year();
        match list.last_mut() {
            Some(current) if current.year == year => {}
            Some(current) => {
                current.consolidate();
                list.push(AnnualAggregate::new(year));
            }
            None => list.push(AnnualAggregate::new(year)),
        }
        if let Some(current) = list.last_mut() {
            current.add_trade(trade, cost_per_operation);
        }
    }

    if let Some(current) = list.last_mut() {
        current.consolidate();
    }
    list
}

fn general_info(trades: &[Trade], tz: Tz) -> GeneralInfo {
    let date = |t: &Trade| to_int_date(local_date(&t.exit_date, tz));
    GeneralInfo {
        from_date: trades.first().map(date),
        to_date: trades.last().map(date),
    }
}

fn distributions(
    daily_returns: &[DailyReturn],
    all: &Partition,
    long: &Partition,
    short: &Partition,
) -> Distributions {
    let daily = Distribution::from_sample(&non_zero_daily_returns(daily_returns));
    let (annual_sharpe_ratio, annual_standard_dev) = daily.as_ref().map_or((0.0, 0.0), |d| {
        (
            trunc2d(d.sharpe_ratio * DAILY_ANNUALIZATION),
            trunc2d(d.standard_dev * DAILY_ANNUALIZATION),
        )
    });

    Distributions {
        daily,
        annual_sharpe_ratio,
        annual_standard_dev,
        trades_all_gross: Distribution::from_sample(&all.gross_profits),
        trades_all_net: Distribution::from_sample(&all.net_profits),
        trades_long_gross: Distribution::from_sample(&long.gross_profits),
        trades_long_net: Distribution::from_sample(&long.net_profits),
        trades_short_gross: Distribution::from_sample(&short.gross_profits),
        trades_short_net: Distribution::from_sample(&short.net_profits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use portlab_core::domain::TradeType;

    fn system() -> TradingSystem {
        TradingSystem {
            id: 1,
            name: "breakout".into(),
            cost_per_operation: 1.0,
            timezone: "America/New_York".into(),
        }
    }

    fn trade(exit: DateTime<Utc>, gross_profit: f64, trade_type: TradeType) -> Trade {
        Trade {
            entry_date: exit - chrono::Duration::hours(5),
            exit_date: exit,
            gross_profit,
            trade_type,
        }
    }

    fn history() -> Vec<Trade> {
        vec![
            trade(Utc.with_ymd_and_hms(2022, 11, 3, 19, 0, 0).unwrap(), 10.0, TradeType::Long),
            trade(Utc.with_ymd_and_hms(2022, 12, 5, 19, 0, 0).unwrap(), -3.0, TradeType::Short),
            trade(Utc.with_ymd_and_hms(2023, 2, 6, 19, 0, 0).unwrap(), 5.0, TradeType::Long),
        ]
    }

    #[test]
    fn profit_summary_per_side() {
        let report = analyze_performance(&system(), &history(), &[], None).unwrap();

        assert_eq!(report.all_equities.gross_equity, vec![10.0, 7.0, 12.0]);
        assert_eq!(report.all_equities.gross_drawdown, vec![0.0, -3.0, 0.0]);
        assert_eq!(report.gross.profit, TotalLongShort { total: 12.0, long: 15.0, short: -3.0 });
        assert_eq!(report.gross.max_drawdown.total, -3.0);
        assert_eq!(report.gross.average_trade.total, 4.0);
        assert_eq!(report.net.profit.total, 6.0);
        assert_eq!(report.net.winning_percentage.total, 66.66);
        assert_eq!(report.long_equities.trades, 2);
        assert_eq!(report.short_equities.trades, 1);
    }

    #[test]
    fn annual_aggregates_close_on_year_change() {
        let report = analyze_performance(&system(), &history(), &[], None).unwrap();
        let years: Vec<i32> = report.annual.iter().map(|a| a.year).collect();
        assert_eq!(years, vec![2022, 2023]);
        assert_eq!(report.annual[0].trades.total, 2);
        assert_eq!(report.annual[0].gross_profit.total, 7.0);
        assert_eq!(report.annual[1].trades.long, 1);
    }

    #[test]
    fn calendar_bounds_use_exit_dates() {
        let report = analyze_performance(&system(), &history(), &[], None).unwrap();
        assert_eq!(report.general.from_date, Some(20221103));
        assert_eq!(report.general.to_date, Some(20230206));
        assert_eq!(report.timezone, "America/New_York");
    }

    #[test]
    fn timezone_shifts_the_exit_year() {
        // 03:00 UTC on Jan 1st is still Dec 31st in New York.
        let trades = vec![trade(Utc.with_ymd_and_hms(2023, 1, 1, 3, 0, 0).unwrap(), 1.0, TradeType::Long)];
        let exchange = analyze_performance(&system(), &trades, &[], Some("exchange")).unwrap();
        let utc = analyze_performance(&system(), &trades, &[], Some("UTC")).unwrap();
        assert_eq!(exchange.annual[0].year, 2022);
        assert_eq!(utc.annual[0].year, 2023);
        assert_eq!(exchange.general.to_date, Some(20221231));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = analyze_performance(&system(), &history(), &[], Some("Mars/Olympus")).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownTimezone(_)));
    }

    #[test]
    fn empty_history_has_no_distributions() {
        let report = analyze_performance(&system(), &[], &[], None).unwrap();
        assert_eq!(report.general, GeneralInfo::default());
        assert!(report.annual.is_empty());
        assert!(report.distributions.daily.is_none());
        assert!(report.distributions.trades_all_gross.is_none());
        assert_eq!(report.gross.average_trade.total, 0.0);
    }

    #[test]
    fn daily_distribution_skips_flat_days_and_annualizes() {
        let day = |d: u32, p: f64| DailyReturn {
            date: NaiveDate::from_ymd_opt(2023, 1, d).unwrap(),
            gross_profit: p,
        };
        let returns = vec![day(2, 1.0), day(3, 0.0), day(4, 3.0)];
        let report = analyze_performance(&system(), &history(), &returns, None).unwrap();

        let daily = report.distributions.daily.unwrap();
        assert_eq!(daily.mean, 2.0);
        assert_eq!(daily.standard_dev, 1.0);
        assert_eq!(daily.sharpe_ratio, 2.0);
        assert_eq!(report.distributions.annual_sharpe_ratio, 32.0);
        assert_eq!(report.distributions.annual_standard_dev, 16.0);
        assert!(report.distributions.trades_short_net.is_some());
    }
}
