//! Day-of-week and month-of-year buckets, overall and year over year.
//!
//! Trades are bucketed by their entry date in the analysis timezone.
//! Days of the week are indexed from Sunday (0) and months from January (0).

use chrono::{Datelike, Weekday};
use chrono_tz::Tz;
use portlab_core::domain::Trade;
use serde::{Deserialize, Serialize};

use super::TotalLongShort;

pub const DAYS_PER_WEEK: usize = 7;
pub const MONTHS_PER_YEAR: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingInfo {
    pub trades: TotalLongShort<usize>,
    pub gross_returns: TotalLongShort<f64>,
    pub net_returns: TotalLongShort<f64>,
}

impl RollingInfo {
    pub fn add_trade(&mut self, trade: &Trade, cost_per_operation: f64) {
        let long = trade.is_long();
        self.trades.add(long, 1);
        self.gross_returns.add(long, trade.gross_profit);
        self.net_returns.add(long, trade.net_profit(cost_per_operation));
    }

    fn truncate(&mut self) {
        self.gross_returns = self.gross_returns.truncated();
        self.net_returns = self.net_returns.truncated();
    }
}

/// One year's worth of buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoYRolling {
    pub year: i32,
    pub data: Vec<RollingInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rolling {
    pub daily: [RollingInfo; DAYS_PER_WEEK],
    pub monthly: [RollingInfo; MONTHS_PER_YEAR],
    #[serde(rename = "dayYoY")]
    pub day_yoy: Vec<YoYRolling>,
    #[serde(rename = "monthYoY")]
    pub month_yoy: Vec<YoYRolling>,
}

impl Rolling {
    pub fn add_trade(&mut self, trade: &Trade, tz: Tz, cost_per_operation: f64) {
        let entry = trade.entry_date.with_timezone(&tz);
        let year = entry.year();
        let dow = weekday_index(entry.weekday());
        let month = entry.month0() as usize;

        self.daily[dow].add_trade(trade, cost_per_operation);
        self.monthly[month].add_trade(trade, cost_per_operation);

        yoy_slot(&mut self.day_yoy, year, DAYS_PER_WEEK, dow).add_trade(trade, cost_per_operation);
        yoy_slot(&mut self.month_yoy, year, MONTHS_PER_YEAR, month)
            .add_trade(trade, cost_per_operation);
    }

    /// Truncate every accumulated return to two decimals.
    pub fn finish(&mut self) {
        let yoy = self.day_yoy.iter_mut().chain(self.month_yoy.iter_mut());
        self.daily
            .iter_mut()
            .chain(self.monthly.iter_mut())
            .chain(yoy.flat_map(|y| y.data.iter_mut()))
            .for_each(RollingInfo::truncate);
    }
}

fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

/// Bucket for `slot` in `year`. A new year row is appended only when the
/// year differs from the last row, so trades must arrive in date order.
fn yoy_slot(list: &mut Vec<YoYRolling>, year: i32, slots: usize, slot: usize) -> &mut RollingInfo {
    if list.last().map_or(true, |last| last.year != year) {
        list.push(YoYRolling {
            year,
            data: vec![RollingInfo::default(); slots],
        });
    }
    let row = list.len() - 1;
    &mut list[row].data[slot]
}
