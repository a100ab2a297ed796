//! Trade — a closed round-trip as read from storage.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stored side of a trade. "All" is a query-time partition, see [`TradeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Long,
    Short,
}

/// Partition selector applied when building profit sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeFilter {
    All,
    Long,
    Short,
}

impl TradeFilter {
    /// All partitions in reporting order.
    pub const PARTITIONS: [TradeFilter; 3] = [TradeFilter::All, TradeFilter::Long, TradeFilter::Short];

    pub fn matches(self, trade_type: TradeType) -> bool {
        match self {
            TradeFilter::All => true,
            TradeFilter::Long => trade_type == TradeType::Long,
            TradeFilter::Short => trade_type == TradeType::Short,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeFilter::All => "all",
            TradeFilter::Long => "long",
            TradeFilter::Short => "short",
        }
    }
}

/// A closed trade. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: DateTime<Utc>,
    pub exit_date: DateTime<Utc>,
    pub gross_profit: f64,
    pub trade_type: TradeType,
}

impl Trade {
    /// Net profit: the per-side cost is charged twice, once on entry and once on exit.
    pub fn net_profit(&self, cost_per_operation: f64) -> f64 {
        self.gross_profit - 2.0 * cost_per_operation
    }

    pub fn is_long(&self) -> bool {
        self.trade_type == TradeType::Long
    }
}

/// Profit of a single calendar day, used only for daily-return statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub gross_profit: f64,
}

/// Calendar date packed as `YYYYMMDD`.
pub fn to_int_date(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Gross profits of the days that actually traded (zero days are dropped).
pub fn non_zero_daily_returns(returns: &[DailyReturn]) -> Vec<f64> {
    returns
        .iter()
        .map(|r| r.gross_profit)
        .filter(|&p| p != 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trade(trade_type: TradeType, gross: f64) -> Trade {
        Trade {
            entry_date: Utc.with_ymd_and_hms(2024, 3, 4, 15, 30, 0).unwrap(),
            exit_date: Utc.with_ymd_and_hms(2024, 3, 5, 21, 0, 0).unwrap(),
            gross_profit: gross,
            trade_type,
        }
    }

    #[test]
    fn net_profit_charges_cost_twice() {
        let t = trade(TradeType::Long, 100.0);
        assert_eq!(t.net_profit(2.5), 95.0);
    }

    #[test]
    fn filter_all_matches_both_sides() {
        assert!(TradeFilter::All.matches(TradeType::Long));
        assert!(TradeFilter::All.matches(TradeType::Short));
        assert!(TradeFilter::Long.matches(TradeType::Long));
        assert!(!TradeFilter::Long.matches(TradeType::Short));
        assert!(!TradeFilter::Short.matches(TradeType::Long));
    }

    #[test]
    fn int_date_packs_ymd() {
        let d = NaiveDate::from_ymd_opt(2023, 7, 9).unwrap();
        assert_eq!(to_int_date(d), 20230709);
    }

    #[test]
    fn zero_days_are_dropped() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let returns = vec![
            DailyReturn { date: d, gross_profit: 10.0 },
            DailyReturn { date: d, gross_profit: 0.0 },
            DailyReturn { date: d, gross_profit: -4.0 },
        ];
        assert_eq!(non_zero_daily_returns(&returns), vec![10.0, -4.0]);
    }

    #[test]
    fn trade_type_serializes_lowercase() {
        let json = serde_json::to_string(&trade(TradeType::Short, 1.0)).unwrap();
        assert!(json.contains("\"short\""));
    }
}
