//! Loading trades, daily returns, trading systems and regime feeds from disk.
//!
//! Trades and daily returns are CSV with a header row:
//! - trades: `entry_date,exit_date,gross_profit,trade_type` (RFC 3339 instants, `long`/`short`)
//! - daily returns: `date,gross_profit` (`YYYY-MM-DD`)
//!
//! The trading system is a JSON object, the regime feed a JSON array of
//! `{date, direction, volatility}` entries.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use portlab_core::domain::{DailyReturn, RegimeDay, RegimeMap, Trade, TradingSystem};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Read trades and order them by exit time, the order every analysis expects.
pub fn load_trades(path: &Path) -> Result<Vec<Trade>> {
    let file = File::open(path).with_context(|| format!("failed to open trades file {}", path.display()))?;
    let mut trades: Vec<Trade> = read_csv(file).with_context(|| format!("invalid trades file {}", path.display()))?;
    trades.sort_by_key(|t| t.exit_date);
    debug!(path = %path.display(), trades = trades.len(), "loaded trades");
    Ok(trades)
}

pub fn load_daily_returns(path: &Path) -> Result<Vec<DailyReturn>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open daily returns file {}", path.display()))?;
    let mut returns: Vec<DailyReturn> =
        read_csv(file).with_context(|| format!("invalid daily returns file {}", path.display()))?;
    returns.sort_by_key(|r| r.date);
    debug!(path = %path.display(), days = returns.len(), "loaded daily returns");
    Ok(returns)
}

pub fn load_system(path: &Path) -> Result<TradingSystem> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trading system {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid trading system {}", path.display()))
}

pub fn load_regimes(path: &Path) -> Result<RegimeMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read regime feed {}", path.display()))?;
    let days: Vec<RegimeDay> =
        serde_json::from_str(&content).with_context(|| format!("invalid regime feed {}", path.display()))?;
    let map = RegimeMap::from_days(&days);
    debug!(path = %path.display(), days = map.len(), "loaded regime feed");
    Ok(map)
}

fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        // Header is line 1.
        rows.push(record.with_context(|| format!("line {}", i + 2))?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use portlab_core::domain::{Direction, TradeType, Volatility};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn trades_are_sorted_by_exit() {
        let csv = "entry_date,exit_date,gross_profit,trade_type\n\
                   2024-03-04T14:30:00Z,2024-03-05T20:00:00Z,-50,short\n\
                   2024-03-01T14:30:00Z,2024-03-01T20:00:00Z, 125.5 ,long\n";
        let trades = read_csv::<Trade, _>(csv.as_bytes()).unwrap();
        assert_eq!(trades.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = temp_file(&dir, "trades.csv", csv);
        let trades = load_trades(&path).unwrap();
        assert_eq!(trades[0].gross_profit, 125.5);
        assert_eq!(trades[0].trade_type, TradeType::Long);
        assert_eq!(trades[0].entry_date, Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap());
        assert_eq!(trades[1].trade_type, TradeType::Short);
    }

    #[test]
    fn bad_row_reports_its_line() {
        let csv = "entry_date,exit_date,gross_profit,trade_type\n\
                   2024-03-01T14:30:00Z,2024-03-01T20:00:00Z,10,long\n\
                   2024-03-02T14:30:00Z,2024-03-02T20:00:00Z,10,sideways\n";
        let err = read_csv::<Trade, _>(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn daily_returns_parse_plain_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_file(&dir, "daily.csv", "date,gross_profit\n2024-01-03,12.5\n2024-01-02,0\n");
        let returns = load_daily_returns(&path).unwrap();
        assert_eq!(returns[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(returns[1].gross_profit, 12.5);
    }

    #[test]
    fn system_and_regimes_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let system = temp_file(
            &dir,
            "system.json",
            r#"{"id": 3, "name": "breakout", "cost_per_operation": 2.5, "timezone": "America/New_York"}"#,
        );
        let system = load_system(&system).unwrap();
        assert_eq!(system.id, 3);
        assert_eq!(system.cost_per_operation, 2.5);

        let regimes = temp_file(
            &dir,
            "regimes.json",
            r#"[{"date": "2024-01-02", "direction": -1, "volatility": 3}]"#,
        );
        let map = load_regimes(&regimes).unwrap();
        let regime = map.lookup(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(regime.direction, Direction::Bear);
        assert_eq!(regime.volatility, Volatility::VeryVolatile);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_trades(Path::new("/nonexistent/trades.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/trades.csv"));
    }
}
