//! Risk unit estimation and R-multiples.
//!
//! The risk unit is the magnitude of the most frequent losing trade, taken as
//! the strategy's effective stop loss. Losses are bucketed by exact value, so
//! near-equal losses that differ by a cent land in different buckets.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Trade, TradeFilter};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskError {
    #[error("no losses found")]
    NoLosses,
}

/// Absolute value of the modal loss. Ties go to the loss seen first.
pub fn risk_unit(trades: &[Trade]) -> Result<f64, RiskError> {
    // Buckets in first-seen order; the map points into the vec.
    let mut buckets: Vec<(f64, usize)> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();

    for trade in trades.iter().filter(|t| t.gross_profit < 0.0) {
        let key = trade.gross_profit.to_bits();
        match index.get(&key) {
            Some(&i) => buckets[i].1 += 1,
            None => {
                index.insert(key, buckets.len());
                buckets.push((trade.gross_profit, 1));
            }
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for &(loss, count) in &buckets {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((loss, count));
        }
    }

    best.map(|(loss, _)| loss.abs()).ok_or(RiskError::NoLosses)
}

/// Net return of each trade in the partition divided by the risk unit.
///
/// Pass a cost of 0 for gross R-multiples.
pub fn r_multiples(trades: &[Trade], filter: TradeFilter, risk: f64, cost_per_operation: f64) -> Vec<f64> {
    trades
        .iter()
        .filter(|t| filter.matches(t.trade_type))
        .map(|t| t.net_profit(cost_per_operation) / risk)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeType;
    use chrono::{TimeZone, Utc};

    fn trades(profits: &[(TradeType, f64)]) -> Vec<Trade> {
        profits
            .iter()
            .enumerate()
            .map(|(i, &(trade_type, gross_profit))| Trade {
                entry_date: Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 10, 0, 0).unwrap(),
                exit_date: Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 16, 0, 0).unwrap(),
                gross_profit,
                trade_type,
            })
            .collect()
    }

    #[test]
    fn modal_loss_is_risk() {
        let t = trades(&[
            (TradeType::Long, -5.0),
            (TradeType::Long, 12.0),
            (TradeType::Short, -5.0),
            (TradeType::Long, -3.0),
        ]);
        assert_eq!(risk_unit(&t), Ok(5.0));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let t = trades(&[
            (TradeType::Long, -3.0),
            (TradeType::Long, -5.0),
            (TradeType::Long, -5.0),
            (TradeType::Long, -3.0),
        ]);
        assert_eq!(risk_unit(&t), Ok(3.0));
    }

    #[test]
    fn no_losses_is_rejected() {
        let t = trades(&[(TradeType::Long, 4.0), (TradeType::Short, 0.0)]);
        assert_eq!(risk_unit(&t), Err(RiskError::NoLosses));
        assert_eq!(risk_unit(&[]), Err(RiskError::NoLosses));
    }

    #[test]
    fn r_multiples_per_partition() {
        let t = trades(&[(TradeType::Long, 10.0), (TradeType::Short, -5.0)]);
        assert_eq!(r_multiples(&t, TradeFilter::All, 5.0, 0.0), vec![2.0, -1.0]);
        assert_eq!(r_multiples(&t, TradeFilter::Long, 5.0, 0.0), vec![2.0]);
        assert_eq!(r_multiples(&t, TradeFilter::Short, 5.0, 2.5), vec![-2.0]);
    }
}
