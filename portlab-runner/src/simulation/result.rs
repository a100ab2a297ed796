//! Simulation result snapshot returned to callers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Combination;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    /// No job is known for the trading system.
    #[default]
    Idle,
    Waiting,
    Running,
    Complete,
}

/// Histogram of per-run max drawdowns in whole R units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownDistribution {
    /// Bin labels, `"-nR"` up to `"0R"`.
    pub x_axis: Vec<String>,
    pub y_axis: Vec<f64>,
}

/// Outcome of one Gross/Net × All/Long/Short combination.
///
/// An empty partition leaves every field `None`. When the chart renderer
/// fails, `error` carries its message and the drawdown histogram is still set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    /// Base64 chart image.
    pub equities: Option<String>,
    pub max_drawdowns: Option<DrawdownDistribution>,
    pub error: Option<String>,
}

impl Details {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub first_trade_date: Option<u32>,
    pub last_trade_date: Option<u32>,
    pub runs: u32,
    pub initial_capital: f64,
    pub ruin_percentage: u32,
    pub risk: f64,

    pub status: SimulationStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Combinations finished so far, 0..=6.
    pub step: u8,

    pub gross_all: Option<Arc<Details>>,
    pub gross_long: Option<Arc<Details>>,
    pub gross_short: Option<Arc<Details>>,
    pub net_all: Option<Arc<Details>>,
    pub net_long: Option<Arc<Details>>,
    pub net_short: Option<Arc<Details>>,
}

impl SimulationResult {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn details(&self, combination: Combination) -> Option<&Arc<Details>> {
        self.slot(combination).as_ref()
    }

    pub fn set_details(&mut self, combination: Combination, details: Details) {
        *self.slot_mut(combination) = Some(Arc::new(details));
    }

    /// True when at least one combination failed to render.
    pub fn has_failures(&self) -> bool {
        Combination::ALL
            .iter()
            .filter_map(|&c| self.details(c))
            .any(|d| d.is_failed())
    }

    fn slot(&self, combination: Combination) -> &Option<Arc<Details>> {
        match combination {
            Combination::GrossAll => &self.gross_all,
            Combination::GrossLong => &self.gross_long,
            Combination::GrossShort => &self.gross_short,
            Combination::NetAll => &self.net_all,
            Combination::NetLong => &self.net_long,
            Combination::NetShort => &self.net_short,
        }
    }

    fn slot_mut(&mut self, combination: Combination) -> &mut Option<Arc<Details>> {
        match combination {
            Combination::GrossAll => &mut self.gross_all,
            Combination::GrossLong => &mut self.gross_long,
            Combination::GrossShort => &mut self.gross_short,
            Combination::NetAll => &mut self.net_all,
            Combination::NetLong => &mut self.net_long,
            Combination::NetShort => &mut self.net_short,
        }
    }
}
