//! Market regime classification supplied by the external regime feed.
//!
//! Each trading day is labelled with a direction (-2..=2) and a volatility
//! bucket (0..=3). Days missing from the feed, or carrying out-of-range
//! levels, are `Unclassified`. An unclassified regime never matches any
//! selector, not even `All`, so those trades drop out of every quality cell.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    StrongBear,
    Bear,
    Neutral,
    Bull,
    StrongBull,
    Unclassified,
}

impl Direction {
    pub const CLASSIFIED: [Direction; 5] = [
        Direction::StrongBear,
        Direction::Bear,
        Direction::Neutral,
        Direction::Bull,
        Direction::StrongBull,
    ];

    pub fn from_level(level: i32) -> Self {
        match level {
            -2 => Direction::StrongBear,
            -1 => Direction::Bear,
            0 => Direction::Neutral,
            1 => Direction::Bull,
            2 => Direction::StrongBull,
            _ => Direction::Unclassified,
        }
    }

    pub fn level(self) -> Option<i32> {
        self.index().map(|i| i as i32 - 2)
    }

    /// Row index in the quality grid (0..5), `None` when unclassified.
    pub fn index(self) -> Option<usize> {
        match self {
            Direction::StrongBear => Some(0),
            Direction::Bear => Some(1),
            Direction::Neutral => Some(2),
            Direction::Bull => Some(3),
            Direction::StrongBull => Some(4),
            Direction::Unclassified => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    Quiet,
    Normal,
    Volatile,
    VeryVolatile,
    Unclassified,
}

impl Volatility {
    pub const CLASSIFIED: [Volatility; 4] = [
        Volatility::Quiet,
        Volatility::Normal,
        Volatility::Volatile,
        Volatility::VeryVolatile,
    ];

    pub fn from_level(level: i32) -> Self {
        match level {
            0 => Volatility::Quiet,
            1 => Volatility::Normal,
            2 => Volatility::Volatile,
            3 => Volatility::VeryVolatile,
            _ => Volatility::Unclassified,
        }
    }

    /// Column index in the quality grid (0..4), `None` when unclassified.
    pub fn index(self) -> Option<usize> {
        match self {
            Volatility::Quiet => Some(0),
            Volatility::Normal => Some(1),
            Volatility::Volatile => Some(2),
            Volatility::VeryVolatile => Some(3),
            Volatility::Unclassified => None,
        }
    }
}

/// Direction axis selector. `All` aggregates across every classified direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionSelector {
    All,
    Only(Direction),
}

impl DirectionSelector {
    pub fn matches(self, direction: Direction) -> bool {
        if direction == Direction::Unclassified {
            return false;
        }
        match self {
            DirectionSelector::All => true,
            DirectionSelector::Only(d) => d == direction,
        }
    }
}

/// Volatility axis selector. `All` aggregates across every classified bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilitySelector {
    All,
    Only(Volatility),
}

impl VolatilitySelector {
    pub fn matches(self, volatility: Volatility) -> bool {
        if volatility == Volatility::Unclassified {
            return false;
        }
        match self {
            VolatilitySelector::All => true,
            VolatilitySelector::Only(v) => v == volatility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Regime {
    pub direction: Direction,
    pub volatility: Volatility,
}

impl Regime {
    pub const UNCLASSIFIED: Regime = Regime {
        direction: Direction::Unclassified,
        volatility: Volatility::Unclassified,
    };
}

/// One entry of the regime feed. Extra fields sent by the feed are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDay {
    pub date: NaiveDate,
    pub direction: i32,
    pub volatility: i32,
}

/// Date → regime lookup built once per analysis.
#[derive(Debug, Clone, Default)]
pub struct RegimeMap {
    days: HashMap<NaiveDate, Regime>,
}

impl RegimeMap {
    pub fn from_days(days: &[RegimeDay]) -> Self {
        let days = days
            .iter()
            .map(|d| {
                let regime = Regime {
                    direction: Direction::from_level(d.direction),
                    volatility: Volatility::from_level(d.volatility),
                };
                (d.date, regime)
            })
            .collect();
        Self { days }
    }

    /// Regime of `date`, or [`Regime::UNCLASSIFIED`] when the feed has no entry.
    pub fn lookup(&self, date: NaiveDate) -> Regime {
        self.days.get(&date).copied().unwrap_or(Regime::UNCLASSIFIED)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
