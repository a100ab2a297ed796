//! TradingSystem — read-only descriptor of the strategy whose trades are analysed.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timezone name that resolves to the trading system's own timezone.
pub const EXCHANGE_TIMEZONE: &str = "exchange";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSystem {
    pub id: u32,
    pub name: String,
    /// Cost charged on each side of a trade.
    pub cost_per_operation: f64,
    /// IANA timezone of the exchange the system trades on.
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timezone: {0}")]
pub struct TimezoneError(pub String);

impl TradingSystem {
    /// Resolve a requested timezone. `None` and `"exchange"` map to the system's timezone.
    pub fn resolve_timezone(&self, requested: Option<&str>) -> Result<Tz, TimezoneError> {
        let name = match requested {
            None | Some(EXCHANGE_TIMEZONE) => self.timezone.as_str(),
            Some(other) => other,
        };
        name.parse::<Tz>()
            .map_err(|_| TimezoneError(name.to_string()))
    }
}

/// Calendar date of an instant as seen from `tz`.
pub fn local_date(instant: &DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}
