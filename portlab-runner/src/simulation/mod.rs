//! Bootstrap robustness simulation, run asynchronously per trading system.

pub mod bootstrap;
pub mod chart;
pub mod manager;
pub mod process;
pub mod request;
pub mod result;

use portlab_core::domain::TimezoneError;
use portlab_core::RiskError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::pool::PoolError;

pub use bootstrap::{bands, drawdown_histogram, resample, Bands, Ensemble};
pub use chart::{ChartRenderer, LineChart, RenderError, Rgba, SvgRenderer};
pub use manager::SimulationManager;
pub use process::{run_bootstrap, Combination, JobHandle, SimulationJob};
pub use request::{RequestError, SimulationRequest};
pub use result::{Details, DrawdownDistribution, SimulationResult, SimulationStatus};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("no trades found for the given time window")]
    NoTrades,
    #[error(transparent)]
    Risk(#[from] RiskError),
    #[error(transparent)]
    UnknownTimezone(#[from] TimezoneError),
    #[error("simulation queue is full")]
    QueueFull,
    #[error("simulation pool is shut down")]
    PoolShutdown,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(std::io::Error),
}

impl From<PoolError> for SimulationError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Full => SimulationError::QueueFull,
            PoolError::Closed => SimulationError::PoolShutdown,
            PoolError::Spawn(e) => SimulationError::Spawn(e),
        }
    }
}
