//! PortLab Runner — analyses and simulations over a trade history.
//!
//! This crate builds on `portlab-core` to provide:
//! - Performance analysis (equity, profit summaries, calendar aggregates, distributions)
//! - Quality analysis on the market-regime grid
//! - Bootstrap robustness simulation with a pluggable chart renderer
//! - A worker pool and a job manager running one simulation per trading system

pub mod config;
pub mod error;
pub mod performance;
pub mod pool;
pub mod quality;
pub mod simulation;

pub use config::{ConfigError, ManagerConfig};
pub use error::AnalysisError;
pub use performance::{analyze_performance, PerformanceReport};
pub use pool::{PoolError, WorkerPool};
pub use quality::{analyze_quality, QualityGrid, QualityMetrics, QualityReport};
pub use simulation::{
    ChartRenderer, Combination, Details, SimulationError, SimulationManager, SimulationRequest,
    SimulationResult, SimulationStatus, SvgRenderer,
};
