//! One simulation job: six bootstrap phases over the Gross/Net × All/Long/Short
//! combinations, with a cooperative stop check before each phase.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use portlab_core::domain::{Trade, TradeFilter};
use portlab_core::{r_multiples, RngHierarchy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::bootstrap::{chart_series, drawdown_histogram, resample};
use super::chart::{ChartRenderer, LineChart, RenderError};
use super::request::SimulationRequest;
use super::result::{Details, SimulationResult, SimulationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Combination {
    GrossAll,
    GrossLong,
    GrossShort,
    NetAll,
    NetLong,
    NetShort,
}

impl Combination {
    /// Processing order of the six phases.
    pub const ALL: [Combination; 6] = [
        Combination::GrossAll,
        Combination::GrossLong,
        Combination::GrossShort,
        Combination::NetAll,
        Combination::NetLong,
        Combination::NetShort,
    ];

    pub fn filter(self) -> TradeFilter {
        match self {
            Combination::GrossAll | Combination::NetAll => TradeFilter::All,
            Combination::GrossLong | Combination::NetLong => TradeFilter::Long,
            Combination::GrossShort | Combination::NetShort => TradeFilter::Short,
        }
    }

    pub fn is_net(self) -> bool {
        matches!(self, Combination::NetAll | Combination::NetLong | Combination::NetShort)
    }

    pub fn label(self) -> &'static str {
        match self {
            Combination::GrossAll => "gross-all",
            Combination::GrossLong => "gross-long",
            Combination::GrossShort => "gross-short",
            Combination::NetAll => "net-all",
            Combination::NetLong => "net-long",
            Combination::NetShort => "net-short",
        }
    }
}

/// Shared handles to a job's state. Cloned into the manager's table.
#[derive(Clone)]
pub struct JobHandle {
    pub(crate) result: Arc<RwLock<SimulationResult>>,
    pub(crate) stop: Arc<AtomicBool>,
}

impl JobHandle {
    pub(crate) fn new(result: SimulationResult) -> Self {
        Self {
            result: Arc::new(RwLock::new(result)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Point-in-time copy of the result.
    pub fn snapshot(&self) -> SimulationResult {
        self.result.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// End time of a completed job; `None` while waiting or running.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        let result = self.result.read().unwrap_or_else(PoisonError::into_inner);
        match result.status {
            SimulationStatus::Complete => result.end_time,
            _ => None,
        }
    }

    pub(crate) fn update<F: FnOnce(&mut SimulationResult)>(&self, f: F) {
        let mut guard = self.result.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

pub struct SimulationJob {
    pub ts_id: u32,
    pub trades: Vec<Trade>,
    pub cost_per_operation: f64,
    pub request: SimulationRequest,
    pub risk: f64,
    pub rng: RngHierarchy,
    pub renderer: Arc<dyn ChartRenderer>,
    pub handle: JobHandle,
}

impl SimulationJob {
    /// Run all phases, then mark the job complete. Stopping skips the phases
    /// not yet started; the job still ends `complete`.
    pub fn run(self) {
        info!(ts_id = self.ts_id, runs = self.request.runs, seed = self.rng.master_seed(), "simulation started");
        self.handle.update(|r| {
            r.status = SimulationStatus::Running;
            r.start_time = Some(Utc::now());
        });

        for combination in Combination::ALL {
            if self.handle.is_stopping() {
                info!(ts_id = self.ts_id, phase = combination.label(), "simulation stopped");
                break;
            }
            debug!(ts_id = self.ts_id, phase = combination.label(), "phase started");
            let details = self.run_combination(combination);
            self.handle.update(|r| {
                r.set_details(combination, details);
                r.step += 1;
            });
        }

        self.handle.update(|r| {
            r.status = SimulationStatus::Complete;
            r.end_time = Some(Utc::now());
        });
        info!(ts_id = self.ts_id, "simulation ended");
    }

    fn run_combination(&self, combination: Combination) -> Details {
        let cost = if combination.is_net() { self.cost_per_operation } else { 0.0 };
        let list = r_multiples(&self.trades, combination.filter(), self.risk, cost);
        let stream = format!("ts-{}/{}", self.ts_id, combination.label());

        let details = run_bootstrap(
            &list,
            &self.request,
            &self.rng,
            &stream,
            self.renderer.as_ref(),
        );
        if let Some(error) = &details.error {
            warn!(ts_id = self.ts_id, phase = combination.label(), %error, "chart rendering failed");
        }
        details
    }
}

/// Resample one R-multiple list, render its ensemble chart and bin its drawdowns.
/// An empty list yields empty details.
pub fn run_bootstrap(
    list: &[f64],
    request: &SimulationRequest,
    rng: &RngHierarchy,
    stream: &str,
    renderer: &dyn ChartRenderer,
) -> Details {
    if list.is_empty() {
        return Details::default();
    }

    let ensemble = resample(list, request.runs as usize, rng, stream);
    let max_drawdowns = drawdown_histogram(&ensemble.max_drawdowns);
    let chart = LineChart::equity_ensemble(chart_series(ensemble, list.len()), request.width, request.height);

    // A panicking renderer is reported like a failing one.
    let rendered = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&chart)))
        .unwrap_or_else(|_| Err(RenderError::Backend("renderer panicked".into())));

    match rendered {
        Ok(bytes) => Details {
            equities: Some(STANDARD.encode(bytes)),
            max_drawdowns: Some(max_drawdowns),
            error: None,
        },
        Err(e) => Details {
            equities: None,
            max_drawdowns: Some(max_drawdowns),
            error: Some(e.to_string()),
        },
    }
}
