//! Simulation manager: at most one job per trading system.
//!
//! The job table is a mutex-guarded map from trading-system id to the job's
//! shared handle. Starting a job for an id that already has one stops the old
//! job and replaces its entry under the same lock. A background sweeper evicts
//! completed jobs once their result has outlived the configured TTL.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use portlab_core::domain::{local_date, to_int_date, Trade, TradingSystem};
use portlab_core::{risk_unit, RngHierarchy};
use tracing::{debug, info, warn};

use super::chart::ChartRenderer;
use super::process::{JobHandle, SimulationJob};
use super::request::SimulationRequest;
use super::result::{SimulationResult, SimulationStatus};
use super::SimulationError;
use crate::config::ManagerConfig;
use crate::pool::WorkerPool;

type JobTable = Mutex<HashMap<u32, JobHandle>>;

pub struct SimulationManager {
    jobs: Arc<JobTable>,
    pool: WorkerPool,
    renderer: Arc<dyn ChartRenderer>,
    config: ManagerConfig,
    sweeper: Option<Sweeper>,
}

struct Sweeper {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationManager {
    pub fn new(config: ManagerConfig, renderer: Arc<dyn ChartRenderer>) -> Result<Self, SimulationError> {
        config.validate()?;
        let pool = WorkerPool::new(config.workers, config.queue_capacity)?;
        let jobs: Arc<JobTable> = Arc::new(Mutex::new(HashMap::new()));
        let sweeper = Sweeper::spawn(Arc::clone(&jobs), config.sweep_interval(), config.result_ttl())?;

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            ttl_secs = config.result_ttl_secs,
            "simulation manager started"
        );

        Ok(Self {
            jobs,
            pool,
            renderer,
            config,
            sweeper: Some(sweeper),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Validate and enqueue a simulation for `system`, replacing any job it already has.
    ///
    /// Nothing is recorded when validation or submission fails.
    pub fn start(
        &self,
        system: &TradingSystem,
        trades: Vec<Trade>,
        request: SimulationRequest,
    ) -> Result<(), SimulationError> {
        self.start_at(system, trades, request, Utc::now())
    }

    /// [`start`](Self::start) with an explicit reference time for the lookback window.
    pub fn start_at(
        &self,
        system: &TradingSystem,
        trades: Vec<Trade>,
        request: SimulationRequest,
        now: DateTime<Utc>,
    ) -> Result<(), SimulationError> {
        request.validate()?;
        let tz = system.resolve_timezone(None)?;
        let trades = request.select_trades(trades, now);
        if trades.is_empty() {
            return Err(SimulationError::NoTrades);
        }
        let risk = risk_unit(&trades)?;

        let exit_date = |t: &Trade| to_int_date(local_date(&t.exit_date, tz));
        let handle = JobHandle::new(SimulationResult {
            first_trade_date: trades.first().map(exit_date),
            last_trade_date: trades.last().map(exit_date),
            runs: request.runs,
            initial_capital: request.initial_capital,
            ruin_percentage: request.ruin_percentage,
            risk,
            status: SimulationStatus::Waiting,
            ..SimulationResult::default()
        });

        let rng = self
            .config
            .master_seed
            .map_or_else(RngHierarchy::from_entropy, RngHierarchy::new);
        let runs = request.runs;
        let job = SimulationJob {
            ts_id: system.id,
            trades,
            cost_per_operation: system.cost_per_operation,
            request,
            risk,
            rng,
            renderer: Arc::clone(&self.renderer),
            handle: handle.clone(),
        };

        let mut jobs = self.lock_jobs();
        self.pool.try_submit(move || job.run())?;
        if let Some(previous) = jobs.insert(system.id, handle) {
            warn!(ts_id = system.id, "stopping previous simulation");
            previous.request_stop();
        }
        info!(ts_id = system.id, name = %system.name, runs, risk, "simulation queued");
        Ok(())
    }

    /// Ask the job for `ts_id` to stop and forget it. False when there is none.
    pub fn stop(&self, ts_id: u32) -> bool {
        let removed = self.lock_jobs().remove(&ts_id);
        match removed {
            Some(handle) => {
                handle.request_stop();
                info!(ts_id, "simulation stop requested");
                true
            }
            None => false,
        }
    }

    /// Snapshot of the job's result, or an idle result when there is no job.
    pub fn result(&self, ts_id: u32) -> SimulationResult {
        let handle = self.lock_jobs().get(&ts_id).cloned();
        handle.map_or_else(SimulationResult::idle, |h| h.snapshot())
    }

    /// Evict completed jobs whose end time is at least the TTL before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        purge(&self.jobs, now, self.config.result_ttl())
    }

    pub fn len(&self) -> usize {
        self.lock_jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_jobs().is_empty()
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<u32, JobHandle>> {
        lock(&self.jobs)
    }
}

impl Drop for SimulationManager {
    fn drop(&mut self) {
        for handle in self.lock_jobs().values() {
            handle.request_stop();
        }
        if let Some(mut sweeper) = self.sweeper.take() {
            sweeper.shutdown();
        }
        debug!("simulation manager shut down");
    }
}

impl Sweeper {
    fn spawn(jobs: Arc<JobTable>, interval: Duration, ttl: chrono::Duration) -> Result<Self, SimulationError> {
        let (shutdown, rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("portlab-sweeper".into())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        purge(&jobs, Utc::now(), ttl);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(SimulationError::Spawn)?;

        Ok(Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    fn shutdown(&mut self) {
        self.shutdown.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock(jobs: &JobTable) -> MutexGuard<'_, HashMap<u32, JobHandle>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

fn purge(jobs: &JobTable, now: DateTime<Utc>, ttl: chrono::Duration) -> usize {
    let mut jobs = lock(jobs);
    let before = jobs.len();
    jobs.retain(|&ts_id, handle| {
        let expired = handle.completed_at().is_some_and(|end| now - end >= ttl);
        if expired {
            info!(ts_id, "evicting completed simulation");
        }
        !expired
    });
    before - jobs.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::chart::{LineChart, RenderError, SvgRenderer};
    use chrono::TimeZone;
    use portlab_core::domain::TradeType;
    use std::sync::mpsc::Receiver;

    fn system(id: u32) -> TradingSystem {
        TradingSystem {
            id,
            name: format!("system-{id}"),
            cost_per_operation: 1.0,
            timezone: "Europe/Rome".into(),
        }
    }

    fn trades() -> Vec<Trade> {
        [5.0, -2.0, 3.0, -2.0, 7.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| Trade {
                entry_date: Utc.with_ymd_and_hms(2024, 2, 5 + i as u32, 9, 0, 0).unwrap(),
                exit_date: Utc.with_ymd_and_hms(2024, 2, 5 + i as u32, 16, 0, 0).unwrap(),
                gross_profit: p,
                trade_type: if i % 2 == 0 { TradeType::Long } else { TradeType::Short },
            })
            .collect()
    }

    fn request(runs: u32) -> SimulationRequest {
        SimulationRequest {
            runs,
            width: 300,
            height: 200,
            ..SimulationRequest::default()
        }
    }

    fn config() -> ManagerConfig {
        ManagerConfig {
            workers: 2,
            master_seed: Some(17),
            ..ManagerConfig::default()
        }
    }

    fn manager() -> SimulationManager {
        SimulationManager::new(config(), Arc::new(SvgRenderer)).unwrap()
    }

    /// Blocks inside `render` until the gate sender is dropped.
    struct GateRenderer {
        started: Mutex<Sender<()>>,
        gate: Mutex<Receiver<()>>,
    }

    impl ChartRenderer for GateRenderer {
        fn render(&self, _chart: &LineChart) -> Result<Vec<u8>, RenderError> {
            let _ = self.started.lock().unwrap().send(());
            let _ = self.gate.lock().unwrap().recv();
            Ok(b"<svg/>".to_vec())
        }
    }

    fn finished_handle(end: DateTime<Utc>) -> JobHandle {
        JobHandle::new(SimulationResult {
            status: SimulationStatus::Complete,
            end_time: Some(end),
            ..SimulationResult::default()
        })
    }

    #[test]
    fn starting_twice_replaces_and_stops_the_first_job() {
        let manager = manager();
        manager.start(&system(1), trades(), request(10)).unwrap();
        let first = lock(&manager.jobs).get(&1).cloned().unwrap();

        manager.start(&system(1), trades(), request(10)).unwrap();
        let second = lock(&manager.jobs).get(&1).cloned().unwrap();

        assert_eq!(manager.len(), 1);
        assert!(first.is_stopping());
        assert!(!second.is_stopping());
        assert!(!Arc::ptr_eq(&first.result, &second.result));
    }

    #[test]
    fn stop_unknown_is_not_found() {
        let manager = manager();
        assert!(!manager.stop(99));
    }

    #[test]
    fn stop_known_removes_the_entry() {
        let manager = manager();
        manager.start(&system(2), trades(), request(10)).unwrap();
        let handle = lock(&manager.jobs).get(&2).cloned().unwrap();

        assert!(manager.stop(2));
        assert!(handle.is_stopping());
        assert_eq!(manager.result(2).status, SimulationStatus::Idle);
        assert!(!manager.stop(2));
    }

    #[test]
    fn unknown_id_reads_idle() {
        let manager = manager();
        assert_eq!(manager.result(42), SimulationResult::idle());
    }

    #[test]
    fn header_is_set_when_queued() {
        let manager = manager();
        manager.start(&system(3), trades(), request(10)).unwrap();
        let result = manager.result(3);

        assert_ne!(result.status, SimulationStatus::Idle);
        assert_eq!(result.first_trade_date, Some(20240205));
        assert_eq!(result.last_trade_date, Some(20240209));
        assert_eq!(result.risk, 2.0);
        assert_eq!(result.runs, 10);
        assert_eq!(result.ruin_percentage, 50);
    }

    #[test]
    fn rejected_starts_leave_no_entry() {
        let manager = manager();

        let invalid = SimulationRequest { ruin_percentage: 99, ..request(10) };
        assert!(matches!(
            manager.start(&system(4), trades(), invalid),
            Err(SimulationError::InvalidRequest(_))
        ));
        assert!(matches!(
            manager.start(&system(4), Vec::new(), request(10)),
            Err(SimulationError::NoTrades)
        ));
        let winners: Vec<Trade> = trades().into_iter().filter(|t| t.gross_profit > 0.0).collect();
        assert!(matches!(
            manager.start(&system(4), winners, request(10)),
            Err(SimulationError::Risk(_))
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn lookback_with_nothing_in_window_is_no_trades() {
        let manager = manager();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let recent_only = SimulationRequest { days_back: 30, ..request(10) };
        assert!(matches!(
            manager.start_at(&system(5), trades(), recent_only, now),
            Err(SimulationError::NoTrades)
        ));
    }

    #[test]
    fn purge_evicts_only_expired_completed_jobs() {
        let manager = manager();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        {
            let mut jobs = lock(&manager.jobs);
            jobs.insert(1, finished_handle(now - chrono::Duration::minutes(31)));
            jobs.insert(2, finished_handle(now - chrono::Duration::minutes(10)));
            jobs.insert(3, finished_handle(now - chrono::Duration::minutes(30)));
            jobs.insert(
                4,
                JobHandle::new(SimulationResult {
                    status: SimulationStatus::Running,
                    start_time: Some(now - chrono::Duration::days(2)),
                    ..SimulationResult::default()
                }),
            );
            jobs.insert(
                5,
                JobHandle::new(SimulationResult {
                    status: SimulationStatus::Waiting,
                    ..SimulationResult::default()
                }),
            );
        }

        assert_eq!(manager.purge_expired(now), 2);
        let mut left: Vec<u32> = lock(&manager.jobs).keys().copied().collect();
        left.sort_unstable();
        assert_eq!(left, vec![2, 4, 5]);
    }

    #[test]
    fn full_queue_rejects_without_an_entry() {
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let renderer = Arc::new(GateRenderer {
            started: Mutex::new(started_tx),
            gate: Mutex::new(gate_rx),
        });
        let config = ManagerConfig {
            workers: 1,
            queue_capacity: 1,
            master_seed: Some(1),
            ..ManagerConfig::default()
        };
        let manager = SimulationManager::new(config, renderer).unwrap();
        // Dropped before the manager so a failed assertion cannot leave the worker blocked.
        let _release = gate_tx;

        manager.start(&system(1), trades(), request(5)).unwrap();
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        manager.start(&system(2), trades(), request(5)).unwrap();

        let rejected = manager.start(&system(3), trades(), request(5));
        assert!(matches!(rejected, Err(SimulationError::QueueFull)));
        assert_eq!(manager.result(3).status, SimulationStatus::Idle);
        assert_eq!(manager.result(2).status, SimulationStatus::Waiting);
        assert_eq!(manager.len(), 2);
    }
}
