//! PortLab CLI — performance, quality and robustness reports for a trading system.
//!
//! Commands:
//! - `performance` — equity, profit summaries, calendar aggregates and distributions
//! - `quality` — SQN and drawdown on the market-regime grid
//! - `simulate` — bootstrap robustness simulation, optionally saving the charts
//!
//! Reports are printed as JSON on stdout; logs go to stderr.

mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Args, Parser, Subcommand};
use portlab_runner::{
    analyze_performance, analyze_quality, Combination, ManagerConfig, SimulationManager,
    SimulationRequest, SimulationResult, SimulationStatus, SvgRenderer,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "portlab",
    about = "PortLab CLI — trade history analytics and bootstrap simulation"
)]
struct Cli {
    /// Log filter (e.g. `debug`, `portlab_runner=trace`). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every command.
#[derive(Args)]
struct SystemArgs {
    /// Trading system descriptor (JSON).
    #[arg(long)]
    system: PathBuf,

    /// Closed trades (CSV: entry_date,exit_date,gross_profit,trade_type).
    #[arg(long)]
    trades: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Performance analysis of the trade history.
    Performance {
        #[command(flatten)]
        input: SystemArgs,

        /// Daily returns (CSV: date,gross_profit).
        #[arg(long)]
        daily: Option<PathBuf>,

        /// IANA timezone for calendar figures, or `exchange` for the system's own.
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Quality analysis on the direction × volatility grid.
    Quality {
        #[command(flatten)]
        input: SystemArgs,

        /// Regime feed (JSON array of {date, direction, volatility}).
        #[arg(long)]
        regimes: PathBuf,
    },
    /// Run a bootstrap simulation and wait for it to complete.
    Simulate {
        #[command(flatten)]
        input: SystemArgs,

        #[command(flatten)]
        request: RequestArgs,

        /// Manager configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Master seed, overriding the configuration.
        #[arg(long)]
        seed: Option<u64>,

        /// Write each equity chart here as `<combination>.svg`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Give up after this many seconds.
        #[arg(long, default_value_t = 600)]
        timeout_secs: u64,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Only trades that exited in the last N days (0 = all).
    #[arg(long, default_value_t = 0)]
    days_back: u32,

    /// Number of bootstrap runs.
    #[arg(long, default_value_t = 1000)]
    runs: u32,

    /// Chart width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Chart height in pixels.
    #[arg(long, default_value_t = 500)]
    height: u32,

    #[arg(long, default_value_t = 10_000.0)]
    initial_capital: f64,

    #[arg(long, default_value_t = 50)]
    ruin_percentage: u32,
}

impl From<RequestArgs> for SimulationRequest {
    fn from(args: RequestArgs) -> Self {
        SimulationRequest {
            days_back: args.days_back,
            runs: args.runs,
            width: args.width,
            height: args.height,
            initial_capital: args.initial_capital,
            ruin_percentage: args.ruin_percentage,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Performance {
            input,
            daily,
            timezone,
        } => run_performance(&input, daily.as_deref(), timezone.as_deref()),
        Commands::Quality { input, regimes } => run_quality(&input, &regimes),
        Commands::Simulate {
            input,
            request,
            config,
            seed,
            output_dir,
            timeout_secs,
        } => run_simulate(
            &input,
            request.into(),
            config.as_deref(),
            seed,
            output_dir.as_deref(),
            Duration::from_secs(timeout_secs),
        ),
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn run_performance(input: &SystemArgs, daily: Option<&Path>, timezone: Option<&str>) -> Result<()> {
    let system = input::load_system(&input.system)?;
    let trades = input::load_trades(&input.trades)?;
    let daily_returns = match daily {
        Some(path) => input::load_daily_returns(path)?,
        None => Vec::new(),
    };

    let report = analyze_performance(&system, &trades, &daily_returns, timezone)
        .with_context(|| format!("performance analysis failed for '{}'", system.name))?;
    info!(ts_id = system.id, trades = trades.len(), timezone = %report.timezone, "performance analysis complete");
    print_json(&report)
}

fn run_quality(input: &SystemArgs, regimes: &Path) -> Result<()> {
    let system = input::load_system(&input.system)?;
    let trades = input::load_trades(&input.trades)?;
    let regimes = input::load_regimes(regimes)?;
    if regimes.is_empty() {
        warn!("regime feed is empty, every grid cell will be empty");
    }

    let report = analyze_quality(&system, &trades, &regimes)
        .with_context(|| format!("quality analysis failed for '{}'", system.name))?;
    info!(ts_id = system.id, risk = report.risk, "quality analysis complete");
    print_json(&report)
}

fn run_simulate(
    input: &SystemArgs,
    request: SimulationRequest,
    config_path: Option<&Path>,
    seed: Option<u64>,
    output_dir: Option<&Path>,
    timeout: Duration,
) -> Result<()> {
    let system = input::load_system(&input.system)?;
    let trades = input::load_trades(&input.trades)?;

    let mut config = match config_path {
        Some(path) => ManagerConfig::load(path)?,
        None => ManagerConfig::default(),
    };
    if seed.is_some() {
        config.master_seed = seed;
    }

    let manager = SimulationManager::new(config, Arc::new(SvgRenderer))?;
    manager
        .start(&system, trades, request)
        .with_context(|| format!("failed to start simulation for '{}'", system.name))?;

    let result = wait_for_completion(&manager, system.id, timeout)?;
    if result.has_failures() {
        warn!(ts_id = system.id, "simulation completed with chart failures");
    }
    if let Some(dir) = output_dir {
        save_charts(&result, dir)?;
    }
    print_json(&result)
}

fn wait_for_completion(manager: &SimulationManager, ts_id: u32, timeout: Duration) -> Result<SimulationResult> {
    let poll = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    let mut last_step = 0;
    loop {
        let result = manager.result(ts_id);
        if result.step != last_step {
            last_step = result.step;
            info!(ts_id, step = result.step, "simulation progress");
        }
        match result.status {
            SimulationStatus::Complete => return Ok(result),
            SimulationStatus::Idle => bail!("simulation for trading system {ts_id} disappeared"),
            SimulationStatus::Waiting | SimulationStatus::Running => {}
        }
        if waited >= timeout {
            manager.stop(ts_id);
            bail!("simulation for trading system {ts_id} timed out after {}s", timeout.as_secs());
        }
        thread::sleep(poll);
        waited += poll;
    }
}

fn save_charts(result: &SimulationResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for combination in Combination::ALL {
        let Some(encoded) = result.details(combination).and_then(|d| d.equities.as_deref()) else {
            continue;
        };
        let svg = STANDARD
            .decode(encoded)
            .with_context(|| format!("chart for {} is not valid base64", combination.label()))?;
        let path = dir.join(format!("{}.svg", combination.label()));
        std::fs::write(&path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "chart saved");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("failed to write JSON")?;
    std::io::Write::write_all(&mut out, b"\n")?;
    Ok(())
}
