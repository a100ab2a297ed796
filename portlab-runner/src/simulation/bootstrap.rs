//! Bootstrap resampling of R-multiple sequences.
//!
//! Each run draws `len` values uniformly with replacement from the source
//! sequence and accumulates them into an equity path. Runs are independent
//! and seeded per index from the [`RngHierarchy`], so the ensemble is the
//! same whether it is computed serially or on the rayon pool.

use portlab_core::equity::{build_equity, max_drawdown};
use portlab_core::stats::mean_and_sample_std_dev;
use portlab_core::RngHierarchy;
use rand::Rng;
use rayon::prelude::*;

use super::result::DrawdownDistribution;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ensemble {
    /// One cumulative equity path per run.
    pub paths: Vec<Vec<f64>>,
    /// Max drawdown of each path.
    pub max_drawdowns: Vec<f64>,
}

/// Resample `source` into `runs` equity paths.
pub fn resample(source: &[f64], runs: usize, rng: &RngHierarchy, stream: &str) -> Ensemble {
    if source.is_empty() {
        return Ensemble::default();
    }

    let paths: Vec<Vec<f64>> = (0..runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = rng.rng_for(stream, run as u64);
            let sample: Vec<f64> = (0..source.len())
                .map(|_| source[rng.gen_range(0..source.len())])
                .collect();
            build_equity(&sample)
        })
        .collect();

    let max_drawdowns = paths.iter().map(|p| max_drawdown(p)).collect();
    Ensemble { paths, max_drawdowns }
}

/// Cross-run statistics at each trade index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bands {
    pub mean: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Mean and one-sigma bands over `len` indices. With no paths every band is flat zero.
pub fn bands(paths: &[Vec<f64>], len: usize) -> Bands {
    let mut out = Bands {
        mean: Vec::with_capacity(len),
        upper: Vec::with_capacity(len),
        lower: Vec::with_capacity(len),
    };
    let mut column = Vec::with_capacity(paths.len());

    for i in 0..len {
        column.clear();
        column.extend(paths.iter().filter_map(|p| p.get(i).copied()));
        let (mean, sd) = mean_and_sample_std_dev(&column);
        out.mean.push(mean);
        out.upper.push(mean + sd);
        out.lower.push(mean - sd);
    }
    out
}

/// Ensemble paths followed by the zero baseline, mean, upper and lower bands.
pub fn chart_series(ensemble: Ensemble, len: usize) -> Vec<Vec<f64>> {
    let bands = bands(&ensemble.paths, len);
    let mut series = ensemble.paths;
    series.reserve(4);
    series.push(vec![0.0; len]);
    series.push(bands.mean);
    series.push(bands.upper);
    series.push(bands.lower);
    series
}

/// Histogram of max drawdowns in whole-R bins, from the deepest observed
/// drawdown up to `0R`. A drawdown of `-2.7` lands in the `-2R` bin.
pub fn drawdown_histogram(max_drawdowns: &[f64]) -> DrawdownDistribution {
    if max_drawdowns.is_empty() {
        return DrawdownDistribution::default();
    }
    let deepest = max_drawdowns.iter().copied().fold(0.0_f64, f64::min);

    let size = deepest.abs().trunc() as usize + 1;
    let x_axis = (1..=size)
        .map(|i| format!("{}R", i as i64 - size as i64))
        .collect();

    let mut y_axis = vec![0.0; size];
    for &dd in max_drawdowns {
        // dd.trunc() is in -(size-1)..=0
        let index = size - 1 - dd.abs().trunc() as usize;
        y_axis[index] += 1.0;
    }

    DrawdownDistribution { x_axis, y_axis }
}
