//! Equal-width histogram for distribution charts.
//!
//! Bin count follows Sturges' rule, `ceil(log2(n)) + 1`. A sample with no
//! spread collapses into a single bin.

use serde::{Deserialize, Serialize};

use super::trunc2d;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub from: f64,
    pub to: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn from_sample(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self { bins: Vec::new() };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max <= min {
            return Self {
                bins: vec![HistogramBin {
                    from: trunc2d(min),
                    to: trunc2d(max),
                    count: n,
                }],
            };
        }

        let k = bin_count(n);
        let width = (max - min) / k as f64;
        let mut counts = vec![0usize; k];

        for &v in values {
            let idx = (((v - min) / width) as usize).min(k - 1);
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                from: trunc2d(min + width * i as f64),
                to: trunc2d(min + width * (i + 1) as f64),
                count,
            })
            .collect();

        Self { bins }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

fn bin_count(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}
