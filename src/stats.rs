//! Aggregate signal statistics over a captured waterfall.

use thiserror::Error;

use crate::{PowerRow, BINS};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// Statistics over zero lines are undefined; callers get this instead of
    /// NaN propagation
    #[error("no waterfall lines to compute statistics over")]
    EmptyInput,
}

/// Summary metrics for one capture, computed once after acquisition
#[derive(Debug, Clone)]
pub struct SummaryStats {
    /// Per-bin mean over time
    pub mean_row: PowerRow,
    /// 95th percentile of the mean row
    pub p95: f32,
    /// Median of the mean row, the noise floor
    pub median: f32,
    /// Strongest value anywhere in the matrix (dBm)
    pub peak: f32,
    /// Weakest value anywhere in the matrix (dBm)
    pub trough: f32,
}

impl SummaryStats {
    pub fn compute(matrix: &[PowerRow]) -> Result<Self, StatsError> {
        let mean_row = mean_per_bin(matrix)?;
        Ok(Self {
            p95: percentile(&mean_row, 95.0)?,
            median: percentile(&mean_row, 50.0)?,
            peak: peak(matrix)?,
            trough: trough(matrix)?,
            mean_row,
        })
    }

    /// Signal-to-noise ratio: p95 over the median noise floor
    pub fn snr(&self) -> f32 {
        self.p95 - self.median
    }
}

/// Element-wise time-average across lines, per bin column
pub fn mean_per_bin(matrix: &[PowerRow]) -> Result<PowerRow, StatsError> {
    if matrix.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let n = matrix.len() as f32;
    let mut mean = [0f32; BINS];
    for row in matrix {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v / n;
        }
    }
    Ok(mean)
}

/// Linear-interpolation percentile of `values` at `p` in [0, 100]
pub fn percentile(values: &[f32], p: f64) -> Result<f32, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Strongest value anywhere in the matrix
pub fn peak(matrix: &[PowerRow]) -> Result<f32, StatsError> {
    if matrix.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    Ok(matrix
        .iter()
        .flatten()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max))
}

/// Weakest value anywhere in the matrix
pub fn trough(matrix: &[PowerRow]) -> Result<f32, StatsError> {
    if matrix.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    Ok(matrix
        .iter()
        .flatten()
        .copied()
        .fold(f32::INFINITY, f32::min))
}
