//! Bounded random partition of a target quantity into N parts.
//!
//! Every part but one is drawn from a percentage band around the even
//! split; the last part absorbs the rounding drift so the sum closes
//! exactly at two decimals. The list is shuffled afterwards so the
//! balancing part has no fixed position.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::errors::ReflowError;

/// Decimal places the distributed values are rounded to.
pub const PRECISION: i32 = 2;
/// Tolerance used by [`validate`] when callers have no better number.
pub const DEFAULT_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentBand {
    min: f64,
    max: f64,
}

impl PercentBand {
    pub fn new(min: f64, max: f64) -> Result<Self, ReflowError> {
        let in_range = |v: f64| v.is_finite() && (-100.0..=100.0).contains(&v);
        if !in_range(min) || !in_range(max) || min > max {
            return Err(ReflowError::InvalidPercentBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Lower and upper value bounds for a given even-split base.
    pub fn bounds(&self, base: f64) -> (f64, f64) {
        let a = base * (1.0 + self.min / 100.0);
        let b = base * (1.0 + self.max / 100.0);
        (a.min(b), a.max(b))
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

impl Default for PercentBand {
    fn default() -> Self {
        Self {
            min: -2.0,
            max: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionRequest {
    pub target: f64,
    pub count: usize,
    pub band: PercentBand,
}

impl DistributionRequest {
    pub fn new(target: f64, count: i64, band: PercentBand) -> Result<Self, ReflowError> {
        if count < 0 {
            return Err(ReflowError::NegativeCount(count));
        }
        if !target.is_finite() {
            return Err(ReflowError::config(format!(
                "target weight must be a finite number, got {}",
                target
            )));
        }
        Ok(Self {
            target,
            count: count as usize,
            band,
        })
    }

    pub fn run<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        distribute(self.target, self.count, self.band, rng)
    }
}

pub fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(PRECISION);
    let rounded = (value * factor).round() / factor;
    // avoid "-0.0" leaking into the sheet
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn distribute<R: Rng>(
    target: f64,
    count: usize,
    band: PercentBand,
    rng: &mut R,
) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }

    let base = target / count as f64;
    let mut values = Vec::with_capacity(count);
    let mut remaining = target;
    for _ in 0..count - 1 {
        let variation = band.draw(rng);
        let value = round_to_precision(base * (1.0 + variation / 100.0));
        remaining -= value;
        values.push(value);
    }
    values.push(round_to_precision(remaining));
    values.shuffle(rng);

    debug!(
        target,
        count,
        base,
        min_pct = band.min(),
        max_pct = band.max(),
        "distributed weight"
    );
    values
}

pub fn validate(values: &[f64], target: f64, tolerance: f64) -> bool {
    let sum: f64 = values.iter().sum();
    (sum - target).abs() <= tolerance
}
