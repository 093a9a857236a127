//! Logistic-map keystream and index generation.
//!
//! Every output is a pure function of [`ChaosParams`] and the requested
//! length, which is what lets decode regenerate exactly the key and the
//! embedding order that encode used.

use crate::error::{Result, StegoError};
use serde::{Deserialize, Serialize};

/// Lower edge of the chaotic regime of the logistic map
pub const CHAOTIC_R_MIN: f64 = 3.57;

/// Upper edge of the logistic map's useful range
pub const CHAOTIC_R_MAX: f64 = 4.0;

/// Parameters that fully determine a logistic-map trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaosParams {
    /// Initial point, expected in (0, 1)
    pub x0: f64,
    /// Control parameter, expected in [3.57, 4.0]
    pub r: f64,
    /// Iterations discarded before any output is taken
    pub n_warmup: usize,
}

impl Default for ChaosParams {
    fn default() -> Self {
        Self {
            x0: 0.123456,
            r: 3.999952,
            n_warmup: 100,
        }
    }
}

impl ChaosParams {
    pub fn new(x0: f64, r: f64, n_warmup: usize) -> Self {
        Self { x0, r, n_warmup }
    }

    /// Check that the parameters lie in the chaotic regime and away from
    /// the map's fixed points.
    ///
    /// The generator functions never call this; they stay total over any
    /// input. Configuration loading does.
    pub fn validate(&self) -> Result<()> {
        if !self.x0.is_finite() || !self.r.is_finite() {
            return Err(StegoError::GeneratorDomain(format!(
                "non-finite parameters x0={}, r={}",
                self.x0, self.r
            )));
        }
        if self.x0 <= 0.0 || self.x0 >= 1.0 {
            return Err(StegoError::GeneratorDomain(format!(
                "x0={} must lie strictly between 0 and 1",
                self.x0
            )));
        }
        if !(CHAOTIC_R_MIN..=CHAOTIC_R_MAX).contains(&self.r) {
            return Err(StegoError::GeneratorDomain(format!(
                "r={} outside chaotic regime [{}, {}]",
                self.r, CHAOTIC_R_MIN, CHAOTIC_R_MAX
            )));
        }
        let fixed_point = 1.0 - 1.0 / self.r;
        if (self.x0 - fixed_point).abs() < 1e-12 {
            return Err(StegoError::GeneratorDomain(format!(
                "x0={} is the fixed point of the map for r={}",
                self.x0, self.r
            )));
        }
        Ok(())
    }

    /// Trajectory positioned just after the warmup iterations
    pub fn trajectory(&self) -> LogisticMap {
        let mut map = LogisticMap::new(self.x0, self.r);
        for _ in 0..self.n_warmup {
            map.step();
        }
        map
    }
}

/// Single step of the logistic map: `x' = r * x * (1 - x)`
#[inline]
pub fn iterate_logistic(x: f64, r: f64) -> f64 {
    r * x * (1.0 - x)
}

/// Iterator over successive logistic-map states
#[derive(Debug, Clone)]
pub struct LogisticMap {
    x: f64,
    r: f64,
}

impl LogisticMap {
    pub fn new(x0: f64, r: f64) -> Self {
        Self { x: x0, r }
    }

    /// Advance one iteration and return the new state
    #[inline]
    pub fn step(&mut self) -> f64 {
        self.x = iterate_logistic(self.x, self.r);
        self.x
    }
}

impl Iterator for LogisticMap {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.step())
    }
}

/// Generate `length_bytes` keystream bytes.
///
/// One bit per iteration after warmup (`1` when the state exceeds 0.5),
/// packed MSB-first.
pub fn generate_keystream(params: &ChaosParams, length_bytes: usize) -> Vec<u8> {
    let mut map = params.trajectory();
    let mut keystream = Vec::with_capacity(length_bytes);

    for _ in 0..length_bytes {
        let mut byte = 0u8;
        for _ in 0..8 {
            let bit = (map.step() > 0.5) as u8;
            byte = (byte << 1) | bit;
        }
        keystream.push(byte);
    }

    keystream
}

/// Generate `count` indices in `[0, range_size)`.
///
/// Indices may repeat. A zero `range_size` has no valid index and yields an
/// empty sequence.
pub fn generate_position_sequence(
    params: &ChaosParams,
    range_size: usize,
    count: usize,
) -> Vec<usize> {
    if range_size == 0 {
        return Vec::new();
    }

    params
        .trajectory()
        .take(count)
        .map(|x| scale_to_index(x, range_size))
        .collect()
}

fn scale_to_index(x: f64, range_size: usize) -> usize {
    let scaled = (x * range_size as f64).floor();
    // NaN and negative values both land on 0
    if !(scaled > 0.0) {
        0
    } else {
        (scaled as usize).min(range_size - 1)
    }
}
