//! Butterworth low-pass filter as a cascade of second-order sections.
//!
//! Designed with the bilinear transform; runs from a zero initial state.

use std::f64::consts::PI;

/// One direct-form-II-transposed section
#[derive(Debug, Clone, Copy)]
struct Section {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Section {
    fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// Low-pass Butterworth filter of arbitrary order
#[derive(Debug, Clone)]
pub struct Butterworth {
    sections: Vec<Section>,
}

impl Butterworth {
    /// Design a low-pass filter.
    ///
    /// `cutoff_hz` is clamped into the open interval (0, Nyquist); order 0
    /// and a degenerate sample rate pass the signal through unchanged.
    pub fn low_pass(order: usize, cutoff_hz: f64, sample_rate: f64) -> Self {
        let nyquist = sample_rate / 2.0;
        if !nyquist.is_finite() || nyquist * 0.999 <= 1e-3 {
            return Self {
                sections: Vec::new(),
            };
        }
        let cutoff = if cutoff_hz.is_finite() {
            cutoff_hz.clamp(1e-3, nyquist * 0.999)
        } else {
            nyquist * 0.999
        };
        // Prewarped analog cutoff
        let k = (PI * cutoff / sample_rate).tan();
        let k2 = k * k;

        let mut sections = Vec::with_capacity(order / 2 + 1);
        for i in 0..order / 2 {
            let theta = PI * (2 * i + 1) as f64 / (2 * order) as f64;
            let q = 1.0 / (2.0 * theta.sin());
            let norm = 1.0 / (1.0 + k / q + k2);
            let b0 = k2 * norm;
            sections.push(Section::new(
                b0,
                2.0 * b0,
                b0,
                2.0 * (k2 - 1.0) * norm,
                (1.0 - k / q + k2) * norm,
            ));
        }
        if order % 2 == 1 {
            let norm = 1.0 / (1.0 + k);
            let b0 = k * norm;
            sections.push(Section::new(b0, b0, 0.0, (k - 1.0) * norm, 0.0));
        }

        Self { sections }
    }

    /// Filter a whole signal from a zero initial state
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut sections = self.sections.clone();
        input
            .iter()
            .map(|&x| sections.iter_mut().fold(x, |acc, s| s.process(acc)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(signal: &[f64]) -> f64 {
        (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
    }

    #[test]
    fn test_dc_gain_is_unity() {
        let filter = Butterworth::low_pass(5, 1000.0, 44100.0);
        let out = filter.apply(&vec![1.0; 4000]);
        assert!((out[3999] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_passband_kept_stopband_removed() {
        let sr = 44100.0;
        let filter = Butterworth::low_pass(5, 2000.0, sr);

        let low = filter.apply(&sine(200.0, sr, 8000));
        let high = filter.apply(&sine(12000.0, sr, 8000));

        // Skip the start-up transient
        assert!(rms(&low[2000..]) > 0.65);
        assert!(rms(&high[2000..]) < 0.01);
    }

    #[test]
    fn test_cutoff_is_half_power() {
        let sr = 48000.0;
        let filter = Butterworth::low_pass(4, 3000.0, sr);
        let out = filter.apply(&sine(3000.0, sr, 24000));
        let gain = rms(&out[8000..]) / (1.0 / 2f64.sqrt());
        assert!((gain - 1.0 / 2f64.sqrt()).abs() < 0.02, "gain {}", gain);
    }

    #[test]
    fn test_order_zero_is_identity() {
        let filter = Butterworth::low_pass(0, 100.0, 8000.0);
        let input = vec![0.5, -0.25, 1.0];
        assert_eq!(filter.apply(&input), input);
    }

    #[test]
    fn test_near_zero_cutoff_is_stable() {
        let filter = Butterworth::low_pass(5, 0.0, 44100.0);
        let out = filter.apply(&sine(440.0, 44100.0, 20000));
        assert!(out.iter().all(|x| x.is_finite()));
        assert!(rms(&out) < 1e-3);
    }

    #[test]
    fn test_zero_sample_rate_passes_through() {
        let input = vec![0.5, -0.25, 1.0];
        for rate in [0.0, 1e-4, f64::NAN] {
            let filter = Butterworth::low_pass(5, 1000.0, rate);
            assert_eq!(filter.apply(&input), input);
        }
    }
}
