//! Signal distortions applied by the robustness harness.
//!
//! Every transform works on channel-interleaved 16-bit samples, processes
//! channels independently, and clamps back into the i16 range.

use crate::attacks::filter::Butterworth;
use crate::attacks::transcode::{transcode_channel, LossyCodec};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Round and saturate into a 16-bit sample
#[inline]
pub fn to_sample(x: f64) -> i16 {
    x.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Split interleaved samples into per-channel signals.
/// A trailing partial frame is kept on the channels it reaches.
pub fn deinterleave(samples: &[i16], channels: usize) -> Vec<Vec<f64>> {
    let channels = channels.max(1);
    let mut out = vec![Vec::with_capacity(samples.len() / channels + 1); channels];
    for (i, &s) in samples.iter().enumerate() {
        out[i % channels].push(s as f64);
    }
    out
}

/// Inverse of [`deinterleave`]
pub fn interleave(channels: &[Vec<f64>]) -> Vec<i16> {
    let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels.len());
    for frame in 0..frames {
        for channel in channels {
            if let Some(&x) = channel.get(frame) {
                out.push(to_sample(x));
            }
        }
    }
    out
}

fn per_channel<F>(samples: &[i16], channels: u16, f: F) -> Vec<i16>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let split = deinterleave(samples, channels as usize);
    let processed: Vec<Vec<f64>> = split.iter().map(|c| f(c.as_slice())).collect();
    interleave(&processed)
}

/// Additive white Gaussian noise with standard deviation `level` of full scale
pub fn add_noise<R: Rng + ?Sized>(samples: &[i16], level: f64, rng: &mut R) -> Vec<i16> {
    let sigma = level * i16::MAX as f64;
    if sigma <= 0.0 || !sigma.is_finite() {
        return samples.to_vec();
    }
    let Ok(normal) = Normal::new(0.0, sigma) else {
        return samples.to_vec();
    };
    samples
        .iter()
        .map(|&s| to_sample(s as f64 + normal.sample(rng)))
        .collect()
}

/// Butterworth low-pass of the given order
pub fn low_pass(
    samples: &[i16],
    channels: u16,
    sample_rate: u32,
    cutoff_hz: f64,
    order: usize,
) -> Vec<i16> {
    let filter = Butterworth::low_pass(order, cutoff_hz, sample_rate as f64);
    per_channel(samples, channels, |signal| filter.apply(signal))
}

/// Drop to `1/factor` of the rate by block averaging, then interpolate back
/// up to the original length.
pub fn resample(samples: &[i16], channels: u16, factor: usize) -> Vec<i16> {
    if factor <= 1 {
        return samples.to_vec();
    }
    per_channel(samples, channels, |signal| {
        let low: Vec<f64> = signal
            .chunks(factor)
            .map(|block| block.iter().sum::<f64>() / block.len() as f64)
            .collect();
        upsample_linear(&low, signal.len(), factor as f64)
    })
}

fn upsample_linear(low: &[f64], len: usize, factor: f64) -> Vec<f64> {
    if low.is_empty() {
        return vec![0.0; len];
    }
    let last = (low.len() - 1) as f64;
    (0..len)
        .map(|i| {
            // Block averages sit at the centre of their block
            let t = ((i as f64 + 0.5) / factor - 0.5).clamp(0.0, last);
            let j = t.floor() as usize;
            let frac = t - j as f64;
            let next = low.get(j + 1).copied().unwrap_or(low[j]);
            low[j] * (1.0 - frac) + next * frac
        })
        .collect()
}

const STRETCH_FRAME: usize = 1024;
const STRETCH_HOP: usize = 256;

/// Change duration by `rate` without resampling (overlap-add). Rates above
/// one shorten the signal; the output has `len / rate` samples per channel.
pub fn time_stretch(samples: &[i16], channels: u16, rate: f64) -> Vec<i16> {
    if !(rate > 0.0) || !rate.is_finite() || (rate - 1.0).abs() < f64::EPSILON {
        return samples.to_vec();
    }
    per_channel(samples, channels, |signal| overlap_add(signal, rate))
}

fn overlap_add(signal: &[f64], rate: f64) -> Vec<f64> {
    let out_len = (signal.len() as f64 / rate).round() as usize;
    let analysis_hop = ((STRETCH_HOP as f64 * rate).round() as usize).max(1);
    let window: Vec<f64> = (0..STRETCH_FRAME)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / STRETCH_FRAME as f64).cos())
        .collect();

    let mut out = vec![0.0; out_len];
    let mut weight = vec![0.0; out_len];

    let mut frame = 0;
    loop {
        let read = frame * analysis_hop;
        let write = frame * STRETCH_HOP;
        if read >= signal.len() || write >= out_len {
            break;
        }
        for (i, &w) in window.iter().enumerate() {
            let (Some(&x), Some(slot)) = (signal.get(read + i), out.get_mut(write + i)) else {
                break;
            };
            *slot += x * w;
            weight[write + i] += w;
        }
        frame += 1;
    }

    for (y, w) in out.iter_mut().zip(&weight) {
        if *w > 1e-6 {
            *y /= w;
        }
    }
    out
}

/// Scale every sample by `gain`
pub fn amplitude(samples: &[i16], gain: f64) -> Vec<i16> {
    samples.iter().map(|&s| to_sample(s as f64 * gain)).collect()
}

/// Single-tap echo: `y[n] = x[n] + decay * x[n - delay]`
pub fn echo(samples: &[i16], channels: u16, sample_rate: u32, delay_ms: f64, decay: f64) -> Vec<i16> {
    let delay = (delay_ms * sample_rate as f64 / 1000.0).round().max(0.0) as usize;
    per_channel(samples, channels, |signal| {
        signal
            .iter()
            .enumerate()
            .map(|(n, &x)| match n.checked_sub(delay) {
                Some(m) if delay > 0 => x + decay * signal[m],
                _ => x,
            })
            .collect()
    })
}

/// Requantize to `bits` of resolution by clearing the low bits
pub fn bit_depth(samples: &[i16], bits: u32) -> Vec<i16> {
    let bits = bits.clamp(1, 16);
    let shift = 16 - bits;
    samples.iter().map(|&s| (s >> shift) << shift).collect()
}

/// Simulated lossy transcode round trip
pub fn transcode(
    samples: &[i16],
    channels: u16,
    sample_rate: u32,
    codec: LossyCodec,
    bitrate_kbps: u32,
) -> Vec<i16> {
    per_channel(samples, channels, |signal| {
        transcode_channel(signal, sample_rate, codec, bitrate_kbps)
    })
}
