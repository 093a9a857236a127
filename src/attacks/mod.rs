//! Robustness harness.
//!
//! Applies a battery of distortions to an encoded stream and measures how
//! much of the hidden bit sequence survives each one. Ground truth is read
//! from the undistorted encoded stream, so results reflect the channel only
//! and not the cipher.

pub mod filter;
pub mod transcode;
pub mod transforms;

pub use transcode::LossyCodec;

use crate::audio::SampleStream;
use crate::error::Result;
use crate::metadata::EncodeMetadata;
use crate::pipeline::bits::count_matching;
use crate::pipeline::lsb::{extract, CodecOptions};
use crate::pipeline::segment::slice_padded;
use crate::pipeline::stego::{check_compatible, extract_payload_bits};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit survival ratio an attack must exceed to count as survived
pub const SUCCESS_THRESHOLD: f64 = 0.95;

/// One distortion with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attack {
    /// White Gaussian noise, `level` is the standard deviation relative to full scale
    Noise { level: f64 },
    Transcode { codec: LossyCodec, bitrate_kbps: u32 },
    LowPass { cutoff_hz: f64, order: usize },
    /// Downsample by `factor` and back
    Resample { factor: usize },
    TimeStretch { rate: f64 },
    Amplitude { gain: f64 },
    Echo { delay_ms: f64, decay: f64 },
    BitDepth { bits: u32 },
}

impl Attack {
    pub fn id(&self) -> &'static str {
        match self {
            Attack::Noise { .. } => "noise",
            Attack::Transcode { .. } => "transcode",
            Attack::LowPass { .. } => "low_pass",
            Attack::Resample { .. } => "resample",
            Attack::TimeStretch { .. } => "time_stretch",
            Attack::Amplitude { .. } => "amplitude",
            Attack::Echo { .. } => "echo",
            Attack::BitDepth { .. } => "bit_depth",
        }
    }

    /// Human-readable parameter summary
    pub fn parameters(&self) -> String {
        match *self {
            Attack::Noise { level } => format!("level={}", level),
            Attack::Transcode {
                codec,
                bitrate_kbps,
            } => format!("codec={} bitrate={}k", codec, bitrate_kbps),
            Attack::LowPass { cutoff_hz, order } => {
                format!("cutoff={}Hz order={}", cutoff_hz, order)
            }
            Attack::Resample { factor } => format!("factor={}", factor),
            Attack::TimeStretch { rate } => format!("rate={}", rate),
            Attack::Amplitude { gain } => format!("gain={}", gain),
            Attack::Echo { delay_ms, decay } => format!("delay={}ms decay={}", delay_ms, decay),
            Attack::BitDepth { bits } => format!("bits={}", bits),
        }
    }

    /// Distorted copy of `stream`'s samples. The length may change.
    pub fn apply(&self, stream: &SampleStream, rng: &mut StdRng) -> Vec<i16> {
        let samples = &stream.samples;
        let channels = stream.format.channels;
        let rate = stream.format.sample_rate;
        match *self {
            Attack::Noise { level } => transforms::add_noise(samples, level, rng),
            Attack::Transcode {
                codec,
                bitrate_kbps,
            } => transforms::transcode(samples, channels, rate, codec, bitrate_kbps),
            Attack::LowPass { cutoff_hz, order } => {
                transforms::low_pass(samples, channels, rate, cutoff_hz, order)
            }
            Attack::Resample { factor } => transforms::resample(samples, channels, factor),
            Attack::TimeStretch { rate: stretch } => {
                transforms::time_stretch(samples, channels, stretch)
            }
            Attack::Amplitude { gain } => transforms::amplitude(samples, gain),
            Attack::Echo { delay_ms, decay } => {
                transforms::echo(samples, channels, rate, delay_ms, decay)
            }
            Attack::BitDepth { bits } => transforms::bit_depth(samples, bits),
        }
    }
}

impl fmt::Display for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.parameters())
    }
}

/// Outcome of one attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    pub attack_id: String,
    pub parameters: String,
    pub matched_bits: usize,
    pub total_bits: usize,
    pub success: bool,
}

impl AttackResult {
    fn new(attack: &Attack, matched_bits: usize, total_bits: usize) -> Self {
        let mut result = Self {
            attack_id: attack.id().to_string(),
            parameters: attack.parameters(),
            matched_bits,
            total_bits,
            success: false,
        };
        result.success = result.ratio() > SUCCESS_THRESHOLD;
        result
    }

    /// Fraction of bits that survived; an empty payload survives trivially
    pub fn ratio(&self) -> f64 {
        if self.total_bits == 0 {
            1.0
        } else {
            self.matched_bits as f64 / self.total_bits as f64
        }
    }
}

/// Results of a full battery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    pub results: Vec<AttackResult>,
    pub passed: usize,
    pub total: usize,
}

impl AttackReport {
    fn from_results(results: Vec<AttackResult>) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        let total = results.len();
        Self {
            results,
            passed,
            total,
        }
    }

    /// Plain-text table of the results
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<14} {:<28} {:>9} {:>8}  {}\n",
            "ATTACK", "PARAMETERS", "BITS", "RATIO", "RESULT"
        ));
        for r in &self.results {
            out.push_str(&format!(
                "{:<14} {:<28} {:>4}/{:<4} {:>7.2}%  {}\n",
                r.attack_id,
                r.parameters,
                r.matched_bits,
                r.total_bits,
                r.ratio() * 100.0,
                if r.success { "survived" } else { "failed" }
            ));
        }
        out.push_str(&format!("\n{}/{} attacks survived\n", self.passed, self.total));
        out
    }
}

/// Harness settings
#[derive(Debug, Clone, Default)]
pub struct AttackOptions {
    /// Fixed seed for the random attacks; fresh entropy when absent
    pub seed: Option<u64>,
    /// Must match the options the payload was embedded with
    pub codec: CodecOptions,
}

/// The standard set of attacks
pub fn default_battery() -> Vec<Attack> {
    use Attack::*;
    vec![
        Noise { level: 0.0001 },
        Noise { level: 0.001 },
        Noise { level: 0.01 },
        Transcode {
            codec: LossyCodec::Mp3,
            bitrate_kbps: 128,
        },
        Transcode {
            codec: LossyCodec::Mp3,
            bitrate_kbps: 64,
        },
        Transcode {
            codec: LossyCodec::Vorbis,
            bitrate_kbps: 96,
        },
        LowPass {
            cutoff_hz: 8000.0,
            order: 5,
        },
        LowPass {
            cutoff_hz: 3000.0,
            order: 5,
        },
        LowPass {
            cutoff_hz: 1000.0,
            order: 5,
        },
        Resample { factor: 2 },
        Resample { factor: 4 },
        TimeStretch { rate: 0.9 },
        TimeStretch { rate: 1.1 },
        Amplitude { gain: 0.5 },
        Amplitude { gain: 1.5 },
        Echo {
            delay_ms: 100.0,
            decay: 0.3,
        },
        BitDepth { bits: 12 },
        BitDepth { bits: 8 },
    ]
}

/// Run [`default_battery`] against an encoded stream
pub fn run_attack_battery(
    encoded: &SampleStream,
    metadata: &EncodeMetadata,
    options: &AttackOptions,
) -> Result<AttackReport> {
    run_attacks(encoded, metadata, &default_battery(), options)
}

/// Run the given attacks against an encoded stream.
///
/// Each attack sees a fresh copy of `encoded`; attack `i` draws from an RNG
/// seeded with `seed + i` when a seed is set.
pub fn run_attacks(
    encoded: &SampleStream,
    metadata: &EncodeMetadata,
    attacks: &[Attack],
    options: &AttackOptions,
) -> Result<AttackReport> {
    check_compatible(encoded.len(), metadata, &options.codec)?;
    let truth = extract_payload_bits(&encoded.samples, metadata, &options.codec);
    let segment = metadata.segment();
    info!(
        "running {} attacks against {} embedded bits",
        attacks.len(),
        truth.len()
    );

    let mut results = Vec::with_capacity(attacks.len());
    for (i, attack) in attacks.iter().enumerate() {
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
            None => StdRng::from_entropy(),
        };

        let distorted = attack.apply(encoded, &mut rng);
        if distorted.len() != encoded.len() {
            warn!(
                "{} changed length {} -> {}; reading the segment with clipping",
                attack,
                encoded.len(),
                distorted.len()
            );
        }

        let window = slice_padded(&distorted, segment);
        let bits = extract(
            &window,
            metadata.message_bit_length,
            metadata.strategy,
            &options.codec,
        );
        let result = AttackResult::new(attack, count_matching(&truth, &bits), truth.len());
        debug!(
            "{}: {}/{} bits ({:.2}%)",
            attack,
            result.matched_bits,
            result.total_bits,
            result.ratio() * 100.0
        );
        results.push(result);
    }

    let report = AttackReport::from_results(results);
    info!("{}/{} attacks survived", report.passed, report.total);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFormat;
    use crate::config::StegoConfig;
    use crate::pipeline::lsb::Strategy;
    use crate::pipeline::stego::encode;

    fn encoded_tone() -> (SampleStream, EncodeMetadata) {
        let samples = (0..60_000)
            .map(|i| ((i as f64 * 0.0627).sin() * 9000.0) as i16)
            .collect();
        let stream = SampleStream::new(samples, AudioFormat::default());
        let result = encode(
            &stream,
            b"robustness",
            false,
            Strategy::Chaotic,
            &StegoConfig::default(),
        )
        .unwrap();
        (result.stream, result.metadata)
    }

    fn seeded() -> AttackOptions {
        AttackOptions {
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_noise_survives_fully() {
        let (stream, meta) = encoded_tone();
        let report = run_attacks(&stream, &meta, &[Attack::Noise { level: 0.0 }], &seeded()).unwrap();
        let r = &report.results[0];
        assert_eq!(r.total_bits, 80);
        assert_eq!(r.matched_bits, 80);
        assert_eq!(r.ratio(), 1.0);
        assert!(r.success);
        assert_eq!(report.passed, 1);
    }

    #[test]
    fn test_extreme_low_pass_fails() {
        let (stream, meta) = encoded_tone();
        let attack = Attack::LowPass {
            cutoff_hz: 1.0,
            order: 5,
        };
        let report = run_attacks(&stream, &meta, &[attack], &seeded()).unwrap();
        let r = &report.results[0];
        assert_eq!(r.total_bits, 80);
        assert!(r.ratio() < SUCCESS_THRESHOLD);
        assert!(!r.success);
        assert_eq!(report.passed, 0);
    }

    #[test]
    fn test_lossless_attacks_survive() {
        let (stream, meta) = encoded_tone();
        let attacks = [Attack::Amplitude { gain: 1.0 }, Attack::BitDepth { bits: 16 }];
        let report = run_attacks(&stream, &meta, &attacks, &seeded()).unwrap();
        assert_eq!(report.passed, 2);
    }

    #[test]
    fn test_bit_depth_reduction_destroys_lsb() {
        let (stream, meta) = encoded_tone();
        let report =
            run_attacks(&stream, &meta, &[Attack::BitDepth { bits: 8 }], &seeded()).unwrap();
        // Every LSB reads as zero now
        let zeros = extract_payload_bits(&stream.samples, &meta, &CodecOptions::default())
            .iter()
            .filter(|&&b| !b)
            .count();
        assert_eq!(report.results[0].matched_bits, zeros);
        assert!(!report.results[0].success);
    }

    #[test]
    fn test_seeded_battery_is_reproducible() {
        let (stream, meta) = encoded_tone();
        let a = run_attack_battery(&stream, &meta, &seeded()).unwrap();
        let b = run_attack_battery(&stream, &meta, &seeded()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total, default_battery().len());
        assert!(a.results.iter().all(|r| r.matched_bits <= r.total_bits));
    }

    #[test]
    fn test_incompatible_stream_rejected() {
        let (stream, meta) = encoded_tone();
        let short = stream.with_samples(stream.samples[..1000].to_vec());
        assert!(run_attack_battery(&short, &meta, &seeded()).is_err());
    }

    #[test]
    fn test_empty_payload_ratio() {
        let result = AttackResult::new(&Attack::Amplitude { gain: 2.0 }, 0, 0);
        assert_eq!(result.ratio(), 1.0);
        assert!(result.success);
    }

    #[test]
    fn test_report_table() {
        let report = AttackReport::from_results(vec![
            AttackResult::new(&Attack::Noise { level: 0.01 }, 40, 80),
            AttackResult::new(&Attack::Resample { factor: 2 }, 80, 80),
        ]);
        let table = report.to_table();
        assert!(table.contains("noise"));
        assert!(table.contains("level=0.01"));
        assert!(table.contains("1/2 attacks survived"));
    }
}
