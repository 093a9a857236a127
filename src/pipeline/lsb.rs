//! Least-significant-bit embedding into 16-bit PCM samples.
//!
//! Bits are grouped into chunks of `num_lsb`; each chunk replaces the
//! trailing bits of one sample, MSB-first. The last chunk may be shorter,
//! in which case it occupies only as many trailing bits as it has.
//!
//! Samples are handled as two's-complement 16-bit words, so negative
//! samples keep their sign bits untouched.

use crate::chaos::{generate_position_sequence, ChaosParams};
use crate::error::{Result, StegoError};
use log::debug;
use serde::{Deserialize, Serialize};

/// Order in which chunks are assigned to samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Chunk `j` goes to sample `j`
    Sequential,
    /// Chunk `j` goes to the `j`-th index of a chaotic position sequence.
    /// Repeated indices are resolved by the [`CollisionPolicy`].
    #[default]
    Chaotic,
}

/// What the chaotic strategy does when the position sequence repeats an index.
///
/// The two policies place chunks differently once the first repeat occurs,
/// so a payload embedded under one cannot be extracted under the other.
/// Records written with last-write-wins layouts need [`CollisionPolicy::Overwrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Move the chunk to the next unused sample (wrapping). Every chunk gets
    /// its own sample, so extraction always recovers what was embedded.
    #[default]
    Probe,
    /// Write to the repeated index anyway; the last write wins and the
    /// overwritten chunks are lost. Bit layout of legacy records.
    Overwrite,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = StegoError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "probe" => Ok(Self::Probe),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(StegoError::UnsupportedAlgorithm(format!("collision policy: {}", s))),
        }
    }
}

impl Strategy {
    /// Flag written into the metadata record
    pub fn as_flag(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Chaotic => "chaotic",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_flag())
    }
}

impl std::str::FromStr for Strategy {
    type Err = StegoError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "chaotic" | "random" | "chaotic-random" => Ok(Self::Chaotic),
            // Boolean "sequential?" flag used by older metadata records
            "true" => Ok(Self::Sequential),
            "false" => Ok(Self::Chaotic),
            _ => Err(StegoError::UnsupportedAlgorithm(format!("strategy: {}", s))),
        }
    }
}

/// Settings shared by embed and extract; both sides must agree on them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodecOptions {
    /// Bits carried per referenced sample
    pub num_lsb: u32,
    /// Seed of the position sequence for [`Strategy::Chaotic`]
    pub position_params: ChaosParams,
    /// Handling of repeated positions for [`Strategy::Chaotic`]
    #[serde(default)]
    pub collisions: CollisionPolicy,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            num_lsb: 1,
            position_params: ChaosParams::default(),
            collisions: CollisionPolicy::default(),
        }
    }
}

impl CodecOptions {
    fn bits_per_sample(&self) -> usize {
        self.num_lsb.min(16) as usize
    }

    /// Number of bits a segment of `segment_len` samples can hold
    pub fn capacity(&self, segment_len: usize) -> usize {
        segment_len * self.bits_per_sample()
    }
}

/// Embed `bits` into a copy of `segment`.
///
/// Fails with [`StegoError::CapacityExceeded`] before touching anything when
/// the segment cannot hold all bits.
pub fn embed(
    segment: &[i16],
    bits: &[bool],
    strategy: Strategy,
    options: &CodecOptions,
) -> Result<Vec<i16>> {
    let capacity = options.capacity(segment.len());
    if bits.len() > capacity {
        return Err(StegoError::CapacityExceeded {
            required: bits.len(),
            available: capacity,
        });
    }

    let mut modified = segment.to_vec();
    if bits.is_empty() {
        return Ok(modified);
    }

    let width = options.bits_per_sample();
    let chunk_count = bits.len().div_ceil(width);
    let positions = chunk_positions(strategy, segment.len(), chunk_count, options);

    for (chunk, &pos) in bits.chunks(width).zip(&positions) {
        modified[pos] = write_trailing_bits(modified[pos], chunk);
    }

    debug!(
        "embedded {} bits into {} samples ({} strategy, {} bit(s)/sample)",
        bits.len(),
        segment.len(),
        strategy,
        width
    );

    Ok(modified)
}

/// Read `bit_length` bits back out of `segment`.
///
/// Never fails: positions that fall outside the segment read as zero bits,
/// and mismatched options simply yield meaningless bits.
pub fn extract(
    segment: &[i16],
    bit_length: usize,
    strategy: Strategy,
    options: &CodecOptions,
) -> Vec<bool> {
    let width = options.bits_per_sample();
    if width == 0 {
        return vec![false; bit_length];
    }

    let chunk_count = bit_length.div_ceil(width);
    let positions = chunk_positions(strategy, segment.len(), chunk_count, options);

    let mut bits = Vec::with_capacity(bit_length);
    for j in 0..chunk_count {
        let chunk_len = width.min(bit_length - j * width);
        let sample = positions.get(j).and_then(|&pos| segment.get(pos)).copied();
        match sample {
            Some(sample) => read_trailing_bits(sample, chunk_len, &mut bits),
            None => bits.extend(std::iter::repeat(false).take(chunk_len)),
        }
    }

    bits
}

fn chunk_positions(
    strategy: Strategy,
    segment_len: usize,
    chunk_count: usize,
    options: &CodecOptions,
) -> Vec<usize> {
    match strategy {
        Strategy::Sequential => (0..chunk_count).collect(),
        Strategy::Chaotic => {
            let raw =
                generate_position_sequence(&options.position_params, segment_len, chunk_count);
            match options.collisions {
                CollisionPolicy::Overwrite => raw,
                CollisionPolicy::Probe => probe_unused(&raw, segment_len),
            }
        }
    }
}

/// Walk each repeated index forward to the next unused slot.
/// Stops early once every slot is taken.
fn probe_unused(raw: &[usize], segment_len: usize) -> Vec<usize> {
    let mut used = vec![false; segment_len];
    let mut resolved = Vec::with_capacity(raw.len().min(segment_len));

    for &start in raw.iter().take(segment_len) {
        let mut pos = start;
        while used[pos] {
            pos = (pos + 1) % segment_len;
        }
        used[pos] = true;
        resolved.push(pos);
    }

    resolved
}

/// Replace the trailing `chunk.len()` bits of `sample` with `chunk`
fn write_trailing_bits(sample: i16, chunk: &[bool]) -> i16 {
    let width = chunk.len() as u32;
    let mask = (((1u32 << width) - 1) & 0xFFFF) as u16;
    let value = chunk.iter().fold(0u16, |acc, &bit| (acc << 1) | bit as u16);
    let word = sample as u16;
    ((word & !mask) | (value & mask)) as i16
}

/// Append the trailing `width` bits of `sample`, MSB-first
fn read_trailing_bits(sample: i16, width: usize, out: &mut Vec<bool>) {
    let word = sample as u16;
    for i in (0..width).rev() {
        out.push((word >> i) & 1 == 1);
    }
}
