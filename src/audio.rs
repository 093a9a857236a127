//! WAV container I/O.
//!
//! The format header is carried through untouched; only 16-bit integer PCM
//! is accepted.

use crate::error::{Result, StegoError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, Write};
use std::path::Path;

/// Container parameters, passed through from input to output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

impl AudioFormat {
    fn from_spec(spec: WavSpec) -> Result<Self> {
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(StegoError::UnsupportedFormat(format!(
                "{}-bit {:?} PCM (expected 16-bit integer)",
                spec.bits_per_sample, spec.sample_format
            )));
        }
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(StegoError::UnsupportedFormat(format!(
                "{} channel(s) at {} Hz",
                spec.channels, spec.sample_rate
            )));
        }
        Ok(Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        })
    }

    fn to_spec(self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }
}

/// Channel-interleaved 16-bit samples plus their container format
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStream {
    pub samples: Vec<i16>,
    pub format: AudioFormat,
}

impl SampleStream {
    pub fn new(samples: Vec<i16>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Same format, different samples
    pub fn with_samples(&self, samples: Vec<i16>) -> Self {
        Self {
            samples,
            format: self.format,
        }
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        let frames = self.samples.len() as f64 / self.format.channels.max(1) as f64;
        frames / self.format.sample_rate.max(1) as f64
    }
}

/// Load a WAV file
pub fn load_stream(path: &Path) -> Result<SampleStream> {
    let reader = WavReader::open(path)?;
    collect_samples(reader)
}

/// Read a WAV stream from any reader
pub fn read_stream<R: Read>(reader: R) -> Result<SampleStream> {
    collect_samples(WavReader::new(reader)?)
}

fn collect_samples<R: Read>(mut reader: WavReader<R>) -> Result<SampleStream> {
    let format = AudioFormat::from_spec(reader.spec())?;
    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()?;
    Ok(SampleStream { samples, format })
}

/// Save a WAV file with the stream's own format
pub fn save_stream(path: &Path, stream: &SampleStream) -> Result<()> {
    let writer = WavWriter::create(path, stream.format.to_spec())?;
    write_samples(writer, &stream.samples)
}

/// Write a WAV stream into any seekable writer
pub fn write_stream<W: Write + Seek>(writer: W, stream: &SampleStream) -> Result<()> {
    let writer = WavWriter::new(writer, stream.format.to_spec())?;
    write_samples(writer, &stream.samples)
}

fn write_samples<W: Write + Seek>(mut writer: WavWriter<W>, samples: &[i16]) -> Result<()> {
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
