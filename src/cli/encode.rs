use crate::audio::{load_stream, save_stream};
use crate::config::StegoConfig;
use crate::error::Result;
use crate::metadata::EncodeMetadata;
use crate::metrics::QualityReport;
use crate::pipeline::compress::{compress, Compression};
use crate::pipeline::lsb::Strategy;
use crate::pipeline::stego::encode;
use crate::store::RecordStore;
use log::warn;
use std::path::{Path, PathBuf};

/// Default directory for metadata and key records
pub const DEFAULT_STORE_DIR: &str = "records";

/// Options for the encode command
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub message: Vec<u8>,
    pub strategy: Strategy,
    pub use_full_stream: bool,
    pub compression: Compression,
    pub config: StegoConfig,
    pub store_dir: PathBuf,
    /// Compute imperceptibility metrics against the input
    pub metrics: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            message: Vec::new(),
            strategy: Strategy::default(),
            use_full_stream: false,
            compression: Compression::default(),
            config: StegoConfig::default(),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            metrics: false,
        }
    }
}

/// What an encode produced
#[derive(Debug, Clone)]
pub struct EncodeSummary {
    pub id: String,
    pub metadata: EncodeMetadata,
    pub message_bytes: usize,
    pub payload_bytes: usize,
    pub quality: Option<QualityReport>,
}

impl EncodeSummary {
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Record id: {}\n", self.id));
        output.push_str(&format!(
            "Embedded {} bytes ({} after compression, {} bits) in samples {}..{} ({})\n",
            self.message_bytes,
            self.payload_bytes,
            self.metadata.message_bit_length,
            self.metadata.segment_start,
            self.metadata.segment_end,
            self.metadata.strategy
        ));
        if let Some(quality) = &self.quality {
            output.push('\n');
            output.push_str(&quality.to_text());
        }
        output
    }
}

/// Hide a message in a WAV file and store the record needed to recover it
pub fn encode_file(input: &Path, output: &Path, options: &EncodeOptions) -> Result<EncodeSummary> {
    let stream = load_stream(input)?;
    let payload = compress(&options.message, options.compression)?;

    let result = encode(
        &stream,
        &payload,
        options.use_full_stream,
        options.strategy,
        &options.config,
    )?;
    // The record goes first; a stego file without it cannot be decoded
    let store = RecordStore::new(&options.store_dir);
    let id = store.save(&result.metadata, &result.key)?;
    if let Err(e) = save_stream(output, &result.stream) {
        if let Err(cleanup) = store.remove(&id) {
            warn!("could not remove record {}: {}", id, cleanup);
        }
        return Err(e);
    }

    let quality = options
        .metrics
        .then(|| QualityReport::compare(&stream.samples, &result.stream.samples));

    Ok(EncodeSummary {
        id,
        metadata: result.metadata,
        message_bytes: options.message.len(),
        payload_bytes: payload.len(),
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, SampleStream};
    use tempfile::tempdir;

    fn write_tone(path: &Path, len: usize) {
        let samples = (0..len)
            .map(|i| ((i as f64 * 0.031).sin() * 10_000.0) as i16)
            .collect();
        save_stream(path, &SampleStream::new(samples, AudioFormat::default())).unwrap();
    }

    #[test]
    fn test_encode_file_writes_output_and_record() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_tone(&input, 50_000);

        let options = EncodeOptions {
            message: b"hello".to_vec(),
            store_dir: dir.path().join("records"),
            metrics: true,
            ..Default::default()
        };
        let summary = encode_file(&input, &output, &options).unwrap();

        assert_eq!(summary.metadata.message_bit_length, 40);
        assert!(output.is_file());
        assert!(RecordStore::new(dir.path().join("records")).exists(&summary.id));

        let quality = summary.quality.as_ref().unwrap();
        assert!(quality.mse <= 1.0);
        assert!(summary.to_text().contains(&summary.id));
    }

    #[test]
    fn test_encode_file_missing_input() {
        let dir = tempdir().unwrap();
        let result = encode_file(
            &dir.path().join("missing.wav"),
            &dir.path().join("out.wav"),
            &EncodeOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_record_save_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_tone(&input, 10_000);
        // A plain file where the store directory should be
        let blocked = dir.path().join("records");
        std::fs::write(&blocked, b"").unwrap();

        let options = EncodeOptions {
            message: b"hello".to_vec(),
            store_dir: blocked,
            ..Default::default()
        };
        assert!(encode_file(&input, &output, &options).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_output_write_removes_record() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        write_tone(&input, 10_000);
        let store_dir = dir.path().join("records");

        let options = EncodeOptions {
            message: b"hello".to_vec(),
            store_dir: store_dir.clone(),
            ..Default::default()
        };
        let output = dir.path().join("no-such-dir").join("out.wav");
        assert!(encode_file(&input, &output, &options).is_err());
        assert_eq!(std::fs::read_dir(&store_dir).unwrap().count(), 0);
    }
}
